//! UniLink Application Orchestration Layer
//!
//! This crate contains the device provisioning use case: call dispatch,
//! the stash-and-resume protocol, and navigation orchestration.

pub mod usecases;

pub use usecases::provision::{
    CoordinatorError, IncomingCallMap, ProvisionError, ProvisionOrchestrator,
    ProvisioningCoordinator,
};
