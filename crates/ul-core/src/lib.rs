//! # ul-core
//!
//! Core domain model for UniLink device provisioning.
//!
//! This crate contains pure business logic without any infrastructure dependencies:
//! the provisioning state machine, the RPC method/payload vocabulary, and the ports
//! the application layer is reached through.

// Public module exports
pub mod device;
pub mod ports;
pub mod provision;
pub mod rpc;
pub mod security;

// Re-export commonly used types at the crate root
pub use device::{Device, DeviceId, DeviceName, DeviceType};
pub use provision::{reduce, DeviceChoice, Navigate, PageGroup, ProvisionAction, ProvisionState};
pub use rpc::{
    CallClass, CallPayload, GpgKey, GpgMethod, IncomingCall, PassphraseKind, Responder,
    ResponsePayload, RpcMethod, RpcReply, RpcStatus,
};
pub use security::SecretString;
