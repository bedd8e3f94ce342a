//! Device provisioning use case.
//!
//! The coordinator owns the dispatch table and the stash slot; the
//! orchestrator serializes entry points and executes navigation effects.

pub mod coordinator;
pub mod error;
pub mod orchestrator;

pub use coordinator::{IncomingCallMap, ProvisioningCoordinator};
pub use error::{CoordinatorError, ProvisionError};
pub use orchestrator::ProvisionOrchestrator;
