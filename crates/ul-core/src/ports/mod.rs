//! Port interfaces for the application layer.
//!
//! Ports define the contract between the application logic and its
//! collaborators, keeping the domain independent of infrastructure.

pub mod router;

pub use router::RouterPort;
