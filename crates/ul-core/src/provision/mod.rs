//! Provisioning domain: state, actions, the reducer, and page selection.

mod action;
pub mod page;
mod reducer;
mod state;

pub use action::ProvisionAction;
pub use page::{Navigate, Page, PageGroup, Tab};
pub use reducer::reduce;
pub use state::{DeviceChoice, ProvisionState};
