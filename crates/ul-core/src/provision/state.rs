//! Session state for one provisioning attempt.

use crate::device::{Device, DeviceId, DeviceName};
use crate::rpc::{GpgKey, GpgMethod, PassphraseKind, RpcStatus};
use crate::security::SecretString;

/// Accepted answer to the device-choice prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceChoice {
    Device(DeviceId),
    /// Explicit "provision without an existing device", only valid when the
    /// prompt allowed it.
    NoDevice,
}

/// Snapshot of provisioning progress, owned by the orchestrator and mutated
/// only through [`reduce`](crate::provision::reduce).
///
/// `error` is shared across prompts but always scoped to the current one: a
/// new inbound prompt resets it unless the peer supplied a prior error.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProvisionState {
    /// Pairing phrase currently displayed/expected.
    pub code_page_text_code: SecretString,
    /// Last user-facing error for the current prompt; empty means none.
    pub error: SecretString,
    /// Existing device names shown to disambiguate a new name.
    pub existing_devices: Vec<DeviceName>,
    /// Name currently entered/submitted by the user.
    pub device_name: String,
    /// Devices offered by the device-choice prompt.
    pub selectable_devices: Vec<Device>,
    pub can_select_no_device: bool,
    pub selected_device: Option<DeviceChoice>,
    /// Keys offered by the GPG-method prompt.
    pub gpg_keys: Vec<GpgKey>,
    pub gpg_method: Option<GpgMethod>,
    /// Which secret-entry prompt is active, if any.
    pub passphrase_kind: Option<PassphraseKind>,
    pub passphrase: SecretString,
    /// Terminal attempt failure; set once, ends the flow.
    pub final_error: Option<RpcStatus>,
}

impl ProvisionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}
