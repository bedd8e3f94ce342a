//! State-transition vocabulary: one variant per user or peer event.

use crate::device::{Device, DeviceId, DeviceName};
use crate::rpc::{GpgKey, GpgMethod, PassphraseKind, RpcStatus};
use crate::security::SecretString;

/// The only permitted way to mutate [`ProvisionState`](super::ProvisionState).
///
/// Arrival variants (`Show…`) are produced by the coordinator from inbound
/// prompts; submission variants (`Submit…`) are dispatched on behalf of the
/// user.
#[derive(Debug, PartialEq, Eq)]
pub enum ProvisionAction {
    ShowCodePage {
        code: SecretString,
        error: SecretString,
    },
    ShowDeviceNamePage {
        existing_devices: Vec<DeviceName>,
        error: SecretString,
    },
    ShowDeviceListPage {
        devices: Vec<Device>,
        can_select_no_device: bool,
    },
    ShowGpgMethodPage {
        keys: Vec<GpgKey>,
    },
    ShowPassphrasePage {
        kind: PassphraseKind,
        error: SecretString,
    },
    ShowFinalErrorPage {
        status: RpcStatus,
    },
    SubmitTextCode {
        phrase: SecretString,
    },
    SubmitDeviceName {
        name: String,
    },
    SubmitDeviceSelect {
        device_id: Option<DeviceId>,
    },
    SubmitGpgMethod {
        method: GpgMethod,
    },
    SubmitPassphrase {
        passphrase: SecretString,
    },
}

impl ProvisionAction {
    /// Stable name for log spans. Payloads never appear here.
    pub fn name(&self) -> &'static str {
        match self {
            ProvisionAction::ShowCodePage { .. } => "show_code_page",
            ProvisionAction::ShowDeviceNamePage { .. } => "show_device_name_page",
            ProvisionAction::ShowDeviceListPage { .. } => "show_device_list_page",
            ProvisionAction::ShowGpgMethodPage { .. } => "show_gpg_method_page",
            ProvisionAction::ShowPassphrasePage { .. } => "show_passphrase_page",
            ProvisionAction::ShowFinalErrorPage { .. } => "show_final_error_page",
            ProvisionAction::SubmitTextCode { .. } => "submit_text_code",
            ProvisionAction::SubmitDeviceName { .. } => "submit_device_name",
            ProvisionAction::SubmitDeviceSelect { .. } => "submit_device_select",
            ProvisionAction::SubmitGpgMethod { .. } => "submit_gpg_method",
            ProvisionAction::SubmitPassphrase { .. } => "submit_passphrase",
        }
    }
}
