//! Pure state transitions for the provisioning flow.
//!
//! 配对流程的纯状态转换：
//! - 无 I/O，无副作用
//! - 同一 (状态, 动作) 输入永远得到同一输出
//! - 校验失败只写入 `error` 字段，绝不触碰 RPC 层

use tracing::warn;

use crate::provision::action::ProvisionAction;
use crate::provision::state::{DeviceChoice, ProvisionState};
use crate::security::SecretString;

/// Apply one action to the state, producing the next state.
///
/// Arrival actions set their prompt's current value and seed `error` from the
/// peer-supplied prior error (empty otherwise). Submission actions validate
/// locally; a rejected submission records the attempted value together with a
/// non-empty `error` so the prompt can re-render in place.
pub fn reduce(state: ProvisionState, action: ProvisionAction) -> ProvisionState {
    match action {
        // ===== Prompt arrivals =====
        ProvisionAction::ShowCodePage { code, error } => ProvisionState {
            code_page_text_code: code,
            error,
            ..state
        },
        ProvisionAction::ShowDeviceNamePage {
            existing_devices,
            error,
        } => ProvisionState {
            existing_devices,
            error,
            ..state
        },
        ProvisionAction::ShowDeviceListPage {
            devices,
            can_select_no_device,
        } => ProvisionState {
            selectable_devices: devices,
            can_select_no_device,
            selected_device: None,
            error: SecretString::default(),
            ..state
        },
        ProvisionAction::ShowGpgMethodPage { keys } => ProvisionState {
            gpg_keys: keys,
            gpg_method: None,
            error: SecretString::default(),
            ..state
        },
        ProvisionAction::ShowPassphrasePage { kind, error } => ProvisionState {
            passphrase_kind: Some(kind),
            passphrase: SecretString::default(),
            error,
            ..state
        },
        ProvisionAction::ShowFinalErrorPage { status } => ProvisionState {
            final_error: Some(status),
            ..state
        },

        // ===== User submissions =====
        ProvisionAction::SubmitTextCode { phrase } => {
            let error = if phrase.is_empty() {
                SecretString::new(EMPTY_CODE_ERROR.to_string())
            } else {
                SecretString::default()
            };
            ProvisionState {
                code_page_text_code: phrase,
                error,
                ..state
            }
        }
        ProvisionAction::SubmitDeviceName { name } => {
            let error = validate_device_name(&state, &name);
            ProvisionState {
                device_name: name,
                error,
                ..state
            }
        }
        ProvisionAction::SubmitDeviceSelect { device_id } => match device_id {
            Some(id)
                if state
                    .selectable_devices
                    .iter()
                    .any(|d| d.device_id == id) =>
            {
                ProvisionState {
                    selected_device: Some(DeviceChoice::Device(id)),
                    error: SecretString::default(),
                    ..state
                }
            }
            Some(_) => {
                warn!("device selection outside the offered list");
                ProvisionState {
                    selected_device: None,
                    error: SecretString::new(UNKNOWN_DEVICE_ERROR.to_string()),
                    ..state
                }
            }
            None if state.can_select_no_device => ProvisionState {
                selected_device: Some(DeviceChoice::NoDevice),
                error: SecretString::default(),
                ..state
            },
            None => ProvisionState {
                selected_device: None,
                error: SecretString::new(DEVICE_REQUIRED_ERROR.to_string()),
                ..state
            },
        },
        ProvisionAction::SubmitGpgMethod { method } => {
            if state.gpg_keys.is_empty() {
                warn!("gpg method submitted before any keys were offered");
            }
            ProvisionState {
                gpg_method: Some(method),
                error: SecretString::default(),
                ..state
            }
        }
        ProvisionAction::SubmitPassphrase { passphrase } => {
            if state.passphrase_kind.is_none() {
                warn!("passphrase submitted with no active prompt");
            }
            let error = if passphrase.is_empty() {
                SecretString::new(EMPTY_PASSPHRASE_ERROR.to_string())
            } else {
                SecretString::default()
            };
            ProvisionState {
                passphrase,
                error,
                ..state
            }
        }
    }
}

/// 设备名校验：非空且不与已有设备重名（大小写不敏感）。
fn validate_device_name(state: &ProvisionState, name: &str) -> SecretString {
    if name.trim().is_empty() {
        return SecretString::new(EMPTY_NAME_ERROR.to_string());
    }
    let needle = name.to_lowercase();
    if state
        .existing_devices
        .iter()
        .any(|d| d.as_str().to_lowercase() == needle)
    {
        return SecretString::new(format!("The device name '{name}' is already taken."));
    }
    SecretString::default()
}

const EMPTY_CODE_ERROR: &str = "Code can't be empty.";
const EMPTY_NAME_ERROR: &str = "Device name can't be empty.";
const UNKNOWN_DEVICE_ERROR: &str = "That device isn't in the list.";
const DEVICE_REQUIRED_ERROR: &str = "Select a device to continue.";
const EMPTY_PASSPHRASE_ERROR: &str = "Passphrase can't be empty.";
