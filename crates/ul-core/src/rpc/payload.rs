//! Typed inbound payloads, decoded per method from the transport's JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};

use crate::device::{Device, DeviceName};
use crate::rpc::method::RpcMethod;

/// `provisionUi.DisplayAndPromptSecret` argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecretPromptArg {
    #[serde(default)]
    pub phrase: String,
    /// Error from the previous answer, verbatim from the peer. Empty on the
    /// first prompt.
    #[serde(default, rename = "previousErr")]
    pub previous_err: String,
}

/// `provisionUi.PromptNewDeviceName` argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceNamePromptArg {
    #[serde(default, rename = "existingDevices")]
    pub existing_devices: Vec<DeviceName>,
    #[serde(default, rename = "errorMessage")]
    pub error_message: String,
}

/// `provisionUi.chooseDevice` argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChooseDeviceArg {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default, rename = "canSelectNoDevice")]
    pub can_select_no_device: bool,
}

/// A GPG key offered by `provisionUi.chooseGPGMethod`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GpgKey {
    #[serde(rename = "keyID")]
    pub key_id: String,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub identities: Vec<String>,
}

/// `provisionUi.chooseGPGMethod` argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChooseGpgMethodArg {
    #[serde(default)]
    pub keys: Vec<GpgKey>,
}

/// How the user wants their GPG key involved. Answered as a wire ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpgMethod {
    None,
    Import,
    Sign,
}

impl GpgMethod {
    pub fn ordinal(&self) -> u8 {
        match self {
            GpgMethod::None => 0,
            GpgMethod::Import => 1,
            GpgMethod::Sign => 2,
        }
    }
}

impl Serialize for GpgMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.ordinal())
    }
}

/// Which secret-entry prompt `secretUi.getPassphrase` is asking for.
///
/// Wire ordinals: 1 = paper key, 2 = passphrase. 0 ("none") never reaches the
/// provisioning flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum PassphraseKind {
    PaperKey,
    Passphrase,
}

impl TryFrom<u8> for PassphraseKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PassphraseKind::PaperKey),
            2 => Ok(PassphraseKind::Passphrase),
            other => Err(format!("unsupported passphrase type {other}")),
        }
    }
}

/// The pinentry block inside `secretUi.getPassphrase`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PinentryArg {
    #[serde(rename = "type")]
    pub kind: PassphraseKind,
    #[serde(default)]
    pub prompt: String,
    /// Peer-supplied prior error, shown when the previous answer was wrong.
    #[serde(default, rename = "retryLabel")]
    pub retry_label: String,
}

/// `secretUi.getPassphrase` argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetPassphraseArg {
    pub pinentry: PinentryArg,
}

/// Inbound payload, decoded according to the method it arrived on.
///
/// Cancel- and ignore-class methods never have their payload read, so it is
/// carried opaquely.
#[derive(Debug, Clone, PartialEq)]
pub enum CallPayload {
    SecretPrompt(SecretPromptArg),
    DeviceNamePrompt(DeviceNamePromptArg),
    ChooseDevice(ChooseDeviceArg),
    ChooseGpgMethod(ChooseGpgMethodArg),
    GetPassphrase(GetPassphraseArg),
    Opaque(serde_json::Value),
}

/// The transport delivered JSON that does not decode as the method's argument.
#[derive(Debug, thiserror::Error)]
#[error("malformed payload for {method}: {source}")]
pub struct PayloadError {
    pub method: RpcMethod,
    #[source]
    pub source: serde_json::Error,
}

impl CallPayload {
    pub fn from_wire(method: RpcMethod, raw: serde_json::Value) -> Result<Self, PayloadError> {
        fn decode<T: DeserializeOwned>(
            method: RpcMethod,
            raw: serde_json::Value,
        ) -> Result<T, PayloadError> {
            serde_json::from_value(raw).map_err(|source| PayloadError { method, source })
        }

        match method {
            RpcMethod::DisplayAndPromptSecret => {
                Ok(CallPayload::SecretPrompt(decode(method, raw)?))
            }
            RpcMethod::PromptNewDeviceName => {
                Ok(CallPayload::DeviceNamePrompt(decode(method, raw)?))
            }
            RpcMethod::ChooseDevice => Ok(CallPayload::ChooseDevice(decode(method, raw)?)),
            RpcMethod::ChooseGpgMethod => Ok(CallPayload::ChooseGpgMethod(decode(method, raw)?)),
            RpcMethod::GetPassphrase => Ok(CallPayload::GetPassphrase(decode(method, raw)?)),
            _ => Ok(CallPayload::Opaque(raw)),
        }
    }
}
