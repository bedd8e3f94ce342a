//! Inbound RPC method identifiers and their handling classes.

use std::fmt;
use std::str::FromStr;

/// How an inbound method must be treated by the coordinator.
///
/// - `Cancel`: actively refused with a generic error, never shown to the user.
/// - `Ignore`: informational, no reply at all.
/// - `Stash`: a user-facing prompt whose reply is produced later by a submit
///   function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallClass {
    Cancel,
    Ignore,
    Stash,
}

/// Every inbound method this coordinator serves. Wire names are the contract
/// and must match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    SelectKey,
    GetEmailOrUsername,
    DisplayPrimaryPaperKey,
    ProvisioneeSuccess,
    ProvisionerSuccess,
    DisplaySecretExchanged,
    DisplayAndPromptSecret,
    PromptNewDeviceName,
    ChooseDevice,
    ChooseGpgMethod,
    GetPassphrase,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 11] = [
        RpcMethod::SelectKey,
        RpcMethod::GetEmailOrUsername,
        RpcMethod::DisplayPrimaryPaperKey,
        RpcMethod::ProvisioneeSuccess,
        RpcMethod::ProvisionerSuccess,
        RpcMethod::DisplaySecretExchanged,
        RpcMethod::DisplayAndPromptSecret,
        RpcMethod::PromptNewDeviceName,
        RpcMethod::ChooseDevice,
        RpcMethod::ChooseGpgMethod,
        RpcMethod::GetPassphrase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::SelectKey => "gpgUi.selectKey",
            RpcMethod::GetEmailOrUsername => "loginUi.getEmailOrUsername",
            RpcMethod::DisplayPrimaryPaperKey => "loginUi.displayPrimaryPaperKey",
            RpcMethod::ProvisioneeSuccess => "provisionUi.ProvisioneeSuccess",
            RpcMethod::ProvisionerSuccess => "provisionUi.ProvisionerSuccess",
            RpcMethod::DisplaySecretExchanged => "provisionUi.DisplaySecretExchanged",
            RpcMethod::DisplayAndPromptSecret => "provisionUi.DisplayAndPromptSecret",
            RpcMethod::PromptNewDeviceName => "provisionUi.PromptNewDeviceName",
            RpcMethod::ChooseDevice => "provisionUi.chooseDevice",
            RpcMethod::ChooseGpgMethod => "provisionUi.chooseGPGMethod",
            RpcMethod::GetPassphrase => "secretUi.getPassphrase",
        }
    }

    pub fn call_class(&self) -> CallClass {
        match self {
            RpcMethod::SelectKey | RpcMethod::GetEmailOrUsername => CallClass::Cancel,
            RpcMethod::DisplayPrimaryPaperKey
            | RpcMethod::ProvisioneeSuccess
            | RpcMethod::ProvisionerSuccess
            | RpcMethod::DisplaySecretExchanged => CallClass::Ignore,
            RpcMethod::DisplayAndPromptSecret
            | RpcMethod::PromptNewDeviceName
            | RpcMethod::ChooseDevice
            | RpcMethod::ChooseGpgMethod
            | RpcMethod::GetPassphrase => CallClass::Stash,
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The transport routed a method name this coordinator does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rpc method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for RpcMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RpcMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}
