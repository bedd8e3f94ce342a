//! Reply types carried back to the peer.

use serde::Serialize;

use crate::rpc::payload::GpgMethod;

/// Wire status attached to refused calls and terminal failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcStatus {
    pub code: i32,
    pub desc: String,
}

impl RpcStatus {
    /// The protocol's catch-all status code.
    pub const GENERIC: i32 = 218;

    pub fn generic(desc: impl Into<String>) -> Self {
        Self {
            code: Self::GENERIC,
            desc: desc.into(),
        }
    }
}

/// Result value for a resolved prompt, in the exact shape its method expects.
///
/// Serialization is the wire contract: a secret answer is
/// `{"code": null, "phrase": …}` (`code` carries raw scanned bytes, absent when
/// the user typed the phrase), a device name is the bare string, a device
/// choice is the bare id string (empty for "no device"), a GPG method is its
/// ordinal, and a passphrase is `{"passphrase": …, "storeSecret": false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Secret {
        code: Option<Vec<u8>>,
        phrase: String,
    },
    DeviceName(String),
    ChosenDevice(String),
    GpgMethod(GpgMethod),
    Passphrase {
        passphrase: String,
        #[serde(rename = "storeSecret")]
        store_secret: bool,
    },
}

/// What the transport sends back for one inbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcReply {
    Result(ResponsePayload),
    Error(RpcStatus),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn secret_reply_encodes_null_code() {
        let payload = ResponsePayload::Secret {
            code: None,
            phrase: "mocktest".to_string(),
        };
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({"code": null, "phrase": "mocktest"})
        );
    }

    #[test]
    fn device_name_reply_is_bare_string() {
        let payload = ResponsePayload::DeviceName("new name".to_string());
        assert_eq!(serde_json::to_value(payload).unwrap(), json!("new name"));
    }

    #[test]
    fn chosen_device_reply_is_bare_id() {
        let payload = ResponsePayload::ChosenDevice(String::new());
        assert_eq!(serde_json::to_value(payload).unwrap(), json!(""));
    }

    #[test]
    fn passphrase_reply_never_asks_for_storage() {
        let payload = ResponsePayload::Passphrase {
            passphrase: "correct horse".to_string(),
            store_secret: false,
        };
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({"passphrase": "correct horse", "storeSecret": false})
        );
    }

    #[test]
    fn generic_status_shape() {
        let status = RpcStatus::generic("Canceling RPC");
        assert_eq!(
            serde_json::to_value(status).unwrap(),
            json!({"code": 218, "desc": "Canceling RPC"})
        );
    }
}
