//! One inbound call as admitted from the transport.

use crate::rpc::method::{RpcMethod, UnknownMethod};
use crate::rpc::payload::{CallPayload, PayloadError};
use crate::rpc::responder::Responder;

#[derive(Debug)]
pub struct IncomingCall {
    pub method: RpcMethod,
    pub payload: CallPayload,
    pub responder: Responder,
}

/// The transport handed over a call this coordinator cannot admit.
#[derive(Debug, thiserror::Error)]
pub enum CallDecodeError {
    #[error(transparent)]
    UnknownMethod(#[from] UnknownMethod),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

impl IncomingCall {
    /// Decode a raw transport frame: method name plus JSON argument.
    pub fn from_wire(
        method: &str,
        raw: serde_json::Value,
        responder: Responder,
    ) -> Result<Self, CallDecodeError> {
        let method: RpcMethod = method.parse()?;
        let payload = CallPayload::from_wire(method, raw)?;
        Ok(Self {
            method,
            payload,
            responder,
        })
    }
}
