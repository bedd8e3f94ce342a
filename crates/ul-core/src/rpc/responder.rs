//! Completion handle for one inbound call.

use std::fmt;
use tokio::sync::oneshot;

use crate::rpc::reply::{ResponsePayload, RpcReply, RpcStatus};

/// Receiving half handed to the transport when a call is admitted.
pub type ReplyReceiver = oneshot::Receiver<RpcReply>;

/// Caller-supplied completion handle. Resolving or rejecting consumes it, so a
/// call can be answered at most once; dropping it unanswered closes the reply
/// channel, which is how ignored calls look to the transport.
pub struct Responder {
    tx: oneshot::Sender<RpcReply>,
}

impl Responder {
    pub fn channel() -> (Self, ReplyReceiver) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Answer the call. Errs with the undelivered reply if the transport
    /// already dropped the receiving half.
    pub fn resolve(self, payload: ResponsePayload) -> Result<(), RpcReply> {
        self.tx.send(RpcReply::Result(payload))
    }

    /// Refuse the call. Same delivery semantics as [`Responder::resolve`].
    pub fn reject(self, status: RpcStatus) -> Result<(), RpcReply> {
        self.tx.send(RpcReply::Error(status))
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Responder")
    }
}
