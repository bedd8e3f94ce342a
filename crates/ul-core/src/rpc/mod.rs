//! RPC vocabulary for the provisioning flow: method identifiers, typed
//! payloads, reply shapes, and the per-call completion handle.

mod call;
mod method;
mod payload;
mod reply;
mod responder;

pub use call::{CallDecodeError, IncomingCall};
pub use method::{CallClass, RpcMethod, UnknownMethod};
pub use payload::{
    CallPayload, ChooseDeviceArg, ChooseGpgMethodArg, DeviceNamePromptArg, GetPassphraseArg,
    GpgKey, GpgMethod, PassphraseKind, PayloadError, PinentryArg, SecretPromptArg,
};
pub use reply::{ResponsePayload, RpcReply, RpcStatus};
pub use responder::{ReplyReceiver, Responder};
