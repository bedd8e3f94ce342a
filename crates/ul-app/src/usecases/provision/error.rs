use ul_core::RpcMethod;

/// Protocol-sequencing and contract violations.
///
/// These are programmer or peer-protocol bugs, not user mistakes: the current
/// attempt must abort rather than mask them. User-recoverable problems never
/// appear here; they live in the state's `error` field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinatorError {
    #[error("a response is already stashed for {pending}, refusing to stash {incoming}")]
    StashOccupied {
        pending: RpcMethod,
        incoming: RpcMethod,
    },
    #[error("no response stashed, wanted {wanted}")]
    NoStashedResponse { wanted: RpcMethod },
    #[error("stashed response is for {have}, wanted {wanted}")]
    ResponseKeyMismatch { wanted: RpcMethod, have: RpcMethod },
    #[error("payload does not match method {method}")]
    PayloadMismatch { method: RpcMethod },
    #[error("no handler registered for {method}")]
    UnhandledMethod { method: RpcMethod },
}

/// Anything that can abort an orchestrator entry point.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    #[error("navigation failed: {0}")]
    Navigation(anyhow::Error),
}
