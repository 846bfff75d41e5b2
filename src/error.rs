use crate::RouterId;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("all ports are full")]
    PortsExhausted,
    #[error("invalid port {0} (expected 0-{max})", max = crate::PORT_COUNT - 1)]
    InvalidPort(usize),
    #[error("no link attached on port {0}")]
    PortEmpty(usize),
    #[error("already attached to {0}")]
    AlreadyAttached(RouterId),
    #[error("cannot attach a router to itself")]
    SelfAttach,
    #[error("connection rejected by {0}")]
    Rejected(RouterId),
    #[error("expected a reply from {expected}, got one from {got}")]
    IdentityMismatch { expected: RouterId, got: RouterId },
    #[error("unexpected {got} message (expected {expected})")]
    UnexpectedMessage { expected: &'static str, got: &'static str },
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("router is not listening")]
    NotListening,
    #[error("io error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Outcome of a path lookup that found nothing. Not a failure: callers
/// surface it to the operator as "No path found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NoPath {
    #[error("destination is not in the link state database")]
    UnknownDestination,
    #[error("destination is unreachable")]
    Unreachable,
}

pub type Result<T> = std::result::Result<T, RouterError>;
