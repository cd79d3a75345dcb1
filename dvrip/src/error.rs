//! High-level error types

use dvrip_core::{MessageType, Status};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("protocol error: {0}")]
    Core(#[from] dvrip_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] dvrip_transport::Error),

    #[error("invalid reply body: {0}")]
    Json(#[from] serde_json::Error),

    /// Login rejected by the device; fatal for this session
    #[error("login rejected: {0}")]
    Auth(Status),

    /// Device-reported failure for one command; local to that call
    #[error("device refused command: {0}")]
    Device(Status),

    /// No matching reply within the deadline. The request may still
    /// have been executed; retrying is the caller's decision.
    #[error("timed out waiting for reply")]
    Timeout,

    /// Session failed or was closed; pending and future calls on it
    /// all report this
    #[error("session closed")]
    SessionClosed,

    /// Bounded stream ended before its declared length
    #[error("stream truncated: got {received} of {expected} bytes")]
    Truncated { expected: u64, received: u64 },

    /// A stream of this data type is already open on the session
    #[error("stream channel {0} already in use")]
    StreamBusy(MessageType),

    /// Reply acknowledged success but omitted the section that
    /// carries the answer
    #[error("reply is missing its {0} section")]
    MissingSection(&'static str),

    #[error("session is not ready for commands")]
    NotReady,
}

impl Error {
    /// Whether the session this error came from is still usable.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Auth(_) | Self::SessionClosed
        )
    }
}
