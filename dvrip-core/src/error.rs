//! Error types for dvrip-core

/// Result type alias for core protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
///
/// Every variant here describes a structural violation of a single
/// frame or message. None of them imply the connection is unusable;
/// that judgement belongs to the transport and client layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame does not start with the protocol magic byte
    #[error("invalid frame magic: 0x{0:02X}")]
    BadMagic(u8),

    /// Frame carries an unsupported protocol version
    #[error("unsupported protocol version: {0}")]
    BadVersion(u8),

    /// Declared payload length exceeds the protocol maximum
    #[error("frame payload too long: {length} bytes (max {max})")]
    PayloadTooLong { length: usize, max: usize },

    /// Message type code not known to this implementation
    #[error("unknown message type: {0}")]
    UnknownMessageType(u16),

    /// Fragmented reply advertised inconsistent fragment counts
    #[error("conflicting fragment counts: expected {expected}, got {actual}")]
    FragmentCountMismatch { expected: u8, actual: u8 },

    /// Fragment index outside the advertised count
    #[error("fragment index {index} out of range (count {count})")]
    FragmentOutOfRange { index: u8, count: u8 },

    /// Same fragment delivered twice
    #[error("overlapping fragment: index {0}")]
    OverlappingFragment(u8),

    /// Reassembled reply contained no payload at all
    #[error("empty message body")]
    EmptyBody,

    /// Session state machine refused a transition
    #[error("invalid session state: {0}")]
    InvalidSessionState(String),
}
