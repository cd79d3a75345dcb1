//! Transport layer for the DVRIP protocol
//!
//! Provides the framed TCP control channel and the broadcast UDP
//! socket used by discovery.

pub mod error;
pub mod tcp;
pub mod udp;

pub use error::{Error, Result};
pub use tcp::{FrameReader, FrameWriter, TcpTransport};
pub use udp::DiscoverySocket;
