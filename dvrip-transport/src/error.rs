//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection timeout")]
    ConnectionTimeout,

    #[error("connection closed by remote")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("truncated datagram")]
    TruncatedDatagram,

    #[error(transparent)]
    Protocol(#[from] dvrip_core::Error),
}
