//! # dvrip
//!
//! Async client for the DVRIP control protocol spoken by network
//! video recorders and IP cameras.
//!
//! ## Features
//!
//! - Authenticated sessions with automatic keepalive
//! - Concurrent commands multiplexed over one TCP connection
//! - Lazy, transparently paginated file search
//! - File download and live monitor streams with cancellation
//! - Broadcast device discovery
//!
//! ## Quick Start
//!
//! ```no_run
//! use dvrip::Client;
//!
//! #[tokio::main]
//! async fn main() -> dvrip::Result<()> {
//!     let mut client = Client::connect("192.168.1.10:34567").await?;
//!     client.login("admin", "").await?;
//!
//!     if let Some(time) = client.get_time().await?.0 {
//!         println!("device clock: {time}");
//!     }
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod discovery;
mod dispatcher;
pub mod error;
pub mod search;
pub mod stream;

pub use client::{Client, ClientBuilder};
pub use discovery::discover;
pub use error::{Error, Result};
pub use search::FileSearch;
pub use stream::{DvrStream, StreamCancel};

// Re-export types
pub use dvrip_core::{MessageType, Session, SessionState, Status};
pub use dvrip_types::{
    DiscoveredDevice, DvrTime, FileEntry, FileKind, Quality, SystemInfo,
};

#[cfg(test)]
pub(crate) mod testing;
