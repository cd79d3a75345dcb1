//! # dvrip-core
//!
//! Core protocol implementation for DVRIP video recorders and cameras.
//!
//! This crate provides the low-level protocol primitives and performs
//! no I/O of its own:
//! - Frame structure and encoding/decoding
//! - Message type registry
//! - Device status codes
//! - Fragment reassembly for multi-frame replies
//! - Credential hashing
//! - Session state tracking

pub mod auth;
pub mod error;
pub mod fragment;
pub mod message;
pub mod packet;
pub mod session;
pub mod status;

pub use error::{Error, Result};
pub use fragment::FragmentAssembler;
pub use message::MessageType;
pub use packet::Packet;
pub use session::{Session, SessionState};
pub use status::Status;

/// Default control channel port
pub const DEFAULT_PORT: u16 = 34567;

/// Default discovery (broadcast) port
pub const DISCOVERY_PORT: u16 = 34568;

/// Frame header size in bytes
pub const HEADER_SIZE: usize = 20;

/// Maximum payload carried by a single frame
pub const MAX_PAYLOAD: usize = 32768;
