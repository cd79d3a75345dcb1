//! Typed request and reply bodies for the DVRIP command catalog.
//!
//! Each message body is a closed serde struct mirroring the JSON the
//! device actually speaks, including its quirks: hex-string integers,
//! `"0x%08X"` session ids, little-endian hex IP addresses and the
//! `"0000-00-00 00:00:00"` / `"2000-00-00 00:00:00"` datetime
//! sentinels.

pub mod datetime;
pub mod discovery;
pub mod encoding;
pub mod error;
pub mod files;
pub mod info;
pub mod login;
pub mod monitor;
pub mod operation;
pub mod playback;

pub use datetime::DvrTime;
pub use discovery::{DiscoverReply, DiscoveredDevice, HostConfig};
pub use encoding::SessionId;
pub use error::{Error, Result};
pub use files::{FileEntry, FileKind, FileQuery, FileSearchReply, FileSearchRequest};
pub use info::{SystemInfo, SystemInfoReply, SystemInfoRequest};
pub use login::{
    KeepAliveReply, KeepAliveRequest, LoginReply, LoginRequest, LogoutReply,
    LogoutRequest,
};
pub use monitor::{MonitorAction, MonitorReply, MonitorRequest, Quality};
pub use operation::{
    GetTimeReply, GetTimeRequest, OperationReply, OperationRequest,
};
pub use playback::{PlaybackAction, PlaybackReply, PlaybackRequest};
