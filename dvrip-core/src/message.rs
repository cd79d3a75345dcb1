//! DVRIP message type registry
//!
//! The frame header carries a 16-bit message type. Requests and their
//! replies use adjacent codes; continuous stream data rides on its own
//! dedicated codes (1412 for live monitor, 1426 for downloads).

use std::fmt;

use crate::error::{Error, Result};

/// Protocol message type codes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    // Session lifecycle
    Login = 1000,
    LoginReply = 1001,
    Logout = 1002,
    LogoutReply = 1003,
    KeepAlive = 1006,
    KeepAliveReply = 1007,

    // Device information
    SystemInfo = 1020,
    SystemInfoReply = 1021,

    // Pan/tilt/zoom
    Ptz = 1400,
    PtzReply = 1401,

    // Live monitor channel
    Monitor = 1410,
    MonitorReply = 1411,
    MonitorData = 1412,
    MonitorClaim = 1413,
    MonitorClaimReply = 1414,

    // Playback / file download channel
    Playback = 1420,
    PlaybackReply = 1421,
    PlaybackClaim = 1424,
    PlaybackClaimReply = 1425,
    PlaybackData = 1426,

    // Searches
    FileSearch = 1440,
    FileSearchReply = 1441,
    LogSearch = 1442,
    LogSearchReply = 1443,

    // Operations (reboot, set time, ...)
    Operation = 1450,
    OperationReply = 1451,
    GetTime = 1452,
    GetTimeReply = 1453,

    // Connectionless discovery
    Discover = 1530,
    DiscoverReply = 1531,
}

impl MessageType {
    /// Check whether this type carries continuous binary stream data
    /// rather than a structured control body.
    pub fn is_stream_data(self) -> bool {
        matches!(self, Self::MonitorData | Self::PlaybackData)
    }

    /// Reply type paired with this request type, if any.
    pub fn reply(self) -> Option<MessageType> {
        match self {
            Self::Login => Some(Self::LoginReply),
            Self::Logout => Some(Self::LogoutReply),
            Self::KeepAlive => Some(Self::KeepAliveReply),
            Self::SystemInfo => Some(Self::SystemInfoReply),
            Self::Ptz => Some(Self::PtzReply),
            Self::Monitor => Some(Self::MonitorReply),
            Self::MonitorClaim => Some(Self::MonitorClaimReply),
            Self::Playback => Some(Self::PlaybackReply),
            Self::PlaybackClaim => Some(Self::PlaybackClaimReply),
            Self::FileSearch => Some(Self::FileSearchReply),
            Self::LogSearch => Some(Self::LogSearchReply),
            Self::Operation => Some(Self::OperationReply),
            Self::GetTime => Some(Self::GetTimeReply),
            Self::Discover => Some(Self::DiscoverReply),
            _ => None,
        }
    }
}

impl From<MessageType> for u16 {
    fn from(t: MessageType) -> u16 {
        t as u16
    }
}

impl TryFrom<u16> for MessageType {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            1000 => Ok(Self::Login),
            1001 => Ok(Self::LoginReply),
            1002 => Ok(Self::Logout),
            1003 => Ok(Self::LogoutReply),
            1006 => Ok(Self::KeepAlive),
            1007 => Ok(Self::KeepAliveReply),
            1020 => Ok(Self::SystemInfo),
            1021 => Ok(Self::SystemInfoReply),
            1400 => Ok(Self::Ptz),
            1401 => Ok(Self::PtzReply),
            1410 => Ok(Self::Monitor),
            1411 => Ok(Self::MonitorReply),
            1412 => Ok(Self::MonitorData),
            1413 => Ok(Self::MonitorClaim),
            1414 => Ok(Self::MonitorClaimReply),
            1420 => Ok(Self::Playback),
            1421 => Ok(Self::PlaybackReply),
            1424 => Ok(Self::PlaybackClaim),
            1425 => Ok(Self::PlaybackClaimReply),
            1426 => Ok(Self::PlaybackData),
            1440 => Ok(Self::FileSearch),
            1441 => Ok(Self::FileSearchReply),
            1442 => Ok(Self::LogSearch),
            1443 => Ok(Self::LogSearchReply),
            1450 => Ok(Self::Operation),
            1451 => Ok(Self::OperationReply),
            1452 => Ok(Self::GetTime),
            1453 => Ok(Self::GetTimeReply),
            1530 => Ok(Self::Discover),
            1531 => Ok(Self::DiscoverReply),
            other => Err(Error::UnknownMessageType(other)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as u16)
    }
}
