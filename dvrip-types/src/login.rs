//! Session lifecycle bodies: login, logout, keepalive

use dvrip_core::Status;
use serde::{Deserialize, Serialize};

use crate::encoding::{status, SessionId};

/// Login request (type 1000).
///
/// `password_hash` is the XM-MD5 digest produced by
/// [`dvrip_core::auth::xm_md5`], never the clear-text password.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "UserName")]
    pub username: String,
    #[serde(rename = "PassWord")]
    pub password_hash: String,
    #[serde(rename = "EncryptType")]
    pub encrypt_type: String,
    #[serde(rename = "LoginType")]
    pub login_type: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            encrypt_type: "MD5".into(),
            login_type: "DVRIP-Web".into(),
        }
    }
}

/// Login reply (type 1001)
#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    #[serde(rename = "Ret", with = "status")]
    pub ret: Status,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
    /// Keepalive period in seconds
    #[serde(rename = "AliveInterval")]
    pub alive_interval: u32,
    #[serde(rename = "ChannelNum", default)]
    pub channels: u32,
    #[serde(rename = "ExtraChannel", default)]
    pub extra_channels: u32,
    // The trailing space is real; it is what devices send.
    #[serde(rename = "DeviceType ", default)]
    pub chassis: Option<String>,
    #[serde(rename = "DataUseAES", default)]
    pub encrypt: Option<bool>,
}

/// Logout request (type 1002)
#[derive(Debug, Clone, Serialize)]
pub struct LogoutRequest {
    #[serde(rename = "Name")]
    pub username: String,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
}

/// Logout reply (type 1003)
#[derive(Debug, Clone, Deserialize)]
pub struct LogoutReply {
    #[serde(rename = "Ret", with = "status")]
    pub ret: Status,
    #[serde(rename = "Name", default)]
    pub username: Option<String>,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
}

/// Keepalive request (type 1006)
#[derive(Debug, Clone, Serialize)]
pub struct KeepAliveRequest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
}

impl KeepAliveRequest {
    pub fn new(session: SessionId) -> Self {
        Self {
            name: "KeepAlive".into(),
            session,
        }
    }
}

/// Keepalive reply (type 1007)
#[derive(Debug, Clone, Deserialize)]
pub struct KeepAliveReply {
    #[serde(rename = "Ret", with = "status")]
    pub ret: Status,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
}
