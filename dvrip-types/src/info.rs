//! System information bodies (types 1020/1021)

use chrono::Duration;
use dvrip_core::Status;
use serde::{Deserialize, Serialize};

use crate::{
    datetime::DvrTime,
    encoding::{hex_u32, status, SessionId},
};

/// System info request (type 1020)
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfoRequest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
}

impl SystemInfoRequest {
    pub fn new(session: SessionId) -> Self {
        Self {
            name: "SystemInfo".into(),
            session,
        }
    }
}

/// Device identity and capability block.
///
/// Field coverage varies per firmware; counts default to zero and
/// strings to empty when a device omits them.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemInfo {
    #[serde(rename = "SerialNo", default)]
    pub serial: String,
    #[serde(rename = "HardWareVersion", default)]
    pub hardware_version: String,
    #[serde(rename = "SoftWareVersion", default)]
    pub software_version: String,
    #[serde(rename = "EncryptVersion", default)]
    pub eeprom_version: String,
    #[serde(rename = "HardWare", default)]
    pub board: Option<String>,
    #[serde(rename = "BuildTime", default = "DvrTime::none")]
    pub build_time: DvrTime,
    #[serde(rename = "VideoInChannel", default)]
    pub video_in: u32,
    #[serde(rename = "VideoOutChannel", default)]
    pub video_out: u32,
    #[serde(rename = "AudioInChannel", default)]
    pub audio_in: u32,
    #[serde(rename = "TalkInChannel", default)]
    pub talk_in: u32,
    #[serde(rename = "TalkOutChannel", default)]
    pub talk_out: u32,
    #[serde(rename = "AlarmInChannel", default)]
    pub trigger_in: u32,
    #[serde(rename = "AlarmOutChannel", default)]
    pub trigger_out: u32,
    #[serde(rename = "ExtraChannel", default)]
    pub views: u32,
    /// Minutes since boot, hex-encoded on the wire
    #[serde(rename = "DeviceRunTime", with = "hex_u32", default)]
    pub run_time_minutes: u32,
}

impl SystemInfo {
    /// Time since the device booted.
    pub fn uptime(&self) -> Duration {
        Duration::minutes(self.run_time_minutes as i64)
    }
}

/// System info reply (type 1021)
#[derive(Debug, Clone, Deserialize)]
pub struct SystemInfoReply {
    #[serde(rename = "Ret", with = "status")]
    pub ret: Status,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
    #[serde(rename = "SystemInfo", default)]
    pub system: Option<SystemInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reply_parse() {
        let body = r#"{
            "Ret": 100,
            "Name": "SystemInfo",
            "SessionID": "0x00000005",
            "SystemInfo": {
                "SerialNo": "a1b2c3d4e5f60708",
                "HardWareVersion": "Unknown",
                "SoftWareVersion": "V4.02.R11.00000000.10010.1",
                "BuildTime": "2019-06-05 11:17:33",
                "VideoInChannel": 4,
                "VideoOutChannel": 1,
                "DeviceRunTime": "0x0000B0A2"
            }
        }"#;
        let reply: SystemInfoReply = serde_json::from_str(body).unwrap();
        let info = reply.system.unwrap();
        assert_eq!(info.serial, "a1b2c3d4e5f60708");
        assert_eq!(info.video_in, 4);
        assert_eq!(info.run_time_minutes, 0xB0A2);
        assert_eq!(info.uptime(), Duration::minutes(0xB0A2));
    }
}
