//! Live monitor bodies (types 1410/1411, claim 1413/1414)

use dvrip_core::Status;
use serde::{Deserialize, Serialize};

use crate::encoding::{status, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorAction {
    Claim,
    Start,
    Stop,
}

/// Live stream quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "Main")]
    Hd,
    #[serde(rename = "Extra")]
    Sd,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorParams {
    #[serde(rename = "Channel")]
    pub channel: u32,
    #[serde(rename = "StreamType")]
    pub quality: Quality,
    #[serde(rename = "TransMode")]
    pub transport: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Monitor {
    #[serde(rename = "Action")]
    pub action: MonitorAction,
    #[serde(rename = "Parameter")]
    pub params: MonitorParams,
}

/// Monitor control request (type 1410; claim rides type 1413)
#[derive(Debug, Clone, Serialize)]
pub struct MonitorRequest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
    #[serde(rename = "OPMonitor")]
    pub monitor: Monitor,
}

impl MonitorRequest {
    pub fn new(
        session: SessionId,
        action: MonitorAction,
        channel: u32,
        quality: Quality,
    ) -> Self {
        Self {
            name: "OPMonitor".into(),
            session,
            monitor: Monitor {
                action,
                params: MonitorParams {
                    channel,
                    quality,
                    transport: "TCP".into(),
                },
            },
        }
    }
}

/// Monitor control reply (types 1411 and 1414)
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorReply {
    #[serde(rename = "Ret", with = "status")]
    pub ret: Status,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_shape() {
        let req =
            MonitorRequest::new(SessionId(2), MonitorAction::Start, 0, Quality::Hd);
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();

        assert_eq!(json["Name"], "OPMonitor");
        assert_eq!(json["OPMonitor"]["Action"], "Start");
        assert_eq!(json["OPMonitor"]["Parameter"]["StreamType"], "Main");
        assert_eq!(json["OPMonitor"]["Parameter"]["TransMode"], "TCP");
    }

    #[test]
    fn test_quality_names() {
        assert_eq!(serde_json::to_string(&Quality::Hd).unwrap(), "\"Main\"");
        assert_eq!(serde_json::to_string(&Quality::Sd).unwrap(), "\"Extra\"");
    }
}
