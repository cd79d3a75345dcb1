//! Machine operations (types 1450/1451) and the device clock
//! (types 1452/1453)

use dvrip_core::Status;
use serde::{Deserialize, Serialize};

use crate::{
    datetime::DvrTime,
    encoding::{status, SessionId},
};

#[derive(Debug, Clone, Serialize)]
pub struct MachineOperation {
    #[serde(rename = "Action")]
    pub action: String,
}

/// Operation request (type 1450).
///
/// The `Name` field selects which of the optional sections is present.
#[derive(Debug, Clone, Serialize)]
pub struct OperationRequest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
    #[serde(rename = "OPMachine", skip_serializing_if = "Option::is_none")]
    pub machine: Option<MachineOperation>,
    #[serde(rename = "OPTimeSetting", skip_serializing_if = "Option::is_none")]
    pub set_time: Option<DvrTime>,
}

impl OperationRequest {
    pub fn reboot(session: SessionId) -> Self {
        Self {
            name: "OPMachine".into(),
            session,
            machine: Some(MachineOperation {
                action: "Reboot".into(),
            }),
            set_time: None,
        }
    }

    pub fn set_time(session: SessionId, time: chrono::NaiveDateTime) -> Self {
        Self {
            name: "OPTimeSetting".into(),
            session,
            machine: None,
            set_time: Some(DvrTime::some(time)),
        }
    }
}

/// Operation reply (type 1451)
#[derive(Debug, Clone, Deserialize)]
pub struct OperationReply {
    #[serde(rename = "Ret", with = "status")]
    pub ret: Status,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
}

/// Clock query (type 1452)
#[derive(Debug, Clone, Serialize)]
pub struct GetTimeRequest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
}

impl GetTimeRequest {
    pub fn new(session: SessionId) -> Self {
        Self {
            name: "OPTimeQuery".into(),
            session,
        }
    }
}

/// Clock reply (type 1453)
#[derive(Debug, Clone, Deserialize)]
pub struct GetTimeReply {
    #[serde(rename = "Ret", with = "status")]
    pub ret: Status,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
    #[serde(rename = "OPTimeQuery")]
    pub time: DvrTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reboot_shape() {
        let req = OperationRequest::reboot(SessionId(9));
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();

        assert_eq!(json["Name"], "OPMachine");
        assert_eq!(json["OPMachine"]["Action"], "Reboot");
        assert!(json.get("OPTimeSetting").is_none());
    }

    #[test]
    fn test_set_time_shape() {
        let t = chrono::NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let req = OperationRequest::set_time(SessionId(9), t);
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();

        assert_eq!(json["Name"], "OPTimeSetting");
        assert_eq!(json["OPTimeSetting"], "2024-03-07 12:00:00");
        assert!(json.get("OPMachine").is_none());
    }

    #[test]
    fn test_get_time_reply_parse() {
        let body = r#"{
            "Ret": 100,
            "Name": "OPTimeQuery",
            "SessionID": "0x00000009",
            "OPTimeQuery": "2024-03-07 12:00:01"
        }"#;
        let reply: GetTimeReply = serde_json::from_str(body).unwrap();
        assert!(reply.ret.is_success());
        assert!(reply.time.0.is_some());
    }
}
