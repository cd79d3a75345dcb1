//! Playback and file download bodies (types 1420/1421, claim 1424/1425)

use dvrip_core::Status;
use serde::{Deserialize, Serialize};

use crate::{
    datetime::DvrTime,
    encoding::{status, SessionId},
    files::FileEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackAction {
    Claim,
    Start,
    Stop,
    DownloadStart,
    DownloadStop,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaybackParams {
    #[serde(rename = "FileName")]
    pub name: String,
    #[serde(rename = "TransMode")]
    pub transport: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Playback {
    #[serde(rename = "Action")]
    pub action: PlaybackAction,
    #[serde(rename = "Parameter")]
    pub params: PlaybackParams,
    #[serde(rename = "StartTime")]
    pub start: DvrTime,
    #[serde(rename = "EndTime")]
    pub end: DvrTime,
}

/// Playback control request (type 1420; claim rides type 1424)
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackRequest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
    #[serde(rename = "OPPlayBack")]
    pub playback: Playback,
}

impl PlaybackRequest {
    /// Build a request targeting a file found through search.
    pub fn for_file(session: SessionId, action: PlaybackAction, file: &FileEntry) -> Self {
        Self {
            name: "OPPlayBack".into(),
            session,
            playback: Playback {
                action,
                params: PlaybackParams {
                    name: file.name.clone(),
                    transport: "TCP".into(),
                },
                start: file.start,
                end: file.end,
            },
        }
    }
}

/// Playback control reply (types 1421 and 1425)
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackReply {
    #[serde(rename = "Ret", with = "status")]
    pub ret: Status,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
}
