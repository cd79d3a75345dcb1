//! File search bodies (types 1440/1441)

use dvrip_core::Status;
use serde::{Deserialize, Serialize};

use crate::{
    datetime::DvrTime,
    encoding::{hex_u32, status, SessionId},
};

/// Kind of recording to search for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    #[serde(rename = "h264")]
    Video,
    #[serde(rename = "jpg")]
    Image,
}

/// Search window handed to the device
#[derive(Debug, Clone, Serialize)]
pub struct FileQuery {
    #[serde(rename = "BeginTime")]
    pub start: DvrTime,
    #[serde(rename = "EndTime")]
    pub end: DvrTime,
    #[serde(rename = "Channel")]
    pub channel: u32,
    #[serde(rename = "Event")]
    pub event: String,
    #[serde(rename = "Type")]
    pub kind: FileKind,
}

impl FileQuery {
    pub fn new(start: DvrTime, end: DvrTime, channel: u32, kind: FileKind) -> Self {
        Self {
            start,
            end,
            channel,
            event: "*".into(),
            kind,
        }
    }
}

/// One recording known to the device.
///
/// Replies do not repeat the channel; it is implied by the query. The
/// length field is in KiB units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(rename = "FileName")]
    pub name: String,
    #[serde(rename = "DiskNo")]
    pub disk: u32,
    #[serde(rename = "SerialNo")]
    pub part: u32,
    #[serde(rename = "FileLength", with = "hex_u32")]
    pub length_kib: u32,
    #[serde(rename = "BeginTime")]
    pub start: DvrTime,
    #[serde(rename = "EndTime")]
    pub end: DvrTime,
}

impl FileEntry {
    /// Size in bytes, the unit a download stream counts in.
    pub fn size_bytes(&self) -> u64 {
        self.length_kib as u64 * 1024
    }
}

/// File search request (type 1440)
#[derive(Debug, Clone, Serialize)]
pub struct FileSearchRequest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
    #[serde(rename = "OPFileQuery")]
    pub query: FileQuery,
}

impl FileSearchRequest {
    pub fn new(session: SessionId, query: FileQuery) -> Self {
        Self {
            name: "OPFileQuery".into(),
            session,
            query,
        }
    }
}

/// File search reply (type 1441); one page of results
#[derive(Debug, Clone, Deserialize)]
pub struct FileSearchReply {
    #[serde(rename = "Ret", with = "status")]
    pub ret: Status,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "SessionID")]
    pub session: SessionId,
    #[serde(rename = "OPFileQuery", default)]
    pub files: Option<Vec<FileEntry>>,
}
