//! Paginated recording search
//!
//! Devices cap each search reply at 64 entries and have no page
//! cursor. [`FileSearch`] walks the full window by re-querying with
//! the last entry's start time and skipping entries already seen, so
//! callers get each recording exactly once.

use std::collections::VecDeque;
use std::time::Duration;

use dvrip_core::{MessageType, Status};
use dvrip_types::{FileEntry, FileQuery, FileSearchReply, FileSearchRequest, SessionId};
use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};

/// Lazy iterator over the recordings in a search window.
pub struct FileSearch {
    dispatcher: Dispatcher,
    session: SessionId,
    query: FileQuery,
    call_timeout: Duration,
    buffer: VecDeque<FileEntry>,
    last: Option<FileEntry>,
    exhausted: bool,
}

impl FileSearch {
    pub(crate) fn new(
        dispatcher: Dispatcher,
        session: SessionId,
        query: FileQuery,
        call_timeout: Duration,
    ) -> Self {
        Self {
            dispatcher,
            session,
            query,
            call_timeout,
            buffer: VecDeque::new(),
            last: None,
            exhausted: false,
        }
    }

    /// Next recording in the window, fetching another page on demand.
    pub async fn next(&mut self) -> Result<Option<FileEntry>> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return Ok(Some(entry));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Drain the whole window into a vector.
    pub async fn collect(mut self) -> Result<Vec<FileEntry>> {
        let mut out = Vec::new();
        while let Some(entry) = self.next().await? {
            out.push(entry);
        }
        Ok(out)
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let request = FileSearchRequest::new(self.session, self.query.clone());
        let body = self
            .dispatcher
            .call(MessageType::FileSearch, &request, self.call_timeout)
            .await?;
        let reply: FileSearchReply = serde_json::from_slice(&body)?;

        if !reply.ret.is_success() {
            self.exhausted = true;
            return Err(Error::Device(reply.ret));
        }

        let files = reply.files.unwrap_or_default();
        if files.is_empty() {
            self.exhausted = true;
            return Ok(());
        }
        debug!(
            "search page: {} entries (ret={})",
            files.len(),
            reply.ret.code()
        );

        // Overlap pages share the previous page's tail: drop entries
        // up to and including the last one already delivered.
        let mut dropping = self.last.is_some();
        for entry in &files {
            if Some(entry) == self.last.as_ref() {
                dropping = false;
                continue;
            }
            if !dropping {
                self.buffer.push_back(entry.clone());
            }
        }
        if dropping {
            // The anchor vanished between queries; deliver the page
            // as-is rather than silently skipping everything.
            self.buffer.extend(files.iter().cloned());
        }

        let page_last = files.last().cloned();
        if reply.ret == Status::SEARCH_COMPLETE || page_last == self.last {
            self.exhausted = true;
        } else if let Some(last) = page_last {
            self.query.start = last.start;
            self.last = Some(last);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dispatcher_pair, entry_json, json_body};
    use dvrip_types::{DvrTime, FileKind};
    use serde_json::json;

    fn search(dispatcher: Dispatcher) -> FileSearch {
        let query = FileQuery::new(
            DvrTime::some(dvrip_types::datetime::epoch()),
            DvrTime::none(),
            0,
            FileKind::Video,
        );
        FileSearch::new(dispatcher, SessionId(0x4F), query, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_two_pages_with_overlap() {
        let (dispatcher, _reader, mut device) = dispatcher_pair();

        let device_task = tokio::spawn(async move {
            // First page ends at entry "c"; second page repeats "c".
            let req = device.recv().await;
            let body = json_body(&req);
            assert_eq!(body["Name"], "OPFileQuery");
            device
                .send_json(
                    MessageType::FileSearchReply,
                    req.sequence,
                    &json!({
                        "Ret": 111,
                        "SessionID": "0x0000004F",
                        "OPFileQuery": [
                            entry_json("a", "2024-03-07 00:00:00"),
                            entry_json("b", "2024-03-07 01:00:00"),
                            entry_json("c", "2024-03-07 02:00:00"),
                        ],
                    }),
                )
                .await;

            let req = device.recv().await;
            let body = json_body(&req);
            assert_eq!(body["OPFileQuery"]["BeginTime"], "2024-03-07 02:00:00");
            device
                .send_json(
                    MessageType::FileSearchReply,
                    req.sequence,
                    &json!({
                        "Ret": 110,
                        "SessionID": "0x0000004F",
                        "OPFileQuery": [
                            entry_json("c", "2024-03-07 02:00:00"),
                            entry_json("d", "2024-03-07 03:00:00"),
                            entry_json("e", "2024-03-07 04:00:00"),
                        ],
                    }),
                )
                .await;
        });

        let files = search(dispatcher).collect().await.unwrap();
        device_task.await.unwrap();

        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_empty_window() {
        let (dispatcher, _reader, mut device) = dispatcher_pair();

        let device_task = tokio::spawn(async move {
            let req = device.recv().await;
            device
                .send_json(
                    MessageType::FileSearchReply,
                    req.sequence,
                    &json!({ "Ret": 119, "SessionID": "0x0000004F" }),
                )
                .await;
        });

        let files = search(dispatcher).collect().await.unwrap();
        device_task.await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_tail_terminates() {
        let (dispatcher, _reader, mut device) = dispatcher_pair();

        // A device that keeps answering 111 with the same single
        // entry must not loop forever.
        let device_task = tokio::spawn(async move {
            for _ in 0..2 {
                let req = device.recv().await;
                device
                    .send_json(
                        MessageType::FileSearchReply,
                        req.sequence,
                        &json!({
                            "Ret": 111,
                            "SessionID": "0x0000004F",
                            "OPFileQuery": [entry_json("a", "2024-03-07 00:00:00")],
                        }),
                    )
                    .await;
            }
        });

        let files = search(dispatcher).collect().await.unwrap();
        device_task.await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a");
    }

    #[tokio::test]
    async fn test_device_error_surfaces() {
        let (dispatcher, _reader, mut device) = dispatcher_pair();

        let device_task = tokio::spawn(async move {
            let req = device.recv().await;
            device
                .send_json(
                    MessageType::FileSearchReply,
                    req.sequence,
                    &json!({ "Ret": 203, "SessionID": "0x0000004F" }),
                )
                .await;
        });

        let mut search = search(dispatcher);
        let err = search.next().await.unwrap_err();
        device_task.await.unwrap();
        assert!(matches!(err, Error::Device(_)));
    }
}
