//! Consuming media data from a claimed stream
//!
//! [`DvrStream`] is the receiving half handed out by
//! [`Client::open_download`](crate::Client::open_download) and
//! [`Client::open_monitor`](crate::Client::open_monitor). Downloads
//! are bounded by the recording's advertised size; live monitors run
//! until cancelled.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dvrip_core::MessageType;
use dvrip_types::{
    FileEntry, MonitorAction, MonitorRequest, PlaybackAction, PlaybackRequest,
    Quality, SessionId,
};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};

/// The command that tells the device to stop producing a stream.
pub(crate) enum StopCommand {
    Monitor {
        session: SessionId,
        channel: u32,
        quality: Quality,
    },
    Download {
        session: SessionId,
        file: FileEntry,
    },
}

impl StopCommand {
    async fn send(&self, dispatcher: &Dispatcher, timeout: Duration) -> Result<()> {
        match self {
            StopCommand::Monitor {
                session,
                channel,
                quality,
            } => {
                let req = MonitorRequest::new(
                    *session,
                    MonitorAction::Stop,
                    *channel,
                    *quality,
                );
                dispatcher
                    .call(MessageType::Monitor, &req, timeout)
                    .await?;
            }
            StopCommand::Download { session, file } => {
                let req = PlaybackRequest::for_file(
                    *session,
                    PlaybackAction::DownloadStop,
                    file,
                );
                dispatcher
                    .call(MessageType::Playback, &req, timeout)
                    .await?;
            }
        }
        Ok(())
    }
}

/// Cancellation handle for a [`DvrStream`], usable from another task.
///
/// The first cancellation wakes the stream's reader and sends the stop
/// command to the device; repeat cancellations are no-ops.
#[derive(Clone)]
pub struct StreamCancel {
    flag: Arc<watch::Sender<bool>>,
    dispatcher: Dispatcher,
    data_type: MessageType,
    stop: Arc<StopCommand>,
    call_timeout: Duration,
}

impl StreamCancel {
    pub async fn cancel(&self) {
        if self.flag.send_replace(true) {
            return;
        }
        self.dispatcher.close_stream(self.data_type);
        if let Err(e) = self.stop.send(&self.dispatcher, self.call_timeout).await {
            debug!("stop command not delivered: {e}");
        }
    }

    fn silence(&self) {
        self.flag.send_replace(true);
        self.dispatcher.close_stream(self.data_type);
    }
}

/// A sequence of data chunks produced by the device.
pub struct DvrStream {
    rx: mpsc::Receiver<Bytes>,
    cancel_rx: watch::Receiver<bool>,
    cancel: StreamCancel,
    total: Option<u64>,
    received: u64,
    done: bool,
}

impl DvrStream {
    pub(crate) fn bounded(
        rx: mpsc::Receiver<Bytes>,
        total: u64,
        dispatcher: Dispatcher,
        data_type: MessageType,
        stop: StopCommand,
        call_timeout: Duration,
    ) -> Self {
        Self::build(rx, Some(total), dispatcher, data_type, stop, call_timeout)
    }

    pub(crate) fn unbounded(
        rx: mpsc::Receiver<Bytes>,
        dispatcher: Dispatcher,
        data_type: MessageType,
        stop: StopCommand,
        call_timeout: Duration,
    ) -> Self {
        Self::build(rx, None, dispatcher, data_type, stop, call_timeout)
    }

    fn build(
        rx: mpsc::Receiver<Bytes>,
        total: Option<u64>,
        dispatcher: Dispatcher,
        data_type: MessageType,
        stop: StopCommand,
        call_timeout: Duration,
    ) -> Self {
        let (flag, cancel_rx) = watch::channel(false);
        Self {
            rx,
            cancel_rx,
            cancel: StreamCancel {
                flag: Arc::new(flag),
                dispatcher,
                data_type,
                stop: Arc::new(stop),
                call_timeout,
            },
            total,
            received: 0,
            done: false,
        }
    }

    /// Total stream length in bytes, if known up front.
    pub fn total_len(&self) -> Option<u64> {
        self.total
    }

    /// Bytes delivered so far.
    pub fn bytes_read(&self) -> u64 {
        self.received
    }

    /// A handle that cancels this stream from anywhere.
    pub fn cancel_handle(&self) -> StreamCancel {
        self.cancel.clone()
    }

    /// Stop this stream and tell the device to stop producing.
    pub async fn cancel(&self) {
        self.cancel.cancel().await;
    }

    /// Next chunk of data.
    ///
    /// `Ok(None)` means the stream ended cleanly: a bounded stream
    /// delivered exactly its advertised length, an unbounded one was
    /// cancelled or the device stopped sending. A bounded stream whose
    /// session drops before the advertised length arrives yields
    /// [`Error::Truncated`].
    pub async fn next(&mut self) -> Result<Option<Bytes>> {
        if self.done || *self.cancel_rx.borrow() {
            self.done = true;
            return Ok(None);
        }
        if let Some(total) = self.total {
            if self.received >= total {
                self.done = true;
                return Ok(None);
            }
        }

        tokio::select! {
            biased;
            _ = self.cancel_rx.changed() => {
                self.done = true;
                Ok(None)
            }
            chunk = self.rx.recv() => match chunk {
                Some(mut bytes) => {
                    // Devices may pad the final chunk past the
                    // advertised recording size.
                    if let Some(total) = self.total {
                        let remaining = total - self.received;
                        if bytes.len() as u64 > remaining {
                            bytes.truncate(remaining as usize);
                        }
                    }
                    self.received += bytes.len() as u64;
                    Ok(Some(bytes))
                }
                None => {
                    self.done = true;
                    match self.total {
                        Some(total) if self.received < total => {
                            Err(Error::Truncated {
                                expected: total,
                                received: self.received,
                            })
                        }
                        _ => Ok(None),
                    }
                }
            }
        }
    }
}

impl Drop for DvrStream {
    fn drop(&mut self) {
        // No async context here, so only release local routing; the
        // device-side stop command needs an explicit cancel().
        self.cancel.silence();
    }
}
