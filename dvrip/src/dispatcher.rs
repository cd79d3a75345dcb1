//! Request multiplexing over one control connection
//!
//! A single reader task owns all inbound parsing. Callers register a
//! pending slot keyed by sequence number, write their frame, and
//! suspend until the reader delivers the correlated reply. Stream data
//! frames bypass the pending table and are routed to the channel
//! registered for their data type.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dvrip_core::{FragmentAssembler, MessageType, Packet, Session, MAX_PAYLOAD};
use dvrip_transport::{FrameReader, FrameWriter};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Chunks buffered per stream before the reader loop backpressures
const STREAM_CHANNEL_CAPACITY: usize = 64;

type ReplySlot = oneshot::Sender<Result<Vec<u8>>>;

struct Shared {
    session: Session,
    writer: tokio::sync::Mutex<FrameWriter>,
    pending: parking_lot::Mutex<HashMap<u32, ReplySlot>>,
    streams: parking_lot::Mutex<HashMap<u16, mpsc::Sender<Bytes>>>,
}

/// Handle to one session's multiplexer. Cheap to clone; all clones
/// share the pending table, the writer and the session state.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub fn new(session: Session, writer: FrameWriter) -> Self {
        Self {
            shared: Arc::new(Shared {
                session,
                writer: tokio::sync::Mutex::new(writer),
                pending: parking_lot::Mutex::new(HashMap::new()),
                streams: parking_lot::Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.shared.session
    }

    /// Issue one request and wait for its correlated reply body.
    ///
    /// Completion order between concurrent calls follows device reply
    /// timing, never send order. A timeout removes only this call's
    /// bookkeeping; the device may still have executed the command.
    pub async fn call<T: Serialize>(
        &self,
        message_type: MessageType,
        body: &T,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        if self.shared.session.state().is_terminal() {
            return Err(Error::SessionClosed);
        }

        let sequence = self.shared.session.next_sequence();
        let payload = encode_body(body)?;
        let packets = into_frames(
            message_type,
            self.shared.session.id(),
            sequence,
            payload,
        );

        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().insert(sequence, tx);

        if let Err(e) = self.write_frames(&packets).await {
            self.shared.pending.lock().remove(&sequence);
            self.fail();
            return Err(e);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            // Sender dropped without a verdict: the session went away.
            Ok(Err(_)) => Err(Error::SessionClosed),
            Err(_) => {
                self.shared.pending.lock().remove(&sequence);
                Err(Error::Timeout)
            }
        }
    }

    /// Claim the channel for one stream data type.
    pub fn open_stream(
        &self,
        data_type: MessageType,
    ) -> Result<mpsc::Receiver<Bytes>> {
        let mut streams = self.shared.streams.lock();
        let code = u16::from(data_type);
        if streams.contains_key(&code) {
            return Err(Error::StreamBusy(data_type));
        }
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        streams.insert(code, tx);
        Ok(rx)
    }

    /// Release a stream data channel; the paired receiver sees
    /// end-of-channel.
    pub fn close_stream(&self, data_type: MessageType) {
        self.shared.streams.lock().remove(&u16::from(data_type));
    }

    /// Spawn the dedicated reader task for this session.
    pub fn spawn_reader(&self, mut reader: FrameReader) -> JoinHandle<()> {
        let shared = self.shared.clone();
        tokio::spawn(async move {
            let mut assemblers: HashMap<u32, FragmentAssembler> = HashMap::new();
            loop {
                match reader.read_frame().await {
                    Ok(packet) => {
                        handle_frame(&shared, &mut assemblers, packet).await;
                    }
                    Err(e) => {
                        if !shared.session.state().is_terminal() {
                            debug!("reader loop ending: {e}");
                        }
                        fan_out_failure(&shared);
                        break;
                    }
                }
            }
        })
    }

    /// Fail the session and unblock everything waiting on it.
    pub fn fail(&self) {
        fan_out_failure(&self.shared);
    }

    /// Orderly local shutdown: unblock all waiters and mark the
    /// session closed.
    pub fn close(&self) {
        self.shared.session.begin_close();
        fan_out(&self.shared);
        self.shared.session.closed();
    }

    /// Shut the write side of the connection down.
    pub async fn shutdown_writer(&self) {
        let mut writer = self.shared.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            debug!("writer shutdown: {e}");
        }
    }

    async fn write_frames(&self, packets: &[Packet]) -> Result<()> {
        // One lock acquisition per message keeps fragments of
        // concurrent messages from interleaving on the wire.
        let mut writer = self.shared.writer.lock().await;
        for packet in packets {
            writer.write_frame(packet).await?;
        }
        Ok(())
    }
}

fn fan_out_failure(shared: &Arc<Shared>) {
    if shared.session.fail() {
        warn!("session failed; unblocking all pending work");
    }
    fan_out(shared);
}

/// Deliver a closure verdict to every pending call and drop every
/// stream sender so their readers observe end-of-channel.
fn fan_out(shared: &Arc<Shared>) {
    let pending: Vec<ReplySlot> =
        shared.pending.lock().drain().map(|(_, tx)| tx).collect();
    for tx in pending {
        let _ = tx.send(Err(Error::SessionClosed));
    }
    shared.streams.lock().clear();
}

async fn handle_frame(
    shared: &Arc<Shared>,
    assemblers: &mut HashMap<u32, FragmentAssembler>,
    packet: Packet,
) {
    shared.session.touch();

    match packet.kind() {
        Some(t) if t.is_stream_data() => route_stream(shared, packet).await,
        Some(_) => complete_control(shared, assemblers, packet),
        None => {
            warn!(
                "ignoring frame with unknown message type {}",
                packet.message_type
            );
        }
    }
}

fn complete_control(
    shared: &Arc<Shared>,
    assemblers: &mut HashMap<u32, FragmentAssembler>,
    packet: Packet,
) {
    let sequence = packet.sequence;

    if !shared.pending.lock().contains_key(&sequence) {
        trace!("dropping unmatched reply (seq={sequence})");
        assemblers.remove(&sequence);
        return;
    }

    let assembler = assemblers.entry(sequence).or_default();
    let verdict = match assembler.push(packet) {
        Ok(None) => return, // more fragments outstanding
        Ok(Some(body)) => Ok(body),
        Err(e) => Err(Error::Core(e)),
    };
    assemblers.remove(&sequence);

    if let Some(tx) = shared.pending.lock().remove(&sequence) {
        // A caller that timed out in the meantime is gone; fine.
        let _ = tx.send(verdict);
    }
}

async fn route_stream(shared: &Arc<Shared>, packet: Packet) {
    let code = packet.message_type;
    let end = packet.is_end() || packet.payload.is_empty();

    let sender = shared.streams.lock().get(&code).cloned();
    let Some(tx) = sender else {
        trace!("dropping unclaimed stream frame (type={code})");
        return;
    };

    if !packet.payload.is_empty() && tx.send(packet.payload).await.is_err() {
        // Receiver cancelled; stop routing this stream.
        shared.streams.lock().remove(&code);
        return;
    }
    if end {
        shared.streams.lock().remove(&code);
    }
}

/// Serialize a body the way devices expect: compact JSON with the
/// `0x0A 0x00` trailer.
fn encode_body<T: Serialize>(body: &T) -> Result<Vec<u8>> {
    let mut payload = serde_json::to_vec(body)?;
    payload.push(b'\n');
    payload.push(0);
    Ok(payload)
}

/// Split a payload into wire frames, fragmenting when it exceeds one
/// frame's capacity.
fn into_frames(
    message_type: MessageType,
    session: u32,
    sequence: u32,
    payload: Vec<u8>,
) -> Vec<Packet> {
    if payload.len() <= MAX_PAYLOAD {
        return vec![Packet::with_payload(
            message_type,
            session,
            sequence,
            payload,
        )];
    }

    let chunks: Vec<&[u8]> = payload.chunks(MAX_PAYLOAD).collect();
    let total = chunks.len() as u8;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            Packet::fragment(
                message_type,
                session,
                sequence,
                total,
                i as u8,
                chunk.to_vec(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dispatcher_pair, json_body};
    use serde_json::json;

    #[tokio::test]
    async fn test_correlation_with_scrambled_replies() {
        let (dispatcher, _reader, mut device) = dispatcher_pair();

        let mut calls = Vec::new();
        for i in 0..3u32 {
            let d = dispatcher.clone();
            calls.push(tokio::spawn(async move {
                d.call(
                    MessageType::GetTime,
                    &json!({ "Name": "OPTimeQuery", "Probe": i }),
                    Duration::from_secs(5),
                )
                .await
            }));
        }

        // Collect all three requests, then answer newest first.
        let mut seen = Vec::new();
        for _ in 0..3 {
            let packet = device.recv().await;
            let body = json_body(&packet);
            seen.push((packet.sequence, body["Probe"].as_u64().unwrap()));
        }
        seen.sort_by_key(|(seq, _)| std::cmp::Reverse(*seq));
        for (seq, probe) in &seen {
            device
                .send_json(
                    MessageType::GetTimeReply,
                    *seq,
                    &json!({ "Ret": 100, "Echo": probe }),
                )
                .await;
        }

        for (i, call) in calls.into_iter().enumerate() {
            let body = call.await.unwrap().unwrap();
            let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(value["Echo"].as_u64().unwrap(), i as u64);
        }
    }

    #[tokio::test]
    async fn test_timeout_isolation() {
        let (dispatcher, _reader, mut device) = dispatcher_pair();

        let body = json!({ "Name": "OPTimeQuery" });
        let silent = dispatcher.call(
            MessageType::GetTime,
            &body,
            Duration::from_millis(50),
        );
        assert!(matches!(silent.await, Err(Error::Timeout)));
        let stale = device.recv().await;

        // A later call with a fresh sequence number works normally,
        // even if the stale reply arrives late.
        let late = dispatcher.call(
            MessageType::GetTime,
            &body,
            Duration::from_secs(5),
        );
        let (late_res, _) = tokio::join!(late, async {
            device
                .send_json(
                    MessageType::GetTimeReply,
                    stale.sequence,
                    &json!({ "Ret": 100, "Stale": true }),
                )
                .await;
            let fresh = device.recv().await;
            device
                .send_json(
                    MessageType::GetTimeReply,
                    fresh.sequence,
                    &json!({ "Ret": 100, "Stale": false }),
                )
                .await;
        });

        let value: serde_json::Value =
            serde_json::from_slice(&late_res.unwrap()).unwrap();
        assert_eq!(value["Stale"], false);
    }

    #[tokio::test]
    async fn test_fragmented_reply_reassembled() {
        let (dispatcher, _reader, mut device) = dispatcher_pair();

        let body = json!({ "Name": "OPFileQuery" });
        let call = dispatcher.call(
            MessageType::FileSearch,
            &body,
            Duration::from_secs(5),
        );
        let (result, _) = tokio::join!(call, async {
            let req = device.recv().await;
            let body = br#"{"Ret":100,"Blob":"abcdef"}"#;
            let (a, b) = body.split_at(10);
            device
                .send_fragment(MessageType::FileSearchReply, req.sequence, 2, 0, a)
                .await;
            device
                .send_fragment(MessageType::FileSearchReply, req.sequence, 2, 1, b)
                .await;
        });

        let value: serde_json::Value =
            serde_json::from_slice(&result.unwrap()).unwrap();
        assert_eq!(value["Blob"], "abcdef");
    }

    #[tokio::test]
    async fn test_close_fans_out_to_all_waiters() {
        let (dispatcher, _reader, mut device) = dispatcher_pair();

        let mut calls = Vec::new();
        for _ in 0..4 {
            let d = dispatcher.clone();
            calls.push(tokio::spawn(async move {
                d.call(
                    MessageType::GetTime,
                    &json!({ "Name": "OPTimeQuery" }),
                    Duration::from_secs(30),
                )
                .await
            }));
        }
        for _ in 0..4 {
            device.recv().await;
        }

        let mut stream = dispatcher.open_stream(MessageType::MonitorData).unwrap();

        dispatcher.close();

        for call in calls {
            assert!(matches!(call.await.unwrap(), Err(Error::SessionClosed)));
        }
        assert!(stream.recv().await.is_none());

        // Future calls fail identically.
        let after = dispatcher
            .call(
                MessageType::GetTime,
                &json!({ "Name": "OPTimeQuery" }),
                Duration::from_secs(1),
            )
            .await;
        assert!(matches!(after, Err(Error::SessionClosed)));
    }

    #[tokio::test]
    async fn test_peer_disconnect_fails_session() {
        let (dispatcher, reader, device) = dispatcher_pair();

        let body = json!({ "Name": "OPTimeQuery" });
        let call = dispatcher.call(
            MessageType::GetTime,
            &body,
            Duration::from_secs(30),
        );
        let (result, _) = tokio::join!(call, async move {
            drop(device);
        });

        assert!(matches!(result, Err(Error::SessionClosed)));
        reader.await.unwrap();
        assert_eq!(
            dispatcher.session().state(),
            dvrip_core::SessionState::Failed
        );
    }

    #[tokio::test]
    async fn test_stream_channel_exclusive() {
        let (dispatcher, _reader, _device) = dispatcher_pair();

        let _first = dispatcher.open_stream(MessageType::PlaybackData).unwrap();
        assert!(matches!(
            dispatcher.open_stream(MessageType::PlaybackData),
            Err(Error::StreamBusy(MessageType::PlaybackData))
        ));

        dispatcher.close_stream(MessageType::PlaybackData);
        assert!(dispatcher.open_stream(MessageType::PlaybackData).is_ok());
    }

    #[test]
    fn test_large_body_fragmented() {
        let payload = vec![b'x'; MAX_PAYLOAD * 2 + 17];
        let frames = into_frames(MessageType::FileSearch, 1, 5, payload);

        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.frag_total == 3));
        assert_eq!(frames[2].frag_index, 2);
        assert_eq!(frames[2].payload.len(), 17);
    }
}
