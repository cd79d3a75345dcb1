//! In-memory device harness for tests
//!
//! Drives the client over a `tokio::io::duplex` pipe, with the test
//! playing the device's side frame by frame.

use std::time::Duration;

use dvrip_core::{MessageType, Packet, Session};
use dvrip_transport::{FrameReader, FrameWriter};

use crate::client::Client;
use crate::dispatcher::Dispatcher;

const SESSION_ID: u32 = 0x4F;
const PIPE_CAPACITY: usize = 256 * 1024;

/// The device's end of the pipe.
pub(crate) struct FakeDevice {
    reader: FrameReader,
    writer: FrameWriter,
}

impl FakeDevice {
    /// Next frame sent by the client.
    pub async fn recv(&mut self) -> Packet {
        self.reader.read_frame().await.unwrap()
    }

    /// Reply with a JSON body, echoing the given sequence number.
    pub async fn send_json(
        &mut self,
        message_type: MessageType,
        sequence: u32,
        body: &serde_json::Value,
    ) {
        let mut payload = serde_json::to_vec(body).unwrap();
        payload.push(b'\n');
        payload.push(0);
        let packet = Packet::with_payload(message_type, SESSION_ID, sequence, payload);
        self.writer.write_frame(&packet).await.unwrap();
    }

    /// Reply with one fragment of a multi-frame body.
    pub async fn send_fragment(
        &mut self,
        message_type: MessageType,
        sequence: u32,
        total: u8,
        index: u8,
        chunk: &[u8],
    ) {
        let packet = Packet::fragment(
            message_type,
            SESSION_ID,
            sequence,
            total,
            index,
            chunk.to_vec(),
        );
        self.writer.write_frame(&packet).await.unwrap();
    }

    /// Push a stream data frame; `end` marks the final frame.
    pub async fn send_data(&mut self, message_type: MessageType, data: &[u8], end: bool) {
        let packet = Packet::fragment(
            message_type,
            SESSION_ID,
            0,
            0, // channel
            end as u8,
            data.to_vec(),
        );
        self.writer.write_frame(&packet).await.unwrap();
    }
}

fn pipe() -> (FrameReader, FrameWriter, FakeDevice) {
    let (near, far) = tokio::io::duplex(PIPE_CAPACITY);
    let (near_r, near_w) = tokio::io::split(near);
    let (far_r, far_w) = tokio::io::split(far);
    (
        FrameReader::new(near_r),
        FrameWriter::new(near_w),
        FakeDevice {
            reader: FrameReader::new(far_r),
            writer: FrameWriter::new(far_w),
        },
    )
}

/// A dispatcher on a session already in the ready state, its reader
/// task running.
pub(crate) fn dispatcher_pair() -> (Dispatcher, tokio::task::JoinHandle<()>, FakeDevice)
{
    let (reader, writer, device) = pipe();
    let session = Session::new();
    session.begin_connect().unwrap();
    session.begin_login().unwrap();
    session.ready(SESSION_ID).unwrap();

    let dispatcher = Dispatcher::new(session, writer);
    let reader_task = dispatcher.spawn_reader(reader);
    (dispatcher, reader_task, device)
}

/// A connected but not yet authenticated client.
pub(crate) fn client_pair() -> (Client, FakeDevice) {
    let (reader, writer, device) = pipe();
    let session = Session::new();
    session.begin_connect().unwrap();
    (
        Client::attach(session, reader, writer, Duration::from_secs(5)),
        device,
    )
}

/// Decode the JSON body of a control frame.
pub(crate) fn json_body(packet: &Packet) -> serde_json::Value {
    let mut body = packet.payload.to_vec();
    while body.last() == Some(&0) || body.last() == Some(&b'\n') {
        body.pop();
    }
    serde_json::from_slice(&body).unwrap()
}

/// A 2 KiB recording entry as the device would list it.
pub(crate) fn entry_json(name: &str, begin: &str) -> serde_json::Value {
    serde_json::json!({
        "FileName": name,
        "DiskNo": 0,
        "SerialNo": 0,
        "FileLength": "0x00000002",
        "BeginTime": begin,
        "EndTime": begin,
    })
}
