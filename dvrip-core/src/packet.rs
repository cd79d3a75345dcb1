//! DVRIP frame structure and encoding/decoding

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    error::{Error, Result},
    message::MessageType,
    HEADER_SIZE, MAX_PAYLOAD,
};

/// DVRIP protocol frame
///
/// # Frame Structure
///
/// ```text
/// ┌───────┬─────────┬──────────┬───────────┬───────────┬───────┬───────┬─────────┬─────────┬─────────┐
/// │ Magic │ Version │ Reserved │ SessionID │ Sequence  │ Frag0 │ Frag1 │  Type   │ Length  │ Payload │
/// │ 1 (FF)│ 1 (01)  │ 2 bytes  │ 4 (LE u32)│ 4 (LE u32)│   1   │   1   │(LE u16) │(LE u32) │ N bytes │
/// └───────┴─────────┴──────────┴───────────┴───────────┴───────┴───────┴─────────┴─────────┴─────────┘
/// ```
///
/// All multi-byte values are little-endian. For control frames the two
/// fragment bytes are (total fragments, fragment index); for stream
/// data frames the same bytes are reused as (channel, end flag).
///
/// # Examples
///
/// ```
/// use dvrip_core::{MessageType, Packet};
/// use bytes::BytesMut;
///
/// let packet = Packet::new(MessageType::Login, 0, 1);
/// let mut encoded = packet.encode();
///
/// let decoded = Packet::decode(&mut encoded).unwrap().unwrap();
/// assert_eq!(packet, decoded);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    /// Session identifier (assigned by device on login, 0 before)
    pub session: u32,

    /// Sequence number correlating a request with its reply
    pub sequence: u32,

    /// Fragment count (control) or channel index (stream data)
    pub frag_total: u8,

    /// Fragment index (control) or end flag (stream data)
    pub frag_index: u8,

    /// Raw message type code
    pub message_type: u16,

    /// Frame payload: JSON body for control, opaque bytes for streams
    pub payload: Bytes,
}

impl Packet {
    /// Magic marker starting every frame
    pub const MAGIC: u8 = 0xFF;

    /// Protocol version this implementation speaks
    pub const VERSION: u8 = 0x01;

    /// Create an unfragmented frame with empty payload
    pub fn new(message_type: MessageType, session: u32, sequence: u32) -> Self {
        Self::with_payload(message_type, session, sequence, Bytes::new())
    }

    /// Create an unfragmented frame with payload
    pub fn with_payload(
        message_type: MessageType,
        session: u32,
        sequence: u32,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            session,
            sequence,
            frag_total: 0,
            frag_index: 0,
            message_type: message_type.into(),
            payload: payload.into(),
        }
    }

    /// Create one fragment of a multi-frame control message
    pub fn fragment(
        message_type: MessageType,
        session: u32,
        sequence: u32,
        frag_total: u8,
        frag_index: u8,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            session,
            sequence,
            frag_total,
            frag_index,
            message_type: message_type.into(),
            payload: payload.into(),
        }
    }

    /// Message type, if the code is known to this implementation
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::try_from(self.message_type).ok()
    }

    /// Channel index of a stream data frame
    pub fn channel(&self) -> u8 {
        self.frag_total
    }

    /// End flag of a stream data frame
    pub fn is_end(&self) -> bool {
        self.frag_index != 0
    }

    /// Total encoded size
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Encode the frame into a fresh buffer
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_u8(Self::MAGIC);
        buf.put_u8(Self::VERSION);
        buf.put_u16(0); // reserved
        buf.put_u32_le(self.session);
        buf.put_u32_le(self.sequence);
        buf.put_u8(self.frag_total);
        buf.put_u8(self.frag_index);
        buf.put_u16_le(self.message_type);
        buf.put_u32_le(self.payload.len() as u32);
        buf.put_slice(&self.payload);

        buf
    }

    /// Decode one frame from the front of `buf`.
    ///
    /// Returns `Ok(None)` when fewer bytes than one complete frame are
    /// available; the caller should read more input and retry. On
    /// success exactly one frame's bytes are consumed, leaving any
    /// following frame untouched.
    ///
    /// # Errors
    ///
    /// Fails on a wrong magic byte, an unsupported version, or a
    /// declared length above [`MAX_PAYLOAD`]. These are fatal to the
    /// byte stream since resynchronization is impossible.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>> {
        if buf.len() < HEADER_SIZE {
            return Ok(None);
        }

        let magic = buf[0];
        if magic != Self::MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let version = buf[1];
        if version != Self::VERSION {
            return Err(Error::BadVersion(version));
        }

        let length =
            u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]) as usize;
        if length > MAX_PAYLOAD {
            return Err(Error::PayloadTooLong {
                length,
                max: MAX_PAYLOAD,
            });
        }
        if buf.len() < HEADER_SIZE + length {
            return Ok(None);
        }

        let mut header = buf.split_to(HEADER_SIZE);
        header.advance(4); // magic, version, reserved
        let session = header.get_u32_le();
        let sequence = header.get_u32_le();
        let frag_total = header.get_u8();
        let frag_index = header.get_u8();
        let message_type = header.get_u16_le();

        let payload = buf.split_to(length).freeze();

        Ok(Some(Self {
            session,
            sequence,
            frag_total,
            frag_index,
            message_type,
            payload,
        }))
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("session", &format_args!("0x{:08X}", self.session))
            .field("sequence", &self.sequence)
            .field("frag", &format_args!("{}/{}", self.frag_index, self.frag_total))
            .field("type", &self.message_type)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet[{}](session=0x{:08X}, seq={}, len={})",
            self.message_type,
            self.session,
            self.sequence,
            self.payload.len()
        )
    }
}
