//! Reassembly of fragmented control replies
//!
//! Structured bodies longer than one frame arrive as a run of frames
//! sharing a sequence number, with `frag_total` giving the count and
//! `frag_index` the position. A count of 0 means a single frame.

use bytes::Bytes;

use crate::{
    error::{Error, Result},
    packet::Packet,
};

/// Collects the fragments of one control reply.
///
/// Feed every frame for a given sequence number to [`push`]; once the
/// advertised count has arrived, the assembled body is returned with
/// the trailing `NUL` and `\` padding stripped, ready for JSON parsing.
///
/// [`push`]: FragmentAssembler::push
#[derive(Debug, Default)]
pub struct FragmentAssembler {
    expected: Option<u8>,
    received: usize,
    slots: Vec<Option<Bytes>>,
}

impl FragmentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one frame. Returns the complete body once all fragments
    /// have arrived, `None` while more are outstanding.
    pub fn push(&mut self, packet: Packet) -> Result<Option<Vec<u8>>> {
        let count = packet.frag_total.max(1);
        match self.expected {
            None => {
                self.expected = Some(count);
                self.slots = vec![None; count as usize];
            }
            Some(expected) if expected != count => {
                return Err(Error::FragmentCountMismatch {
                    expected,
                    actual: count,
                });
            }
            Some(_) => {}
        }

        let index = packet.frag_index;
        if index as usize >= self.slots.len() {
            return Err(Error::FragmentOutOfRange { index, count });
        }
        if self.slots[index as usize].is_some() {
            return Err(Error::OverlappingFragment(index));
        }

        self.slots[index as usize] = Some(packet.payload);
        self.received += 1;

        if self.received < self.slots.len() {
            return Ok(None);
        }

        let mut body = Vec::new();
        for slot in self.slots.drain(..) {
            // Every slot is filled once received == len.
            if let Some(chunk) = slot {
                body.extend_from_slice(&chunk);
            }
        }
        if body.is_empty() {
            return Err(Error::EmptyBody);
        }
        while matches!(body.last(), Some(0x00) | Some(b'\\')) {
            body.pop();
        }
        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use pretty_assertions::assert_eq;

    fn frame(total: u8, index: u8, payload: &[u8]) -> Packet {
        Packet::fragment(
            MessageType::FileSearchReply,
            1,
            7,
            total,
            index,
            payload.to_vec(),
        )
    }

    #[test]
    fn test_single_frame() {
        let mut asm = FragmentAssembler::new();
        let body = asm
            .push(frame(0, 0, b"{\"Ret\":100}\n\x00"))
            .unwrap()
            .unwrap();
        assert_eq!(body, b"{\"Ret\":100}\n");
    }

    #[test]
    fn test_two_fragments_in_order() {
        let mut asm = FragmentAssembler::new();
        assert!(asm.push(frame(2, 0, b"{\"Ret\"")).unwrap().is_none());
        let body = asm.push(frame(2, 1, b":100}\x00")).unwrap().unwrap();
        assert_eq!(body, b"{\"Ret\":100}");
    }

    #[test]
    fn test_fragments_out_of_order() {
        let mut asm = FragmentAssembler::new();
        assert!(asm.push(frame(2, 1, b"world\x00")).unwrap().is_none());
        let body = asm.push(frame(2, 0, b"hello ")).unwrap().unwrap();
        assert_eq!(body, b"hello world");
    }

    #[test]
    fn test_conflicting_counts() {
        let mut asm = FragmentAssembler::new();
        asm.push(frame(3, 0, b"a")).unwrap();
        assert!(matches!(
            asm.push(frame(2, 1, b"b")),
            Err(Error::FragmentCountMismatch { .. })
        ));
    }

    #[test]
    fn test_overlapping_fragment() {
        let mut asm = FragmentAssembler::new();
        asm.push(frame(2, 0, b"a")).unwrap();
        assert!(matches!(
            asm.push(frame(2, 0, b"a")),
            Err(Error::OverlappingFragment(0))
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let mut asm = FragmentAssembler::new();
        asm.push(frame(2, 0, b"a")).unwrap();
        assert!(matches!(
            asm.push(frame(2, 2, b"b")),
            Err(Error::FragmentOutOfRange { .. })
        ));
    }

    #[test]
    fn test_empty_body_rejected() {
        let mut asm = FragmentAssembler::new();
        assert!(matches!(
            asm.push(frame(0, 0, b"")),
            Err(Error::EmptyBody)
        ));
    }
}
