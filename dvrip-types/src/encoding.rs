//! Wire encodings shared by the message bodies
//!
//! Devices encode several integers as `"0x%08X"` strings and IP
//! addresses as the hex form of their little-endian u32.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Parse a `"0x%08X"` style hex string.
pub(crate) fn parse_hex(s: &str) -> Result<u32> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| Error::Parse(format!("missing 0x prefix in {s:?}")))?;
    if digits.is_empty() || digits.len() > 8 {
        return Err(Error::Parse(format!("bad hex literal {s:?}")));
    }
    u32::from_str_radix(digits, 16)
        .map_err(|_| Error::Parse(format!("bad hex literal {s:?}")))
}

pub(crate) fn format_hex(value: u32) -> String {
    format!("0x{value:08X}")
}

/// Device-assigned session identifier.
///
/// Rides in every body as a `"0x%08X"` string even though the frame
/// header carries the same value in binary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u32);

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hex(self.0))
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hex(&s).map(SessionId).map_err(de::Error::custom)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Serde adapter for plain integers encoded as hex strings
/// (file lengths, uptime counters).
pub mod hex_u32 {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &u32,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hex(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<u32, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hex(&s).map_err(de::Error::custom)
    }
}

/// Serde adapter for [`dvrip_core::Status`], a bare number on the wire.
pub mod status {
    use dvrip_core::Status;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Status,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(value.code())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Status, D::Error> {
        u32::deserialize(deserializer).map(Status)
    }
}

/// IPv4 address encoded as the hex form of its little-endian u32.
///
/// `192.168.1.10` goes on the wire as `"0x0A01A8C0"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpLe(pub Ipv4Addr);

impl Serialize for IpLe {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let [a, b, c, d] = self.0.octets();
        let le = (d as u32) << 24 | (c as u32) << 16 | (b as u32) << 8 | a as u32;
        serializer.serialize_str(&format_hex(le))
    }
}

impl<'de> Deserialize<'de> for IpLe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let le = parse_hex(&s).map_err(de::Error::custom)?;
        let a = (le & 0xFF) as u8;
        let b = (le >> 8 & 0xFF) as u8;
        let c = (le >> 16 & 0xFF) as u8;
        let d = (le >> 24 & 0xFF) as u8;
        Ok(IpLe(Ipv4Addr::new(a, b, c, d)))
    }
}

impl fmt::Display for IpLe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
