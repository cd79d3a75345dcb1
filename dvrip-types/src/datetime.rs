//! The device datetime format
//!
//! Clock values are `"%Y-%m-%d %H:%M:%S"` strings with two sentinels:
//! `"0000-00-00 00:00:00"` means "no value" and the syntactically
//! impossible `"2000-00-00 00:00:00"` means the device epoch,
//! 2000-01-01 00:00:00.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NONE_STR: &str = "0000-00-00 00:00:00";
const EPOCH_STR: &str = "2000-00-00 00:00:00";

/// Device epoch: the earliest representable clock value.
pub fn epoch() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// A possibly-absent device clock value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DvrTime(pub Option<NaiveDateTime>);

impl DvrTime {
    pub fn none() -> Self {
        DvrTime(None)
    }

    pub fn some(t: NaiveDateTime) -> Self {
        DvrTime(Some(t))
    }
}

impl From<NaiveDateTime> for DvrTime {
    fn from(t: NaiveDateTime) -> Self {
        DvrTime(Some(t))
    }
}

impl Serialize for DvrTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = match self.0 {
            None => NONE_STR.to_owned(),
            Some(t) if t == epoch() => EPOCH_STR.to_owned(),
            Some(t) => t.format(FORMAT).to_string(),
        };
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for DvrTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            NONE_STR => Ok(DvrTime(None)),
            EPOCH_STR => Ok(DvrTime(Some(epoch()))),
            other => NaiveDateTime::parse_from_str(other, FORMAT)
                .map(|t| DvrTime(Some(t)))
                .map_err(|_| de::Error::custom(format!("not a datetime string: {other:?}"))),
        }
    }
}

impl fmt::Display for DvrTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str(NONE_STR),
            Some(t) => write!(f, "{}", t.format(FORMAT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_round_trip() {
        let t = DvrTime::some(
            chrono::NaiveDate::from_ymd_opt(2024, 3, 7)
                .unwrap()
                .and_hms_opt(15, 4, 5)
                .unwrap(),
        );
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"2024-03-07 15:04:05\"");
        assert_eq!(serde_json::from_str::<DvrTime>(&json).unwrap(), t);
    }

    #[test]
    fn test_none_sentinel() {
        let json = serde_json::to_string(&DvrTime::none()).unwrap();
        assert_eq!(json, "\"0000-00-00 00:00:00\"");
        assert_eq!(
            serde_json::from_str::<DvrTime>(&json).unwrap(),
            DvrTime::none()
        );
    }

    #[test]
    fn test_epoch_sentinel() {
        let t = DvrTime::some(epoch());
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"2000-00-00 00:00:00\"");
        assert_eq!(serde_json::from_str::<DvrTime>(&json).unwrap(), t);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<DvrTime>("\"yesterday\"").is_err());
    }
}
