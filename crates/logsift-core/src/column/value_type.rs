//! Column value type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Encoding of an encoded column.
///
/// The discriminants are the on-disk tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueType {
    /// Plain strings.
    String = 1,
    /// One-byte indexes into a small table of distinct strings.
    Dict = 2,
    Uint8 = 3,
    Uint16 = 4,
    Uint32 = 5,
    Uint64 = 6,
    Float64 = 7,
    /// IPv4 addresses packed as big-endian `u32`.
    Ipv4 = 8,
    /// `YYYY-MM-DDThh:mm:ss.mmmZ` timestamps stored as Unix nanoseconds.
    TimestampIso8601 = 9,
    Int64 = 10,
}

impl ValueType {
    /// Every value type, in tag order.
    pub const ALL: [ValueType; 10] = [
        ValueType::String,
        ValueType::Dict,
        ValueType::Uint8,
        ValueType::Uint16,
        ValueType::Uint32,
        ValueType::Uint64,
        ValueType::Float64,
        ValueType::Ipv4,
        ValueType::TimestampIso8601,
        ValueType::Int64,
    ];

    /// Look up a value type by its on-disk tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|vt| vt.tag() == tag)
    }

    /// On-disk tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Name used by the `value_type` filter.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Dict => "dict",
            ValueType::Uint8 => "uint8",
            ValueType::Uint16 => "uint16",
            ValueType::Uint32 => "uint32",
            ValueType::Uint64 => "uint64",
            ValueType::Float64 => "float64",
            ValueType::Ipv4 => "ipv4",
            ValueType::TimestampIso8601 => "iso8601",
            ValueType::Int64 => "int64",
        }
    }

    /// Whether values are unsigned integers.
    pub fn is_uint(self) -> bool {
        matches!(
            self,
            ValueType::Uint8 | ValueType::Uint16 | ValueType::Uint32 | ValueType::Uint64
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|vt| vt.as_str() == s)
            .ok_or_else(|| Error::InvalidFilter(format!("unknown value type {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip() {
        for vt in ValueType::ALL {
            assert_eq!(ValueType::from_tag(vt.tag()), Some(vt));
            assert_eq!(vt.as_str().parse::<ValueType>().unwrap(), vt);
        }
        assert_eq!(ValueType::from_tag(0), None);
        assert_eq!(ValueType::from_tag(11), None);
    }

    #[test]
    fn test_tag_values() {
        assert_eq!(ValueType::String.tag(), 1);
        assert_eq!(ValueType::TimestampIso8601.tag(), 9);
        assert_eq!(ValueType::Int64.tag(), 10);
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            "uint128".parse::<ValueType>(),
            Err(Error::InvalidFilter(_))
        ));
    }
}
