//! Picks the typed encoding of a string column at ingestion.

use crate::error::{Error, Result};

use super::format::{
    write_float64, write_int64, write_ipv4, write_timestamp_iso8601, write_uint64,
};
use super::parse::{
    try_parse_float64, try_parse_int64, try_parse_ipv4, try_parse_timestamp_iso8601,
    try_parse_uint64,
};
use super::{ColumnValues, ValueType};

const MAX_DICT_LEN: usize = 8;
const MAX_DICT_SIZE_BYTES: usize = 256;

/// Output of [`ValuesEncoder`]: typed values plus the column summary.
///
/// `min_value`/`max_value` hold raw `u64`s for unsigned and IPv4 columns,
/// two's complement for int64 and timestamps, and the bit pattern for
/// float64. They are zero for string and dict columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedValues {
    pub values: ColumnValues,
    pub dict_values: Vec<String>,
    pub min_value: u64,
    pub max_value: u64,
}

impl EncodedValues {
    /// Value type chosen by the encoder.
    pub fn value_type(&self) -> ValueType {
        self.values.value_type()
    }
}

/// Column encoder.
#[derive(Debug, Clone)]
pub struct ValuesEncoder {
    max_dict_len: usize,
    max_dict_size_bytes: usize,
}

impl Default for ValuesEncoder {
    fn default() -> Self {
        Self {
            max_dict_len: MAX_DICT_LEN,
            max_dict_size_bytes: MAX_DICT_SIZE_BYTES,
        }
    }
}

impl ValuesEncoder {
    /// Create an encoder with the default dictionary limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of distinct dictionary values.
    pub fn max_dict_len(mut self, len: usize) -> Self {
        self.max_dict_len = len.min(256);
        self
    }

    /// Encode `values` with the most compact encoding that represents every
    /// value exactly.
    ///
    /// Candidates are tried in order: dict, unsigned, int64, float64, ipv4,
    /// iso8601 and finally plain strings.
    pub fn encode(&self, values: &[String]) -> EncodedValues {
        if values.is_empty() {
            return string_values(values);
        }
        self.try_dict(values)
            .or_else(|| try_uint(values))
            .or_else(|| try_int64(values, true))
            .or_else(|| try_float64(values))
            .or_else(|| try_ipv4(values))
            .or_else(|| try_iso8601(values))
            .unwrap_or_else(|| string_values(values))
    }

    /// Encode `values` as `value_type`, failing if any value does not parse.
    pub fn encode_as(&self, values: &[String], value_type: ValueType) -> Result<EncodedValues> {
        let encoded = match value_type {
            ValueType::String => Some(string_values(values)),
            ValueType::Dict => self.try_dict(values),
            ValueType::Uint8 | ValueType::Uint16 | ValueType::Uint32 | ValueType::Uint64 => {
                try_uint(values).map(|e| widen_uint(e, value_type))
            }
            ValueType::Int64 => try_int64(values, false),
            ValueType::Float64 => try_float64(values),
            ValueType::Ipv4 => try_ipv4(values),
            ValueType::TimestampIso8601 => try_iso8601(values),
        };
        let encoded = encoded.ok_or_else(|| {
            Error::InvalidBlock(format!("values do not fit the {value_type} encoding"))
        })?;
        if encoded.value_type() != value_type {
            return Err(Error::InvalidBlock(format!(
                "values need at least {} to encode, not {value_type}",
                encoded.value_type()
            )));
        }
        Ok(encoded)
    }

    fn try_dict(&self, values: &[String]) -> Option<EncodedValues> {
        let mut dict: Vec<String> = Vec::new();
        let mut size = 0;
        let mut ids = Vec::with_capacity(values.len());
        for v in values {
            let id = match dict.iter().position(|d| d == v) {
                Some(id) => id,
                None => {
                    if dict.len() >= self.max_dict_len
                        || size + v.len() > self.max_dict_size_bytes
                    {
                        return None;
                    }
                    size += v.len();
                    dict.push(v.clone());
                    dict.len() - 1
                }
            };
            ids.push(id as u8);
        }
        Some(EncodedValues {
            values: ColumnValues::Dict(ids),
            dict_values: dict,
            min_value: 0,
            max_value: 0,
        })
    }
}

/// Encode with [`ValuesEncoder::default`].
pub fn encode_values(values: &[String]) -> EncodedValues {
    ValuesEncoder::default().encode(values)
}

/// Encode as `value_type` with [`ValuesEncoder::default`].
pub fn encode_values_as(values: &[String], value_type: ValueType) -> Result<EncodedValues> {
    ValuesEncoder::default().encode_as(values, value_type)
}

fn string_values(values: &[String]) -> EncodedValues {
    EncodedValues {
        values: ColumnValues::String(values.to_vec()),
        dict_values: Vec::new(),
        min_value: 0,
        max_value: 0,
    }
}

fn min_max<T: PartialOrd + Copy>(items: &[T]) -> Option<(T, T)> {
    let (&first, rest) = items.split_first()?;
    Some(rest.iter().fold((first, first), |(lo, hi), &x| {
        (if x < lo { x } else { lo }, if x > hi { x } else { hi })
    }))
}

/// Parse every value, keeping the result only if each value is already in
/// its canonical form, so that decoding gives back the ingested strings.
fn parse_canonical<T: Copy>(
    values: &[String],
    parse: impl Fn(&str) -> Option<T>,
    write: impl Fn(&mut String, T),
) -> Option<Vec<T>> {
    let mut buf = String::new();
    values
        .iter()
        .map(|v| {
            let n = parse(v)?;
            buf.clear();
            write(&mut buf, n);
            (buf == *v).then_some(n)
        })
        .collect()
}

fn try_uint(values: &[String]) -> Option<EncodedValues> {
    let nums = parse_canonical(values, try_parse_uint64, write_uint64)?;
    let (min, max) = min_max(&nums)?;
    let bits = 64 - max.leading_zeros();
    let values = if bits <= 8 {
        ColumnValues::Uint8(nums.iter().map(|&n| n as u8).collect())
    } else if bits <= 16 {
        ColumnValues::Uint16(nums.iter().map(|&n| n as u16).collect())
    } else if bits <= 32 {
        ColumnValues::Uint32(nums.iter().map(|&n| n as u32).collect())
    } else {
        ColumnValues::Uint64(nums)
    };
    Some(EncodedValues {
        values,
        dict_values: Vec::new(),
        min_value: min,
        max_value: max,
    })
}

fn widen_uint(encoded: EncodedValues, target: ValueType) -> EncodedValues {
    let nums: Vec<u64> = match &encoded.values {
        ColumnValues::Uint8(v) => v.iter().map(|&n| u64::from(n)).collect(),
        ColumnValues::Uint16(v) => v.iter().map(|&n| u64::from(n)).collect(),
        ColumnValues::Uint32(v) => v.iter().map(|&n| u64::from(n)).collect(),
        ColumnValues::Uint64(v) => v.clone(),
        _ => return encoded,
    };
    let values = match target {
        ValueType::Uint16 if encoded.max_value <= u64::from(u16::MAX) => {
            ColumnValues::Uint16(nums.iter().map(|&n| n as u16).collect())
        }
        ValueType::Uint32 if encoded.max_value <= u64::from(u32::MAX) => {
            ColumnValues::Uint32(nums.iter().map(|&n| n as u32).collect())
        }
        ValueType::Uint64 => ColumnValues::Uint64(nums),
        _ => return encoded,
    };
    EncodedValues { values, ..encoded }
}

fn try_int64(values: &[String], require_negative: bool) -> Option<EncodedValues> {
    let nums = parse_canonical(values, try_parse_int64, write_int64)?;
    if require_negative && nums.iter().all(|&n| n >= 0) {
        return None;
    }
    let (min, max) = min_max(&nums)?;
    Some(EncodedValues {
        values: ColumnValues::Int64(nums),
        dict_values: Vec::new(),
        min_value: min as u64,
        max_value: max as u64,
    })
}

fn try_float64(values: &[String]) -> Option<EncodedValues> {
    let nums = parse_canonical(values, try_parse_float64, write_float64)?;
    let (min, max) = min_max(&nums)?;
    Some(EncodedValues {
        values: ColumnValues::Float64(nums),
        dict_values: Vec::new(),
        min_value: min.to_bits(),
        max_value: max.to_bits(),
    })
}

fn try_ipv4(values: &[String]) -> Option<EncodedValues> {
    let nums = parse_canonical(values, try_parse_ipv4, write_ipv4)?;
    let (min, max) = min_max(&nums)?;
    Some(EncodedValues {
        values: ColumnValues::Ipv4(nums),
        dict_values: Vec::new(),
        min_value: u64::from(min),
        max_value: u64::from(max),
    })
}

fn try_iso8601(values: &[String]) -> Option<EncodedValues> {
    let nums = parse_canonical(values, try_parse_timestamp_iso8601, write_timestamp_iso8601)?;
    let (min, max) = min_max(&nums)?;
    Some(EncodedValues {
        values: ColumnValues::TimestampIso8601(nums),
        dict_values: Vec::new(),
        min_value: min as u64,
        max_value: max as u64,
    })
}
