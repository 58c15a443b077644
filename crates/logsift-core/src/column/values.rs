//! Typed per-row column arrays.

use super::format::{write_float64, write_int64, write_ipv4, write_timestamp_iso8601, write_uint64};
use super::ValueType;

/// Per-row values of an encoded column, one variant per [`ValueType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    String(Vec<String>),
    /// Indexes into the column header's dictionary values.
    Dict(Vec<u8>),
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Uint64(Vec<u64>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Ipv4(Vec<u32>),
    /// Unix nanoseconds.
    TimestampIso8601(Vec<i64>),
}

impl ColumnValues {
    /// Value type of the variant.
    pub fn value_type(&self) -> ValueType {
        match self {
            ColumnValues::String(_) => ValueType::String,
            ColumnValues::Dict(_) => ValueType::Dict,
            ColumnValues::Uint8(_) => ValueType::Uint8,
            ColumnValues::Uint16(_) => ValueType::Uint16,
            ColumnValues::Uint32(_) => ValueType::Uint32,
            ColumnValues::Uint64(_) => ValueType::Uint64,
            ColumnValues::Int64(_) => ValueType::Int64,
            ColumnValues::Float64(_) => ValueType::Float64,
            ColumnValues::Ipv4(_) => ValueType::Ipv4,
            ColumnValues::TimestampIso8601(_) => ValueType::TimestampIso8601,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::String(v) => v.len(),
            ColumnValues::Dict(v) | ColumnValues::Uint8(v) => v.len(),
            ColumnValues::Uint16(v) => v.len(),
            ColumnValues::Uint32(v) | ColumnValues::Ipv4(v) => v.len(),
            ColumnValues::Uint64(v) => v.len(),
            ColumnValues::Int64(v) | ColumnValues::TimestampIso8601(v) => v.len(),
            ColumnValues::Float64(v) => v.len(),
        }
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the canonical string form of row `idx` to `buf`.
    ///
    /// Dict indexes outside `dict_values` read as "".
    pub fn write_value(&self, idx: usize, dict_values: &[String], buf: &mut String) {
        match self {
            ColumnValues::String(v) => buf.push_str(&v[idx]),
            ColumnValues::Dict(v) => {
                if let Some(s) = dict_values.get(v[idx] as usize) {
                    buf.push_str(s);
                }
            }
            ColumnValues::Uint8(v) => write_uint64(buf, u64::from(v[idx])),
            ColumnValues::Uint16(v) => write_uint64(buf, u64::from(v[idx])),
            ColumnValues::Uint32(v) => write_uint64(buf, u64::from(v[idx])),
            ColumnValues::Uint64(v) => write_uint64(buf, v[idx]),
            ColumnValues::Int64(v) => write_int64(buf, v[idx]),
            ColumnValues::Float64(v) => write_float64(buf, v[idx]),
            ColumnValues::Ipv4(v) => write_ipv4(buf, v[idx]),
            ColumnValues::TimestampIso8601(v) => write_timestamp_iso8601(buf, v[idx]),
        }
    }

    /// Decode every row to its canonical string form.
    pub fn decode(&self, dict_values: &[String]) -> Vec<String> {
        if let ColumnValues::String(v) = self {
            return v.clone();
        }
        let mut buf = String::new();
        (0..self.len())
            .map(|idx| {
                buf.clear();
                self.write_value(idx, dict_values, &mut buf);
                buf.clone()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_typed() {
        let values = ColumnValues::Ipv4(vec![0x0a00_0001, 0xc0a8_0001]);
        assert_eq!(values.decode(&[]), vec!["10.0.0.1", "192.168.0.1"]);

        let values = ColumnValues::Int64(vec![-5, 7]);
        assert_eq!(values.value_type(), ValueType::Int64);
        assert_eq!(values.decode(&[]), vec!["-5", "7"]);
    }

    #[test]
    fn test_decode_dict() {
        let dict = vec!["info".to_string(), "error".to_string()];
        let values = ColumnValues::Dict(vec![1, 0, 1]);
        assert_eq!(values.decode(&dict), vec!["error", "info", "error"]);
        assert_eq!(values.len(), 3);
    }
}
