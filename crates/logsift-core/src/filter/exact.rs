//! `exact(v)`: the whole value equals `v`.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::bitmap::Bitmap;
use crate::column::format::{
    write_float64, write_int64, write_ipv4, write_timestamp_iso8601, write_timestamp_rfc3339_nano,
    write_uint64,
};
use crate::column::parse::{
    try_parse_float64, try_parse_int64, try_parse_ipv4, try_parse_timestamp_iso8601,
    try_parse_timestamp_rfc3339_nano, try_parse_uint64,
};
use crate::tokenizer::{hash_tokens, tokenize};

use super::column::{ColumnFilter, ColumnView, EncodedView, Typed};
use super::matchers::parse_canonical;
use super::render::{quote_field_name_if_needed, quote_token_if_needed};

#[derive(Debug, Clone)]
pub struct ExactFilter {
    field: String,
    value: String,
    hashes: OnceCell<Vec<u64>>,
}

impl ExactFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            hashes: OnceCell::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn hashes(&self) -> &[u64] {
        self.hashes
            .get_or_init(|| hash_tokens(&tokenize(&self.value)))
    }
}

impl ColumnFilter for ExactFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        match col {
            ColumnView::Missing | ColumnView::Const(_) => {
                if col.const_value() != Some(self.value.as_str()) {
                    bm.reset_bits();
                }
            }
            ColumnView::Time(timestamps) => match_exact_timestamp(timestamps, bm, &self.value),
            ColumnView::Encoded(ev) => {
                match_exact_value(ev, bm, &self.value, self.hashes(), "exact")
            }
        }
    }
}

impl fmt::Display for ExactFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}exact({})",
            quote_field_name_if_needed(&self.field),
            quote_token_if_needed(&self.value)
        )
    }
}

/// Rows of the time column whose RFC3339 form is exactly `value`.
pub(crate) fn match_exact_timestamp(timestamps: &[i64], bm: &mut Bitmap, value: &str) {
    match parse_canonical(value, try_parse_timestamp_rfc3339_nano, write_timestamp_rfc3339_nano) {
        Some(ts) => bm.for_each_set_bit(|i| timestamps[i] == ts),
        None => bm.reset_bits(),
    }
}

/// Rows of an encoded column whose value is exactly `value`.
///
/// Typed columns compare native values after pruning on the column range;
/// `hashes` are the tokens of `value`.
pub(crate) fn match_exact_value(
    ev: &EncodedView<'_>,
    bm: &mut Bitmap,
    value: &str,
    hashes: &[u64],
    filter: &'static str,
) {
    let header = ev.header;
    match ev.typed() {
        Typed::String(values) => {
            if !ev.bloom_contains_all(hashes, filter) {
                bm.reset_bits();
                return;
            }
            bm.for_each_set_bit(|i| values[i] == value);
        }
        Typed::Dict(ids) => ev.match_dict(ids, bm, |v| v == value),
        Typed::Uint(values) => match parse_canonical(value, try_parse_uint64, write_uint64) {
            Some(n)
                if (header.min_value..=header.max_value).contains(&n)
                    && ev.bloom_contains_all(hashes, filter) =>
            {
                bm.for_each_set_bit(|i| values.get(i) == n)
            }
            _ => bm.reset_bits(),
        },
        Typed::Int64(values) => match parse_canonical(value, try_parse_int64, write_int64) {
            Some(n)
                if (header.min_i64()..=header.max_i64()).contains(&n)
                    && ev.bloom_contains_all(hashes, filter) =>
            {
                bm.for_each_set_bit(|i| values[i] == n)
            }
            _ => bm.reset_bits(),
        },
        Typed::Float64(values) => match parse_canonical(value, try_parse_float64, write_float64) {
            Some(f)
                if f >= header.min_f64()
                    && f <= header.max_f64()
                    && ev.bloom_contains_all(hashes, filter) =>
            {
                let bits = f.to_bits();
                bm.for_each_set_bit(|i| values[i].to_bits() == bits)
            }
            _ => bm.reset_bits(),
        },
        Typed::Ipv4(values) => match parse_canonical(value, try_parse_ipv4, write_ipv4) {
            Some(ip)
                if (header.min_value..=header.max_value).contains(&u64::from(ip))
                    && ev.bloom_contains_all(hashes, filter) =>
            {
                bm.for_each_set_bit(|i| values[i] == ip)
            }
            _ => bm.reset_bits(),
        },
        Typed::Iso8601(values) => {
            match parse_canonical(value, try_parse_timestamp_iso8601, write_timestamp_iso8601) {
                Some(ts)
                    if (header.min_i64()..=header.max_i64()).contains(&ts)
                        && ev.bloom_contains_all(hashes, filter) =>
                {
                    bm.for_each_set_bit(|i| values[i] == ts)
                }
                _ => bm.reset_bits(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::block::BlockBuilder;
    use crate::column::ValueType;
    use crate::filter::test_util::assert_rows;
    use crate::filter::Filter;

    #[test]
    fn test_exact_strings() {
        let bs = BlockBuilder::new(vec![1, 2, 3])
            .column("f", ["foo", "bar", "foobar"])
            .build()
            .unwrap();
        assert_rows(&Filter::exact("f", "bar"), &bs, &[1]);
        assert_rows(&Filter::exact("f", "foo"), &bs, &[0]);
        assert_rows(&Filter::exact("f", "fo"), &bs, &[]);
        assert_rows(&Filter::exact("f", ""), &bs, &[]);
        assert_rows(&Filter::exact("missing", ""), &bs, &[0, 1, 2]);
        assert_rows(&Filter::exact("missing", "foo"), &bs, &[]);
    }

    #[test]
    fn test_exact_typed() {
        let bs = BlockBuilder::new(vec![1, 2, 3, 4])
            .column_as("u", ["1", "20", "300", "20"], ValueType::Uint16)
            .column_as("i", ["-1", "5", "-1", "7"], ValueType::Int64)
            .column_as("fl", ["1.5", "-2", "0.25", "1.5"], ValueType::Float64)
            .column_as("ip", ["10.0.0.1", "1.2.3.4", "10.0.0.1", "8.8.8.8"], ValueType::Ipv4)
            .column_as(
                "ts",
                [
                    "2024-01-01T00:00:00.000Z",
                    "2024-01-01T00:00:01.000Z",
                    "2024-01-01T00:00:02.000Z",
                    "2024-01-01T00:00:01.000Z",
                ],
                ValueType::TimestampIso8601,
            )
            .build()
            .unwrap();
        assert_rows(&Filter::exact("u", "20"), &bs, &[1, 3]);
        assert_rows(&Filter::exact("u", "020"), &bs, &[]);
        assert_rows(&Filter::exact("u", "5000"), &bs, &[]);
        assert_rows(&Filter::exact("u", "abc"), &bs, &[]);
        assert_rows(&Filter::exact("i", "-1"), &bs, &[0, 2]);
        assert_rows(&Filter::exact("fl", "1.5"), &bs, &[0, 3]);
        assert_rows(&Filter::exact("fl", "1.50"), &bs, &[]);
        assert_rows(&Filter::exact("ip", "10.0.0.1"), &bs, &[0, 2]);
        assert_rows(&Filter::exact("ip", "10.0.0"), &bs, &[]);
        assert_rows(&Filter::exact("ts", "2024-01-01T00:00:01.000Z"), &bs, &[1, 3]);
    }

    #[test]
    fn test_exact_time_and_const() {
        let bs = BlockBuilder::new(vec![1_000_000_000, 2_000_000_000])
            .column("host", ["web", "web"])
            .build()
            .unwrap();
        assert_rows(&Filter::exact("_time", "1970-01-01T00:00:02Z"), &bs, &[1]);
        assert_rows(&Filter::exact("_time", "1970-01-01T00:00:02.000Z"), &bs, &[]);
        assert_rows(&Filter::exact("host", "web"), &bs, &[0, 1]);
        assert_rows(&Filter::exact("host", "we"), &bs, &[]);
    }

    #[test]
    fn test_exact_render() {
        assert_eq!(Filter::exact("", "foo bar").to_string(), r#"exact("foo bar")"#);
        assert_eq!(Filter::exact("level", "error").to_string(), "level:exact(error)");
    }
}
