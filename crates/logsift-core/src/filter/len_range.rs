//! `len_range(min, max)`: the value has between `min` and `max` chars.

use std::fmt;

use crate::bitmap::Bitmap;

use super::column::{match_strings, ColumnFilter, ColumnView, Typed};
use super::matchers::match_len_range;
use super::render::quote_field_name_if_needed;

/// Longest canonical float form the encoder accepts.
const MAX_FLOAT_LEN: u64 = 20;
/// Length of the canonical ISO8601 form.
const ISO8601_LEN: u64 = "2006-01-02T15:04:05.000Z".len() as u64;

#[derive(Debug, Clone)]
pub struct LenRangeFilter {
    field: String,
    min: u64,
    max: u64,
}

impl LenRangeFilter {
    pub fn new(field: impl Into<String>, min: u64, max: u64) -> Self {
        Self {
            field: field.into(),
            min,
            max,
        }
    }

    fn overlaps(&self, lo: u64, hi: u64) -> bool {
        self.min <= hi && self.max >= lo
    }
}

impl ColumnFilter for LenRangeFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let (min, max) = (self.min, self.max);
        if min > max {
            bm.reset_bits();
            return;
        }
        if let ColumnView::Encoded(ev) = col {
            let candidates = match ev.typed() {
                Typed::String(_) | Typed::Dict(_) | Typed::Int64(_) => true,
                Typed::Uint(_) => {
                    let (lo, hi) = (ev.header.min_value, ev.header.max_value);
                    self.overlaps(decimal_len(lo), decimal_len(hi))
                }
                Typed::Float64(_) => self.overlaps(1, MAX_FLOAT_LEN),
                Typed::Ipv4(_) => self.overlaps(7, 15),
                Typed::Iso8601(_) => {
                    if !self.overlaps(ISO8601_LEN, ISO8601_LEN) {
                        bm.reset_bits();
                    }
                    return;
                }
            };
            if !candidates {
                bm.reset_bits();
                return;
            }
        }
        match_strings(col, bm, |s| match_len_range(s, min, max));
    }
}

fn decimal_len(n: u64) -> u64 {
    u64::from(n.checked_ilog10().unwrap_or(0)) + 1
}

impl fmt::Display for LenRangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}len_range({},{})",
            quote_field_name_if_needed(&self.field),
            self.min,
            self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::decimal_len;
    use crate::block::BlockBuilder;
    use crate::column::ValueType;
    use crate::filter::test_util::assert_rows;
    use crate::filter::Filter;

    #[test]
    fn test_decimal_len() {
        assert_eq!(decimal_len(0), 1);
        assert_eq!(decimal_len(9), 1);
        assert_eq!(decimal_len(10), 2);
        assert_eq!(decimal_len(u64::MAX), 20);
    }

    #[test]
    fn test_len_range() {
        let bs = BlockBuilder::new(vec![1, 2, 3])
            .column("s", ["", "ab", "привет"])
            .column_as("u", ["7", "1234", "56"], ValueType::Uint16)
            .column_as("ip", ["1.2.3.4", "10.0.0.1", "192.168.100.200"], ValueType::Ipv4)
            .column_as(
                "ts",
                [
                    "2024-01-01T00:00:00.000Z",
                    "2024-01-01T00:00:01.000Z",
                    "2024-01-01T00:00:02.000Z",
                ],
                ValueType::TimestampIso8601,
            )
            .build()
            .unwrap();
        assert_rows(&Filter::len_range("s", 0, 2), &bs, &[0, 1]);
        assert_rows(&Filter::len_range("s", 6, 6), &bs, &[2]);
        assert_rows(&Filter::len_range("u", 2, 3), &bs, &[2]);
        assert_rows(&Filter::len_range("u", 5, 10), &bs, &[]);
        assert_rows(&Filter::len_range("ip", 8, 15), &bs, &[1, 2]);
        assert_rows(&Filter::len_range("ip", 0, 6), &bs, &[]);
        assert_rows(&Filter::len_range("ts", 20, 30), &bs, &[0, 1, 2]);
        assert_rows(&Filter::len_range("ts", 0, 23), &bs, &[]);
        assert_rows(&Filter::len_range("missing", 0, 0), &bs, &[0, 1, 2]);
        assert_rows(&Filter::len_range("u", 3, 1), &bs, &[]);
    }

    #[test]
    fn test_len_range_render() {
        assert_eq!(Filter::len_range("", 1, 5).to_string(), "len_range(1,5)");
    }
}
