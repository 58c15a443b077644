//! `range[min, max]`: numeric interval over the value.

use std::fmt;

use crate::bitmap::Bitmap;

use super::column::{ColumnFilter, ColumnView, Typed};
use super::matchers::{
    match_range, next_down, next_up, to_int64_range, to_uint32_range, to_uint64_range,
};
use super::render::quote_field_name_if_needed;

/// Numeric range filter.
///
/// Bounds are kept as written for rendering; evaluation uses the inclusive
/// equivalents. Integer encodings round the bounds toward the inside of the
/// interval, ipv4 values compare as `u32` and timestamps as nanoseconds.
#[derive(Debug, Clone)]
pub struct RangeFilter {
    field: String,
    min: f64,
    max: f64,
    min_inclusive: bool,
    max_inclusive: bool,
    lo: f64,
    hi: f64,
}

impl RangeFilter {
    /// Inclusive range `[min, max]`.
    pub fn new(field: impl Into<String>, min: f64, max: f64) -> Self {
        Self::with_bounds(field, min, true, max, true)
    }

    pub fn with_bounds(
        field: impl Into<String>,
        min: f64,
        min_inclusive: bool,
        max: f64,
        max_inclusive: bool,
    ) -> Self {
        Self {
            field: field.into(),
            min,
            max,
            min_inclusive,
            max_inclusive,
            lo: if min_inclusive { min } else { next_up(min) },
            hi: if max_inclusive { max } else { next_down(max) },
        }
    }

    /// Inclusive bounds used for matching.
    pub fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }
}

impl ColumnFilter for RangeFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let (min, max) = (self.lo, self.hi);
        if !(min <= max) {
            bm.reset_bits();
            return;
        }
        match col {
            ColumnView::Missing | ColumnView::Const(_) => {
                if !match_range(col.const_value().unwrap_or_default(), min, max) {
                    bm.reset_bits();
                }
            }
            ColumnView::Time(timestamps) => match to_int64_range(min, max) {
                Some((lo, hi)) => bm.for_each_set_bit(|i| (lo..=hi).contains(&timestamps[i])),
                None => bm.reset_bits(),
            },
            ColumnView::Encoded(ev) => {
                let header = ev.header;
                match ev.typed() {
                    Typed::String(values) => {
                        bm.for_each_set_bit(|i| match_range(&values[i], min, max))
                    }
                    Typed::Dict(ids) => ev.match_dict(ids, bm, |s| match_range(s, min, max)),
                    Typed::Uint(values) => match to_uint64_range(min, max) {
                        Some((lo, hi)) if lo <= header.max_value && hi >= header.min_value => {
                            if lo > header.min_value || hi < header.max_value {
                                bm.for_each_set_bit(|i| (lo..=hi).contains(&values.get(i)));
                            }
                        }
                        _ => bm.reset_bits(),
                    },
                    Typed::Int64(values) | Typed::Iso8601(values) => {
                        match to_int64_range(min, max) {
                            Some((lo, hi)) if lo <= header.max_i64() && hi >= header.min_i64() => {
                                if lo > header.min_i64() || hi < header.max_i64() {
                                    bm.for_each_set_bit(|i| (lo..=hi).contains(&values[i]));
                                }
                            }
                            _ => bm.reset_bits(),
                        }
                    }
                    Typed::Float64(values) => {
                        if max < header.min_f64() || min > header.max_f64() {
                            bm.reset_bits();
                            return;
                        }
                        if min > header.min_f64() || max < header.max_f64() {
                            bm.for_each_set_bit(|i| values[i] >= min && values[i] <= max);
                        }
                    }
                    Typed::Ipv4(values) => match to_uint32_range(min, max) {
                        Some((lo, hi))
                            if u64::from(lo) <= header.max_value
                                && u64::from(hi) >= header.min_value =>
                        {
                            bm.for_each_set_bit(|i| (lo..=hi).contains(&values[i]));
                        }
                        _ => bm.reset_bits(),
                    },
                }
            }
        }
    }
}

impl fmt::Display for RangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.min_inclusive { '[' } else { '(' };
        let close = if self.max_inclusive { ']' } else { ')' };
        write!(
            f,
            "{}range{open}{}, {}{close}",
            quote_field_name_if_needed(&self.field),
            self.min,
            self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::block::BlockBuilder;
    use crate::column::ValueType;
    use crate::filter::test_util::assert_rows;
    use crate::filter::Filter;

    fn block() -> crate::BlockSearch {
        BlockBuilder::new(vec![1_000_000_000, 2_000_000_000, 3_000_000_000, 4_000_000_000])
            .column_as("u", ["1", "5", "10", "300"], ValueType::Uint16)
            .column_as("i", ["-10", "-1", "0", "7"], ValueType::Int64)
            .column_as("fl", ["-1.5", "0.5", "2.25", "100"], ValueType::Float64)
            .column_as("ip", ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"], ValueType::Ipv4)
            .column("s", ["1", "x", "2.5", "-3"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_range_inclusive() {
        let bs = block();
        assert_rows(&Filter::range("u", 5.0, 10.0), &bs, &[1, 2]);
        assert_rows(&Filter::range("u", 0.0, 1000.0), &bs, &[0, 1, 2, 3]);
        assert_rows(&Filter::range("u", 1.5, 9.5), &bs, &[1]);
        assert_rows(&Filter::range("u", -5.0, -1.0), &bs, &[]);
        assert_rows(&Filter::range("i", -5.0, 0.0), &bs, &[1, 2]);
        assert_rows(&Filter::range("fl", 0.0, 2.25), &bs, &[1, 2]);
        assert_rows(&Filter::range("s", 1.0, 3.0), &bs, &[0, 2]);
        assert_rows(&Filter::range("_time", 2e9, 3e9), &bs, &[1, 2]);
        assert_rows(&Filter::range("ip", 167_772_162.0, 167_772_163.0), &bs, &[1, 2]);
        assert_rows(&Filter::range("missing", f64::NEG_INFINITY, f64::INFINITY), &bs, &[]);
    }

    #[test]
    fn test_range_boundaries() {
        let bs = block();
        let half_open = Filter::range_with_bounds("u", 5.0, false, 5.0, true);
        assert_rows(&half_open, &bs, &[]);
        assert_rows(&Filter::range_with_bounds("u", 5.0, true, 5.0, true), &bs, &[1]);
        assert_rows(&Filter::range_with_bounds("u", 1.0, false, 10.0, false), &bs, &[1]);
        assert_rows(&Filter::range_with_bounds("fl", 0.5, false, 100.0, true), &bs, &[2, 3]);
        assert_rows(&Filter::range("u", 10.0, 5.0), &bs, &[]);
        assert_rows(&Filter::range("s", 3.0, 1.0), &bs, &[]);
    }

    #[test]
    fn test_range_render() {
        assert_eq!(Filter::range("x", 1.0, 2.5).to_string(), "x:range[1, 2.5]");
        assert_eq!(
            Filter::range_with_bounds("", 1.0, false, 5.0, false).to_string(),
            "range(1, 5)"
        );
    }
}
