//! `_time:[min, max]`: the row timestamp lies in an inclusive range.

use std::fmt;
use std::fmt::Write;

use crate::bitmap::Bitmap;
use crate::block::{BlockResult, BlockSearch, TIME_FIELD};
use crate::column::format::timestamp_rfc3339_nano_to_string;
use crate::column::parse::try_parse_timestamp_rfc3339_nano;
use crate::error::{Error, Result};

use super::column::{match_strings, ColumnView, Typed};

pub(crate) const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub(crate) const NANOS_PER_DAY: i64 = 24 * 3600 * NANOS_PER_SECOND;

#[derive(Debug, Clone)]
pub struct TimeFilter {
    min: i64,
    max: i64,
}

impl TimeFilter {
    /// Range of Unix nanoseconds, both ends included.
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Range between two RFC3339 timestamps.
    pub fn parse(min: &str, max: &str) -> Result<Self> {
        let parse = |s: &str| {
            try_parse_timestamp_rfc3339_nano(s)
                .ok_or_else(|| Error::InvalidFilter(format!("invalid timestamp {s:?}")))
        };
        Ok(Self::new(parse(min)?, parse(max)?))
    }

    pub fn min_timestamp(&self) -> i64 {
        self.min
    }

    pub fn max_timestamp(&self) -> i64 {
        self.max
    }

    pub(crate) fn apply_to_block_search(&self, bs: &BlockSearch, bm: &mut Bitmap) {
        let (min, max) = (self.min, self.max);
        if min > max || max < bs.min_timestamp() || min > bs.max_timestamp() {
            bm.reset_bits();
            return;
        }
        if min <= bs.min_timestamp() && max >= bs.max_timestamp() {
            return;
        }
        let timestamps = bs.timestamps();
        bm.for_each_set_bit(|i| (min..=max).contains(&timestamps[i]));
    }

    pub(crate) fn apply_to_block_result(&self, br: &BlockResult, bm: &mut Bitmap) {
        let (min, max) = (self.min, self.max);
        if min > max {
            bm.reset_bits();
            return;
        }
        match_timestamps(&time_column(br), bm, |ts| (min..=max).contains(&ts));
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{TIME_FIELD}:[{}, {}]",
            timestamp_rfc3339_nano_to_string(self.min),
            timestamp_rfc3339_nano_to_string(self.max)
        )
    }
}

/// The `_time` column of a block result. Results without one fall back to
/// the row timestamps.
pub(crate) fn time_column(br: &BlockResult) -> ColumnView<'_> {
    match ColumnView::from_result(br, TIME_FIELD) {
        ColumnView::Missing => ColumnView::Time(br.timestamps()),
        col => col,
    }
}

/// Narrow `bm` to rows whose timestamp satisfies `f`. Values that do not
/// parse as timestamps never match.
pub(crate) fn match_timestamps(col: &ColumnView<'_>, bm: &mut Bitmap, f: impl Fn(i64) -> bool) {
    match col {
        ColumnView::Time(timestamps) => bm.for_each_set_bit(|i| f(timestamps[i])),
        ColumnView::Encoded(ev) => match ev.typed() {
            Typed::Iso8601(values) => bm.for_each_set_bit(|i| f(values[i])),
            _ => ev.match_strings(bm, |s| try_parse_timestamp_rfc3339_nano(s).is_some_and(&f)),
        },
        ColumnView::Missing | ColumnView::Const(_) => {
            match_strings(col, bm, |s| try_parse_timestamp_rfc3339_nano(s).is_some_and(&f))
        }
    }
}

/// `hh:mm`, with seconds and a fraction only when present.
pub(crate) fn format_day_time(nanos: i64) -> String {
    let secs = nanos.div_euclid(NANOS_PER_SECOND);
    let frac = nanos.rem_euclid(NANOS_PER_SECOND);
    let mut s = format!("{:02}:{:02}", secs / 3600, secs / 60 % 60);
    if secs % 60 != 0 || frac != 0 {
        let _ = write!(s, ":{:02}", secs % 60);
    }
    if frac != 0 {
        let digits = format!("{frac:09}");
        s.push('.');
        s.push_str(digits.trim_end_matches('0'));
    }
    s
}

/// Compact duration such as `2h30m` or `-90s`.
pub(crate) fn format_duration(nanos: i64) -> String {
    if nanos == 0 {
        return "0s".to_string();
    }
    let mut s = String::new();
    if nanos < 0 {
        s.push('-');
    }
    let abs = nanos.unsigned_abs();
    let secs = abs / NANOS_PER_SECOND as u64;
    let frac = abs % NANOS_PER_SECOND as u64;
    let parts = [
        (secs / 86400, "d"),
        (secs / 3600 % 24, "h"),
        (secs / 60 % 60, "m"),
        (secs % 60, "s"),
    ];
    for (n, unit) in parts {
        if n != 0 {
            let _ = write!(s, "{n}{unit}");
        }
    }
    if frac != 0 {
        let _ = write!(s, "{frac}ns");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;
    use crate::column::ValueType;
    use crate::filter::test_util::assert_rows;
    use crate::filter::Filter;

    const SEC: i64 = NANOS_PER_SECOND;

    #[test]
    fn test_time_filter() {
        let bs = BlockBuilder::new(vec![SEC, 2 * SEC, 3 * SEC, 4 * SEC])
            .build()
            .unwrap();
        assert_rows(&Filter::time(2 * SEC, 3 * SEC), &bs, &[1, 2]);
        assert_rows(&Filter::time(0, 10 * SEC), &bs, &[0, 1, 2, 3]);
        assert_rows(&Filter::time(5 * SEC, 10 * SEC), &bs, &[]);
        assert_rows(&Filter::time(3 * SEC, 2 * SEC), &bs, &[]);
        assert_rows(&Filter::time(4 * SEC, 4 * SEC), &bs, &[3]);
    }

    #[test]
    fn test_time_filter_on_result_columns() {
        let mut br = BlockResult::new(vec![0, 0, 0]);
        br.add_string_column(
            TIME_FIELD,
            ["1970-01-01T00:00:01Z", "garbage", "1970-01-01T00:00:05.5+00:00"],
        )
        .unwrap();
        let f = Filter::time(SEC, 6 * SEC);
        assert_eq!(f.filter_result(&br).to_indices(), vec![0, 2]);

        let br = BlockResult::new(vec![SEC, 7 * SEC]);
        assert_eq!(f.filter_result(&br).to_indices(), vec![0]);
    }

    #[test]
    fn test_match_timestamps_iso8601() {
        let bs = BlockBuilder::new(vec![1, 2])
            .column_as(
                "ts",
                ["2024-01-01T00:00:00.000Z", "2024-01-02T00:00:00.000Z"],
                ValueType::TimestampIso8601,
            )
            .build()
            .unwrap();
        let col = ColumnView::from_search(&bs, "ts");
        let mut bm = Bitmap::new_all_set(2);
        let cutoff = try_parse_timestamp_rfc3339_nano("2024-01-01T12:00:00Z").unwrap();
        match_timestamps(&col, &mut bm, |ts| ts > cutoff);
        assert_eq!(bm.to_indices(), vec![1]);
    }

    #[test]
    fn test_time_render() {
        let f = TimeFilter::parse("2024-01-01T00:00:00Z", "2024-01-01T00:00:00.5Z").unwrap();
        assert_eq!(
            f.to_string(),
            "_time:[2024-01-01T00:00:00Z, 2024-01-01T00:00:00.5Z]"
        );
        assert!(TimeFilter::parse("yesterday", "today").is_err());
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_day_time(0), "00:00");
        assert_eq!(format_day_time(8 * 3600 * SEC + 30 * 60 * SEC), "08:30");
        assert_eq!(format_day_time(61 * SEC + SEC / 2), "00:01:01.5");
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(2 * 3600 * SEC + 30 * 60 * SEC), "2h30m");
        assert_eq!(format_duration(-90 * SEC), "-1m30s");
    }
}
