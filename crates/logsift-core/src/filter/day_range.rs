//! `_time:day_range[start, end]`: the time of day lies in a range.

use std::fmt;

use crate::bitmap::Bitmap;
use crate::block::{BlockResult, BlockSearch, TIME_FIELD};

use super::column::ColumnView;
use super::time::{format_day_time, format_duration, match_timestamps, time_column, NANOS_PER_DAY};

/// Matches rows whose timestamp, shifted by `offset`, falls between `start`
/// and `end` nanoseconds after midnight, both ends included.
#[derive(Debug, Clone)]
pub struct DayRangeFilter {
    start: i64,
    end: i64,
    offset: i64,
}

impl DayRangeFilter {
    pub fn new(start: i64, end: i64, offset: i64) -> Self {
        Self { start, end, offset }
    }

    fn matches(&self, ts: i64) -> bool {
        let t = ts.saturating_add(self.offset).rem_euclid(NANOS_PER_DAY);
        t >= self.start && t <= self.end
    }

    fn is_empty(&self) -> bool {
        self.start > self.end || self.end < 0 || self.start >= NANOS_PER_DAY
    }

    pub(crate) fn apply_to_block_search(&self, bs: &BlockSearch, bm: &mut Bitmap) {
        self.apply(&ColumnView::Time(bs.timestamps()), bm);
    }

    pub(crate) fn apply_to_block_result(&self, br: &BlockResult, bm: &mut Bitmap) {
        self.apply(&time_column(br), bm);
    }

    fn apply(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        if self.is_empty() {
            bm.reset_bits();
            return;
        }
        match_timestamps(col, bm, |ts| self.matches(ts));
    }
}

impl fmt::Display for DayRangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{TIME_FIELD}:day_range[{}, {}]",
            format_day_time(self.start),
            format_day_time(self.end)
        )?;
        if self.offset != 0 {
            write!(f, " offset {}", format_duration(self.offset))?;
        }
        Ok(())
    }
}
