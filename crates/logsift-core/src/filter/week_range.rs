//! `_time:week_range[start, end]`: the day of week lies in a range.

use std::fmt;

use chrono::Weekday;

use crate::bitmap::Bitmap;
use crate::block::{BlockResult, BlockSearch, TIME_FIELD};

use super::column::ColumnView;
use super::time::{format_duration, match_timestamps, time_column, NANOS_PER_DAY};

/// 1970-01-01 was a Thursday.
const EPOCH_WEEKDAY: i64 = 4;

/// Matches rows whose timestamp, shifted by `offset`, falls on a weekday
/// between `start` and `end`, counting from Sunday.
#[derive(Debug, Clone)]
pub struct WeekRangeFilter {
    start: Weekday,
    end: Weekday,
    offset: i64,
}

impl WeekRangeFilter {
    pub fn new(start: Weekday, end: Weekday, offset: i64) -> Self {
        Self { start, end, offset }
    }

    fn matches(&self, ts: i64) -> bool {
        let days = ts.saturating_add(self.offset).div_euclid(NANOS_PER_DAY);
        let weekday = (days + EPOCH_WEEKDAY).rem_euclid(7) as u32;
        weekday >= self.start.num_days_from_sunday() && weekday <= self.end.num_days_from_sunday()
    }

    pub(crate) fn apply_to_block_search(&self, bs: &BlockSearch, bm: &mut Bitmap) {
        self.apply(&ColumnView::Time(bs.timestamps()), bm);
    }

    pub(crate) fn apply_to_block_result(&self, br: &BlockResult, bm: &mut Bitmap) {
        self.apply(&time_column(br), bm);
    }

    fn apply(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        if self.start.num_days_from_sunday() > self.end.num_days_from_sunday() {
            bm.reset_bits();
            return;
        }
        match_timestamps(col, bm, |ts| self.matches(ts));
    }
}

impl fmt::Display for WeekRangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TIME_FIELD}:week_range[{}, {}]", self.start, self.end)?;
        if self.offset != 0 {
            write!(f, " offset {}", format_duration(self.offset))?;
        }
        Ok(())
    }
}
