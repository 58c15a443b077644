//! Filters over log blocks.
//!
//! A [`Filter`] narrows a bitmap of candidate rows. It can run against a
//! persisted [`BlockSearch`], where column summaries and bloom filters let it
//! skip whole columns, or against an in-memory [`BlockResult`]. Both entry
//! points select the same rows for the same data.
//!
//! ```
//! use logsift_core::{BlockBuilder, Filter};
//!
//! let block = BlockBuilder::new(vec![1, 2, 3])
//!     .column("level", ["info", "error", "info"])
//!     .build()
//!     .unwrap();
//! let f = Filter::and([Filter::exact("level", "info"), Filter::not(Filter::noop())]);
//! assert!(f.search_block(&block).is_zero());
//! ```

mod and;
mod any_case;
mod column;
mod contains;
mod day_range;
mod exact;
mod exact_prefix;
mod field_compare;
mod in_values;
mod ipv4_range;
mod len_range;
mod matchers;
mod noop;
mod not;
mod or;
mod phrase;
mod prefix;
mod range;
mod regexp;
mod render;
mod sequence;
mod stream;
mod stream_id;
mod string_range;
mod time;
mod value_type;
mod week_range;

use std::collections::BTreeSet;
use std::fmt;

use chrono::Weekday;

use crate::bitmap::Bitmap;
use crate::block::{canonical_field_name, BlockResult, BlockSearch, STREAM_ID_FIELD, TIME_FIELD};
use crate::error::Result;
use crate::stream::{QueryContext, StreamId, StreamSelector};

use column::{ColumnFilter, ColumnView};

pub use and::AndFilter;
pub use any_case::{AnyCasePhraseFilter, AnyCasePrefixFilter};
pub use contains::{ContainsAllFilter, ContainsAnyFilter};
pub use day_range::DayRangeFilter;
pub use exact::ExactFilter;
pub use exact_prefix::ExactPrefixFilter;
pub use field_compare::{EqFieldFilter, LeFieldFilter};
pub use in_values::InFilter;
pub use ipv4_range::Ipv4RangeFilter;
pub use len_range::LenRangeFilter;
pub use noop::NoopFilter;
pub use not::NotFilter;
pub use or::OrFilter;
pub use phrase::PhraseFilter;
pub use prefix::PrefixFilter;
pub use range::RangeFilter;
pub use regexp::RegexpFilter;
pub use sequence::SequenceFilter;
pub use stream::StreamFilter;
pub use stream_id::StreamIdFilter;
pub use string_range::StringRangeFilter;
pub use time::TimeFilter;
pub use value_type::ValueTypeFilter;
pub use week_range::WeekRangeFilter;

/// A node of a filter tree.
#[derive(Debug, Clone)]
pub enum Filter {
    Noop(NoopFilter),
    And(AndFilter),
    Or(OrFilter),
    Not(NotFilter),
    Stream(StreamFilter),
    StreamId(StreamIdFilter),
    Time(TimeFilter),
    DayRange(DayRangeFilter),
    WeekRange(WeekRangeFilter),
    ValueType(ValueTypeFilter),
    Phrase(PhraseFilter),
    Prefix(PrefixFilter),
    AnyCasePhrase(AnyCasePhraseFilter),
    AnyCasePrefix(AnyCasePrefixFilter),
    Sequence(SequenceFilter),
    Exact(ExactFilter),
    ExactPrefix(ExactPrefixFilter),
    Range(RangeFilter),
    StringRange(StringRangeFilter),
    LenRange(LenRangeFilter),
    Ipv4Range(Ipv4RangeFilter),
    In(InFilter),
    ContainsAny(ContainsAnyFilter),
    ContainsAll(ContainsAllFilter),
    Regexp(RegexpFilter),
    LeField(LeFieldFilter),
    EqField(EqFieldFilter),
}

impl Filter {
    /// Narrow `bm` to the rows of `bs` matching the filter.
    ///
    /// # Panics
    ///
    /// Panics if `bm` does not have one bit per row, or if a stream filter
    /// has not been prepared.
    pub fn apply_to_block_search(&self, bs: &BlockSearch, bm: &mut Bitmap) {
        check_bitmap_len(bm, bs.rows_count(), bs.location());
        match self {
            Filter::Noop(_) => {}
            Filter::And(f) => f.apply_to_block_search(bs, bm),
            Filter::Or(f) => f.apply_to_block_search(bs, bm),
            Filter::Not(f) => f.apply_to_block_search(bs, bm),
            Filter::Stream(f) => f.apply_to_block_search(bs, bm),
            Filter::StreamId(f) => f.apply_to_block_search(bs, bm),
            Filter::Time(f) => f.apply_to_block_search(bs, bm),
            Filter::DayRange(f) => f.apply_to_block_search(bs, bm),
            Filter::WeekRange(f) => f.apply_to_block_search(bs, bm),
            Filter::LeField(f) => f.apply_to_columns(
                &ColumnView::from_search(bs, f.field()),
                &ColumnView::from_search(bs, f.other()),
                bm,
            ),
            Filter::EqField(f) => f.apply_to_columns(
                &ColumnView::from_search(bs, f.field()),
                &ColumnView::from_search(bs, f.other()),
                bm,
            ),
            leaf => {
                if let Some(f) = leaf.column_filter() {
                    f.apply_to_column(&ColumnView::from_search(bs, f.field_name()), bm);
                }
            }
        }
    }

    /// Narrow `bm` to the rows of `br` matching the filter.
    ///
    /// # Panics
    ///
    /// Same as [`apply_to_block_search`](Filter::apply_to_block_search).
    pub fn apply_to_block_result(&self, br: &BlockResult, bm: &mut Bitmap) {
        check_bitmap_len(bm, br.rows_count(), "block result");
        match self {
            Filter::Noop(_) => {}
            Filter::And(f) => f.apply_to_block_result(br, bm),
            Filter::Or(f) => f.apply_to_block_result(br, bm),
            Filter::Not(f) => f.apply_to_block_result(br, bm),
            Filter::Stream(f) => f.apply_to_block_result(br, bm),
            Filter::StreamId(f) => f.apply_to_block_result(br, bm),
            Filter::Time(f) => f.apply_to_block_result(br, bm),
            Filter::DayRange(f) => f.apply_to_block_result(br, bm),
            Filter::WeekRange(f) => f.apply_to_block_result(br, bm),
            Filter::LeField(f) => f.apply_to_columns(
                &ColumnView::from_result(br, f.field()),
                &ColumnView::from_result(br, f.other()),
                bm,
            ),
            Filter::EqField(f) => f.apply_to_columns(
                &ColumnView::from_result(br, f.field()),
                &ColumnView::from_result(br, f.other()),
                bm,
            ),
            leaf => {
                if let Some(f) = leaf.column_filter() {
                    f.apply_to_column(&ColumnView::from_result(br, f.field_name()), bm);
                }
            }
        }
    }

    /// Rows of `bs` matching the filter.
    pub fn search_block(&self, bs: &BlockSearch) -> Bitmap {
        let mut bm = Bitmap::new_all_set(bs.rows_count());
        self.apply_to_block_search(bs, &mut bm);
        bm
    }

    /// Rows of `br` matching the filter.
    pub fn filter_result(&self, br: &BlockResult) -> Bitmap {
        let mut bm = Bitmap::new_all_set(br.rows_count());
        self.apply_to_block_result(br, &mut bm);
        bm
    }

    /// Resolve per-query state, such as the stream IDs behind stream
    /// selectors. Call once per query before applying the filter.
    pub fn prepare(&mut self, ctx: &QueryContext) -> Result<()> {
        match self {
            Filter::And(f) => f.prepare(ctx),
            Filter::Or(f) => f.prepare(ctx),
            Filter::Not(f) => f.prepare(ctx),
            Filter::Stream(f) => f.prepare(ctx),
            _ => Ok(()),
        }
    }

    /// Add the fields the filter reads to `fields`.
    pub fn update_needed_fields(&self, fields: &mut BTreeSet<String>) {
        match self {
            Filter::Noop(_) => {}
            Filter::And(f) => f.filters().iter().for_each(|f| f.update_needed_fields(fields)),
            Filter::Or(f) => f.filters().iter().for_each(|f| f.update_needed_fields(fields)),
            Filter::Not(f) => f.filter().update_needed_fields(fields),
            Filter::Stream(_) | Filter::StreamId(_) => {
                fields.insert(STREAM_ID_FIELD.to_string());
            }
            Filter::Time(_) | Filter::DayRange(_) | Filter::WeekRange(_) => {
                fields.insert(TIME_FIELD.to_string());
            }
            Filter::LeField(f) => {
                fields.insert(canonical_field_name(f.field()).to_string());
                fields.insert(canonical_field_name(f.other()).to_string());
            }
            Filter::EqField(f) => {
                fields.insert(canonical_field_name(f.field()).to_string());
                fields.insert(canonical_field_name(f.other()).to_string());
            }
            leaf => {
                if let Some(f) = leaf.column_filter() {
                    fields.insert(canonical_field_name(f.field_name()).to_string());
                }
            }
        }
    }

    /// Fields the filter reads.
    pub fn needed_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.update_needed_fields(&mut fields);
        fields
    }

    /// The filter as a single-field leaf, if it is one.
    fn column_filter(&self) -> Option<&dyn ColumnFilter> {
        match self {
            Filter::ValueType(f) => Some(f),
            Filter::Phrase(f) => Some(f),
            Filter::Prefix(f) => Some(f),
            Filter::AnyCasePhrase(f) => Some(f),
            Filter::AnyCasePrefix(f) => Some(f),
            Filter::Sequence(f) => Some(f),
            Filter::Exact(f) => Some(f),
            Filter::ExactPrefix(f) => Some(f),
            Filter::Range(f) => Some(f),
            Filter::StringRange(f) => Some(f),
            Filter::LenRange(f) => Some(f),
            Filter::Ipv4Range(f) => Some(f),
            Filter::In(f) => Some(f),
            Filter::ContainsAny(f) => Some(f),
            Filter::ContainsAll(f) => Some(f),
            Filter::Regexp(f) => Some(f),
            Filter::Noop(_)
            | Filter::And(_)
            | Filter::Or(_)
            | Filter::Not(_)
            | Filter::Stream(_)
            | Filter::StreamId(_)
            | Filter::Time(_)
            | Filter::DayRange(_)
            | Filter::WeekRange(_)
            | Filter::LeField(_)
            | Filter::EqField(_) => None,
        }
    }
}

fn check_bitmap_len(bm: &Bitmap, rows: usize, location: &str) {
    if bm.len() != rows {
        panic!(
            "BUG: {location}: bitmap has {} bits for a block of {rows} rows",
            bm.len()
        );
    }
}

// Constructors.
impl Filter {
    pub fn noop() -> Self {
        Filter::Noop(NoopFilter)
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(AndFilter::new(filters.into_iter().collect()))
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(OrFilter::new(filters.into_iter().collect()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(NotFilter::new(filter))
    }

    pub fn stream(selector: StreamSelector) -> Self {
        Filter::Stream(StreamFilter::new(selector))
    }

    pub fn stream_id(ids: impl IntoIterator<Item = StreamId>) -> Self {
        Filter::StreamId(StreamIdFilter::new(ids))
    }

    /// `_time` within `[min, max]` Unix nanoseconds.
    pub fn time(min: i64, max: i64) -> Self {
        Filter::Time(TimeFilter::new(min, max))
    }

    /// Time of day within `[start, end]` nanoseconds after midnight, after
    /// shifting timestamps by `offset`.
    pub fn day_range(start: i64, end: i64, offset: i64) -> Self {
        Filter::DayRange(DayRangeFilter::new(start, end, offset))
    }

    pub fn week_range(start: Weekday, end: Weekday, offset: i64) -> Self {
        Filter::WeekRange(WeekRangeFilter::new(start, end, offset))
    }

    pub fn value_type(field: impl Into<String>, value_type: &str) -> Result<Self> {
        Ok(Filter::ValueType(ValueTypeFilter::new(field, value_type)?))
    }

    pub fn phrase(field: impl Into<String>, phrase: impl Into<String>) -> Self {
        Filter::Phrase(PhraseFilter::new(field, phrase))
    }

    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Filter::Prefix(PrefixFilter::new(field, prefix))
    }

    pub fn any_case_phrase(field: impl Into<String>, phrase: impl Into<String>) -> Self {
        Filter::AnyCasePhrase(AnyCasePhraseFilter::new(field, phrase))
    }

    pub fn any_case_prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Filter::AnyCasePrefix(AnyCasePrefixFilter::new(field, prefix))
    }

    pub fn sequence<I, S>(field: impl Into<String>, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Sequence(SequenceFilter::new(field, phrases))
    }

    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Exact(ExactFilter::new(field, value))
    }

    pub fn exact_prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Filter::ExactPrefix(ExactPrefixFilter::new(field, prefix))
    }

    /// Numeric range `[min, max]`.
    pub fn range(field: impl Into<String>, min: f64, max: f64) -> Self {
        Filter::Range(RangeFilter::new(field, min, max))
    }

    pub fn range_with_bounds(
        field: impl Into<String>,
        min: f64,
        min_inclusive: bool,
        max: f64,
        max_inclusive: bool,
    ) -> Self {
        Filter::Range(RangeFilter::with_bounds(
            field,
            min,
            min_inclusive,
            max,
            max_inclusive,
        ))
    }

    pub fn string_range(
        field: impl Into<String>,
        min: impl Into<String>,
        max: impl Into<String>,
    ) -> Self {
        Filter::StringRange(StringRangeFilter::new(field, min, max))
    }

    pub fn len_range(field: impl Into<String>, min: u64, max: u64) -> Self {
        Filter::LenRange(LenRangeFilter::new(field, min, max))
    }

    pub fn ipv4_range(field: impl Into<String>, min: &str, max: &str) -> Result<Self> {
        Ok(Filter::Ipv4Range(Ipv4RangeFilter::parse(field, min, max)?))
    }

    pub fn in_values<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::In(InFilter::new(field, values))
    }

    pub fn contains_any<I, S>(field: impl Into<String>, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::ContainsAny(ContainsAnyFilter::new(field, phrases))
    }

    pub fn contains_all<I, S>(field: impl Into<String>, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::ContainsAll(ContainsAllFilter::new(field, phrases))
    }

    pub fn regexp(field: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Filter::Regexp(RegexpFilter::new(field, pattern)?))
    }

    pub fn le_field(field: impl Into<String>, other: impl Into<String>) -> Self {
        Filter::LeField(LeFieldFilter::new(field, other, false))
    }

    pub fn lt_field(field: impl Into<String>, other: impl Into<String>) -> Self {
        Filter::LeField(LeFieldFilter::new(field, other, true))
    }

    pub fn eq_field(field: impl Into<String>, other: impl Into<String>) -> Self {
        Filter::EqField(EqFieldFilter::new(field, other))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Noop(x) => fmt::Display::fmt(x, f),
            Filter::And(x) => fmt::Display::fmt(x, f),
            Filter::Or(x) => fmt::Display::fmt(x, f),
            Filter::Not(x) => fmt::Display::fmt(x, f),
            Filter::Stream(x) => fmt::Display::fmt(x, f),
            Filter::StreamId(x) => fmt::Display::fmt(x, f),
            Filter::Time(x) => fmt::Display::fmt(x, f),
            Filter::DayRange(x) => fmt::Display::fmt(x, f),
            Filter::WeekRange(x) => fmt::Display::fmt(x, f),
            Filter::ValueType(x) => fmt::Display::fmt(x, f),
            Filter::Phrase(x) => fmt::Display::fmt(x, f),
            Filter::Prefix(x) => fmt::Display::fmt(x, f),
            Filter::AnyCasePhrase(x) => fmt::Display::fmt(x, f),
            Filter::AnyCasePrefix(x) => fmt::Display::fmt(x, f),
            Filter::Sequence(x) => fmt::Display::fmt(x, f),
            Filter::Exact(x) => fmt::Display::fmt(x, f),
            Filter::ExactPrefix(x) => fmt::Display::fmt(x, f),
            Filter::Range(x) => fmt::Display::fmt(x, f),
            Filter::StringRange(x) => fmt::Display::fmt(x, f),
            Filter::LenRange(x) => fmt::Display::fmt(x, f),
            Filter::Ipv4Range(x) => fmt::Display::fmt(x, f),
            Filter::In(x) => fmt::Display::fmt(x, f),
            Filter::ContainsAny(x) => fmt::Display::fmt(x, f),
            Filter::ContainsAll(x) => fmt::Display::fmt(x, f),
            Filter::Regexp(x) => fmt::Display::fmt(x, f),
            Filter::LeField(x) => fmt::Display::fmt(x, f),
            Filter::EqField(x) => fmt::Display::fmt(x, f),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;

    #[test]
    fn test_needed_fields() {
        let f = Filter::and([
            Filter::phrase("", "error"),
            Filter::or([Filter::exact("level", "warn"), Filter::time(0, 1)]),
            Filter::not(Filter::le_field("a", "b")),
            Filter::stream_id([]),
        ]);
        let fields: Vec<String> = f.needed_fields().into_iter().collect();
        assert_eq!(fields, ["_msg", "_stream_id", "_time", "a", "b", "level"]);
        assert!(Filter::noop().needed_fields().is_empty());
    }

    #[test]
    #[should_panic(expected = "BUG: memory: bitmap has 2 bits for a block of 3 rows")]
    fn test_bitmap_length_mismatch_panics() {
        let bs = BlockBuilder::new(vec![1, 2, 3]).build().unwrap();
        let mut bm = Bitmap::new_all_set(2);
        Filter::noop().apply_to_block_search(&bs, &mut bm);
    }

    #[test]
    fn test_prepare_recurses() {
        use std::sync::Arc;

        use crate::stream::{MemoryStreamIndex, TagFilter, TenantId};

        let tenant = TenantId::new(0, 0);
        let index = MemoryStreamIndex::new();
        index.register(StreamId::new(tenant, 5), vec![("app".into(), "api".into())]);
        let ctx = QueryContext::new(vec![tenant], Arc::new(index));

        let selector = StreamSelector::all_of(vec![TagFilter::eq("app", "api")]);
        let mut f = Filter::not(Filter::or([Filter::stream(selector), Filter::noop()]));
        f.prepare(&ctx).unwrap();
        let bs = BlockBuilder::new(vec![1])
            .stream_id(StreamId::new(tenant, 5))
            .build()
            .unwrap();
        assert!(f.search_block(&bs).is_zero());
    }
}
