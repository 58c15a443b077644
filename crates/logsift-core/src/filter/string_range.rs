//! `string_range(min, max)`: `min <= value < max`, compared byte-wise.

use std::fmt;

use crate::bitmap::Bitmap;

use super::column::{match_strings, ColumnFilter, ColumnView, Typed};
use super::matchers::match_string_range;
use super::render::{quote_field_name_if_needed, quote_token_if_needed};

#[derive(Debug, Clone)]
pub struct StringRangeFilter {
    field: String,
    min: String,
    max: String,
}

impl StringRangeFilter {
    pub fn new(field: impl Into<String>, min: impl Into<String>, max: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    /// Whether some string starting with a byte in `first..=b'9'` can fall in
    /// the range.
    fn may_hold_numbers(&self, first: &str) -> bool {
        let above_digits = self.min.bytes().next().is_some_and(|b| b > b'9');
        !above_digits && self.max.as_str() >= first
    }
}

impl ColumnFilter for StringRangeFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let (min, max) = (self.min.as_str(), self.max.as_str());
        if min >= max {
            bm.reset_bits();
            return;
        }
        if let ColumnView::Encoded(ev) = col {
            let candidates = match ev.typed() {
                Typed::String(_) | Typed::Dict(_) => true,
                Typed::Uint(_) | Typed::Ipv4(_) | Typed::Iso8601(_) => self.may_hold_numbers("0"),
                Typed::Int64(_) | Typed::Float64(_) => self.may_hold_numbers("+"),
            };
            if !candidates {
                bm.reset_bits();
                return;
            }
        }
        match_strings(col, bm, |s| match_string_range(s, min, max));
    }
}

impl fmt::Display for StringRangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}string_range({}, {})",
            quote_field_name_if_needed(&self.field),
            quote_token_if_needed(&self.min),
            quote_token_if_needed(&self.max)
        )
    }
}
