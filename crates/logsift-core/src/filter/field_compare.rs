//! Row-by-row comparison of two fields: `le_field`, `lt_field`, `eq_field`.

use std::fmt;

use crate::bitmap::{with_scratch_buffer, Bitmap};

use super::column::{ColumnView, Typed};
use super::matchers::less_value;
use super::render::{quote_field_name_if_needed, quote_token_if_needed};

/// `field <= other`, or `field < other` with `exclude_equal`.
///
/// Values compare numerically when both sides parse as the same kind of
/// number and byte-wise otherwise. A missing field reads as "".
#[derive(Debug, Clone)]
pub struct LeFieldFilter {
    field: String,
    other: String,
    exclude_equal: bool,
}

impl LeFieldFilter {
    pub fn new(field: impl Into<String>, other: impl Into<String>, exclude_equal: bool) -> Self {
        Self {
            field: field.into(),
            other: other.into(),
            exclude_equal,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn other(&self) -> &str {
        &self.other
    }

    pub(crate) fn apply_to_columns(&self, a: &ColumnView<'_>, b: &ColumnView<'_>, bm: &mut Bitmap) {
        let exclude_equal = self.exclude_equal;
        if let (ColumnView::Encoded(x), ColumnView::Encoded(y)) = (a, b) {
            match (x.typed(), y.typed()) {
                (Typed::Uint(xs), Typed::Uint(ys)) => {
                    bm.for_each_set_bit(|i| less_or_equal(xs.get(i), ys.get(i), exclude_equal));
                    return;
                }
                (Typed::Int64(xs), Typed::Int64(ys)) | (Typed::Iso8601(xs), Typed::Iso8601(ys)) => {
                    bm.for_each_set_bit(|i| less_or_equal(xs[i], ys[i], exclude_equal));
                    return;
                }
                _ => {}
            }
        }
        compare_rows(a, b, bm, |x, y| {
            if x == y {
                !exclude_equal
            } else {
                less_value(x, y)
            }
        });
    }
}

fn less_or_equal<T: PartialOrd>(x: T, y: T, exclude_equal: bool) -> bool {
    if exclude_equal {
        x < y
    } else {
        x <= y
    }
}

impl fmt::Display for LeFieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.exclude_equal { "lt_field" } else { "le_field" };
        write!(
            f,
            "{}{name}({})",
            quote_field_name_if_needed(&self.field),
            quote_token_if_needed(&self.other)
        )
    }
}

/// `field == other`, comparing string forms.
#[derive(Debug, Clone)]
pub struct EqFieldFilter {
    field: String,
    other: String,
}

impl EqFieldFilter {
    pub fn new(field: impl Into<String>, other: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            other: other.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn other(&self) -> &str {
        &self.other
    }

    pub(crate) fn apply_to_columns(&self, a: &ColumnView<'_>, b: &ColumnView<'_>, bm: &mut Bitmap) {
        if let (ColumnView::Encoded(x), ColumnView::Encoded(y)) = (a, b) {
            match (x.typed(), y.typed()) {
                (Typed::Uint(xs), Typed::Uint(ys)) => {
                    bm.for_each_set_bit(|i| xs.get(i) == ys.get(i));
                    return;
                }
                (Typed::Int64(xs), Typed::Int64(ys)) | (Typed::Iso8601(xs), Typed::Iso8601(ys)) => {
                    bm.for_each_set_bit(|i| xs[i] == ys[i]);
                    return;
                }
                (Typed::Ipv4(xs), Typed::Ipv4(ys)) => {
                    bm.for_each_set_bit(|i| xs[i] == ys[i]);
                    return;
                }
                _ => {}
            }
        }
        compare_rows(a, b, bm, |x, y| x == y);
    }
}

impl fmt::Display for EqFieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}eq_field({})",
            quote_field_name_if_needed(&self.field),
            quote_token_if_needed(&self.other)
        )
    }
}

/// Narrow `bm` to rows where `f` holds for the string forms of both columns.
fn compare_rows(
    a: &ColumnView<'_>,
    b: &ColumnView<'_>,
    bm: &mut Bitmap,
    f: impl Fn(&str, &str) -> bool,
) {
    if let (Some(x), Some(y)) = (a.const_value(), b.const_value()) {
        if !f(x, y) {
            bm.reset_bits();
        }
        return;
    }
    with_scratch_buffer(|left| {
        with_scratch_buffer(|right| {
            bm.for_each_set_bit(|i| {
                left.clear();
                right.clear();
                a.write_row(i, left);
                b.write_row(i, right);
                f(left, right)
            })
        })
    });
}
