//! `word*`: the value holds a word starting with the prefix.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::bitmap::Bitmap;
use crate::column::parse::try_parse_uint64;
use crate::tokenizer::{hash_tokens, tokens_skip_last};

use super::column::{match_time_strings, ColumnFilter, ColumnView, EncodedView, Typed};
use super::matchers::match_prefix;
use super::render::{quote_field_name_if_needed, quote_token_if_needed};

#[derive(Debug, Clone)]
pub struct PrefixFilter {
    field: String,
    prefix: String,
    hashes: OnceCell<Vec<u64>>,
}

impl PrefixFilter {
    pub fn new(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            prefix: prefix.into(),
            hashes: OnceCell::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn hashes(&self) -> &[u64] {
        self.hashes
            .get_or_init(|| hash_tokens(&tokens_skip_last(&self.prefix)))
    }
}

impl ColumnFilter for PrefixFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        match_prefix_column(col, bm, &self.prefix, self.hashes(), "prefix");
    }
}

impl fmt::Display for PrefixFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = quote_field_name_if_needed(&self.field);
        if self.prefix.is_empty() {
            return write!(f, "{field}*");
        }
        write!(f, "{field}{}*", quote_token_if_needed(&self.prefix))
    }
}

/// Narrow `bm` to rows of `col` holding a word that starts with `prefix`.
/// `hashes` are the hashes of the prefix's complete tokens.
pub(crate) fn match_prefix_column(
    col: &ColumnView<'_>,
    bm: &mut Bitmap,
    prefix: &str,
    hashes: &[u64],
    filter: &'static str,
) {
    match col {
        ColumnView::Missing | ColumnView::Const(_) => {
            if !match_prefix(col.const_value().unwrap_or_default(), prefix) {
                bm.reset_bits();
            }
        }
        // Timestamps and typed values are never empty.
        ColumnView::Time(_) | ColumnView::Encoded(_) if prefix.is_empty() => {}
        ColumnView::Time(timestamps) => {
            match_time_strings(timestamps, bm, |s| match_prefix(s, prefix))
        }
        ColumnView::Encoded(ev) => match_prefix_encoded(ev, bm, prefix, hashes, filter),
    }
}

fn match_prefix_encoded(
    ev: &EncodedView<'_>,
    bm: &mut Bitmap,
    prefix: &str,
    hashes: &[u64],
    filter: &'static str,
) {
    let candidates = match ev.typed() {
        Typed::String(_) | Typed::Int64(_) | Typed::Iso8601(_) => true,
        Typed::Dict(ids) => {
            ev.match_dict(ids, bm, |v| match_prefix(v, prefix));
            return;
        }
        // A word of a decimal string is the whole value, and it is at least
        // as large as any of its prefixes.
        Typed::Uint(_) => try_parse_uint64(prefix).is_some_and(|n| n <= ev.header.max_value),
        Typed::Float64(_) => prefix
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b'.' || b == b'-'),
        Typed::Ipv4(_) => prefix.bytes().all(|b| b.is_ascii_digit() || b == b'.'),
    };
    if !candidates || !ev.bloom_contains_all(hashes, filter) {
        bm.reset_bits();
        return;
    }
    ev.match_strings(bm, |s| match_prefix(s, prefix));
}

#[cfg(test)]
mod tests {
    use crate::block::BlockBuilder;
    use crate::column::ValueType;
    use crate::filter::test_util::assert_rows;
    use crate::filter::Filter;

    #[test]
    fn test_prefix_strings() {
        let bs = BlockBuilder::new(vec![1, 2, 3])
            .column("field", ["foo", "bar", "foobar"])
            .build()
            .unwrap();
        assert_rows(&Filter::prefix("field", "foo"), &bs, &[0, 2]);
        assert_rows(&Filter::prefix("field", "ba"), &bs, &[1]);
        assert_rows(&Filter::prefix("field", "oo"), &bs, &[]);
        assert_rows(&Filter::prefix("field", ""), &bs, &[0, 1, 2]);
        assert_rows(&Filter::prefix("missing", ""), &bs, &[]);
    }

    #[test]
    fn test_prefix_message_words() {
        let bs = BlockBuilder::new(vec![1, 2, 3])
            .column(
                "",
                ["connection refused by peer", "refusing to start", "ok"],
            )
            .build()
            .unwrap();
        assert_rows(&Filter::prefix("", "refus"), &bs, &[0, 1]);
        assert_rows(&Filter::prefix("", "refused by p"), &bs, &[0]);
        assert_rows(&Filter::prefix("", "to st"), &bs, &[1]);
    }

    #[test]
    fn test_prefix_typed() {
        let bs = BlockBuilder::new(vec![1, 2, 3])
            .column_as("u", ["12", "123", "40"], ValueType::Uint8)
            .column_as("ip", ["10.0.0.1", "10.1.0.5", "192.168.0.1"], ValueType::Ipv4)
            .column_as("fl", ["1.5", "-2.25", "15"], ValueType::Float64)
            .build()
            .unwrap();
        assert_rows(&Filter::prefix("u", "12"), &bs, &[0, 1]);
        assert_rows(&Filter::prefix("u", "500"), &bs, &[]);
        assert_rows(&Filter::prefix("u", "x"), &bs, &[]);
        assert_rows(&Filter::prefix("u", ""), &bs, &[0, 1, 2]);
        assert_rows(&Filter::prefix("ip", "10.0"), &bs, &[0]);
        assert_rows(&Filter::prefix("ip", "1"), &bs, &[0, 1, 2]);
        assert_rows(&Filter::prefix("ip", "10.x"), &bs, &[]);
        assert_rows(&Filter::prefix("fl", "2"), &bs, &[1]);
        assert_rows(&Filter::prefix("fl", "1"), &bs, &[0, 2]);
    }

    #[test]
    fn test_prefix_render() {
        assert_eq!(Filter::prefix("field", "foo").to_string(), "field:foo*");
        assert_eq!(Filter::prefix("", "").to_string(), "*");
        assert_eq!(Filter::prefix("", "a b").to_string(), r#""a b"*"#);
    }
}
