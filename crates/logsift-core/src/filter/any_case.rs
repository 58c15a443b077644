//! `i(word)` and `i(word*)`: case-insensitive phrase and prefix.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::bitmap::Bitmap;
use crate::tokenizer::{hash_tokens, tokenize, tokens_skip_last};

use super::column::{match_time_strings, ColumnFilter, ColumnView, Typed};
use super::matchers::{match_any_case_phrase, match_any_case_prefix, match_phrase, match_prefix};
use super::phrase::match_phrase_column;
use super::prefix::match_prefix_column;
use super::render::{quote_field_name_if_needed, quote_token_if_needed};

/// Operand variants computed once per filter.
#[derive(Debug, Clone)]
struct CaseVariants {
    lower: String,
    lower_hashes: Vec<u64>,
    /// Used for timestamps, whose canonical forms are upper case.
    upper: String,
    upper_hashes: Vec<u64>,
}

impl CaseVariants {
    fn new(operand: &str, tokens: fn(&str) -> Vec<String>) -> Self {
        let lower = operand.to_lowercase();
        let upper = operand.to_uppercase();
        Self {
            lower_hashes: hash_tokens(&tokens(&lower)),
            upper_hashes: hash_tokens(&tokens(&upper)),
            lower,
            upper,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnyCasePhraseFilter {
    field: String,
    phrase: String,
    variants: OnceCell<CaseVariants>,
}

impl AnyCasePhraseFilter {
    pub fn new(field: impl Into<String>, phrase: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            phrase: phrase.into(),
            variants: OnceCell::new(),
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    fn variants(&self) -> &CaseVariants {
        self.variants
            .get_or_init(|| CaseVariants::new(&self.phrase, tokenize))
    }
}

impl ColumnFilter for AnyCasePhraseFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let v = self.variants();
        match col {
            ColumnView::Missing | ColumnView::Const(_) => {
                if !match_any_case_phrase(col.const_value().unwrap_or_default(), &v.lower) {
                    bm.reset_bits();
                }
            }
            ColumnView::Time(timestamps) => {
                match_time_strings(timestamps, bm, |s| match_phrase(s, &v.upper))
            }
            ColumnView::Encoded(ev) => match ev.typed() {
                Typed::String(values) => {
                    if !has_cased_chars(&self.phrase)
                        && !ev.bloom_contains_all(&v.lower_hashes, "any_case_phrase")
                    {
                        bm.reset_bits();
                        return;
                    }
                    bm.for_each_set_bit(|i| match_any_case_phrase(&values[i], &v.lower));
                }
                Typed::Dict(ids) => ev.match_dict(ids, bm, |s| match_any_case_phrase(s, &v.lower)),
                Typed::Iso8601(_) => {
                    match_phrase_column(col, bm, &v.upper, &v.upper_hashes, "any_case_phrase")
                }
                // Numeric canonical forms hold no letters.
                Typed::Uint(_) | Typed::Int64(_) | Typed::Float64(_) | Typed::Ipv4(_) => {
                    match_phrase_column(col, bm, &v.lower, &v.lower_hashes, "any_case_phrase")
                }
            },
        }
    }
}

impl fmt::Display for AnyCasePhraseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}i({})",
            quote_field_name_if_needed(&self.field),
            quote_token_if_needed(&self.phrase)
        )
    }
}

#[derive(Debug, Clone)]
pub struct AnyCasePrefixFilter {
    field: String,
    prefix: String,
    variants: OnceCell<CaseVariants>,
}

impl AnyCasePrefixFilter {
    pub fn new(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            prefix: prefix.into(),
            variants: OnceCell::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn variants(&self) -> &CaseVariants {
        self.variants
            .get_or_init(|| CaseVariants::new(&self.prefix, tokens_skip_last))
    }
}

impl ColumnFilter for AnyCasePrefixFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let v = self.variants();
        match col {
            ColumnView::Missing | ColumnView::Const(_) => {
                if !match_any_case_prefix(col.const_value().unwrap_or_default(), &v.lower) {
                    bm.reset_bits();
                }
            }
            ColumnView::Time(_) if v.lower.is_empty() => {}
            ColumnView::Time(timestamps) => {
                match_time_strings(timestamps, bm, |s| match_prefix(s, &v.upper))
            }
            ColumnView::Encoded(ev) => match ev.typed() {
                Typed::String(values) => {
                    if !has_cased_chars(&self.prefix)
                        && !ev.bloom_contains_all(&v.lower_hashes, "any_case_prefix")
                    {
                        bm.reset_bits();
                        return;
                    }
                    bm.for_each_set_bit(|i| match_any_case_prefix(&values[i], &v.lower));
                }
                Typed::Dict(ids) => ev.match_dict(ids, bm, |s| match_any_case_prefix(s, &v.lower)),
                Typed::Iso8601(_) => {
                    match_prefix_column(col, bm, &v.upper, &v.upper_hashes, "any_case_prefix")
                }
                Typed::Uint(_) | Typed::Int64(_) | Typed::Float64(_) | Typed::Ipv4(_) => {
                    match_prefix_column(col, bm, &v.lower, &v.lower_hashes, "any_case_prefix")
                }
            },
        }
    }
}

impl fmt::Display for AnyCasePrefixFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = quote_field_name_if_needed(&self.field);
        if self.prefix.is_empty() {
            return write!(f, "{field}i(*)");
        }
        write!(f, "{field}i({}*)", quote_token_if_needed(&self.prefix))
    }
}

/// Bloom filters hold tokens in their stored casing, so they can only rule
/// out operands without cased chars.
fn has_cased_chars(operand: &str) -> bool {
    operand.chars().any(|c| c.is_lowercase() || c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use crate::block::BlockBuilder;
    use crate::column::ValueType;
    use crate::filter::test_util::assert_rows;
    use crate::filter::Filter;

    #[test]
    fn test_any_case_phrase() {
        let bs = BlockBuilder::new(vec![1, 2, 3, 4, 5, 6])
            .column("", ["WORD", "word", "WoRd", "words", "", "a Word."])
            .build()
            .unwrap();
        assert_rows(&Filter::any_case_phrase("", "word"), &bs, &[0, 1, 2, 5]);
        assert_rows(&Filter::any_case_phrase("", "WORD"), &bs, &[0, 1, 2, 5]);
        assert_rows(&Filter::any_case_phrase("", ""), &bs, &[4]);
        assert_rows(&Filter::any_case_phrase("missing", ""), &bs, &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_any_case_prefix() {
        let bs = BlockBuilder::new(vec![1, 2, 3])
            .column("", ["Error: timeout", "ERRORS found", "no errors"])
            .build()
            .unwrap();
        assert_rows(&Filter::any_case_prefix("", "err"), &bs, &[0, 1, 2]);
        assert_rows(&Filter::any_case_prefix("", "ERROR:"), &bs, &[0]);
        assert_rows(&Filter::any_case_prefix("", "rror"), &bs, &[]);
        assert_rows(&Filter::any_case_prefix("", ""), &bs, &[0, 1, 2]);
    }

    #[test]
    fn test_any_case_unicode() {
        let bs = BlockBuilder::new(vec![1, 2])
            .column("", ["ПРИВЕТ мир", "пока"])
            .build()
            .unwrap();
        assert_rows(&Filter::any_case_phrase("", "привет"), &bs, &[0]);
        assert_rows(&Filter::any_case_prefix("", "ПО"), &bs, &[1]);
    }

    #[test]
    fn test_any_case_timestamps() {
        let bs = BlockBuilder::new(vec![1_000_000_000, 2_000_000_000])
            .column_as(
                "ts",
                ["2024-05-01T10:00:00.000Z", "2024-05-02T11:00:00.000Z"],
                ValueType::TimestampIso8601,
            )
            .build()
            .unwrap();
        assert_rows(&Filter::any_case_phrase("ts", "2024-05-01t10"), &bs, &[0]);
        assert_rows(&Filter::any_case_prefix("ts", "2024-05-02t"), &bs, &[1]);
        assert_rows(&Filter::any_case_phrase("_time", "00:02z"), &bs, &[1]);
    }

    #[test]
    fn test_any_case_render() {
        assert_eq!(Filter::any_case_phrase("", "Foo").to_string(), "i(Foo)");
        assert_eq!(Filter::any_case_prefix("f", "ab").to_string(), "f:i(ab*)");
        assert_eq!(Filter::any_case_prefix("", "").to_string(), "i(*)");
    }
}
