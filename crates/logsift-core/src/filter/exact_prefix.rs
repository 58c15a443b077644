//! `exact(v*)`: the whole value starts with `v`.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::bitmap::Bitmap;
use crate::column::parse::try_parse_uint64;
use crate::tokenizer::{hash_tokens, tokens_skip_last};

use super::column::{match_strings, ColumnFilter, ColumnView, Typed};
use super::matchers::match_exact_prefix;
use super::render::{quote_field_name_if_needed, quote_token_if_needed};

#[derive(Debug, Clone)]
pub struct ExactPrefixFilter {
    field: String,
    prefix: String,
    tokens: OnceCell<Vec<String>>,
    hashes: OnceCell<Vec<u64>>,
}

impl ExactPrefixFilter {
    pub fn new(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            prefix: prefix.into(),
            tokens: OnceCell::new(),
            hashes: OnceCell::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Complete tokens of the prefix.
    fn tokens(&self) -> &[String] {
        self.tokens.get_or_init(|| tokens_skip_last(&self.prefix))
    }

    pub(crate) fn hashes(&self) -> &[u64] {
        self.hashes.get_or_init(|| hash_tokens(self.tokens()))
    }

    fn starts_with_digit(&self) -> bool {
        self.prefix.bytes().next().is_some_and(|b| b.is_ascii_digit())
    }
}

impl ColumnFilter for ExactPrefixFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let prefix = self.prefix.as_str();
        if prefix.is_empty() {
            return;
        }
        let ColumnView::Encoded(ev) = col else {
            match_strings(col, bm, |s| match_exact_prefix(s, prefix));
            return;
        };
        let candidates = match ev.typed() {
            Typed::Dict(ids) => {
                ev.match_dict(ids, bm, |s| match_exact_prefix(s, prefix));
                return;
            }
            Typed::String(_) => true,
            Typed::Uint(_) => {
                self.tokens().is_empty()
                    && try_parse_uint64(prefix).is_some_and(|n| n <= ev.header.max_value)
            }
            Typed::Int64(_) => self.tokens().is_empty(),
            Typed::Float64(_) => {
                let first_ok = prefix.starts_with('-') || self.starts_with_digit();
                first_ok && self.tokens().len() <= 2
            }
            Typed::Ipv4(_) => self.starts_with_digit() && self.tokens().len() <= 3,
            Typed::Iso8601(_) => self.starts_with_digit(),
        };
        if !candidates || !ev.bloom_contains_all(self.hashes(), "exact_prefix") {
            bm.reset_bits();
            return;
        }
        ev.match_strings(bm, |s| match_exact_prefix(s, prefix));
    }
}

impl fmt::Display for ExactPrefixFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}exact({}*)",
            quote_field_name_if_needed(&self.field),
            quote_token_if_needed(&self.prefix)
        )
    }
}
