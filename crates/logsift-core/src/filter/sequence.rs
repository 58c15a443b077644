//! `seq(a, b, ...)`: phrases that appear in order.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::bitmap::Bitmap;
use crate::tokenizer::{hash_tokens, tokenize_strings};

use super::column::{match_strings, ColumnFilter, ColumnView, Typed};
use super::phrase::match_phrase_column;
use super::matchers::match_sequence;
use super::render::{join_tokens, quote_field_name_if_needed};

#[derive(Debug, Clone)]
pub struct SequenceFilter {
    field: String,
    phrases: Vec<String>,
    /// Non-empty phrases, in order.
    non_empty: Vec<String>,
    hashes: OnceCell<Vec<u64>>,
    first_hashes: OnceCell<Vec<u64>>,
}

impl SequenceFilter {
    pub fn new<I, S>(field: impl Into<String>, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phrases: Vec<String> = phrases.into_iter().map(Into::into).collect();
        let non_empty = phrases.iter().filter(|p| !p.is_empty()).cloned().collect();
        Self {
            field: field.into(),
            phrases,
            non_empty,
            hashes: OnceCell::new(),
            first_hashes: OnceCell::new(),
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub(crate) fn hashes(&self) -> &[u64] {
        self.hashes
            .get_or_init(|| hash_tokens(&tokenize_strings(&self.non_empty)))
    }

    fn first_hashes(&self) -> &[u64] {
        self.first_hashes
            .get_or_init(|| hash_tokens(&tokenize_strings(self.non_empty.first())))
    }
}

impl ColumnFilter for SequenceFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let phrases = &self.non_empty;
        if phrases.is_empty() {
            return;
        }
        if let [phrase] = phrases.as_slice() {
            match_phrase_column(col, bm, phrase, self.first_hashes(), "sequence");
            return;
        }
        let ColumnView::Encoded(ev) = col else {
            match_strings(col, bm, |s| match_sequence(s, phrases));
            return;
        };
        match ev.typed() {
            Typed::Dict(ids) => ev.match_dict(ids, bm, |s| match_sequence(s, phrases)),
            // A decimal string holds a single token.
            Typed::Uint(_) => bm.reset_bits(),
            Typed::String(_)
            | Typed::Int64(_)
            | Typed::Float64(_)
            | Typed::Ipv4(_)
            | Typed::Iso8601(_) => {
                if !ev.bloom_contains_all(self.hashes(), "sequence") {
                    bm.reset_bits();
                    return;
                }
                ev.match_strings(bm, |s| match_sequence(s, phrases));
            }
        }
    }
}

impl fmt::Display for SequenceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}seq({})",
            quote_field_name_if_needed(&self.field),
            join_tokens(&self.phrases)
        )
    }
}
