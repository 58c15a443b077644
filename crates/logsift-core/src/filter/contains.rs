//! `contains_any(...)` and `contains_all(...)`: phrase sets.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::bitmap::{acquire_bitmap, Bitmap};
use crate::tokenizer::{hash_tokens, tokenize, tokenize_strings};

use super::column::{ColumnFilter, ColumnView, TokenSets, Typed};
use super::matchers::match_phrase;
use super::phrase::match_phrase_column;
use super::render::{join_tokens, quote_field_name_if_needed};

fn phrase_hashes(phrases: &[String]) -> Vec<Vec<u64>> {
    phrases.iter().map(|p| hash_tokens(&tokenize(p))).collect()
}

/// The value contains at least one of the phrases. An empty phrase matches
/// every value.
#[derive(Debug, Clone)]
pub struct ContainsAnyFilter {
    field: String,
    phrases: Vec<String>,
    token_sets: OnceCell<TokenSets>,
    hashes: OnceCell<Vec<Vec<u64>>>,
}

impl ContainsAnyFilter {
    pub fn new<I, S>(field: impl Into<String>, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            phrases: phrases.into_iter().map(Into::into).collect(),
            token_sets: OnceCell::new(),
            hashes: OnceCell::new(),
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    fn matches(&self, s: &str) -> bool {
        self.phrases.iter().any(|p| match_phrase(s, p))
    }

    /// Union of the per-phrase matches, so typed columns keep their fast
    /// paths.
    fn match_per_phrase(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let hashes = self.hashes.get_or_init(|| phrase_hashes(&self.phrases));
        let mut result = acquire_bitmap(bm.len());
        let mut pending = acquire_bitmap(bm.len());
        for (phrase, hashes) in self.phrases.iter().zip(hashes) {
            pending.copy_from(bm);
            pending.and_not(&result);
            if pending.is_zero() {
                break;
            }
            match_phrase_column(col, &mut pending, phrase, hashes, "contains_any");
            result.or(&pending);
        }
        bm.copy_from(&result);
    }
}

impl ColumnFilter for ContainsAnyFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        if self.phrases.is_empty() {
            bm.reset_bits();
            return;
        }
        if self.phrases.iter().any(String::is_empty) {
            return;
        }
        match col {
            ColumnView::Missing | ColumnView::Const(_) => {
                if !self.matches(col.const_value().unwrap_or_default()) {
                    bm.reset_bits();
                }
            }
            ColumnView::Time(_) => self.match_per_phrase(col, bm),
            ColumnView::Encoded(ev) => match ev.typed() {
                Typed::Dict(ids) => ev.match_dict(ids, bm, |s| self.matches(s)),
                Typed::String(_) => {
                    let token_sets = self
                        .token_sets
                        .get_or_init(|| TokenSets::new(&self.phrases));
                    if !ev.bloom_contains_any_set(token_sets, "contains_any") {
                        bm.reset_bits();
                        return;
                    }
                    ev.match_strings(bm, |s| self.matches(s));
                }
                _ => self.match_per_phrase(col, bm),
            },
        }
    }
}

impl fmt::Display for ContainsAnyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}contains_any({})",
            quote_field_name_if_needed(&self.field),
            join_tokens(&self.phrases)
        )
    }
}

/// The value contains every phrase. Empty phrases are ignored, so an empty
/// list matches every value.
#[derive(Debug, Clone)]
pub struct ContainsAllFilter {
    field: String,
    phrases: Vec<String>,
    non_empty: Vec<String>,
    all_hashes: OnceCell<Vec<u64>>,
    hashes: OnceCell<Vec<Vec<u64>>>,
}

impl ContainsAllFilter {
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
            all_hashes: OnceCell::new(),
            hashes: OnceCell::new(),
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    fn matches(&self, s: &str) -> bool {
        self.non_empty.iter().all(|p| match_phrase(s, p))
    }

    fn match_per_phrase(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let hashes = self.hashes.get_or_init(|| phrase_hashes(&self.non_empty));
        for (phrase, hashes) in self.non_empty.iter().zip(hashes) {
            match_phrase_column(col, bm, phrase, hashes, "contains_all");
            if bm.is_zero() {
                return;
            }
        }
    }
}

impl ColumnFilter for ContainsAllFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        if self.non_empty.is_empty() {
            return;
        }
        match col {
            ColumnView::Missing | ColumnView::Const(_) => {
                if !self.matches(col.const_value().unwrap_or_default()) {
                    bm.reset_bits();
                }
            }
            ColumnView::Time(_) => self.match_per_phrase(col, bm),
            ColumnView::Encoded(ev) => match ev.typed() {
                Typed::Dict(ids) => ev.match_dict(ids, bm, |s| self.matches(s)),
                Typed::String(_) => {
                    let all_hashes = self
                        .all_hashes
                        .get_or_init(|| hash_tokens(&tokenize_strings(&self.non_empty)));
                    if !ev.bloom_contains_all(all_hashes, "contains_all") {
                        bm.reset_bits();
                        return;
                    }
                    ev.match_strings(bm, |s| self.matches(s));
                }
                _ => self.match_per_phrase(col, bm),
            },
        }
    }
}

impl fmt::Display for ContainsAllFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}contains_all({})",
            quote_field_name_if_needed(&self.field),
            join_tokens(&self.phrases)
        )
    }
}
