//! Bare word or quoted phrase: the value contains the phrase on token
//! boundaries.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::bitmap::Bitmap;
use crate::column::format::{
    write_int64, write_ipv4, write_timestamp_iso8601, write_timestamp_rfc3339_nano,
};
use crate::column::parse::{
    try_parse_int64, try_parse_ipv4, try_parse_timestamp_iso8601, try_parse_timestamp_rfc3339_nano,
};
use crate::tokenizer::{hash_tokens, tokenize};

use super::column::{match_time_strings, ColumnFilter, ColumnView, EncodedView, Typed};
use super::exact::match_exact_value;
use super::matchers::{match_phrase, parse_canonical};
use super::render::{quote_field_name_if_needed, quote_token_if_needed};

#[derive(Debug, Clone)]
pub struct PhraseFilter {
    field: String,
    phrase: String,
    hashes: OnceCell<Vec<u64>>,
}

impl PhraseFilter {
    pub fn new(field: impl Into<String>, phrase: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            phrase: phrase.into(),
            hashes: OnceCell::new(),
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub(crate) fn hashes(&self) -> &[u64] {
        self.hashes
            .get_or_init(|| hash_tokens(&tokenize(&self.phrase)))
    }
}

impl ColumnFilter for PhraseFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        match_phrase_column(col, bm, &self.phrase, self.hashes(), "phrase");
    }
}

impl fmt::Display for PhraseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            quote_field_name_if_needed(&self.field),
            quote_token_if_needed(&self.phrase)
        )
    }
}

/// Narrow `bm` to rows of `col` containing `phrase`; `hashes` are the
/// phrase's token hashes.
pub(crate) fn match_phrase_column(
    col: &ColumnView<'_>,
    bm: &mut Bitmap,
    phrase: &str,
    hashes: &[u64],
    filter: &'static str,
) {
    match col {
        ColumnView::Missing | ColumnView::Const(_) => {
            if !match_phrase(col.const_value().unwrap_or_default(), phrase) {
                bm.reset_bits();
            }
        }
        ColumnView::Time(timestamps) => {
            let ts = parse_canonical(
                phrase,
                try_parse_timestamp_rfc3339_nano,
                write_timestamp_rfc3339_nano,
            );
            match ts {
                Some(ts) => bm.for_each_set_bit(|i| timestamps[i] == ts),
                None => match_time_strings(timestamps, bm, |s| match_phrase(s, phrase)),
            }
        }
        ColumnView::Encoded(ev) => match_phrase_encoded(ev, bm, phrase, hashes, filter),
    }
}

fn match_phrase_encoded(
    ev: &EncodedView<'_>,
    bm: &mut Bitmap,
    phrase: &str,
    hashes: &[u64],
    filter: &'static str,
) {
    match ev.typed() {
        Typed::String(values) => {
            if !ev.bloom_contains_all(hashes, filter) {
                bm.reset_bits();
                return;
            }
            bm.for_each_set_bit(|i| match_phrase(&values[i], phrase));
        }
        Typed::Dict(ids) => ev.match_dict(ids, bm, |v| match_phrase(v, phrase)),
        // A decimal string is a single token, so only the whole value can
        // hold the phrase.
        Typed::Uint(_) => match_exact_value(ev, bm, phrase, hashes, filter),
        Typed::Int64(values) => {
            if phrase == "-" {
                if ev.header.min_i64() >= 0 {
                    bm.reset_bits();
                    return;
                }
                bm.for_each_set_bit(|i| values[i] < 0);
                return;
            }
            match parse_canonical(phrase, try_parse_int64, write_int64) {
                // "5" also sits on token boundaries inside "-5".
                Some(n) if ev.bloom_contains_all(hashes, filter) => {
                    let neg = if n > 0 { -n } else { n };
                    bm.for_each_set_bit(|i| values[i] == n || values[i] == neg);
                }
                _ => bm.reset_bits(),
            }
        }
        Typed::Float64(_) => {
            let float_chars = phrase
                .bytes()
                .all(|b| b.is_ascii_digit() || b == b'.' || b == b'-');
            if phrase.is_empty() || !float_chars || !ev.bloom_contains_all(hashes, filter) {
                bm.reset_bits();
                return;
            }
            ev.match_strings(bm, |s| match_phrase(s, phrase));
        }
        Typed::Ipv4(_) => {
            if parse_canonical(phrase, try_parse_ipv4, write_ipv4).is_some() {
                match_exact_value(ev, bm, phrase, hashes, filter);
                return;
            }
            match_phrase_strings(ev, bm, phrase, hashes, filter);
        }
        Typed::Iso8601(_) => {
            let canonical =
                parse_canonical(phrase, try_parse_timestamp_iso8601, write_timestamp_iso8601);
            if canonical.is_some() {
                match_exact_value(ev, bm, phrase, hashes, filter);
                return;
            }
            match_phrase_strings(ev, bm, phrase, hashes, filter);
        }
    }
}

fn match_phrase_strings(
    ev: &EncodedView<'_>,
    bm: &mut Bitmap,
    phrase: &str,
    hashes: &[u64],
    filter: &'static str,
) {
    if !ev.bloom_contains_all(hashes, filter) {
        bm.reset_bits();
        return;
    }
    ev.match_strings(bm, |s| match_phrase(s, phrase));
}
