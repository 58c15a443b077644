//! LogsQL-style rendering helpers.

use crate::block::MSG_FIELD;
use crate::tokenizer::is_token_char;

const RESERVED_KEYWORDS: &[&str] = &[
    "", "and", "or", "not", "!", "(", ")", "{", "}", "=", "!=", "=~", "!~", ",", "|", ":", "*",
    "[", "]", "now", "offset", "-", "exact", "i", "in", "ipv4_range", "len_range", "range", "re",
    "seq", "string_range", "contains_any", "contains_all", "day_range", "week_range",
    "value_type", "le_field", "lt_field", "eq_field",
];

/// Quote `s` when it would not read back as a single bare token.
pub(crate) fn quote_token_if_needed(s: &str) -> String {
    if need_quote_token(s) {
        format!("{s:?}")
    } else {
        s.to_string()
    }
}

fn need_quote_token(s: &str) -> bool {
    let lower = s.to_lowercase();
    if RESERVED_KEYWORDS.contains(&lower.as_str()) {
        return true;
    }
    s.chars().any(|c| !is_token_char(c) && c != '.' && c != '-')
}

/// `name:` prefix of a rendered filter; empty for the message field.
pub(crate) fn quote_field_name_if_needed(name: &str) -> String {
    if name.is_empty() || name == MSG_FIELD {
        return String::new();
    }
    quote_token_if_needed(name) + ":"
}

/// Render a comma-separated list of quoted tokens.
pub(crate) fn join_tokens<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| quote_token_if_needed(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}
