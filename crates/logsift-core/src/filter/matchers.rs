//! String-level matchers shared by the leaf filters.
//!
//! These work on the canonical string form of a value. Typed columns only
//! fall back to them when a binary comparison is not possible.

use crate::bitmap::with_scratch_buffer;
use crate::column::parse::{try_parse_float64, try_parse_int64, try_parse_ipv4, try_parse_uint64};
use crate::tokenizer::is_token_char;

/// 2^64, the first float above every `u64`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;
/// 2^63, the first float above every `i64`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Byte offset of the first occurrence of `phrase` in `s` that sits on token
/// boundaries.
///
/// The boundary is only checked on a side where the phrase itself starts or
/// ends with a token char, so `"foo"` is found in `"a foo."` but not in
/// `"foobar"`, while `"-bar"` is found in `"foo-bar"`.
pub(crate) fn phrase_pos(s: &str, phrase: &str) -> Option<usize> {
    if phrase.is_empty() {
        return Some(0);
    }
    if phrase.len() > s.len() {
        return None;
    }
    let starts_with_token = phrase.chars().next().is_some_and(is_token_char);
    let ends_with_token = phrase.chars().next_back().is_some_and(is_token_char);

    let mut pos = 0;
    while let Some(n) = s[pos..].find(phrase) {
        pos += n;
        let end = pos + phrase.len();
        let bad_start =
            starts_with_token && s[..pos].chars().next_back().is_some_and(is_token_char);
        let bad_end = ends_with_token && s[end..].chars().next().is_some_and(is_token_char);
        if !bad_start && !bad_end {
            return Some(pos);
        }
        pos += s[pos..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Whether `phrase` occurs in `s` on token boundaries. An empty phrase
/// matches only an empty value.
pub(crate) fn match_phrase(s: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return s.is_empty();
    }
    phrase_pos(s, phrase).is_some()
}

/// Whether `s` contains a word starting with `prefix`. An empty prefix
/// matches every non-empty value.
pub(crate) fn match_prefix(s: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return !s.is_empty();
    }
    let starts_with_token = prefix.chars().next().is_some_and(is_token_char);
    let mut pos = 0;
    while let Some(n) = s[pos..].find(prefix) {
        pos += n;
        if !starts_with_token || !s[..pos].chars().next_back().is_some_and(is_token_char) {
            return true;
        }
        pos += s[pos..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// Whether every phrase occurs in `s`, each after the end of the previous one.
pub(crate) fn match_sequence<S: AsRef<str>>(s: &str, phrases: &[S]) -> bool {
    let mut rest = s;
    for phrase in phrases {
        let phrase = phrase.as_ref();
        match phrase_pos(rest, phrase) {
            Some(n) => rest = &rest[n + phrase.len()..],
            None => return false,
        }
    }
    true
}

pub(crate) fn match_exact_prefix(s: &str, prefix: &str) -> bool {
    s.starts_with(prefix)
}

/// Case-insensitive [`match_phrase`]; `phrase_lowercase` must already be
/// lowercased.
pub(crate) fn match_any_case_phrase(s: &str, phrase_lowercase: &str) -> bool {
    if phrase_lowercase.is_empty() {
        return s.is_empty();
    }
    if is_ascii_lowercase(s) {
        return match_phrase(s, phrase_lowercase);
    }
    with_scratch_buffer(|buf| {
        buf.extend(s.chars().flat_map(char::to_lowercase));
        match_phrase(buf, phrase_lowercase)
    })
}

/// Case-insensitive [`match_prefix`]; `prefix_lowercase` must already be
/// lowercased.
pub(crate) fn match_any_case_prefix(s: &str, prefix_lowercase: &str) -> bool {
    if prefix_lowercase.is_empty() {
        return !s.is_empty();
    }
    if is_ascii_lowercase(s) {
        return match_prefix(s, prefix_lowercase);
    }
    with_scratch_buffer(|buf| {
        buf.extend(s.chars().flat_map(char::to_lowercase));
        match_prefix(buf, prefix_lowercase)
    })
}

fn is_ascii_lowercase(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii() && !b.is_ascii_uppercase())
}

/// `min <= s < max`, byte-wise.
pub(crate) fn match_string_range(s: &str, min: &str, max: &str) -> bool {
    s >= min && s < max
}

/// Whether the number of chars in `s` is within `[min, max]`.
pub(crate) fn match_len_range(s: &str, min: u64, max: u64) -> bool {
    let n = s.chars().count() as u64;
    n >= min && n <= max
}

/// Whether `s` parses as a number within `[min, max]`.
pub(crate) fn match_range(s: &str, min: f64, max: f64) -> bool {
    try_parse_float64(s).is_some_and(|f| f >= min && f <= max)
}

/// Whether `s` is an IPv4 address within `[min, max]`.
pub(crate) fn match_ipv4_range(s: &str, min: u32, max: u32) -> bool {
    try_parse_ipv4(s).is_some_and(|n| n >= min && n <= max)
}

/// Parse `s` with `parse`, keeping the result only if `write` renders it
/// back as `s`. Typed columns hold canonical values only, so an operand that
/// is not canonical can never equal one of them.
pub(crate) fn parse_canonical<T: Copy>(
    s: &str,
    parse: impl Fn(&str) -> Option<T>,
    write: impl Fn(&mut String, T),
) -> Option<T> {
    let n = parse(s)?;
    with_scratch_buffer(|buf| {
        write(buf, n);
        (buf == s).then_some(n)
    })
}

/// Integer bounds of `[min, max]` as `u64`, or `None` if no `u64` lies in
/// the interval.
pub(crate) fn to_uint64_range(min: f64, max: f64) -> Option<(u64, u64)> {
    let (lo, hi) = (min.ceil(), max.floor());
    if !(lo <= hi) || hi < 0.0 || lo >= U64_LIMIT {
        return None;
    }
    // `as` saturates at the type bounds.
    Some((lo as u64, hi as u64))
}

/// Integer bounds of `[min, max]` as `i64`, or `None` if no `i64` lies in
/// the interval.
pub(crate) fn to_int64_range(min: f64, max: f64) -> Option<(i64, i64)> {
    let (lo, hi) = (min.ceil(), max.floor());
    if !(lo <= hi) || hi < -I64_LIMIT || lo >= I64_LIMIT {
        return None;
    }
    Some((lo as i64, hi as i64))
}

/// Integer bounds of `[min, max]` as `u32`, or `None` if no `u32` lies in
/// the interval.
pub(crate) fn to_uint32_range(min: f64, max: f64) -> Option<(u32, u32)> {
    let (lo, hi) = (min.ceil(), max.floor());
    if !(lo <= hi) || hi < 0.0 || lo > f64::from(u32::MAX) {
        return None;
    }
    Some((lo as u32, hi as u32))
}

/// Ordering used by field-to-field comparisons.
///
/// Two values compare numerically when both parse as the same kind of number
/// (unsigned, then signed, then float); otherwise they compare byte-wise.
/// Equal strings are never less than each other.
pub(crate) fn less_value(a: &str, b: &str) -> bool {
    if a == b {
        return false;
    }
    if let (Some(x), Some(y)) = (try_parse_uint64(a), try_parse_uint64(b)) {
        return x < y;
    }
    if let (Some(x), Some(y)) = (try_parse_int64(a), try_parse_int64(b)) {
        return x < y;
    }
    if let (Some(x), Some(y)) = (try_parse_float64(a), try_parse_float64(b)) {
        return x < y;
    }
    a < b
}

/// Next float above `f`, used to turn an exclusive lower bound into an
/// inclusive one.
pub(crate) fn next_up(f: f64) -> f64 {
    if f.is_nan() || f == f64::INFINITY {
        return f;
    }
    if f == 0.0 {
        return f64::from_bits(1);
    }
    let bits = f.to_bits();
    f64::from_bits(if f > 0.0 { bits + 1 } else { bits - 1 })
}

/// Next float below `f`.
pub(crate) fn next_down(f: f64) -> f64 {
    -next_up(-f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_phrase() {
        assert!(match_phrase("foo bar", "foo"));
        assert!(match_phrase("foo bar", "bar"));
        assert!(match_phrase("foo bar", "foo bar"));
        assert!(match_phrase("a foo.", "foo"));
        assert!(!match_phrase("foobar", "foo"));
        assert!(!match_phrase("barfoo", "foo"));
        assert!(match_phrase("foobar foo", "foo"));
        assert!(match_phrase("foo-bar", "-bar"));
        assert!(match_phrase("", ""));
        assert!(!match_phrase("x", ""));
        assert!(match_phrase("привет мир", "мир"));
        assert!(!match_phrase("приветмир", "мир"));
    }

    #[test]
    fn test_match_prefix() {
        assert!(match_prefix("foobar", "foo"));
        assert!(match_prefix("a foobar", "foo"));
        assert!(!match_prefix("afoobar", "foo"));
        assert!(match_prefix("x", ""));
        assert!(!match_prefix("", ""));
        assert!(!match_prefix("", "foo"));
        assert!(match_prefix("ab.cd", ".c"));
    }

    #[test]
    fn test_match_sequence() {
        assert!(match_sequence("x a x b x", &["a", "b"]));
        assert!(!match_sequence("b x a x", &["a", "b"]));
        assert!(!match_sequence("xaxbx", &["a", "b"]));
        assert!(match_sequence("foo bar baz", &["foo", "baz"]));
        assert!(!match_sequence("foo bar", &["foo", "foo"]));
        assert!(match_sequence::<&str>("anything", &[]));
    }

    #[test]
    fn test_any_case() {
        for s in ["WORD", "word", "WoRd", "a Word b"] {
            assert!(match_any_case_phrase(s, "word"), "{s}");
        }
        assert!(!match_any_case_phrase("words", "word"));
        assert!(match_any_case_phrase("", ""));
        assert!(!match_any_case_phrase("x", ""));
        assert!(match_any_case_phrase("ПРИВЕТ", "привет"));
        assert!(match_any_case_prefix("WORDS", "wor"));
        assert!(!match_any_case_prefix("SWORD", "wor"));
    }

    #[test]
    fn test_string_and_len_ranges() {
        assert!(match_string_range("b", "a", "c"));
        assert!(match_string_range("a", "a", "c"));
        assert!(!match_string_range("c", "a", "c"));
        assert!(match_len_range("абв", 3, 3));
        assert!(!match_len_range("abcd", 1, 3));
    }

    #[test]
    fn test_numeric_ranges() {
        assert!(match_range("1.5", 1.0, 2.0));
        assert!(!match_range("abc", f64::MIN, f64::MAX));
        assert!(match_ipv4_range("10.0.0.5", 0x0a00_0000, 0x0a00_00ff));
        assert!(!match_ipv4_range("10.0.1.5", 0x0a00_0000, 0x0a00_00ff));
    }

    #[test]
    fn test_integer_range_conversion() {
        assert_eq!(to_uint64_range(1.5, 4.5), Some((2, 4)));
        assert_eq!(to_uint64_range(-10.0, 3.0), Some((0, 3)));
        assert_eq!(to_uint64_range(-10.0, -1.0), None);
        assert_eq!(to_uint64_range(1.2, 1.8), None);
        assert_eq!(to_uint64_range(0.0, f64::INFINITY), Some((0, u64::MAX)));
        assert_eq!(to_uint64_range(U64_LIMIT, f64::INFINITY), None);
        assert_eq!(to_int64_range(-1.5, 1.5), Some((-1, 1)));
        assert_eq!(to_int64_range(f64::NEG_INFINITY, 0.0), Some((i64::MIN, 0)));
        assert_eq!(to_uint32_range(0.0, 1e12), Some((0, u32::MAX)));
        assert_eq!(to_uint32_range(5e9, 6e9), None);
        assert_eq!(to_uint64_range(f64::NAN, 1.0), None);
    }

    #[test]
    fn test_less_value() {
        assert!(less_value("2", "10"));
        assert!(less_value("-5", "3"));
        assert!(less_value("1.5", "10"));
        assert!(less_value("10", "9a"));
        assert!(less_value("", "abc"));
        assert!(!less_value("abc", "abc"));
    }

    #[test]
    fn test_next_float() {
        assert!(next_up(1.0) > 1.0);
        assert!(next_down(1.0) < 1.0);
        assert!(next_up(-1.0) > -1.0);
        assert!(next_up(0.0) > 0.0);
        assert_eq!(next_up(f64::INFINITY), f64::INFINITY);
        assert_eq!(next_down(next_up(2.5)), 2.5);
    }

    #[test]
    fn test_parse_canonical() {
        use crate::column::format::write_uint64;
        assert_eq!(parse_canonical("42", try_parse_uint64, write_uint64), Some(42));
        assert_eq!(parse_canonical("042", try_parse_uint64, write_uint64), None);
        assert_eq!(parse_canonical("4_2", try_parse_uint64, write_uint64), None);
        assert_eq!(parse_canonical("x", try_parse_uint64, write_uint64), None);
    }
}
