//! Word tokenization and token hashing.
//!
//! A token is a maximal run of token chars: `_` or any Unicode alphanumeric.
//! Token hashes are xxHash64 with seed 0 over the token's UTF-8 bytes; the
//! block builder and the filters both go through [`hash_token`], so bloom
//! filters built here stay consistent with the queries that consult them.

use std::collections::HashSet;

use xxhash_rust::xxh64::xxh64;

/// Whether `c` belongs to a token.
#[inline]
pub fn is_token_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Split `s` into its distinct tokens in order of first appearance.
pub fn tokenize(s: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    push_tokens(s, &mut seen, &mut tokens);
    tokens
}

/// Distinct tokens across all of `values`, in order of first appearance.
pub fn tokenize_strings<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for v in values {
        push_tokens(v.as_ref(), &mut seen, &mut tokens);
    }
    tokens
}

fn push_tokens(s: &str, seen: &mut HashSet<String>, tokens: &mut Vec<String>) {
    for token in s.split(|c: char| !is_token_char(c)) {
        if !token.is_empty() && !seen.contains(token) {
            seen.insert(token.to_string());
            tokens.push(token.to_string());
        }
    }
}

/// Tokens of `s` after dropping a trailing partial token.
///
/// Used for prefix operands, where the last token may continue in the
/// matched value and so cannot be looked up in a bloom filter.
pub fn tokens_skip_last(s: &str) -> Vec<String> {
    let trimmed = s.trim_end_matches(is_token_char);
    tokenize(trimmed)
}

/// Whether `s` starts with a token char.
pub fn starts_with_token_char(s: &str) -> bool {
    s.chars().next().is_some_and(is_token_char)
}

/// Whether `s` ends with a token char.
pub fn ends_with_token_char(s: &str) -> bool {
    s.chars().next_back().is_some_and(is_token_char)
}

/// Stable 64-bit hash of a token.
#[inline]
pub fn hash_token(token: &str) -> u64 {
    xxh64(token.as_bytes(), 0)
}

/// Hash every token.
pub fn hash_tokens<S: AsRef<str>>(tokens: &[S]) -> Vec<u64> {
    tokens.iter().map(|t| hash_token(t.as_ref())).collect()
}
