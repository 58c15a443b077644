//! `re("pattern")`: the value matches a regular expression.

use std::fmt;

use regex::Regex;
use regex_syntax::hir::{Hir, HirKind};

use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::tokenizer::{ends_with_token_char, hash_tokens, starts_with_token_char, tokenize};

use super::column::{match_strings, ColumnFilter, ColumnView};
use super::render::quote_field_name_if_needed;

#[derive(Debug, Clone)]
pub struct RegexpFilter {
    field: String,
    re: Regex,
    /// Hashes of tokens every match must contain.
    hashes: Vec<u64>,
}

impl RegexpFilter {
    pub fn new(field: impl Into<String>, pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)?;
        let tokens = required_tokens(pattern);
        Ok(Self {
            field: field.into(),
            re,
            hashes: hash_tokens(&tokens),
        })
    }

    pub fn pattern(&self) -> &str {
        self.re.as_str()
    }
}

impl ColumnFilter for RegexpFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        if let ColumnView::Encoded(ev) = col {
            if !ev.bloom_contains_all(&self.hashes, "regexp") {
                bm.reset_bits();
                return;
            }
        }
        match_strings(col, bm, |s| self.re.is_match(s));
    }
}

impl fmt::Display for RegexpFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}re({:?})",
            quote_field_name_if_needed(&self.field),
            self.re.as_str()
        )
    }
}

/// Whole tokens that any value matching `pattern` must contain.
///
/// Only case-sensitive literals at the top level of the pattern count. The
/// edge tokens of a literal are dropped when they could continue into text
/// matched by the rest of the pattern.
fn required_tokens(pattern: &str) -> Vec<String> {
    let Ok(hir) = regex_syntax::Parser::new().parse(pattern) else {
        return Vec::new();
    };
    let mut literals = Vec::new();
    collect_literals(&hir, &mut literals);

    let mut tokens = Vec::new();
    for lit in &literals {
        let mut lit_tokens = tokenize(lit);
        if ends_with_token_char(lit) {
            lit_tokens.pop();
        }
        if starts_with_token_char(lit) && !lit_tokens.is_empty() {
            lit_tokens.remove(0);
        }
        for t in lit_tokens {
            if !tokens.contains(&t) {
                tokens.push(t);
            }
        }
    }
    tokens
}

fn collect_literals(hir: &Hir, out: &mut Vec<String>) {
    match hir.kind() {
        HirKind::Literal(lit) => {
            if let Ok(s) = std::str::from_utf8(&lit.0) {
                out.push(s.to_string());
            }
        }
        HirKind::Capture(cap) => collect_literals(&cap.sub, out),
        HirKind::Concat(parts) => {
            for part in parts {
                match part.kind() {
                    HirKind::Literal(_) | HirKind::Capture(_) => collect_literals(part, out),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;
    use crate::column::ValueType;
    use crate::error::Error;
    use crate::filter::test_util::assert_rows;
    use crate::filter::Filter;

    #[test]
    fn test_required_tokens() {
        assert_eq!(required_tokens("foo"), Vec::<String>::new());
        assert_eq!(required_tokens("foo bar baz"), vec!["bar"]);
        assert_eq!(required_tokens(" error: .* disk "), vec!["error", "disk"]);
        assert_eq!(required_tokens("(?i) error "), Vec::<String>::new());
        assert_eq!(required_tokens("a|b c d"), Vec::<String>::new());
        assert_eq!(required_tokens("x( user id )y"), vec!["user", "id"]);
        assert_eq!(required_tokens("x (user id) y"), Vec::<String>::new());
    }

    #[test]
    fn test_regexp() {
        let bs = BlockBuilder::new(vec![1, 2, 3])
            .column("", ["user 42 logged in", "user bob logged out", "system start"])
            .column_as("u", ["7", "42", "420"], ValueType::Uint16)
            .build()
            .unwrap();
        assert_rows(&Filter::regexp("", r"user \d+ ").unwrap(), &bs, &[0]);
        assert_rows(&Filter::regexp("", "logged (in|out)").unwrap(), &bs, &[0, 1]);
        assert_rows(&Filter::regexp("", "^system").unwrap(), &bs, &[2]);
        assert_rows(&Filter::regexp("u", "^42").unwrap(), &bs, &[1, 2]);
        assert_rows(&Filter::regexp("missing", "^$").unwrap(), &bs, &[0, 1, 2]);
        assert_rows(&Filter::regexp("missing", "x").unwrap(), &bs, &[]);
    }

    #[test]
    fn test_invalid_regexp() {
        let err = Filter::regexp("", "(unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidRegex(_)));
    }

    #[test]
    fn test_regexp_render() {
        let f = Filter::regexp("path", r"^/api/\d+").unwrap();
        assert_eq!(f.to_string(), r#"path:re("^/api/\\d+")"#);
    }
}
