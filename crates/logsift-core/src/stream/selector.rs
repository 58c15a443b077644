//! Stream selectors: `{tag="value", other=~"re.*" or ...}`.

use std::fmt;

use regex::Regex;

use crate::error::Result;

/// Comparison applied by a [`TagFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagOp {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `=~`, full match.
    Regex,
    /// `!~`, full match.
    NotRegex,
}

impl TagOp {
    pub fn as_str(self) -> &'static str {
        match self {
            TagOp::Eq => "=",
            TagOp::NotEq => "!=",
            TagOp::Regex => "=~",
            TagOp::NotRegex => "!~",
        }
    }
}

/// One `name op "value"` condition over stream tags.
#[derive(Debug, Clone)]
pub struct TagFilter {
    name: String,
    op: TagOp,
    value: String,
    regex: Option<Regex>,
}

impl TagFilter {
    /// Create a tag filter. Regex operands are anchored on both ends.
    pub fn new(name: impl Into<String>, op: TagOp, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let regex = match op {
            TagOp::Regex | TagOp::NotRegex => Some(Regex::new(&format!("^(?:{value})$"))?),
            TagOp::Eq | TagOp::NotEq => None,
        };
        Ok(Self {
            name: name.into(),
            op,
            value,
            regex,
        })
    }

    /// Shorthand for an `=` filter.
    pub fn eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: TagOp::Eq,
            value: value.into(),
            regex: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op(&self) -> TagOp {
        self.op
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the tag set satisfies the condition. A missing tag reads as "".
    pub fn matches(&self, tags: &[(String, String)]) -> bool {
        let actual = tags
            .iter()
            .find(|(k, _)| *k == self.name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("");
        match (self.op, &self.regex) {
            (TagOp::Eq, _) => actual == self.value,
            (TagOp::NotEq, _) => actual != self.value,
            (TagOp::Regex, Some(re)) => re.is_match(actual),
            (TagOp::NotRegex, Some(re)) => !re.is_match(actual),
            (TagOp::Regex | TagOp::NotRegex, None) => false,
        }
    }
}

impl PartialEq for TagFilter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.op == other.op && self.value == other.value
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{:?}", self.name, self.op.as_str(), self.value)
    }
}

/// Conjunction of tag filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AndStreamFilter {
    pub tag_filters: Vec<TagFilter>,
}

impl AndStreamFilter {
    pub fn new(tag_filters: Vec<TagFilter>) -> Self {
        Self { tag_filters }
    }

    pub fn matches(&self, tags: &[(String, String)]) -> bool {
        self.tag_filters.iter().all(|tf| tf.matches(tags))
    }
}

/// Disjunction of [`AndStreamFilter`]s. The empty selector matches every
/// stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSelector {
    pub or_filters: Vec<AndStreamFilter>,
}

impl StreamSelector {
    pub fn new(or_filters: Vec<AndStreamFilter>) -> Self {
        Self { or_filters }
    }

    /// Selector with a single conjunction.
    pub fn all_of(tag_filters: Vec<TagFilter>) -> Self {
        Self::new(vec![AndStreamFilter::new(tag_filters)])
    }

    /// Whether the selector places no constraint on streams.
    pub fn is_empty(&self) -> bool {
        self.or_filters.iter().all(|af| af.tag_filters.is_empty())
    }

    /// Whether a stream with `tags` is selected.
    pub fn matches(&self, tags: &[(String, String)]) -> bool {
        self.is_empty() || self.or_filters.iter().any(|af| af.matches(tags))
    }
}

impl fmt::Display for StreamSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, af) in self.or_filters.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            for (j, tf) in af.tag_filters.iter().enumerate() {
                if j > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{tf}")?;
            }
        }
        f.write_str("}")
    }
}
