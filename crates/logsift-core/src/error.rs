//! Core error types.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the filter engine.
///
/// Operands that cannot match a column are not errors: the affected rows are
/// simply excluded. Broken block invariants discovered during evaluation
/// panic instead of being reported here.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream index failed to resolve a stream selector.
    #[error("stream index error: {0}")]
    StreamIndex(String),

    /// A regular expression operand did not compile.
    #[error("invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// A filter was constructed with invalid operands.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A stream ID string could not be decoded.
    #[error("invalid stream id: {0}")]
    InvalidStreamId(String),

    /// Block data handed to a constructor is inconsistent.
    #[error("invalid block: {0}")]
    InvalidBlock(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
