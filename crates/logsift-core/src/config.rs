//! Search configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Knobs controlling how filters evaluate persisted blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Consult column bloom filters before scanning rows.
    ///
    /// Disabling this never changes results, only the amount of work.
    pub use_bloom_filters: bool,

    /// Above this many per-value token sets, `in` and `contains_any` skip the
    /// bloom pre-check and scan every row instead.
    pub max_token_sets: usize,

    /// Skip the token-set bloom check when there are more token sets than
    /// `token_sets_per_row_limit * rows` in the block.
    pub token_sets_per_row_limit: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            use_bloom_filters: true,
            max_token_sets: 1000,
            token_sets_per_row_limit: 10,
        }
    }
}

impl SearchConfig {
    /// Load a config from JSON. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the config values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.token_sets_per_row_limit == 0 {
            return Err(Error::Config(
                "token_sets_per_row_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Enable or disable bloom filter pre-checks.
    pub fn use_bloom_filters(mut self, enabled: bool) -> Self {
        self.use_bloom_filters = enabled;
        self
    }

    /// Set the token set limit for `in`-style filters.
    pub fn max_token_sets(mut self, max: usize) -> Self {
        self.max_token_sets = max;
        self
    }

    /// Set the per-row token set limit.
    pub fn token_sets_per_row_limit(mut self, limit: u64) -> Self {
        self.token_sets_per_row_limit = limit;
        self
    }

    /// Whether a bloom check over `token_sets` sets is worth doing for a block
    /// with `rows` rows.
    pub(crate) fn token_sets_worth_checking(&self, token_sets: usize, rows: usize) -> bool {
        token_sets <= self.max_token_sets
            && (token_sets as u64) <= self.token_sets_per_row_limit.saturating_mul(rows as u64)
    }
}
