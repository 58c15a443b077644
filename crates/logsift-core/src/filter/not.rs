//! Negation of a filter.

use std::fmt;

use crate::bitmap::{acquire_bitmap, Bitmap};
use crate::block::{BlockResult, BlockSearch};
use crate::error::Result;
use crate::stream::QueryContext;

use super::Filter;

/// Rows the wrapped filter does not match.
#[derive(Debug, Clone)]
pub struct NotFilter {
    filter: Box<Filter>,
}

impl NotFilter {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter: Box::new(filter),
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub(crate) fn prepare(&mut self, ctx: &QueryContext) -> Result<()> {
        self.filter.prepare(ctx)
    }

    pub(crate) fn apply_to_block_search(&self, bs: &BlockSearch, bm: &mut Bitmap) {
        let mut matched = acquire_bitmap(bm.len());
        matched.copy_from(bm);
        self.filter.apply_to_block_search(bs, &mut matched);
        bm.and_not(&matched);
    }

    pub(crate) fn apply_to_block_result(&self, br: &BlockResult, bm: &mut Bitmap) {
        let mut matched = acquire_bitmap(bm.len());
        matched.copy_from(bm);
        self.filter.apply_to_block_result(br, &mut matched);
        bm.and_not(&matched);
    }
}

impl fmt::Display for NotFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.filter.as_ref() {
            Filter::And(_) | Filter::Or(_) => write!(f, "!({})", self.filter),
            inner => write!(f, "!{inner}"),
        }
    }
}
