//! `_stream:{...}`: the row belongs to a stream matching a tag selector.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::bitmap::Bitmap;
use crate::block::{BlockResult, BlockSearch, STREAM_FIELD, STREAM_ID_FIELD};
use crate::error::Result;
use crate::stream::{QueryContext, StreamId, StreamSelector};

use super::column::{match_strings, ColumnView};

/// Stream selector filter.
///
/// The selector is resolved to stream IDs through the query's
/// [`QueryContext`] in [`prepare`](StreamFilter::prepare). Resolved IDs belong
/// to one query; preparing again for another query replaces them.
#[derive(Debug, Clone)]
pub struct StreamFilter {
    selector: StreamSelector,
    stream_ids: Option<Arc<HashSet<StreamId>>>,
}

impl StreamFilter {
    pub fn new(selector: StreamSelector) -> Self {
        Self {
            selector,
            stream_ids: None,
        }
    }

    pub fn selector(&self) -> &StreamSelector {
        &self.selector
    }

    /// Resolve the selector for the query behind `ctx`.
    pub fn prepare(&mut self, ctx: &QueryContext) -> Result<()> {
        if self.selector.is_empty() {
            return Ok(());
        }
        self.stream_ids = Some(ctx.resolve_stream_ids(&self.selector)?);
        Ok(())
    }

    fn stream_ids(&self) -> &HashSet<StreamId> {
        match &self.stream_ids {
            Some(ids) => ids,
            None => panic!("BUG: stream filter {self} applied before prepare"),
        }
    }

    pub(crate) fn apply_to_block_search(&self, bs: &BlockSearch, bm: &mut Bitmap) {
        if self.selector.is_empty() {
            return;
        }
        if !self.stream_ids().contains(&bs.stream_id()) {
            bm.reset_bits();
        }
    }

    pub(crate) fn apply_to_block_result(&self, br: &BlockResult, bm: &mut Bitmap) {
        if self.selector.is_empty() {
            return;
        }
        let ids = self.stream_ids();
        let col = ColumnView::from_result(br, STREAM_ID_FIELD);
        match_strings(&col, bm, |s| {
            s.parse::<StreamId>().is_ok_and(|sid| ids.contains(&sid))
        });
    }
}

impl fmt::Display for StreamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{STREAM_FIELD}:{}", self.selector)
    }
}
