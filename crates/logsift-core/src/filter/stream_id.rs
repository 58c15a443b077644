//! `_stream_id:in(...)`: the row belongs to one of the listed streams.

use std::collections::HashSet;
use std::fmt;

use crate::bitmap::Bitmap;
use crate::block::{BlockResult, BlockSearch, STREAM_ID_FIELD};
use crate::error::Result;
use crate::stream::StreamId;

use super::column::{match_strings, ColumnView};

#[derive(Debug, Clone)]
pub struct StreamIdFilter {
    /// In the order given, for rendering.
    ids: Vec<StreamId>,
    set: HashSet<StreamId>,
}

impl StreamIdFilter {
    pub fn new(ids: impl IntoIterator<Item = StreamId>) -> Self {
        let mut list = Vec::new();
        let mut set = HashSet::new();
        for sid in ids {
            if set.insert(sid) {
                list.push(sid);
            }
        }
        Self { ids: list, set }
    }

    /// Parse stream IDs from their 48-char hex form.
    pub fn parse<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = ids
            .into_iter()
            .map(|s| s.as_ref().parse::<StreamId>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(ids))
    }

    pub fn stream_ids(&self) -> &[StreamId] {
        &self.ids
    }

    pub(crate) fn apply_to_block_search(&self, bs: &BlockSearch, bm: &mut Bitmap) {
        if !self.set.contains(&bs.stream_id()) {
            bm.reset_bits();
        }
    }

    pub(crate) fn apply_to_block_result(&self, br: &BlockResult, bm: &mut Bitmap) {
        if self.set.is_empty() {
            bm.reset_bits();
            return;
        }
        let col = ColumnView::from_result(br, STREAM_ID_FIELD);
        match_strings(&col, bm, |s| {
            s.parse::<StreamId>().is_ok_and(|sid| self.set.contains(&sid))
        });
    }
}

impl fmt::Display for StreamIdFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{STREAM_ID_FIELD}:in(")?;
        for (i, sid) in self.ids.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{sid}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;
    use crate::error::Error;
    use crate::filter::Filter;
    use crate::stream::TenantId;

    fn block(id: u128) -> BlockSearch {
        BlockBuilder::new(vec![1, 2, 3])
            .stream_id(StreamId::new(TenantId::new(3, 4), id))
            .build()
            .unwrap()
    }

    #[test]
    fn test_stream_id_filter() {
        let wanted = StreamId::new(TenantId::new(3, 4), 10);
        let f = Filter::stream_id([wanted]);
        assert_eq!(f.search_block(&block(10)).to_indices(), vec![0, 1, 2]);
        assert!(f.search_block(&block(11)).is_zero());
        let br = BlockResult::from_block_search(&block(10));
        assert_eq!(f.filter_result(&br).to_indices(), vec![0, 1, 2]);

        let empty = Filter::stream_id([]);
        assert!(empty.search_block(&block(10)).is_zero());
        assert!(empty.filter_result(&br).is_zero());
    }

    #[test]
    fn test_stream_id_parse() {
        let sid = StreamId::new(TenantId::new(3, 4), 10);
        let f = StreamIdFilter::parse([sid.to_string(), sid.to_string()]).unwrap();
        assert_eq!(f.stream_ids(), &[sid]);
        assert_eq!(f.to_string(), format!("_stream_id:in({sid})"));
        let err = StreamIdFilter::parse(["nope"]).unwrap_err();
        assert!(matches!(err, Error::InvalidStreamId(_)));
    }
}
