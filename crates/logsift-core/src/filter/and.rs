//! Conjunction of filters.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::bitmap::Bitmap;
use crate::block::{canonical_field_name, BlockResult, BlockSearch};
use crate::error::Result;
use crate::stream::QueryContext;

use super::column::{ColumnFilter, ColumnView, Typed};
use super::Filter;

/// Rows matching every child.
///
/// Children run in order on a shared bitmap and evaluation stops once no
/// row is left.
#[derive(Debug, Clone)]
pub struct AndFilter {
    filters: Vec<Filter>,
    /// Token hashes per field, unioned over the free-text children of that
    /// field. Only fields with at least two such children are kept.
    field_tokens: OnceCell<Vec<(String, Vec<u64>)>>,
}

impl AndFilter {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            field_tokens: OnceCell::new(),
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub(crate) fn prepare(&mut self, ctx: &QueryContext) -> Result<()> {
        for f in &mut self.filters {
            f.prepare(ctx)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to_block_search(&self, bs: &BlockSearch, bm: &mut Bitmap) {
        if !self.matches_bloom_filters(bs) {
            bm.reset_bits();
            return;
        }
        for f in &self.filters {
            f.apply_to_block_search(bs, bm);
            if bm.is_zero() {
                return;
            }
        }
    }

    pub(crate) fn apply_to_block_result(&self, br: &BlockResult, bm: &mut Bitmap) {
        for f in &self.filters {
            f.apply_to_block_result(br, bm);
            if bm.is_zero() {
                return;
            }
        }
    }

    /// One bloom check per field for the union of the children's tokens.
    fn matches_bloom_filters(&self, bs: &BlockSearch) -> bool {
        let field_tokens = self.field_tokens.get_or_init(|| self.collect_field_tokens());
        field_tokens.iter().all(|(field, hashes)| {
            match ColumnView::from_search(bs, field) {
                ColumnView::Encoded(ev) if matches!(ev.typed(), Typed::String(_)) => {
                    ev.bloom_contains_all(hashes, "and")
                }
                _ => true,
            }
        })
    }

    fn collect_field_tokens(&self) -> Vec<(String, Vec<u64>)> {
        let mut groups: Vec<(String, usize, Vec<u64>)> = Vec::new();
        for f in &self.filters {
            let Some((field, hashes)) = free_text_tokens(f) else {
                continue;
            };
            let field = canonical_field_name(field);
            let idx = match groups.iter().position(|(name, _, _)| name == field) {
                Some(idx) => idx,
                None => {
                    groups.push((field.to_string(), 0, Vec::new()));
                    groups.len() - 1
                }
            };
            let (_, count, all) = &mut groups[idx];
            *count += 1;
            for &h in hashes {
                if !all.contains(&h) {
                    all.push(h);
                }
            }
        }
        groups
            .into_iter()
            .filter(|(_, count, hashes)| *count >= 2 && !hashes.is_empty())
            .map(|(field, _, hashes)| (field, hashes))
            .collect()
    }
}

/// Field and required token hashes of a free-text child.
fn free_text_tokens(f: &Filter) -> Option<(&str, &[u64])> {
    match f {
        Filter::Phrase(f) => Some((f.field_name(), f.hashes())),
        Filter::Prefix(f) => Some((f.field_name(), f.hashes())),
        Filter::Exact(f) => Some((f.field_name(), f.hashes())),
        Filter::ExactPrefix(f) => Some((f.field_name(), f.hashes())),
        Filter::Sequence(f) => Some((f.field_name(), f.hashes())),
        _ => None,
    }
}

impl fmt::Display for AndFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match child {
                Filter::Or(_) => write!(f, "({child})")?,
                _ => write!(f, "{child}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;
    use crate::filter::test_util::assert_rows;

    fn block() -> BlockSearch {
        BlockBuilder::new(vec![1, 2, 3, 4])
            .column(
                "",
                [
                    "GET /api/users 200",
                    "POST /api/users 500",
                    "GET /health 200",
                    "GET /api/orders 404",
                ],
            )
            .column("level", ["info", "error", "info", "warn"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_and() {
        let bs = block();
        let f = Filter::and([Filter::phrase("", "GET"), Filter::prefix("", "api")]);
        assert_rows(&f, &bs, &[0, 3]);
        let f = Filter::and([Filter::phrase("", "GET"), Filter::exact("level", "info")]);
        assert_rows(&f, &bs, &[0, 2]);
        let f = Filter::and([Filter::phrase("", "DELETE"), Filter::exact("level", "info")]);
        assert_rows(&f, &bs, &[]);
        assert_rows(&Filter::and([]), &bs, &[0, 1, 2, 3]);
    }

    #[test]
    fn test_and_field_tokens() {
        let f = AndFilter::new(vec![
            Filter::phrase("", "GET"),
            Filter::prefix("_msg", "api use"),
            Filter::exact("level", "info"),
            Filter::phrase("level", ""),
            Filter::phrase("host", "web"),
        ]);
        let tokens = f.collect_field_tokens();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].0, "_msg");
        assert_eq!(tokens[0].1.len(), 2);
        assert_eq!(tokens[1].0, "level");
        assert_eq!(tokens[1].1.len(), 1);
    }

    #[test]
    fn test_and_bloom_group() {
        let values: Vec<String> = (0..20).map(|i| format!("GET /api/item{i} 200")).collect();
        let bs = BlockBuilder::new((0..20).collect())
            .column("", values)
            .build()
            .unwrap();
        let f = Filter::and([Filter::phrase("", "item7"), Filter::phrase("", "GET")]);
        assert_rows(&f, &bs, &[7]);
        let f = Filter::and([Filter::phrase("", "POST"), Filter::phrase("", "GET")]);
        assert_rows(&f, &bs, &[]);
        // Each phrase is present in the column, but never in the same row.
        let f = Filter::and([Filter::phrase("", "item3"), Filter::phrase("", "item4")]);
        assert_rows(&f, &bs, &[]);
    }

    #[test]
    fn test_and_render() {
        let f = Filter::and([
            Filter::phrase("", "a"),
            Filter::or([Filter::phrase("", "b"), Filter::phrase("", "c")]),
            Filter::not(Filter::exact("x", "d")),
        ]);
        assert_eq!(f.to_string(), "a (b or c) !x:exact(d)");
    }
}
