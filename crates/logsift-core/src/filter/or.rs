//! Disjunction of filters.

use std::fmt;

use crate::bitmap::{acquire_bitmap, Bitmap};
use crate::block::{BlockResult, BlockSearch};
use crate::error::Result;
use crate::stream::QueryContext;

use super::Filter;

/// Rows matching at least one child.
///
/// Each child only sees the rows no earlier child matched.
#[derive(Debug, Clone)]
pub struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
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
        self.apply(bm, |f, pending| f.apply_to_block_search(bs, pending));
    }

    pub(crate) fn apply_to_block_result(&self, br: &BlockResult, bm: &mut Bitmap) {
        self.apply(bm, |f, pending| f.apply_to_block_result(br, pending));
    }

    fn apply(&self, bm: &mut Bitmap, apply_child: impl Fn(&Filter, &mut Bitmap)) {
        let mut result = acquire_bitmap(bm.len());
        let mut pending = acquire_bitmap(bm.len());
        for f in &self.filters {
            pending.copy_from(bm);
            pending.and_not(&result);
            if pending.is_zero() {
                break;
            }
            apply_child(f, &mut pending);
            result.or(&pending);
        }
        bm.copy_from(&result);
    }
}

impl fmt::Display for OrFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{child}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::block::BlockBuilder;
    use crate::filter::test_util::assert_rows;
    use crate::filter::Filter;

    #[test]
    fn test_or() {
        let bs = BlockBuilder::new(vec![1, 2, 3, 4])
            .column("level", ["info", "error", "warn", "debug"])
            .build()
            .unwrap();
        let f = Filter::or([Filter::exact("level", "error"), Filter::exact("level", "warn")]);
        assert_rows(&f, &bs, &[1, 2]);
        let f = Filter::or([Filter::prefix("level", ""), Filter::exact("level", "warn")]);
        assert_rows(&f, &bs, &[0, 1, 2, 3]);
        let f = Filter::or([Filter::exact("level", "fatal")]);
        assert_rows(&f, &bs, &[]);
        assert_rows(&Filter::or([]), &bs, &[]);
    }

    #[test]
    fn test_or_inside_and() {
        let bs = BlockBuilder::new(vec![1, 2, 3, 4])
            .column("level", ["info", "error", "warn", "error"])
            .column("host", ["a", "a", "b", "b"])
            .build()
            .unwrap();
        let f = Filter::and([
            Filter::exact("host", "b"),
            Filter::or([Filter::exact("level", "error"), Filter::exact("level", "info")]),
        ]);
        assert_rows(&f, &bs, &[3]);
    }

    #[test]
    fn test_or_render() {
        let f = Filter::or([Filter::phrase("", "a"), Filter::exact("f", "b c")]);
        assert_eq!(f.to_string(), r#"a or f:exact("b c")"#);
    }
}
