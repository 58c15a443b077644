//! `*`: matches every row.

use std::fmt;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFilter;

impl fmt::Display for NoopFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("*")
    }
}

#[cfg(test)]
mod tests {
    use crate::block::BlockBuilder;
    use crate::filter::test_util::assert_rows;
    use crate::filter::Filter;

    #[test]
    fn test_noop() {
        let bs = BlockBuilder::new(vec![1, 2, 3]).build().unwrap();
        assert_rows(&Filter::noop(), &bs, &[0, 1, 2]);
        assert_eq!(Filter::noop().to_string(), "*");
        assert!(Filter::noop().needed_fields().is_empty());
    }
}
