//! `value_type(t)`: the column is stored with the given encoding.

use std::fmt;

use crate::bitmap::Bitmap;
use crate::column::ValueType;
use crate::error::Result;

use super::column::{ColumnFilter, ColumnView};
use super::render::{quote_field_name_if_needed, quote_token_if_needed};

const CONST_TYPE: &str = "const";
const TIME_TYPE: &str = "time";

#[derive(Debug, Clone)]
pub struct ValueTypeFilter {
    field: String,
    value_type: String,
}

impl ValueTypeFilter {
    /// `value_type` is "const", "time" or a [`ValueType`] name.
    pub fn new(field: impl Into<String>, value_type: impl Into<String>) -> Result<Self> {
        let value_type = value_type.into();
        if value_type != CONST_TYPE && value_type != TIME_TYPE {
            value_type.parse::<ValueType>()?;
        }
        Ok(Self {
            field: field.into(),
            value_type,
        })
    }

    pub fn value_type(&self) -> &str {
        &self.value_type
    }
}

impl ColumnFilter for ValueTypeFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let actual = match col {
            ColumnView::Missing => {
                bm.reset_bits();
                return;
            }
            ColumnView::Const(_) => CONST_TYPE,
            ColumnView::Time(_) => TIME_TYPE,
            ColumnView::Encoded(ev) => ev.header.value_type.as_str(),
        };
        if actual != self.value_type {
            bm.reset_bits();
        }
    }
}

impl fmt::Display for ValueTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}value_type({})",
            quote_field_name_if_needed(&self.field),
            quote_token_if_needed(&self.value_type)
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::block::BlockBuilder;
    use crate::column::ValueType;
    use crate::error::Error;
    use crate::filter::test_util::assert_rows;
    use crate::filter::Filter;

    #[test]
    fn test_value_type() {
        let bs = BlockBuilder::new(vec![1, 2])
            .column("level", ["info", "warn"])
            .column_as("u", ["1", "2"], ValueType::Uint64)
            .column("host", ["web-1", "web-1"])
            .build()
            .unwrap();
        assert_rows(&Filter::value_type("level", "dict").unwrap(), &bs, &[0, 1]);
        assert_rows(&Filter::value_type("level", "string").unwrap(), &bs, &[]);
        assert_rows(&Filter::value_type("u", "uint64").unwrap(), &bs, &[0, 1]);
        assert_rows(&Filter::value_type("host", "const").unwrap(), &bs, &[0, 1]);
        assert_rows(&Filter::value_type("_time", "time").unwrap(), &bs, &[0, 1]);
        assert_rows(&Filter::value_type("missing", "const").unwrap(), &bs, &[]);
        assert_rows(&Filter::value_type("missing", "string").unwrap(), &bs, &[]);
    }

    #[test]
    fn test_value_type_unknown() {
        let err = Filter::value_type("x", "uint128").unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
        assert_eq!(
            Filter::value_type("x", "ipv4").unwrap().to_string(),
            "x:value_type(ipv4)"
        );
    }
}
