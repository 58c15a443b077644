//! Column headers and encoded column data.

use crate::bloom::BloomFilter;
use crate::column::{ColumnValues, EncodedValues, ValueType};

/// Persisted metadata of one encoded column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnHeader {
    pub name: String,
    pub value_type: ValueType,
    /// Column minimum, see [`EncodedValues`] for the per-type layout.
    pub min_value: u64,
    pub max_value: u64,
    /// Dictionary for [`ValueType::Dict`] columns.
    pub dict_values: Vec<String>,
    /// Tokens of the canonical string form of every value in the column.
    pub bloom: Option<BloomFilter>,
}

impl ColumnHeader {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            min_value: 0,
            max_value: 0,
            dict_values: Vec::new(),
            bloom: None,
        }
    }

    pub fn min_f64(&self) -> f64 {
        f64::from_bits(self.min_value)
    }

    pub fn max_f64(&self) -> f64 {
        f64::from_bits(self.max_value)
    }

    pub fn min_i64(&self) -> i64 {
        self.min_value as i64
    }

    pub fn max_i64(&self) -> i64 {
        self.max_value as i64
    }
}

/// Header plus typed values of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnData {
    pub header: ColumnHeader,
    pub values: ColumnValues,
}

impl ColumnData {
    /// Wrap encoder output under `name`.
    pub fn from_encoded(name: impl Into<String>, encoded: EncodedValues) -> Self {
        let header = ColumnHeader {
            name: name.into(),
            value_type: encoded.value_type(),
            min_value: encoded.min_value,
            max_value: encoded.max_value,
            dict_values: encoded.dict_values,
            bloom: None,
        };
        Self {
            header,
            values: encoded.values,
        }
    }

    pub fn with_bloom(mut self, bloom: BloomFilter) -> Self {
        self.header.bloom = Some(bloom);
        self
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// Decode every row to its string form.
    pub fn decode(&self) -> Vec<String> {
        self.values.decode(&self.header.dict_values)
    }
}

/// A name/value pair, used for const columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
