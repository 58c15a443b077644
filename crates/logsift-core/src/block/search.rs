//! Read-only view over a persisted block.

use crate::column::{ColumnValues, ValueType};
use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::stream::{format_stream_tags, StreamId};

use super::{canonical_field_name, ColumnData, Field, STREAM_FIELD, STREAM_ID_FIELD, TIME_FIELD};

/// A persisted block as seen by filters.
///
/// Holds the per-row timestamps, const columns (one value shared by every
/// row) and encoded columns with their headers. The block is immutable once
/// built; filters only narrow the caller's bitmap.
#[derive(Debug, Clone)]
pub struct BlockSearch {
    location: String,
    stream_id: StreamId,
    stream_id_str: String,
    stream_tags: Vec<(String, String)>,
    stream_str: String,
    timestamps: Vec<i64>,
    min_timestamp: i64,
    max_timestamp: i64,
    const_columns: Vec<Field>,
    columns: Vec<ColumnData>,
    config: SearchConfig,
}

impl BlockSearch {
    /// Assemble a block, checking that every column covers every row and
    /// that headers agree with their values.
    pub fn new(
        location: impl Into<String>,
        stream_id: StreamId,
        timestamps: Vec<i64>,
        const_columns: Vec<Field>,
        columns: Vec<ColumnData>,
    ) -> Result<Self> {
        let location = location.into();
        let rows = timestamps.len();
        let mut names: Vec<&str> = Vec::new();

        let mut const_columns = const_columns;
        for field in &mut const_columns {
            field.name = canonical_field_name(&field.name).to_string();
        }
        let mut columns = columns;
        for col in &mut columns {
            col.header.name = canonical_field_name(&col.header.name).to_string();
        }

        for name in const_columns
            .iter()
            .map(|f| f.name.as_str())
            .chain(columns.iter().map(|c| c.header.name.as_str()))
        {
            if name == TIME_FIELD {
                return Err(Error::InvalidBlock(format!(
                    "{location}: {TIME_FIELD} is reserved for row timestamps"
                )));
            }
            if names.contains(&name) {
                return Err(Error::InvalidBlock(format!(
                    "{location}: duplicate column {name:?}"
                )));
            }
            names.push(name);
        }

        for col in &columns {
            validate_column(&location, col, rows)?;
        }

        let min_timestamp = timestamps.iter().copied().min().unwrap_or(0);
        let max_timestamp = timestamps.iter().copied().max().unwrap_or(0);
        Ok(Self {
            location,
            stream_id,
            stream_id_str: stream_id.to_string(),
            stream_tags: Vec::new(),
            stream_str: String::new(),
            timestamps,
            min_timestamp,
            max_timestamp,
            const_columns,
            columns,
            config: SearchConfig::default(),
        })
    }

    /// Attach the stream's tags, exposed through the `_stream` field.
    pub fn with_stream_tags(mut self, tags: Vec<(String, String)>) -> Self {
        self.stream_str = if tags.is_empty() {
            String::new()
        } else {
            format_stream_tags(&tags)
        };
        self.stream_tags = tags;
        self
    }

    /// Use `config` when evaluating filters against this block.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Diagnostic label of the block, e.g. its part path.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn stream_tags(&self) -> &[(String, String)] {
        &self.stream_tags
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn rows_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn min_timestamp(&self) -> i64 {
        self.min_timestamp
    }

    pub fn max_timestamp(&self) -> i64 {
        self.max_timestamp
    }

    pub fn const_columns(&self) -> &[Field] {
        &self.const_columns
    }

    pub fn columns(&self) -> &[ColumnData] {
        &self.columns
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Value of a const field, including the `_stream` and `_stream_id`
    /// metadata fields.
    pub fn const_column_value(&self, name: &str) -> Option<&str> {
        let name = canonical_field_name(name);
        if name == STREAM_ID_FIELD {
            return Some(&self.stream_id_str);
        }
        if name == STREAM_FIELD && !self.stream_str.is_empty() {
            return Some(&self.stream_str);
        }
        self.const_columns
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Encoded column named `name`.
    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        let name = canonical_field_name(name);
        self.columns.iter().find(|c| c.header.name == name)
    }
}

fn validate_column(location: &str, col: &ColumnData, rows: usize) -> Result<()> {
    let name = &col.header.name;
    if col.values.len() != rows {
        return Err(Error::InvalidBlock(format!(
            "{location}: column {name:?} has {} values for {rows} rows",
            col.values.len()
        )));
    }
    if col.header.value_type != col.values.value_type() {
        return Err(Error::InvalidBlock(format!(
            "{location}: column {name:?} header says {} but values are {}",
            col.header.value_type,
            col.values.value_type()
        )));
    }
    if let ColumnValues::Dict(ids) = &col.values {
        let dict_len = col.header.dict_values.len();
        if let Some(id) = ids.iter().find(|&&id| id as usize >= dict_len) {
            return Err(Error::InvalidBlock(format!(
                "{location}: column {name:?} references dict entry {id} of {dict_len}"
            )));
        }
    } else if col.header.value_type != ValueType::Dict && !col.header.dict_values.is_empty() {
        return Err(Error::InvalidBlock(format!(
            "{location}: non-dict column {name:?} carries dict values"
        )));
    }
    Ok(())
}
