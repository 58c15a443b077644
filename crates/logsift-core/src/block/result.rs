//! In-memory block results passed between pipeline stages.

use once_cell::sync::OnceCell;

use crate::column::format::write_timestamp_rfc3339_nano;
use crate::column::{ValueType, ValuesEncoder};
use crate::error::{Error, Result};

use super::{
    canonical_field_name, BlockSearch, ColumnData, STREAM_FIELD, STREAM_ID_FIELD, TIME_FIELD,
};

/// Storage of one result column.
#[derive(Debug, Clone)]
pub enum ResultColumnData {
    /// One value shared by every row.
    Const(String),
    /// Row timestamps in Unix nanoseconds.
    Time(Vec<i64>),
    Encoded(ColumnData),
}

/// A column of a [`BlockResult`] with lazily decoded string values.
#[derive(Debug, Clone)]
pub struct BlockResultColumn {
    name: String,
    rows: usize,
    data: ResultColumnData,
    decoded: OnceCell<Vec<String>>,
}

impl BlockResultColumn {
    fn new(name: &str, rows: usize, data: ResultColumnData) -> Self {
        Self {
            name: canonical_field_name(name).to_string(),
            rows,
            data,
            decoded: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ResultColumnData {
        &self.data
    }

    pub fn is_const(&self) -> bool {
        matches!(self.data, ResultColumnData::Const(_))
    }

    pub fn is_time(&self) -> bool {
        matches!(self.data, ResultColumnData::Time(_))
    }

    /// Encoding of the column. Const and time columns read as strings.
    pub fn value_type(&self) -> ValueType {
        match &self.data {
            ResultColumnData::Encoded(col) => col.header.value_type,
            ResultColumnData::Const(_) | ResultColumnData::Time(_) => ValueType::String,
        }
    }

    pub fn dict_values(&self) -> &[String] {
        match &self.data {
            ResultColumnData::Encoded(col) => &col.header.dict_values,
            ResultColumnData::Const(_) | ResultColumnData::Time(_) => &[],
        }
    }

    /// Encoded data, if the column is neither const nor time.
    pub fn values_encoded(&self) -> Option<&ColumnData> {
        match &self.data {
            ResultColumnData::Encoded(col) => Some(col),
            ResultColumnData::Const(_) | ResultColumnData::Time(_) => None,
        }
    }

    /// Per-row string values, decoded on first access.
    pub fn values(&self) -> &[String] {
        self.decoded.get_or_init(|| match &self.data {
            ResultColumnData::Const(v) => vec![v.clone(); self.rows],
            ResultColumnData::Time(timestamps) => {
                let mut buf = String::new();
                timestamps
                    .iter()
                    .map(|&ts| {
                        buf.clear();
                        write_timestamp_rfc3339_nano(&mut buf, ts);
                        buf.clone()
                    })
                    .collect()
            }
            ResultColumnData::Encoded(col) => col.decode(),
        })
    }

    pub(crate) fn decoded_cell(&self) -> &OnceCell<Vec<String>> {
        &self.decoded
    }
}

/// Rows produced by an earlier pipeline stage.
///
/// Filters only read it; unknown columns read as const "".
#[derive(Debug, Clone, Default)]
pub struct BlockResult {
    timestamps: Vec<i64>,
    columns: Vec<BlockResultColumn>,
}

impl BlockResult {
    /// Empty result over rows with `timestamps`.
    pub fn new(timestamps: Vec<i64>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
        }
    }

    /// Materialize every column of a persisted block, plus `_time`,
    /// `_stream_id` and `_stream` when the stream has tags.
    pub fn from_block_search(bs: &BlockSearch) -> Self {
        let mut br = Self::new(bs.timestamps().to_vec());
        br.add_time_column();
        br.add_const_column(STREAM_ID_FIELD, bs.stream_id().to_string());
        if let Some(stream) = bs.const_column_value(STREAM_FIELD) {
            br.add_const_column(STREAM_FIELD, stream);
        }
        for field in bs.const_columns() {
            br.add_const_column(&field.name, field.value.clone());
        }
        for col in bs.columns() {
            br.add_encoded_column(col.clone());
        }
        br
    }

    pub fn rows_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[BlockResultColumn] {
        &self.columns
    }

    /// Column named `name`, if present.
    pub fn column(&self, name: &str) -> Option<&BlockResultColumn> {
        let name = canonical_field_name(name);
        self.columns.iter().find(|c| c.name == name)
    }

    /// Add or replace a const column.
    pub fn add_const_column(&mut self, name: &str, value: impl Into<String>) {
        let data = ResultColumnData::Const(value.into());
        let col = BlockResultColumn::new(name, self.rows_count(), data);
        self.upsert(col);
    }

    /// Add or replace the `_time` column.
    pub fn add_time_column(&mut self) {
        let col = BlockResultColumn::new(
            TIME_FIELD,
            self.rows_count(),
            ResultColumnData::Time(self.timestamps.clone()),
        );
        self.upsert(col);
    }

    /// Add or replace a column from per-row strings, encoding it the way the
    /// block builder would.
    pub fn add_string_column<I, S>(&mut self, name: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() != self.rows_count() {
            return Err(Error::InvalidBlock(format!(
                "column {name:?} has {} values for {} rows",
                values.len(),
                self.rows_count()
            )));
        }
        let encoded = ValuesEncoder::default().encode(&values);
        let col = ColumnData::from_encoded(name, encoded);
        self.upsert(BlockResultColumn::new(
            name,
            self.rows_count(),
            ResultColumnData::Encoded(col),
        ));
        Ok(())
    }

    /// Add or replace an already encoded column.
    pub fn add_encoded_column(&mut self, col: ColumnData) {
        let name = col.header.name.clone();
        let col = BlockResultColumn::new(&name, self.rows_count(), ResultColumnData::Encoded(col));
        self.upsert(col);
    }

    fn upsert(&mut self, col: BlockResultColumn) {
        match self.columns.iter_mut().find(|c| c.name == col.name) {
            Some(existing) => *existing = col,
            None => self.columns.push(col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;

    #[test]
    fn test_from_block_search() {
        let bs = BlockBuilder::new(vec![1_000_000_000, 2_500_000_000])
            .stream_tags(vec![("app".into(), "api".into())])
            .column("host", ["h1", "h1"])
            .column("status", ["200", "404"])
            .build()
            .unwrap();
        let br = BlockResult::from_block_search(&bs);
        assert_eq!(br.rows_count(), 2);
        assert!(br.column("host").unwrap().is_const());
        assert!(br.column("_time").unwrap().is_time());
        assert_eq!(br.column("status").unwrap().values(), &["200", "404"]);
        assert_eq!(
            br.column("_time").unwrap().values(),
            &["1970-01-01T00:00:01Z", "1970-01-01T00:00:02.5Z"]
        );
        assert_eq!(br.column("_stream").unwrap().values(), &[r#"{app="api"}"#; 2]);
        assert!(br.column("missing").is_none());
    }

    #[test]
    fn test_add_columns_upserts() {
        let mut br = BlockResult::new(vec![1, 2, 3]);
        br.add_string_column("n", ["1", "20", "300"]).unwrap();
        assert_eq!(br.column("n").unwrap().value_type(), ValueType::Dict);
        br.add_const_column("n", "x");
        assert_eq!(br.columns().len(), 1);
        assert_eq!(br.column("n").unwrap().values(), &["x", "x", "x"]);
        assert!(br.add_string_column("bad", ["1"]).is_err());
    }

    #[test]
    fn test_msg_alias() {
        let mut br = BlockResult::new(vec![1]);
        br.add_const_column("", "hello");
        assert_eq!(br.column("_msg").unwrap().values(), &["hello"]);
    }
}
