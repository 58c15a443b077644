//! Builds persisted-style blocks from raw string columns.

use crate::bloom::{BloomConfig, BloomFilter};
use crate::column::{ValueType, ValuesEncoder};
use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::stream::StreamId;
use crate::tokenizer::tokenize_strings;

use super::{BlockSearch, ColumnData, Field};

enum PendingColumn {
    Auto(String, Vec<String>),
    Typed(String, Vec<String>, ValueType),
}

/// Ingestion-side block builder.
///
/// Columns holding one non-empty value in every row become const columns,
/// columns that are empty in every row are dropped, and the rest are
/// encoded and get a bloom filter over the tokens of their canonical
/// string forms.
///
/// ```
/// use logsift_core::BlockBuilder;
///
/// let block = BlockBuilder::new(vec![1, 2, 3])
///     .column("level", ["info", "warn", "info"])
///     .build()
///     .unwrap();
/// assert_eq!(block.rows_count(), 3);
/// ```
pub struct BlockBuilder {
    timestamps: Vec<i64>,
    location: String,
    stream_id: StreamId,
    stream_tags: Vec<(String, String)>,
    columns: Vec<PendingColumn>,
    encoder: ValuesEncoder,
    bloom_config: BloomConfig,
    search_config: SearchConfig,
}

impl BlockBuilder {
    pub fn new(timestamps: Vec<i64>) -> Self {
        Self {
            timestamps,
            location: "memory".to_string(),
            stream_id: StreamId::default(),
            stream_tags: Vec::new(),
            columns: Vec::new(),
            encoder: ValuesEncoder::default(),
            bloom_config: BloomConfig::default(),
            search_config: SearchConfig::default(),
        }
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn stream_id(mut self, stream_id: StreamId) -> Self {
        self.stream_id = stream_id;
        self
    }

    pub fn stream_tags(mut self, tags: Vec<(String, String)>) -> Self {
        self.stream_tags = tags;
        self
    }

    pub fn encoder(mut self, encoder: ValuesEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn bloom_config(mut self, config: BloomConfig) -> Self {
        self.bloom_config = config;
        self
    }

    pub fn search_config(mut self, config: SearchConfig) -> Self {
        self.search_config = config;
        self
    }

    /// Add a column and let the encoder pick its encoding.
    pub fn column<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.columns.push(PendingColumn::Auto(name.into(), values));
        self
    }

    /// Add a column forced into `value_type`. It is never turned into a
    /// const column.
    pub fn column_as<I, S>(
        mut self,
        name: impl Into<String>,
        values: I,
        value_type: ValueType,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.columns
            .push(PendingColumn::Typed(name.into(), values, value_type));
        self
    }

    pub fn build(self) -> Result<BlockSearch> {
        let rows = self.timestamps.len();
        let mut const_columns = Vec::new();
        let mut columns = Vec::new();

        for pending in self.columns {
            let (name, values, forced) = match pending {
                PendingColumn::Auto(name, values) => (name, values, None),
                PendingColumn::Typed(name, values, vt) => (name, values, Some(vt)),
            };
            if values.len() != rows {
                return Err(Error::InvalidBlock(format!(
                    "{}: column {name:?} has {} values for {rows} rows",
                    self.location,
                    values.len()
                )));
            }
            let encoded = match forced {
                Some(vt) => self.encoder.encode_as(&values, vt)?,
                None => {
                    if values.iter().all(|v| v.is_empty()) {
                        continue;
                    }
                    if values.iter().all(|v| *v == values[0]) {
                        const_columns.push(Field::new(name, values[0].clone()));
                        continue;
                    }
                    self.encoder.encode(&values)
                }
            };
            let col = ColumnData::from_encoded(name, encoded);
            let tokens = tokenize_strings(col.decode());
            let bloom = BloomFilter::from_tokens(&tokens, self.bloom_config);
            columns.push(col.with_bloom(bloom));
        }

        Ok(BlockSearch::new(
            self.location,
            self.stream_id,
            self.timestamps,
            const_columns,
            columns,
        )?
        .with_stream_tags(self.stream_tags)
        .with_config(self.search_config))
    }
}
