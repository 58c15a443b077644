//! Logsift Core - filter evaluation over columnar log blocks.
//!
//! This crate decides which rows of a log block match a parsed query
//! predicate. Filters run either against a persisted block (`BlockSearch`),
//! where bloom filters and column summaries let whole columns be rejected
//! cheaply, or against an in-memory `BlockResult` produced by earlier
//! pipeline stages.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod bitmap;
pub mod block;
pub mod bloom;
pub mod column;
pub mod config;
pub mod error;
pub mod filter;
pub mod stream;
pub mod tokenizer;

pub use bitmap::{acquire_bitmap, Bitmap, PooledBitmap};
pub use block::{
    BlockBuilder, BlockResult, BlockResultColumn, BlockSearch, ColumnData, ColumnHeader, Field,
};
pub use bloom::{BloomConfig, BloomFilter};
pub use column::{ColumnValues, EncodedValues, ValueType};
pub use config::SearchConfig;
pub use error::{Error, Result};
pub use filter::Filter;
pub use stream::{
    MemoryStreamIndex, QueryContext, StreamId, StreamIndex, StreamSelector, TagFilter, TagOp,
    TenantId,
};
