//! Block views that filters evaluate against.
//!
//! [`BlockSearch`] is the persisted view with column headers, bloom filters
//! and min/max summaries. [`BlockResult`] is the in-memory view produced by
//! earlier pipeline stages.

mod builder;
mod header;
mod result;
mod search;

pub use builder::BlockBuilder;
pub use header::{ColumnData, ColumnHeader, Field};
pub use result::{BlockResult, BlockResultColumn, ResultColumnData};
pub use search::BlockSearch;

/// Field holding the log message. The empty field name is an alias.
pub const MSG_FIELD: &str = "_msg";
/// Synthetic field exposing row timestamps.
pub const TIME_FIELD: &str = "_time";
/// Field exposing the block's stream ID.
pub const STREAM_ID_FIELD: &str = "_stream_id";
/// Field exposing the block's rendered stream tags.
pub const STREAM_FIELD: &str = "_stream";

/// Map the empty field name to `_msg`.
pub fn canonical_field_name(name: &str) -> &str {
    if name.is_empty() {
        MSG_FIELD
    } else {
        name
    }
}
