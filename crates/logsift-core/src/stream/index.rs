//! Stream index boundary.

use parking_lot::RwLock;

use crate::error::Result;

use super::{StreamId, StreamSelector, TenantId};

/// Resolves stream selectors to stream IDs.
///
/// Implementations are shared across worker threads and queries.
pub trait StreamIndex: Send + Sync {
    /// IDs of all streams of `tenants` whose tags satisfy `selector`.
    fn search_stream_ids(
        &self,
        tenants: &[TenantId],
        selector: &StreamSelector,
    ) -> Result<Vec<StreamId>>;
}

/// In-memory stream registry.
#[derive(Debug, Default)]
pub struct MemoryStreamIndex {
    streams: RwLock<Vec<(StreamId, Vec<(String, String)>)>>,
}

impl MemoryStreamIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stream with its tags. Re-registering replaces the tags.
    pub fn register(&self, stream_id: StreamId, tags: Vec<(String, String)>) {
        let mut streams = self.streams.write();
        match streams.iter_mut().find(|(sid, _)| *sid == stream_id) {
            Some(entry) => entry.1 = tags,
            None => streams.push((stream_id, tags)),
        }
    }

    /// Number of registered streams.
    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.read().is_empty()
    }
}

impl StreamIndex for MemoryStreamIndex {
    fn search_stream_ids(
        &self,
        tenants: &[TenantId],
        selector: &StreamSelector,
    ) -> Result<Vec<StreamId>> {
        let streams = self.streams.read();
        Ok(streams
            .iter()
            .filter(|(sid, tags)| tenants.contains(&sid.tenant_id) && selector.matches(tags))
            .map(|(sid, _)| *sid)
            .collect())
    }
}
