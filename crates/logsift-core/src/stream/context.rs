//! Per-query execution context.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::Result;

use super::{StreamId, StreamIndex, StreamSelector, TenantId};

/// State shared by all filters of one query execution.
///
/// Stream resolutions are cached by the selector's rendered form, so
/// identical selectors in one query hit the index once. Create one context
/// per query; the cache is tenant-scoped and must not outlive it.
pub struct QueryContext {
    tenants: Vec<TenantId>,
    index: Arc<dyn StreamIndex>,
    stream_ids: DashMap<String, Arc<HashSet<StreamId>>>,
}

impl QueryContext {
    pub fn new(tenants: Vec<TenantId>, index: Arc<dyn StreamIndex>) -> Self {
        Self {
            tenants,
            index,
            stream_ids: DashMap::new(),
        }
    }

    /// Tenants the query runs for.
    pub fn tenants(&self) -> &[TenantId] {
        &self.tenants
    }

    /// Resolve `selector` to the set of matching stream IDs.
    pub fn resolve_stream_ids(&self, selector: &StreamSelector) -> Result<Arc<HashSet<StreamId>>> {
        let key = selector.to_string();
        if let Some(ids) = self.stream_ids.get(&key) {
            return Ok(Arc::clone(ids.value()));
        }

        let ids: HashSet<StreamId> = self
            .index
            .search_stream_ids(&self.tenants, selector)?
            .into_iter()
            .collect();
        debug!(
            selector = %key,
            tenants = self.tenants.len(),
            stream_ids = ids.len(),
            "resolved stream selector"
        );

        let ids = Arc::new(ids);
        Ok(Arc::clone(
            self.stream_ids.entry(key).or_insert(ids).value(),
        ))
    }
}

impl std::fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field("tenants", &self.tenants)
            .field("cached_selectors", &self.stream_ids.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::Error;
    use crate::stream::{MemoryStreamIndex, TagFilter};

    struct CountingIndex {
        inner: MemoryStreamIndex,
        calls: AtomicUsize,
    }

    impl StreamIndex for CountingIndex {
        fn search_stream_ids(
            &self,
            tenants: &[TenantId],
            selector: &StreamSelector,
        ) -> Result<Vec<StreamId>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.search_stream_ids(tenants, selector)
        }
    }

    struct FailingIndex;

    impl StreamIndex for FailingIndex {
        fn search_stream_ids(&self, _: &[TenantId], _: &StreamSelector) -> Result<Vec<StreamId>> {
            Err(Error::StreamIndex("index unavailable".to_string()))
        }
    }

    #[test]
    fn test_resolution_is_cached_per_selector() {
        let index = Arc::new(CountingIndex {
            inner: MemoryStreamIndex::new(),
            calls: AtomicUsize::new(0),
        });
        let tenant = TenantId::default();
        index
            .inner
            .register(StreamId::new(tenant, 1), vec![("app".into(), "a".into())]);

        let ctx = QueryContext::new(vec![tenant], index.clone());
        let sel = StreamSelector::all_of(vec![TagFilter::eq("app", "a")]);
        let first = ctx.resolve_stream_ids(&sel).unwrap();
        let second = ctx.resolve_stream_ids(&sel).unwrap();
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(index.calls.load(Ordering::SeqCst), 1);

        let ctx = QueryContext::new(vec![tenant], index.clone());
        ctx.resolve_stream_ids(&sel).unwrap();
        assert_eq!(index.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_index_failure_propagates() {
        let ctx = QueryContext::new(vec![TenantId::default()], Arc::new(FailingIndex));
        let err = ctx.resolve_stream_ids(&StreamSelector::default()).unwrap_err();
        assert!(matches!(err, Error::StreamIndex(_)));
    }
}
