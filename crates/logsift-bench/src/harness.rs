//! Benchmark harness helpers.

use std::sync::Arc;

use logsift_core::{
    BlockResult, BlockSearch, Filter, MemoryStreamIndex, QueryContext, SearchConfig, StreamId,
    TenantId,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::fixtures::{generate_block, Scale, ROWS_PER_BLOCK};

/// Start of the generated data: 2024-01-01T00:00:00Z.
pub const START_TS: i64 = 1_704_067_200_000_000_000;

const APPS: &[&str] = &["api", "worker", "nginx", "billing"];

/// Install a `RUST_LOG`-driven subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Generated blocks plus the stream index describing their streams.
pub struct TestContext {
    pub blocks: Vec<BlockSearch>,
    pub results: Vec<BlockResult>,
    pub index: Arc<MemoryStreamIndex>,
    pub tenant: TenantId,
}

impl TestContext {
    /// Create a context with `scale.blocks()` blocks spread round-robin over
    /// `scale.streams()` streams.
    pub fn with_scale(scale: Scale) -> Self {
        let tenant = TenantId::default();
        let index = Arc::new(MemoryStreamIndex::new());
        let stream_ids: Vec<StreamId> = (0..scale.streams())
            .map(|i| {
                let sid = StreamId::new(tenant, i as u128 + 1);
                let tags = vec![
                    ("app".to_string(), APPS[i % APPS.len()].to_string()),
                    ("env".to_string(), if i % 3 == 0 { "dev" } else { "prod" }.to_string()),
                    ("instance".to_string(), format!("host-{i}")),
                ];
                index.register(sid, tags);
                sid
            })
            .collect();

        let block_span = ROWS_PER_BLOCK as i64 * 250_000_000;
        let blocks: Vec<BlockSearch> = (0..scale.blocks())
            .map(|i| {
                let sid = stream_ids[i % stream_ids.len()];
                generate_block(i as u64, sid, START_TS + i as i64 * block_span, ROWS_PER_BLOCK)
            })
            .collect();
        let results = blocks.iter().map(BlockResult::from_block_search).collect();
        tracing::debug!(
            blocks = blocks.len(),
            streams = stream_ids.len(),
            rows_per_block = ROWS_PER_BLOCK,
            "generated benchmark data"
        );

        Self {
            blocks,
            results,
            index,
            tenant,
        }
    }

    /// Copy of the blocks with a different search config.
    pub fn blocks_with_config(&self, config: &SearchConfig) -> Vec<BlockSearch> {
        self.blocks
            .iter()
            .map(|bs| bs.clone().with_config(config.clone()))
            .collect()
    }

    pub fn query_context(&self) -> QueryContext {
        QueryContext::new(vec![self.tenant], self.index.clone())
    }

    /// Resolve stream selectors in `filter` against this context's index.
    pub fn prepare(&self, filter: &mut Filter) {
        filter.prepare(&self.query_context()).unwrap();
    }

    /// Matching rows over all blocks, evaluated on the search surface.
    pub fn count_search(&self, filter: &Filter) -> usize {
        count_matches(filter, &self.blocks)
    }

    /// Matching rows over all blocks, evaluated on the result surface.
    pub fn count_result(&self, filter: &Filter) -> usize {
        self.results
            .iter()
            .map(|br| filter.filter_result(br).count_ones())
            .sum()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::with_scale(Scale::default())
    }
}

/// Matching rows of `filter` over `blocks`.
pub fn count_matches(filter: &Filter, blocks: &[BlockSearch]) -> usize {
    blocks
        .iter()
        .map(|bs| filter.search_block(bs).count_ones())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsift_core::{StreamSelector, TagFilter};

    #[test]
    fn test_surfaces_agree() {
        let ctx = TestContext::with_scale(Scale::Tiny);
        let filters = [
            Filter::phrase("_msg", "GET"),
            Filter::exact("level", "error"),
            Filter::range("duration_ms", 100.0, 2000.0),
            Filter::ipv4_range("client_ip", "10.1.0.0", "10.1.255.255").unwrap(),
        ];
        for f in filters {
            assert_eq!(ctx.count_search(&f), ctx.count_result(&f), "{f}");
        }
    }

    #[test]
    fn test_stream_filter() {
        let ctx = TestContext::with_scale(Scale::Small);
        let mut f = Filter::stream(StreamSelector::all_of(vec![TagFilter::eq("app", "api")]));
        ctx.prepare(&mut f);
        // Blocks 0 and 4 belong to the only api stream.
        assert_eq!(ctx.count_search(&f), 2 * ROWS_PER_BLOCK);
    }
}
