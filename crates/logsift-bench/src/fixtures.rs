//! Log data generation for benchmarks.
//!
//! Every generator is seeded so runs are comparable.

use logsift_core::column::format::timestamp_iso8601_to_string;
use logsift_core::{BlockBuilder, BlockSearch, StreamId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Rows per generated block.
pub const ROWS_PER_BLOCK: usize = 4096;

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug)]
pub enum Scale {
    /// A single block. Use for quick iteration.
    Tiny,
    Small,
    Medium,
    Large,
}

impl Scale {
    /// Number of blocks at this scale.
    pub fn blocks(&self) -> usize {
        match self {
            Scale::Tiny => 1,
            Scale::Small => 8,
            Scale::Medium => 64,
            Scale::Large => 512,
        }
    }

    /// Number of distinct streams the blocks are spread over.
    pub fn streams(&self) -> usize {
        match self {
            Scale::Tiny => 1,
            Scale::Small => 4,
            Scale::Medium => 16,
            Scale::Large => 64,
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Small
    }
}

const TEMPLATES: &[&str] = &[
    "GET /api/v1/users/{id} 200",
    "POST /api/v1/orders 201",
    "GET /api/v1/orders/{id} 404",
    "connection refused by upstream {id}",
    "worker {id} picked up job from queue",
    "cache miss for key session:{id}",
    "user {id} logged in",
    "timeout waiting for lock on table events",
    "disk usage above 90% on /var/lib/data",
    "Retry attempt for request {id} failed",
];

const LEVELS: &[&str] = &["debug", "info", "info", "info", "warn", "error"];

/// Generate `count` log messages built from a small set of templates.
pub fn generate_messages(rng: &mut StdRng, count: usize) -> Vec<String> {
    (0..count)
        .map(|_| {
            let template = TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
            template.replace("{id}", &rng.gen_range(0..100_000u32).to_string())
        })
        .collect()
}

/// Generate one block of `rows` rows starting at `start_ts` nanoseconds.
///
/// Columns: `_msg`, `level`, `status`, `duration_ms`, `delta`, `client_ip`,
/// `trace_id` and an ISO8601 `ts` copy of the row time.
pub fn generate_block(seed: u64, stream_id: StreamId, start_ts: i64, rows: usize) -> BlockSearch {
    let mut rng = StdRng::seed_from_u64(seed);

    let timestamps: Vec<i64> = (0..rows as i64)
        .map(|i| start_ts + i * 250_000_000)
        .collect();
    let messages = generate_messages(&mut rng, rows);
    let levels: Vec<&str> = (0..rows)
        .map(|_| LEVELS[rng.gen_range(0..LEVELS.len())])
        .collect();
    let statuses: Vec<String> = (0..rows)
        .map(|_| [200u32, 201, 204, 301, 404, 500][rng.gen_range(0..6)].to_string())
        .collect();
    let durations: Vec<String> = (0..rows)
        .map(|_| (rng.gen_range(0..500_000u32) as f64 / 100.0).to_string())
        .collect();
    let deltas: Vec<String> = (0..rows)
        .map(|_| rng.gen_range(-50_000i64..50_000).to_string())
        .collect();
    let ips: Vec<String> = (0..rows)
        .map(|_| {
            format!(
                "10.{}.{}.{}",
                rng.gen_range(0..4),
                rng.gen_range(0..256),
                rng.gen_range(1..255)
            )
        })
        .collect();
    let trace_ids: Vec<String> = (0..rows)
        .map(|_| hex::encode(rng.gen::<[u8; 8]>()))
        .collect();
    let iso: Vec<String> = timestamps
        .iter()
        .map(|&ts| timestamp_iso8601_to_string(ts))
        .collect();

    BlockBuilder::new(timestamps)
        .location(format!("bench/block-{seed}"))
        .stream_id(stream_id)
        .column("_msg", messages)
        .column("level", levels)
        .column("status", statuses)
        .column("duration_ms", durations)
        .column("delta", deltas)
        .column("client_ip", ips)
        .column("trace_id", trace_ids)
        .column("ts", iso)
        .build()
        .unwrap()
}
