//! Bloom filter pruning benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use logsift_bench::fixtures::Scale;
use logsift_bench::harness::{count_matches, init_tracing, TestContext};
use logsift_core::{Filter, SearchConfig};

fn bench_bloom_pruning(c: &mut Criterion) {
    init_tracing();
    let mut group = c.benchmark_group("bloom/pruning");
    let ctx = TestContext::with_scale(Scale::Medium);
    let with_bloom = ctx.blocks_with_config(&SearchConfig::default());
    let without_bloom =
        ctx.blocks_with_config(&SearchConfig::default().use_bloom_filters(false));

    // Tokens that are absent from every block, so a bloom hit skips the scan.
    let filters = [
        ("phrase", Filter::phrase("_msg", "kernel")),
        ("exact", Filter::exact("_msg", "segfault at 0")),
        ("in", Filter::in_values("trace_id", ["0000000000000000", "ffffffffffffffff"])),
        (
            "and_group",
            Filter::and([Filter::phrase("_msg", "GET"), Filter::phrase("_msg", "kernel")]),
        ),
        ("contains_all", Filter::contains_all("_msg", ["disk", "kernel"])),
    ];

    for (name, f) in &filters {
        group.bench_with_input(BenchmarkId::new("bloom", name), f, |b, f| {
            b.iter(|| black_box(count_matches(f, &with_bloom)));
        });
        group.bench_with_input(BenchmarkId::new("scan", name), f, |b, f| {
            b.iter(|| black_box(count_matches(f, &without_bloom)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bloom_pruning);

criterion_main!(benches);
