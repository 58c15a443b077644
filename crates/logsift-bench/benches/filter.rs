//! Filter evaluation benchmarks.

use chrono::Weekday;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use logsift_bench::fixtures::Scale;
use logsift_bench::harness::{init_tracing, TestContext, START_TS};
use logsift_core::{Filter, StreamSelector, TagFilter};

const HOUR: i64 = 3_600_000_000_000;

fn bench_leaf(c: &mut Criterion) {
    init_tracing();
    let mut group = c.benchmark_group("filter/leaf");
    let ctx = TestContext::with_scale(Scale::Small);

    let filters = [
        ("phrase", Filter::phrase("_msg", "refused")),
        ("prefix", Filter::prefix("_msg", "sess")),
        ("any_case_phrase", Filter::any_case_phrase("_msg", "retry")),
        ("sequence", Filter::sequence("_msg", ["worker", "queue"])),
        ("exact_dict", Filter::exact("level", "error")),
        ("exact_uint", Filter::exact("status", "404")),
        ("in", Filter::in_values("status", ["404", "500"])),
        ("range_float", Filter::range("duration_ms", 1000.0, 2000.0)),
        ("range_int64", Filter::range("delta", -100.0, 100.0)),
        (
            "ipv4_range",
            Filter::ipv4_range("client_ip", "10.2.0.0", "10.2.255.255").unwrap(),
        ),
        ("regexp", Filter::regexp("_msg", "user [0-9]+ logged").unwrap()),
        ("len_range", Filter::len_range("trace_id", 16, 16)),
    ];

    for (name, f) in &filters {
        group.bench_with_input(BenchmarkId::new("search", name), f, |b, f| {
            b.iter(|| black_box(ctx.count_search(f)));
        });
        group.bench_with_input(BenchmarkId::new("result", name), f, |b, f| {
            b.iter(|| black_box(ctx.count_result(f)));
        });
    }

    group.finish();
}

fn bench_boolean(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/boolean");
    let ctx = TestContext::with_scale(Scale::Small);

    group.bench_function("and_same_field", |b| {
        let f = Filter::and([
            Filter::phrase("_msg", "GET"),
            Filter::phrase("_msg", "orders"),
            Filter::phrase("_msg", "404"),
        ]);
        b.iter(|| black_box(ctx.count_search(&f)));
    });

    group.bench_function("and_mixed", |b| {
        let f = Filter::and([
            Filter::exact("level", "error"),
            Filter::range("status", 500.0, 599.0),
            Filter::phrase("_msg", "timeout"),
        ]);
        b.iter(|| black_box(ctx.count_search(&f)));
    });

    group.bench_function("or", |b| {
        let f = Filter::or([
            Filter::exact("level", "error"),
            Filter::exact("level", "warn"),
            Filter::phrase("_msg", "refused"),
        ]);
        b.iter(|| black_box(ctx.count_search(&f)));
    });

    group.bench_function("not", |b| {
        let f = Filter::not(Filter::exact("level", "info"));
        b.iter(|| black_box(ctx.count_search(&f)));
    });

    group.bench_function("nested", |b| {
        let f = Filter::and([
            Filter::or([
                Filter::phrase("_msg", "GET"),
                Filter::phrase("_msg", "POST"),
            ]),
            Filter::not(Filter::in_values("status", ["200", "201", "204"])),
            Filter::ipv4_range("client_ip", "10.0.0.0", "10.1.255.255").unwrap(),
        ]);
        b.iter(|| black_box(ctx.count_search(&f)));
    });

    group.finish();
}

fn bench_time_and_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/time");
    let ctx = TestContext::with_scale(Scale::Small);

    group.bench_function("time_range", |b| {
        let f = Filter::time(START_TS + HOUR, START_TS + 3 * HOUR);
        b.iter(|| black_box(ctx.count_search(&f)));
    });

    group.bench_function("day_range", |b| {
        let f = Filter::day_range(2 * HOUR, 4 * HOUR, 0);
        b.iter(|| black_box(ctx.count_search(&f)));
    });

    group.bench_function("week_range", |b| {
        let f = Filter::week_range(Weekday::Mon, Weekday::Fri, 0);
        b.iter(|| black_box(ctx.count_search(&f)));
    });

    group.bench_function("stream", |b| {
        let mut f = Filter::stream(StreamSelector::all_of(vec![
            TagFilter::eq("app", "api"),
            TagFilter::eq("env", "dev"),
        ]));
        ctx.prepare(&mut f);
        b.iter(|| black_box(ctx.count_search(&f)));
    });

    group.bench_function("stream_prepare", |b| {
        let mut f = Filter::stream(StreamSelector::all_of(vec![TagFilter::eq("app", "api")]));
        b.iter(|| ctx.prepare(black_box(&mut f)));
    });

    group.finish();
}

criterion_group!(benches, bench_leaf, bench_boolean, bench_time_and_stream);

criterion_main!(benches);
