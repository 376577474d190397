//! Query pipeline benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use materia_bench::fixtures::Scale;
use materia_bench::harness::{init_tracing, TestContext};
use materia_core::query::{Candidates, FieldValueFetcher};

fn bench_find(c: &mut Criterion) {
    init_tracing();
    let mut group = c.benchmark_group("find");

    for scale in [Scale::Small, Scale::Medium] {
        let ctx = TestContext::with_scale(scale);

        group.bench_with_input(BenchmarkId::new("all_fields", scale.label()), &ctx, |b, ctx| {
            let query = ctx.query("en");
            b.iter(|| black_box(query.find().unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("select_one", scale.label()), &ctx, |b, ctx| {
            let mut query = ctx.query("en");
            query.select("title");
            b.iter(|| black_box(query.find().unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("where_color", scale.label()), &ctx, |b, ctx| {
            let mut query = ctx.query("en");
            query.where_field("color", "red");
            b.iter(|| black_box(query.find().unwrap()));
        });

        group.bench_with_input(
            BenchmarkId::new("where_color_size_title", scale.label()),
            &ctx,
            |b, ctx| {
                let mut query = ctx.query("de");
                query
                    .where_field("color", "red")
                    .where_field("size", "S")
                    .where_field("title", "Produkt 20");
                b.iter(|| black_box(query.find().unwrap()));
            },
        );

        group.bench_with_input(BenchmarkId::new("short_circuit", scale.label()), &ctx, |b, ctx| {
            let mut query = ctx.query("en");
            query
                .where_field("color", "purple")
                .where_field("size", "S")
                .where_field("price", 500i64);
            b.iter(|| black_box(query.find().unwrap()));
        });
    }

    group.finish();
}

fn bench_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch");

    let ctx = TestContext::with_scale(Scale::Medium);
    let fields = ctx.product.fields();

    for count in [1usize, 100, 1_000] {
        let candidates = Candidates::only(ctx.ids.iter().copied().take(count));

        group.bench_with_input(BenchmarkId::new("all_fields", count), &candidates, |b, candidates| {
            let fetcher = FieldValueFetcher::new(ctx.db.storage(), fields, "en", &[]);
            b.iter(|| black_box(fetcher.fetch(candidates).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("one_field", count), &candidates, |b, candidates| {
            let selection = [1];
            let fetcher = FieldValueFetcher::new(ctx.db.storage(), fields, "en", &selection);
            b.iter(|| black_box(fetcher.fetch(candidates).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_find, bench_fetch);
criterion_main!(benches);
