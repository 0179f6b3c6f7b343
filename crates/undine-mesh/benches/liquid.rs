use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use undine_basin::fill::{FillMode, FillSpec, generate_chunk};
use undine_basin::{BasinView, ViewOptions, view_of_buf};
use undine_cells::{ChunkCoord, LiquidType};
use undine_mesh::{BuildScratch, build_chunk_liquids};

const DIMS: (usize, usize, usize) = (16, 16, 16);

fn view_for(mode: FillMode, lava_pockets: bool) -> BasinView {
    let spec = FillSpec {
        mode,
        lava_pockets,
        ..FillSpec::default()
    };
    let buf = generate_chunk(&spec, ChunkCoord::new(0, 0, 0), DIMS.0, DIMS.1, DIMS.2)
        .expect("bench chunk dims are legal");
    view_of_buf(buf, ViewOptions::default())
}

fn bench_pond(c: &mut Criterion) {
    let view = view_for(FillMode::Pond, true);
    let mut group = c.benchmark_group("liquid_mesh");

    group.bench_function("pond_cold_scratch", |b| {
        b.iter(|| {
            let mut scratch = BuildScratch::new();
            let out = build_chunk_liquids(&view, &LiquidType::MESHABLE, &mut scratch);
            black_box(out);
        })
    });

    let mut scratch = BuildScratch::new();
    build_chunk_liquids(&view, &LiquidType::MESHABLE, &mut scratch);
    group.bench_function("pond_warm_scratch", |b| {
        b.iter(|| {
            let out = build_chunk_liquids(&view, &LiquidType::MESHABLE, &mut scratch);
            black_box(out);
        })
    });
    group.finish();
}

fn bench_flood(c: &mut Criterion) {
    let view = view_for(FillMode::Flood, false);
    let mut scratch = BuildScratch::new();
    build_chunk_liquids(&view, &LiquidType::MESHABLE, &mut scratch);

    let mut group = c.benchmark_group("liquid_mesh");
    group.bench_function("flood_warm_scratch", |b| {
        b.iter(|| {
            let out = build_chunk_liquids(&view, &LiquidType::MESHABLE, &mut scratch);
            black_box(out);
        })
    });
    group.finish();
}

fn bench_columns(c: &mut Criterion) {
    // Isolated columns emit the most faces a legal chunk can hold.
    let view = view_for(FillMode::Columns, true);
    let mut scratch = BuildScratch::new();
    build_chunk_liquids(&view, &LiquidType::MESHABLE, &mut scratch);

    let mut group = c.benchmark_group("liquid_mesh_heavy");
    group.bench_function("columns_warm_scratch", |b| {
        b.iter(|| {
            let out = build_chunk_liquids(&view, &LiquidType::MESHABLE, &mut scratch);
            black_box(out);
        })
    });
    group.finish();
}

fn short_config() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(2))
        .sample_size(20)
}

fn long_config() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(20))
        .warm_up_time(Duration::from_secs(3))
        .sample_size(10)
}

criterion_group! {
    name = benches;
    config = short_config();
    targets = bench_pond, bench_flood
}

criterion_group! {
    name = benches_heavy;
    config = long_config();
    targets = bench_columns
}

criterion_main!(benches, benches_heavy);
