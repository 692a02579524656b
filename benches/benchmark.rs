use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use observe_earth::processing::{Evaluator, IndexRegistry};
use observe_earth::{BandRole, GeoInfo, IndexResult, RasterBand};

const SIZE: (usize, usize) = (1024, 1024);

fn synthetic_band(base: f32, period: usize) -> RasterBand {
    let values = (0..SIZE.0 * SIZE.1)
        .map(|i| base + (i % period) as f32)
        .collect();
    RasterBand::from_vec(SIZE, values, GeoInfo::default())
}

/// Benchmark NDVI evaluation over a 1024 x 1024 scene
fn benchmark_ndvi_evaluation(c: &mut Criterion) {
    let registry = IndexRegistry::with_defaults();
    let evaluator = Evaluator::new(&registry);

    // simulating NIR and RED reflectances
    let bands = HashMap::from([
        (BandRole::Nir, synthetic_band(5000.0, 100)),
        (BandRole::Red, synthetic_band(2500.0, 50)),
    ]);

    c.bench_function("ndvi_evaluation", |b| {
        b.iter(|| evaluator.evaluate(black_box("NDVI"), black_box(&bands)))
    });
}

/// Benchmark the statistics pass over an evaluated result
fn benchmark_statistics(c: &mut Criterion) {
    let pixels = (0..SIZE.0 * SIZE.1)
        .map(|i| (i % 7 != 0).then(|| (i % 200) as f32 / 100.0 - 1.0))
        .collect();
    let result = IndexResult::from_pixels("NDVI", SIZE, pixels, GeoInfo::default()).unwrap();

    c.bench_function("index_statistics", |b| b.iter(|| black_box(&result).statistics()));
}

criterion_group!(benches, benchmark_ndvi_evaluation, benchmark_statistics);
criterion_main!(benches);
