//! Benchmark suite for the forecast hot path
//!
//! Measures prediction, chart rendering and training on a synthetic dataset.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pronosticar::{
    dataset::{Dataset, Observation},
    model::{ForestConfig, Regressor},
    train::{train, TrainingConfig},
    viz::{encode_base64, ChartRenderer, ForecastPoint, ScatterRenderer},
};

fn create_dataset(rows: usize) -> Dataset {
    Dataset::from_observations(
        (0..rows)
            .map(|i| {
                let spend = 2000.0 + 150.0 * i as f64;
                let wobble = ((i * 7) % 11) as f64 - 5.0;
                Observation::new(format!("m{i}"), spend, spend / 24.0 + wobble)
            })
            .collect(),
    )
}

fn benchmark_predict(c: &mut Criterion) {
    let dataset = create_dataset(48);
    let trained = train(&dataset, &TrainingConfig::default()).unwrap();

    c.bench_function("forest_predict_single", |b| {
        b.iter(|| black_box(trained.model.predict(black_box(5500.0)).unwrap()));
    });
}

fn benchmark_render(c: &mut Criterion) {
    let renderer = ScatterRenderer::new();
    let mut group = c.benchmark_group("render_chart");

    for rows in [12, 48, 240].iter() {
        let dataset = create_dataset(*rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, _| {
            let point = ForecastPoint {
                spend: 6000.0,
                purchases: 250.0,
            };
            b.iter(|| {
                let png = renderer
                    .render(black_box(dataset.observations()), point)
                    .unwrap();
                black_box(encode_base64(&png))
            });
        });
    }

    group.finish();
}

fn benchmark_train(c: &mut Criterion) {
    let dataset = create_dataset(48);
    let mut group = c.benchmark_group("train");
    group.sample_size(10);

    for trees in [10, 100].iter() {
        let config =
            TrainingConfig::default().with_forest(ForestConfig::default().with_n_estimators(*trees));
        group.bench_with_input(BenchmarkId::from_parameter(trees), trees, |b, _| {
            b.iter(|| black_box(train(black_box(&dataset), &config).unwrap().report.mae));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_predict, benchmark_render, benchmark_train);
criterion_main!(benches);
