//! Performance benchmarks for the inference latency benchmark
//!
//! The harness itself must stay cheap next to the forward passes it
//! measures; these track statistics, preprocessing and classification.

use clap::Parser;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, RgbImage};
use inference_latency_bench::{
    classify::Synset,
    cli::Cli,
    models::{LatencyStatistics, RunConfig, SampleLabel},
    preprocess::{create_preprocessor, normalize_image, PreprocessConfig},
    stats::{percentile, StatisticsCollector},
    types::{ModelVariant, PreprocessKind, RunKind, TrimStrategy},
};
use std::time::Duration;

fn create_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn create_samples(count: usize) -> Vec<u64> {
    (0..count).map(|i| 5_000_000 + (i as u64 * 7_919) % 3_000_000).collect()
}

/// Benchmark configuration parsing and validation
fn benchmark_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");

    group.bench_function("parse_cli_args", |b| {
        b.iter(|| {
            let cli = Cli::parse_from(black_box([
                "ilb",
                "--model-path-prefix", "models/resnet18_v1",
                "--num-runs", "100",
                "--use-batch",
                "--batchsize", "8",
            ]));
            black_box(cli)
        })
    });

    group.bench_function("validate_config", |b| {
        let config = RunConfig::default();
        b.iter(|| black_box(config.validate()))
    });

    group.finish();
}

/// Benchmark statistics calculation over growing sample counts
fn benchmark_statistics_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");

    for size in [10usize, 100, 1_000, 10_000].iter() {
        let samples = create_samples(*size);

        group.bench_with_input(BenchmarkId::new("from_nanos", size), size, |b, _| {
            b.iter(|| black_box(LatencyStatistics::from_nanos(&samples)))
        });

        let mut sorted = samples.clone();
        sorted.sort_unstable();
        group.bench_with_input(BenchmarkId::new("percentile_p99", size), size, |b, _| {
            b.iter(|| black_box(percentile(99.0, &sorted)))
        });

        group.bench_with_input(BenchmarkId::new("collector", size), size, |b, _| {
            b.iter(|| {
                let label = SampleLabel::new(RunKind::Single, ModelVariant::NonEndToEnd);
                let mut collector = StatisticsCollector::new(label, 5, TrimStrategy::HeadTail);
                for (run, ns) in samples.iter().enumerate() {
                    collector.record(run as u32, Duration::from_nanos(*ns));
                }
                black_box(collector.summarize())
            })
        });
    }

    group.finish();
}

/// Benchmark host-side preprocessing strategies
fn benchmark_preprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocessing");
    group.sample_size(20);

    let config = PreprocessConfig::default();
    let image = create_test_image(640, 480);

    group.bench_function("normalize_640x480_to_224", |b| {
        b.iter(|| black_box(normalize_image(&image, &config)))
    });

    for batch in [1usize, 8].iter() {
        let images: Vec<DynamicImage> = (0..*batch).map(|_| image.clone()).collect();

        let batched = create_preprocessor(PreprocessKind::BatchedResizeNormalize, config.clone());
        group.bench_with_input(BenchmarkId::new("batched_resize_normalize", batch), batch, |b, _| {
            b.iter(|| black_box(batched.prepare(&images)))
        });

        let identity = create_preprocessor(PreprocessKind::Identity, config.clone());
        group.bench_with_input(BenchmarkId::new("identity", batch), batch, |b, _| {
            b.iter(|| black_box(identity.prepare(&images)))
        });
    }

    group.finish();
}

/// Benchmark label lookup over an ImageNet-sized output
fn benchmark_classification(c: &mut Criterion) {
    let synset = Synset::from_labels((0..1000).map(|i| format!("n{:08} class {}", i, i)).collect());
    let scores: Vec<f32> = (0..1000).map(|i| ((i * 37) % 1000) as f32 / 1000.0).collect();

    let mut group = c.benchmark_group("classification");
    group.bench_function("classify_1000", |b| b.iter(|| black_box(synset.classify(&scores))));
    group.bench_function("top5_1000", |b| b.iter(|| black_box(synset.top_k(&scores, 5))));
    group.finish();
}

criterion_group!(
    benches,
    benchmark_config_parsing,
    benchmark_statistics_calculation,
    benchmark_preprocessing,
    benchmark_classification
);
criterion_main!(benches);
