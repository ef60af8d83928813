//! Performance benchmarks for the latency harness
//!
//! Covers the CPU-side work of a run: percentile summaries over large sample
//! sets, report rendering, sample file rendering and configuration parsing.

use chrono::Utc;
use clap::Parser;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use foodai_latency::{
    cli::Cli,
    config::parser::ConfigParser,
    defaults::DEFAULT_PERCENTILES,
    models::{Config, Sample, SampleImage},
    output::{render_samples, OutputCoordinator, OutputFormatterFactory, RunReport},
    sampler::SamplingRun,
    stats::{percentile, LatencySummary},
};
use std::time::Duration;

/// Latencies with a long tail, roughly like a real service
fn create_latencies(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 120.0 + (i % 97) as f64 * 3.5 + if i % 50 == 0 { 2_000.0 } else { 0.0 })
        .collect()
}

fn create_samples(count: usize) -> Vec<Sample> {
    create_latencies(count)
        .into_iter()
        .enumerate()
        .map(|(i, ms)| Sample {
            timestamp: Utc::now(),
            latency: Duration::from_micros((ms * 1000.0) as u64),
            payload_bytes: 51_234,
            image_index: i % 2,
        })
        .collect()
}

/// Benchmark percentile and summary calculation
fn benchmark_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");

    for size in [100usize, 1_000, 10_000, 100_000].iter() {
        let latencies = create_latencies(*size);
        let samples = create_samples(*size);

        group.bench_with_input(BenchmarkId::new("summary_from_samples", size), size, |b, _| {
            b.iter(|| {
                let summary = LatencySummary::from_samples(black_box(&samples), DEFAULT_PERCENTILES).unwrap();
                black_box(summary);
            });
        });

        let mut sorted = latencies.clone();
        sorted.sort_by(f64::total_cmp);
        group.bench_with_input(BenchmarkId::new("percentile_sorted", size), size, |b, _| {
            b.iter(|| {
                let p99 = percentile(black_box(&sorted), 99.0).unwrap();
                black_box(p99);
            });
        });
    }

    group.finish();
}

/// Benchmark report and sample file rendering
fn benchmark_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("output");

    let config = Config {
        user_key: "bench".to_string(),
        verbose: true,
        ..Default::default()
    };
    let images = vec![SampleImage::original("https://img.example/a.jpg", vec![0u8; 51_234])];
    let run = SamplingRun {
        samples: create_samples(1_000),
        failures: 0,
        wall_time: Duration::from_secs(25),
    };
    let summary = LatencySummary::from_samples(&run.samples, DEFAULT_PERCENTILES).unwrap();

    for (name, color) in [("render_report_plain", false), ("render_report_colored", true)] {
        let coordinator = OutputCoordinator::new(OutputFormatterFactory::create_formatter(color), true);
        group.bench_function(name, |b| {
            b.iter(|| {
                let report = RunReport::new(&config, &images, &run, &summary);
                let text = coordinator.render_report(black_box(&report)).unwrap();
                black_box(text);
            });
        });
    }

    group.bench_function("render_sample_file", |b| {
        b.iter(|| {
            let text = render_samples(black_box(&run.samples));
            black_box(text);
        });
    });

    group.finish();
}

/// Benchmark configuration parsing from CLI arguments
fn benchmark_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");

    let args = vec![
        "foodai-latency",
        "--user-key", "bench",
        "--endpoint", "http://localhost:8080/",
        "--count", "500",
        "--parallel", "16",
        "--percentiles", "50,90,99,99.9",
        "--no-color",
    ];

    group.bench_function("parse_cli_args", |b| {
        b.iter(|| {
            let cli = Cli::try_parse_from(black_box(&args)).unwrap();
            black_box(cli);
        });
    });

    group.bench_function("parse_from_cli", |b| {
        let cli = Cli::try_parse_from(&args).unwrap();
        b.iter(|| {
            let config = ConfigParser::new(black_box(cli.clone())).parse().unwrap();
            black_box(config);
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_statistics, benchmark_output, benchmark_config_parsing);

criterion_main!(benches);
