use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nereval::{Category, EvalConfig, EvalConfigBuilder, Evaluator, PredictionRecord};
use pprof::criterion::{Output, PProfProfiler};
use serde::Deserialize;
use serde_jsonlines::json_lines;
use std::path::Path;

const TAGS: [&str; 6] = ["PER", "ORG", "LOC", "GPE", "ORGANISATION", "MISC"];

#[derive(Deserialize)]
struct Example {
    line: String,
    predicted: Vec<String>,
}

impl Example {
    fn into<P: AsRef<Path>>(path: P) -> (Vec<String>, Vec<PredictionRecord>) {
        let examples = json_lines::<Example, P>(path)
            .unwrap()
            .map(|r| r.unwrap())
            .collect::<Vec<_>>();
        let mut lines = Vec::with_capacity(examples.len());
        let mut predictions = Vec::with_capacity(examples.len());
        for (id, ex) in examples.into_iter().enumerate() {
            lines.push(ex.line);
            predictions.push(PredictionRecord::from_raw(id, ex.predicted));
        }
        (lines, predictions)
    }
}

/// Repeats the test fixture until it holds `size` records.
fn build_dataset(size: usize) -> (Vec<String>, Vec<PredictionRecord>) {
    let (lines, predictions) = Example::into("./tests/data/predictions.jsonl");
    let lines: Vec<String> = lines.iter().cycle().take(size).cloned().collect();
    let predictions = predictions
        .iter()
        .cycle()
        .take(size)
        .enumerate()
        .map(|(id, p)| PredictionRecord::new(id, p.labels.clone()))
        .collect();
    (lines, predictions)
}

/// Synthetic lines with many annotations each, for the parser.
fn build_annotated_lines(size: usize) -> Vec<String> {
    (0..size)
        .map(|i| {
            (0..(i % 5))
                .map(|j| format!("word [target {}_{{{}}}] more", j, TAGS[(i + j) % TAGS.len()]))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    for size in [1_000, 100_000] {
        let lines = build_annotated_lines(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &lines, |b, lines| {
            b.iter(|| Evaluator::new(lines, EvalConfig::default()).unwrap())
        });
    }
    group.finish();
}

fn benchmark_advanced_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("advanced_report");
    for size in [1_000, 100_000] {
        let (lines, predictions) = build_dataset(size);
        let evaluator = Evaluator::new(&lines, EvalConfig::default()).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &predictions,
            |b, predictions| b.iter(|| evaluator.advanced_report(predictions).unwrap()),
        );
    }
    group.finish();
}

fn benchmark_compare(c: &mut Criterion) {
    let (lines, predictions) = build_dataset(100_000);
    let evaluator = Evaluator::new(&lines, EvalConfig::default()).unwrap();
    let baseline: Vec<PredictionRecord> = predictions
        .iter()
        .map(|p| PredictionRecord::new(p.id, vec![Category::NONE]))
        .collect();
    c.bench_function("compare_100000", |b| {
        b.iter(|| evaluator.compare(&predictions, &baseline).unwrap())
    });
}

fn benchmark_predict(c: &mut Criterion) {
    let (lines, _) = build_dataset(100_000);
    let predictor = |id: usize, _sentence: &str, _target: &str| -> Vec<String> {
        vec![String::from(TAGS[id % TAGS.len()])]
    };
    for parallel in [false, true] {
        let config = EvalConfigBuilder::default().parallel(parallel).build();
        let evaluator = Evaluator::new(&lines, config).unwrap();
        c.bench_function(&format!("predict_100000_parallel_{}", parallel), |b| {
            b.iter(|| evaluator.predict(&predictor))
        });
    }
}

criterion_group!(
    name=report_benches;
    config = Criterion::default().sample_size(50).with_profiler(PProfProfiler::new(3000, Output::Flamegraph(None)));
    targets = benchmark_parsing,
    benchmark_advanced_report,
    benchmark_compare,
    benchmark_predict
);
criterion_main!(report_benches);
