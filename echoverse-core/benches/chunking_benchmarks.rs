//! Benchmarks for analysis, chunking and classification
//!
//! Run with: cargo bench --bench chunking_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use echoverse_core::application::chunking::DocumentChunker;
use echoverse_core::application::strategies::{ProcessingPreferences, StrategyClassifier};
use echoverse_core::domain::analysis::analyze;

/// Generate prose of roughly `size` characters with a paragraph break every eight sentences
fn generate_text(size: usize) -> String {
    let sentences = [
        "The lighthouse keeper climbed the stairs one last time. ",
        "Below him, the sea rolled against the rocks, patient and grey. ",
        "He had counted every step for thirty years; tonight he lost count. ",
        "Somewhere beyond the fog a bell was ringing and nobody answered. ",
    ];

    let mut text = String::with_capacity(size + 80);
    let mut i = 0;
    while text.len() < size {
        text.push_str(sentences[i % sentences.len()]);
        i += 1;
        if i % 8 == 0 {
            text.push_str("\n\n");
        }
    }
    text
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for size in [200, 2_000, 10_000] {
        let text = generate_text(size);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| analyze(black_box(text)));
        });
    }

    group.finish();
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_sizes");
    let text = generate_text(10_000);
    group.throughput(Throughput::Bytes(text.len() as u64));

    for max in [100, 200, 500] {
        let chunker = DocumentChunker::new(max, max / 4, 30);
        group.bench_with_input(BenchmarkId::from_parameter(max), &text, |b, text| {
            b.iter(|| chunker.chunk(black_box(text)));
        });
    }

    group.finish();
}

fn bench_overlap(c: &mut Criterion) {
    let chunker = DocumentChunker::default();
    let text = generate_text(10_000);

    c.bench_function("chunk_with_overlap", |b| {
        b.iter(|| chunker.with_overlap(chunker.chunk(black_box(&text))));
    });
}

fn bench_classify(c: &mut Criterion) {
    let classifier = StrategyClassifier::new();
    let text = generate_text(2_200);

    c.bench_function("classify_2200", |b| {
        b.iter(|| classifier.classify(black_box(&text), ProcessingPreferences::default()));
    });
}

criterion_group!(benches, bench_analyze, bench_chunk_sizes, bench_overlap, bench_classify);
criterion_main!(benches);
