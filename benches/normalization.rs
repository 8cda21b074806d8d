//! Benchmarks for response normalization
//!
//! This benchmark measures:
//! - Fenced JSON decoding per task
//! - Rescue extraction on free-text analysis replies
//! - Markdown cleaning of long explanations

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use xenovate::normalize::{markdown, normalize};
use xenovate::types::{GenerationRequest, Task};

const ANALYSIS_JSON: &str = "```json\n{\"time_complexity\": \"O(n log n)\", \"space_complexity\": \"O(n)\", \"explanation\": \"The function uses **merge sort**: it splits the list in half, sorts each half recursively and merges the sorted halves with `merge`.\"}\n```";

const OPTIMIZATION_JSON: &str = "```json\n{\"optimized_code\": \"def total(xs):\\n    return sum(xs)\", \"improvements\": [\"Replaced the manual loop with the built-in `sum`\", \"Removed the **temporary** accumulator\", \"Clearer intent\"]}\n```";

const ANALYSIS_PROSE: &str = "**Time Complexity:** O(n²) because of the nested loops over the input.\n\n**Space Complexity:** O(1) since sorting happens in place.\n\nThe algorithm is a *bubble sort*: each pass swaps adjacent out-of-order elements until no swaps remain.";

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let analyze = GenerationRequest::new(Task::Analyze, "def f(xs): return sorted(xs)", "python");
    let optimize = GenerationRequest::new(Task::Optimize, "def total(xs):\n    t = 0\n    for x in xs: t += x\n    return t", "python");

    group.throughput(Throughput::Bytes(ANALYSIS_JSON.len() as u64));
    group.bench_function("analysis_fenced_json", |b| {
        b.iter(|| normalize(black_box(&analyze), black_box(ANALYSIS_JSON)))
    });

    group.throughput(Throughput::Bytes(OPTIMIZATION_JSON.len() as u64));
    group.bench_function("optimization_fenced_json", |b| {
        b.iter(|| normalize(black_box(&optimize), black_box(OPTIMIZATION_JSON)))
    });

    group.finish();
}

fn bench_rescue(c: &mut Criterion) {
    let mut group = c.benchmark_group("rescue");
    let request = GenerationRequest::new(Task::Analyze, "bubble_sort(xs)", "python");

    group.throughput(Throughput::Bytes(ANALYSIS_PROSE.len() as u64));
    group.bench_function("analysis_prose", |b| {
        b.iter(|| normalize(black_box(&request), black_box(ANALYSIS_PROSE)))
    });

    group.finish();
}

fn bench_markdown(c: &mut Criterion) {
    let mut group = c.benchmark_group("markdown");
    let long = ANALYSIS_PROSE.repeat(64);

    group.throughput(Throughput::Bytes(long.len() as u64));
    group.bench_function("clean_long_explanation", |b| {
        b.iter(|| markdown::clean(black_box(&long)))
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_rescue, bench_markdown);
criterion_main!(benches);
