//! Benchmarks for resume-point resolution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marketflow::description::WorkflowDescription;
use marketflow::pipeline::{resolve_document, resolve_stage};
use serde_json::json;

fn resolver_benchmark(c: &mut Criterion) {
    let document = json!({
        "title": "Berlin temperature",
        "outcomeType": "SCALAR",
        "oracleAddress": "0x1111111111111111111111111111111111111111",
        "eventAddress": "0x2222222222222222222222222222222222222222",
        "marketAddress": "   ",
        "winningOutcome": 215
    });
    let description: WorkflowDescription =
        serde_json::from_value(document.clone()).unwrap_or_default();

    c.bench_function("resolve_stage", |b| {
        b.iter(|| resolve_stage(black_box(&description)))
    });
    c.bench_function("resolve_document", |b| {
        b.iter(|| resolve_document(black_box(&document)))
    });
}

criterion_group!(benches, resolver_benchmark);
criterion_main!(benches);
