//! Benchmarks for the core's CPU-bound hot paths: MinHash/LSH signing and
//! the subsequence matcher. Run with: cargo bench -p kato-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kato_core::pattern::{lsh_bands, signature, MinHashParams};
use kato_core::search::align;

fn make_events(n_events: usize, symbols_per_event: usize) -> Vec<Vec<String>> {
    (0..n_events)
        .map(|e| {
            (0..symbols_per_event)
                .map(|s| format!("sym-{e}-{s}"))
                .collect()
        })
        .collect()
}

fn bench_minhash_signature(c: &mut Criterion) {
    let events = make_events(50, 4);
    let params = MinHashParams::default();

    c.bench_function("minhash_signature_200_symbols", |b| {
        b.iter(|| black_box(signature(black_box(&events), params)));
    });
}

fn bench_lsh_bands(c: &mut Criterion) {
    let events = make_events(50, 4);
    let params = MinHashParams::default();
    let sig = signature(&events, params);

    c.bench_function("lsh_bands_k128_b32", |b| {
        b.iter(|| black_box(lsh_bands(black_box(&sig), params)));
    });
}

fn bench_matcher_exact_match(c: &mut Criterion) {
    let pattern: Vec<String> = (0..200).map(|i| format!("tok-{i}")).collect();
    let stm = pattern[50..70].to_vec();

    c.bench_function("align_200_tokens_exact_subsequence", |b| {
        b.iter(|| black_box(align(black_box(&pattern), black_box(&stm))));
    });
}

fn bench_matcher_fragmented_match(c: &mut Criterion) {
    let pattern: Vec<String> = (0..200).map(|i| format!("tok-{i}")).collect();
    let stm: Vec<String> = pattern.iter().step_by(3).cloned().collect();

    c.bench_function("align_200_tokens_fragmented", |b| {
        b.iter(|| black_box(align(black_box(&pattern), black_box(&stm))));
    });
}

criterion_group!(
    benches,
    bench_minhash_signature,
    bench_lsh_bands,
    bench_matcher_exact_match,
    bench_matcher_fragmented_match,
);
criterion_main!(benches);
