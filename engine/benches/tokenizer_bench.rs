use criterion::{criterion_group, criterion_main, Criterion};
use engine::{build_tf, tokenize};

fn sample_text() -> String {
    let para = "The quick brown fox jumps over the lazy dog. \
        Incremental indexing keeps per-term document frequencies current \
        as new uploads arrive, 1 of 42 times with digits.";
    para.repeat(200)
}

fn bench_tokenize(c: &mut Criterion) {
    let text = sample_text();
    c.bench_function("tokenize_200_paragraphs", |b| b.iter(|| tokenize(&text)));
}

fn bench_build_tf(c: &mut Criterion) {
    let tokens = tokenize(&sample_text());
    c.bench_function("build_tf_200_paragraphs", |b| b.iter(|| build_tf(&tokens)));
}

criterion_group!(benches, bench_tokenize, bench_build_tf);
criterion_main!(benches);
