use booksim_core::tokenizer::tokenize;
use booksim_core::{build_index, DocRecord, PipelineConfig};
use criterion::{criterion_group, criterion_main, Criterion};

const WORDS: &[&str] = &[
    "whale", "sea", "captain", "ship", "marriage", "ball", "letter", "castle", "vampire", "blood",
    "monster", "science", "village", "gossip", "navy", "storm", "harpoon", "carriage", "estate", "night",
];

fn synthetic_corpus(n: usize) -> Vec<DocRecord> {
    (0..n)
        .map(|i| {
            let text: Vec<&str> = (0..200).map(|k| WORDS[(i * 7 + k * k) % WORDS.len()]).collect();
            DocRecord {
                id: format!("{i}"),
                title: format!("Book {i}"),
                author: format!("Author {}", i % 25),
                year: None,
                text: text.join(" "),
                rating: None,
            }
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let text = synthetic_corpus(1).remove(0).text;
    c.bench_function("tokenize_200_words", |b| b.iter(|| tokenize(&text)));
}

fn bench_build(c: &mut Criterion) {
    let records = synthetic_corpus(300);
    let config = PipelineConfig::default();
    c.bench_function("build_index_300_docs", |b| {
        b.iter(|| build_index(records.clone(), None, &config).unwrap())
    });
}

criterion_group!(benches, bench_tokenize, bench_build);
criterion_main!(benches);
