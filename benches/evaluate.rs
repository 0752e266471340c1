use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wordle_sieve::{filter_candidates, is_match, RuleSet};

const RULES: &str = "O AT 3\nA IN WORD, NOT AT 1\nNO S, T, R, E\nLENGTH: 5";

fn word_universe() -> Vec<String> {
    let letters: Vec<char> = ('A'..='Z').collect();
    let mut words = Vec::with_capacity(20_000);
    for i in 0..20_000usize {
        let word: String = (0..5)
            .map(|p| letters[(i * 7 + p * 11 + i / 26 * p) % 26])
            .collect();
        words.push(word);
    }
    words
}

fn bench_evaluate(c: &mut Criterion) {
    let rules = RuleSet::compile(RULES);
    let words = word_universe();

    c.bench_function("compile_rules", |b| {
        b.iter(|| RuleSet::compile(black_box(RULES)))
    });

    c.bench_function("evaluate_single", |b| {
        b.iter(|| is_match(black_box("CLOAK"), &rules))
    });

    c.bench_function("filter_20k", |b| {
        b.iter(|| filter_candidates(black_box(&words), &rules))
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
