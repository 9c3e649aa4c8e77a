use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use shortform::AbbreviationMatcher;

const TARGET_COUNT: usize = 2_000;
const SEED: u64 = 42;

const VOCABULARY: &[&str] = &[
    "overall", "merit", "review", "quality", "paper", "draft", "score",
    "notes", "author", "topic", "novelty", "clarity", "impact", "summary",
    "confidence", "expertise", "rating", "comments", "systems", "study",
];

/// Generate field-like names: two to four vocabulary words, occasionally
/// suffixed with a round number.
fn generate_names(rng: &mut StdRng) -> Vec<String> {
    (0..TARGET_COUNT)
        .map(|_| {
            let n = rng.gen_range(2..=4);
            let mut words: Vec<&str> = VOCABULARY
                .choose_multiple(rng, n)
                .copied()
                .collect();
            words.shuffle(rng);
            let mut name = words.join(" ");
            if rng.gen_ratio(1, 8) {
                name.push_str(&format!(" R{}", rng.gen_range(1..100)));
            }
            name
        })
        .collect()
}

fn build_index(names: &[String]) -> AbbreviationMatcher<usize> {
    let mut m = AbbreviationMatcher::new();
    for (i, name) in names.iter().enumerate() {
        m.add_phrase(name, i, 0);
    }
    m
}

fn bench_queries(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(SEED);
    let names = generate_names(&mut rng);

    // Cold path: the first query analyzes every pending entry.
    c.bench_function("first_query_analyzes_index", |b| {
        b.iter_batched(
            || build_index(&names),
            |mut m| m.find_all("OveMer", 0),
            BatchSize::SmallInput,
        )
    });

    // Warm path: testers are analyzed, pattern results memoized.
    let mut warm = build_index(&names);
    warm.find_all("OveMer", 0);
    warm.find_all("review qua*", 0);
    c.bench_function("camel_query_cached", |b| {
        b.iter(|| warm.find_all("OveMer", 0))
    });
    c.bench_function("wildcard_query_cached", |b| {
        b.iter(|| warm.find_all("review qua*", 0))
    });

    // Uncached scoring over the full index.
    let mut cold_patterns = build_index(&names);
    cold_patterns.find_all("overall", 0);
    let patterns: Vec<String> = (0..1_000)
        .map(|i| format!("{} R{}", VOCABULARY[i % VOCABULARY.len()], i))
        .collect();
    c.bench_function("distinct_patterns", |b| {
        let mut i = 0;
        b.iter(|| {
            i += 1;
            cold_patterns.find_all(&patterns[i % patterns.len()], 0)
        })
    });
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
