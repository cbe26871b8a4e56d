// Performance benchmarks for encoding and ranking
use blindmatch::{
    Attribute, Encoder, IdentityId, IdentityRecord, IndexCatalog, IndexDefinition, IndexStore, MemoryStore, Ranker,
    ScoringPolicy, SecretKey,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use std::sync::Arc;

const GIVEN: &[&str] = &["John", "Maria", "Ahmed", "Li", "Olga", "Pierre", "Aisha", "Kenji", "Sofia", "Liam"];
const FAMILY: &[&str] = &["Smith", "Garcia", "Khan", "Wang", "Ivanova", "Dubois", "Okafor", "Tanaka", "Rossi", "Murphy"];

fn create_catalog() -> Arc<IndexCatalog> {
    Arc::new(
        IndexCatalog::new(vec![
            IndexDefinition::exact("dob", &["date_of_birth"], 40.0),
            IndexDefinition::phonetic("family", &["family_name"], 30.0),
            IndexDefinition::fuzzy("name", &["given_name", "family_name"], 50.0),
        ])
        .unwrap(),
    )
}

fn generate_random_person(rng: &mut impl Rng) -> Vec<Attribute> {
    vec![
        Attribute::phonetic("given_name", GIVEN[rng.random_range(0..GIVEN.len())]),
        Attribute::phonetic("family_name", FAMILY[rng.random_range(0..FAMILY.len())]),
        Attribute::date(
            "date_of_birth",
            format!(
                "{}-{:02}-{:02}",
                rng.random_range(1940..2010),
                rng.random_range(1..13),
                rng.random_range(1..29)
            ),
        ),
    ]
}

fn benchmark_encode(c: &mut Criterion) {
    let catalog = create_catalog();
    let encoder = Encoder::new(SecretKey::from_bytes(vec![7u8; 32]).unwrap()).unwrap();
    let mut rng = rand::rng();
    let person = generate_random_person(&mut rng);

    c.bench_function("encode_person", |b| {
        b.iter(|| {
            let encoded = encoder.encode(black_box(person.clone()), &catalog).unwrap();
            black_box(encoded);
        });
    });
}

fn benchmark_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    let catalog = create_catalog();
    let encoder = Encoder::new(SecretKey::from_bytes(vec![7u8; 32]).unwrap()).unwrap();
    let ranker = Ranker::new(Arc::clone(&catalog), ScoringPolicy::default());
    let mut rng = rand::rng();

    for size in [100u64, 1000, 10000].iter() {
        let store = MemoryStore::new(Arc::clone(&catalog));
        for i in 0..*size {
            let (instances, _) = encoder
                .encode(generate_random_person(&mut rng), &catalog)
                .unwrap()
                .into_parts();
            store.upsert(IdentityRecord::new(IdentityId::from(i), instances)).unwrap();
        }

        let (query, _) = encoder
            .encode(generate_random_person(&mut rng), &catalog)
            .unwrap()
            .into_parts();
        let candidates = store.candidates(&query).unwrap();

        group.bench_with_input(BenchmarkId::new("candidates", size), &candidates, |b, candidates| {
            b.iter(|| {
                let ranked = ranker.rank(black_box(&query), candidates);
                black_box(ranked);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_encode, benchmark_rank);
criterion_main!(benches);
