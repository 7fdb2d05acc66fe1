//! Benchmarks for building the neighbor indexes
//!
//! Run with: cargo bench --package similarity
//!
//! Uses a synthetic store so it runs without the dataset on disk.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{Rating, RatingStore};
use similarity::{ExactNeighborIndex, NeighborIndex, RankWalkNeighborIndex};

/// 400 users, 60 ratings each, spread over 500 movies
fn synthetic_store() -> RatingStore {
    let mut store = RatingStore::new();
    for user_id in 1..=400u32 {
        for n in 0..60u32 {
            let movie_id = (user_id * 7 + n * 13) % 500 + 1;
            let value = ((user_id + n) % 5 + 1) as u8;
            store.record(user_id, movie_id, Rating::new(value, 1000000 + n as i64));
        }
    }
    store
}

fn bench_exact_build(c: &mut Criterion) {
    let store = synthetic_store();

    c.bench_function("exact_index_build", |b| {
        b.iter(|| {
            let index = ExactNeighborIndex::build(black_box(&store));
            black_box(index)
        })
    });
}

fn bench_rank_walk_build(c: &mut Criterion) {
    let store = synthetic_store();

    c.bench_function("rank_walk_index_build", |b| {
        b.iter(|| {
            let index = RankWalkNeighborIndex::build(black_box(&store));
            black_box(index)
        })
    });
}

fn bench_top_k(c: &mut Criterion) {
    let store = synthetic_store();
    let exact = ExactNeighborIndex::build(&store);

    c.bench_function("exact_top_k", |b| {
        b.iter(|| {
            let neighbors = exact.top_k(black_box(1), black_box(50));
            black_box(neighbors)
        })
    });
}

criterion_group!(
    benches,
    bench_exact_build,
    bench_rank_walk_build,
    bench_top_k
);
criterion_main!(benches);
