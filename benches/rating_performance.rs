//! Performance benchmarks for rating calculations and the ranking store

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use elo_ranker::ranking::{Broadcaster, InMemoryPlayerRepository, RankingStore};
use elo_ranker::rating::{expected_score, initial_rating, new_rating, EloCalculator};
use std::sync::Arc;

fn create_bench_store(players: usize) -> RankingStore {
    let store = RankingStore::new(
        Arc::new(InMemoryPlayerRepository::new()),
        Arc::new(EloCalculator::default()),
        Broadcaster::new(),
    );

    for i in 0..players {
        store
            .create_player(&format!("player_{}", i))
            .expect("Failed to create bench player");
    }

    store
}

fn bench_rating_calculations(c: &mut Criterion) {
    c.bench_function("expected_score_and_update", |b| {
        b.iter(|| {
            let expected = expected_score(black_box(1216.0), black_box(1184.0));
            black_box(new_rating(1216, expected, 1.0))
        })
    });

    let ratings: Vec<i32> = (0..1_000).map(|i| 1000 + (i % 400)).collect();
    c.bench_function("initial_rating_1000_players", |b| {
        b.iter(|| black_box(initial_rating(black_box(&ratings))))
    });
}

fn bench_process_match(c: &mut Criterion) {
    let store = create_bench_store(100);

    c.bench_function("process_match_100_players", |b| {
        let mut round = 0usize;
        b.iter(|| {
            round += 1;
            let winner = format!("player_{}", round % 100);
            let loser = format!("player_{}", (round + 37) % 100);
            black_box(store.process_match(&winner, &loser, round % 5 == 0))
        })
    });
}

fn bench_process_match_with_subscribers(c: &mut Criterion) {
    let store = create_bench_store(10);
    let mut subscriptions: Vec<_> = (0..50).map(|_| store.broadcaster().subscribe()).collect();

    c.bench_function("process_match_50_subscribers", |b| {
        b.iter(|| {
            let result = store.process_match("player_1", "player_2", false);
            for subscription in subscriptions.iter_mut() {
                while subscription.try_recv().is_some() {}
            }
            black_box(result)
        })
    });
}

fn bench_list_players(c: &mut Criterion) {
    let store = create_bench_store(1_000);

    c.bench_function("list_players_1000", |b| {
        b.iter(|| black_box(store.list_players()))
    });
}

criterion_group!(
    benches,
    bench_rating_calculations,
    bench_process_match,
    bench_process_match_with_subscribers,
    bench_list_players
);
criterion_main!(benches);
