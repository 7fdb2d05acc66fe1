//! End-to-end tests: rating log in, error figures out.
//!
//! These tests run the store, both neighbor indexes, the predictor and the
//! evaluator together on small hand-checked data.

use data_loader::{parser, DataLoadError, Rating, RatingStore, NEUTRAL_RATING};
use prediction::{round_rating, Evaluator, PredictionSource, Predictor, SweepConfig};
use similarity::{build_neighbor_index, NeighborIndex, NeighborStrategy};
use std::path::Path;
use std::sync::Arc;

/// user 1: {10:5, 20:4} + held-out (10, 5)
/// user 2: {10:5, 20:3}
/// user 3: {10:1}
fn create_three_user_store() -> RatingStore {
    let mut store = RatingStore::new();
    store.record(1, 10, Rating::new(5, 100));
    store.record(1, 20, Rating::new(4, 101));
    store.record(1, 10, Rating::new(5, 102));
    store.record(2, 10, Rating::new(5, 103));
    store.record(2, 20, Rating::new(3, 104));
    store.record(3, 10, Rating::new(1, 105));
    store
}

fn predictor_for(store: RatingStore, strategy: NeighborStrategy) -> Predictor {
    let store = Arc::new(store);
    let index: Arc<dyn NeighborIndex> = Arc::from(build_neighbor_index(&store, strategy));
    Predictor::new(store, index)
}

#[test]
fn test_three_user_scenario() {
    let predictor = predictor_for(create_three_user_store(), NeighborStrategy::Exact);

    assert_eq!(predictor.store().validation_ratings_of(1).len(), 1);
    assert_eq!(predictor.store().training_ratings_of(1).len(), 2);

    // 5 / (41 * 1) for user 3 outranks 37 / (41 * 34) for user 2
    let ranked = predictor.index().top_k(1, 2);
    assert_eq!(ranked[0].user_id, 3);
    assert_eq!(ranked[1].user_id, 2);

    // k = 1: only the nearest rater counts
    let nearest = predictor.predict_detailed(1, 10, 1);
    assert_eq!(nearest.value, 1.0);
    assert_eq!(nearest.source, PredictionSource::Neighbors { count: 1 });

    // k = 2: (1 + 5) / 2 rounds to 3, two away from the held-out 5
    let both = predictor.predict(1, 10, 2);
    assert_eq!(both, 3.0);
    assert_eq!((5 - round_rating(both)).abs(), 2);
}

#[test]
fn test_evaluation_over_the_scenario() {
    let evaluator = Evaluator::new(predictor_for(create_three_user_store(), NeighborStrategy::Exact));

    let reports = evaluator.sweep(&SweepConfig::default().with_range(1, 2).with_step(1));
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].mean_absolute_error, Some(4.0));
    assert_eq!(reports[1].mean_absolute_error, Some(2.0));
}

#[test]
fn test_fallback_chain_end_to_end() {
    let predictor = predictor_for(create_three_user_store(), NeighborStrategy::Exact);

    // Both of user 3's neighbors rated movie 20 (4 and 3)
    let prediction = predictor.predict_detailed(3, 20, 10);
    assert_eq!(prediction.source, PredictionSource::Neighbors { count: 2 });
    assert_eq!(prediction.value, 3.5);

    // Nobody ever rated movie 12345
    let unknown = predictor.predict_detailed(2, 12345, 10);
    assert_eq!(unknown.source, PredictionSource::Neutral);
    assert_eq!(unknown.value, NEUTRAL_RATING);
}

#[test]
fn test_global_average_when_only_held_out_ratings_exist() {
    let mut store = RatingStore::new();
    store.record(1, 10, Rating::new(4, 1));
    store.record(1, 20, Rating::new(3, 2));
    store.record(1, 50, Rating::new(2, 3)); // held out
    store.record(2, 10, Rating::new(5, 4));
    let predictor = predictor_for(store, NeighborStrategy::Exact);

    // User 1's rating of movie 50 is validation-only: no neighbor source,
    // but it still feeds the global average
    let prediction = predictor.predict_detailed(2, 50, 10);
    assert_eq!(prediction.source, PredictionSource::GlobalAverage);
    assert_eq!(prediction.value, 2.0);
}

#[test]
fn test_both_strategies_agree_on_the_fallbacks() {
    for strategy in [NeighborStrategy::Exact, NeighborStrategy::RankWalk] {
        let predictor = predictor_for(create_three_user_store(), strategy);

        assert_eq!(predictor.predict(1, 999, 5), NEUTRAL_RATING);
        assert_eq!(predictor.predict(42, 10, 5), predictor.store().global_average(10).unwrap());

        let value = predictor.predict(1, 10, 200);
        assert!((1.0..=5.0).contains(&value), "{} predicted {}", strategy, value);
    }
}

#[test]
fn test_rebuilding_the_index_is_idempotent() {
    let store = create_three_user_store();

    for strategy in [NeighborStrategy::Exact, NeighborStrategy::RankWalk] {
        let first = build_neighbor_index(&store, strategy);
        let second = build_neighbor_index(&store, strategy);
        for user_id in 1..=3 {
            assert_eq!(first.top_k(user_id, 10), second.top_k(user_id, 10));
        }
    }
}

#[test]
fn test_held_out_rating_only_moves_the_fallback() {
    // Identical training partitions; user 4's third rating differs
    let build = |held_out: u8| {
        let mut store = create_three_user_store();
        store.record(4, 20, Rating::new(2, 200));
        store.record(4, 30, Rating::new(5, 201));
        store.record(4, 10, Rating::new(held_out, 202));
        store
    };

    for strategy in [NeighborStrategy::Exact, NeighborStrategy::RankWalk] {
        let low = predictor_for(build(1), strategy);
        let high = predictor_for(build(5), strategy);

        for user_id in 1..=4 {
            assert_eq!(low.index().top_k(user_id, 10), high.index().top_k(user_id, 10));
        }
        assert_eq!(low.predict(1, 10, 2), high.predict(1, 10, 2));
        assert_ne!(low.store().global_average(10), high.store().global_average(10));
    }
}

#[test]
fn test_empty_store_end_to_end() {
    let predictor = predictor_for(RatingStore::new(), NeighborStrategy::Exact);
    assert!(predictor.index().top_k(1, 10).is_empty());
    assert_eq!(predictor.predict(1, 1, 10), NEUTRAL_RATING);

    let reports = Evaluator::new(predictor).sweep(&SweepConfig::default());
    assert_eq!(reports.len(), 20);
    assert!(reports.iter().all(|r| r.mean_absolute_error.is_none()));
}

#[test]
fn test_log_file_to_sweep() {
    let content = "1::10::5::978300760\n\
                   1::20::4::978300761\n\
                   1::10::5::978300762\n\
                   not a rating\n\
                   2::10::5::978300763\n\
                   2::20::3::978300764\n\
                   3::10::1::978300765\n\
                   3::10\n";
    let path = std::env::temp_dir().join(format!("ratings-e2e-{}.txt", std::process::id()));
    std::fs::write(&path, content).unwrap();

    let loaded = RatingStore::load_from_file(&path);
    std::fs::remove_file(&path).unwrap();
    let (store, report) = loaded.unwrap();

    assert_eq!(report.parsed, 6);
    assert_eq!(report.skipped, 2);

    let evaluator = Evaluator::new(predictor_for(store, NeighborStrategy::Exact));
    let report = evaluator.evaluate(2);
    assert_eq!(report.predictions, 1);
    assert_eq!(report.mean_absolute_error, Some(2.0));
}

#[test]
fn test_missing_log_file() {
    let err = RatingStore::load_from_file(Path::new("no/such/dir/ratings.txt")).unwrap_err();
    assert!(matches!(err, DataLoadError::FileNotFound { .. }));
}

#[test]
fn test_parsed_records_match_recorded_ones() {
    let parsed = parser::parse_ratings_str("1::10::5::100\n1::20::4::101\n", "inline");
    let from_log = RatingStore::from_records(parsed.records);
    let by_hand = {
        let mut store = RatingStore::new();
        store.record(1, 10, Rating::new(5, 100));
        store.record(1, 20, Rating::new(4, 101));
        store
    };

    assert_eq!(from_log.training_ratings_of(1), by_hand.training_ratings_of(1));
}
