//! The Neighbor Index contract.
//!
//! A neighbor index answers "who resembles this user, best first?".
//! Two implementations exist and are picked with [`NeighborStrategy`]:
//! - [`ExactNeighborIndex`]: every pairwise score, sorted per user
//! - [`RankWalkNeighborIndex`]: an approximate walk over one global ranking

use crate::exact::ExactNeighborIndex;
use crate::rank_walk::RankWalkNeighborIndex;
use data_loader::{RatingStore, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How similar one other user is to the user being queried
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub user_id: UserId,
    pub score: f64,
}

impl SimilarityScore {
    pub fn new(user_id: UserId, score: f64) -> Self {
        Self { user_id, score }
    }
}

/// Ranked neighbor lookup, read-only once built.
///
/// ## Design Note
/// - `Send + Sync` so one index can be shared through an `Arc` by the
///   evaluation sweep
/// - `neighbors` is lazy: the predictor stops walking as soon as it has
///   enough ratings
pub trait NeighborIndex: Send + Sync {
    /// Returns the name of this index (for logging/debugging)
    fn name(&self) -> &str;

    /// All neighbors of `user_id` in non-increasing score order.
    ///
    /// Empty for a user the index has never seen.
    fn neighbors<'a>(&'a self, user_id: UserId) -> Box<dyn Iterator<Item = SimilarityScore> + 'a>;

    /// The `k` best neighbors; always a prefix of [`NeighborIndex::neighbors`]
    fn top_k(&self, user_id: UserId, k: usize) -> Vec<SimilarityScore> {
        self.neighbors(user_id).take(k).collect()
    }
}

/// Which neighbor index to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeighborStrategy {
    /// Full pairwise scores. Quadratic in the number of users.
    #[default]
    Exact,
    /// Walk outward along a single popularity ranking. Approximate.
    RankWalk,
}

impl fmt::Display for NeighborStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeighborStrategy::Exact => write!(f, "exact"),
            NeighborStrategy::RankWalk => write!(f, "rank-walk"),
        }
    }
}

/// Build the index selected by `strategy` over the store's training ratings
pub fn build_neighbor_index(
    store: &RatingStore,
    strategy: NeighborStrategy,
) -> Box<dyn NeighborIndex> {
    match strategy {
        NeighborStrategy::Exact => Box::new(ExactNeighborIndex::build(store)),
        NeighborStrategy::RankWalk => Box::new(RankWalkNeighborIndex::build(store)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Rating;

    fn create_test_store() -> RatingStore {
        let mut store = RatingStore::new();
        let rows: [(UserId, &[(u32, u8)]); 4] = [
            (1, &[(10, 5), (20, 4)]),
            (2, &[(10, 5), (20, 3)]),
            (3, &[(10, 1)]),
            (4, &[(20, 2), (30, 5)]),
        ];
        for (user_id, row) in rows {
            for &(movie_id, value) in row {
                store.record(user_id, movie_id, Rating::new(value, 1000000));
            }
        }
        store
    }

    #[test]
    fn test_both_strategies_honor_the_contract() {
        let store = create_test_store();

        for strategy in [NeighborStrategy::Exact, NeighborStrategy::RankWalk] {
            let index = build_neighbor_index(&store, strategy);

            for user_id in 1..=4 {
                let all: Vec<SimilarityScore> = index.neighbors(user_id).collect();
                assert!(
                    all.windows(2).all(|w| w[0].score >= w[1].score),
                    "{} index out of order for user {}",
                    strategy,
                    user_id
                );
                assert!(all.iter().all(|s| s.user_id != user_id));

                for k in 0..all.len() {
                    let shorter = index.top_k(user_id, k);
                    let longer = index.top_k(user_id, k + 1);
                    assert_eq!(shorter[..], longer[..k]);
                }
            }

            assert!(index.top_k(999, 5).is_empty());
        }
    }

    /// Same training partition every time; only user 4's held-out rating of
    /// movie 10 changes
    fn create_store_with_held_out(held_out: u8) -> RatingStore {
        let mut store = RatingStore::new();
        let rows: [(UserId, [(u32, u8); 3]); 4] = [
            (1, [(10, 5), (20, 4), (30, 2)]),
            (2, [(10, 4), (20, 4), (30, 3)]),
            (3, [(10, 1), (40, 5), (20, 5)]),
            (4, [(20, 2), (30, 5), (10, held_out)]),
        ];
        for (user_id, row) in rows {
            for (movie_id, value) in row {
                store.record(user_id, movie_id, Rating::new(value, 1000000));
            }
        }
        store
    }

    #[test]
    fn test_held_out_ratings_never_move_neighbors() {
        let low = create_store_with_held_out(1);
        let high = create_store_with_held_out(5);
        assert_ne!(low.global_average(10), high.global_average(10));

        for strategy in [NeighborStrategy::Exact, NeighborStrategy::RankWalk] {
            let from_low = build_neighbor_index(&low, strategy);
            let from_high = build_neighbor_index(&high, strategy);

            for user_id in 1..=4 {
                assert_eq!(
                    from_low.top_k(user_id, 10),
                    from_high.top_k(user_id, 10),
                    "{} neighbors of user {} depend on a held-out rating",
                    strategy,
                    user_id
                );
            }
        }
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(NeighborStrategy::Exact.to_string(), "exact");
        assert_eq!(NeighborStrategy::RankWalk.to_string(), "rank-walk");
        assert_eq!(NeighborStrategy::default(), NeighborStrategy::Exact);
    }
}
