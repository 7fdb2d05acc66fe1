//! Rank-walk neighbor index - approximate, linear in the number of users
//!
//! Every user is reduced to one scalar: their cosine-style score against a
//! synthetic "popularity user" who rates each movie with its training
//! average. Users are sorted by that scalar once. The neighbors of `u` are
//! found by walking outward from `u`'s slot, each step taking whichever
//! side is closer in scalar value.
//!
//! Nearby in this ranking does not mean similar in taste. This trades
//! accuracy for skipping the pairwise pass entirely.

use crate::neighbors::{NeighborIndex, SimilarityScore};
use data_loader::{MovieId, MovieRatings, RatingStore, UserId};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
struct RankedUser {
    user_id: UserId,
    scalar: f64,
}

/// Neighbor index over a single global ranking of users
#[derive(Debug, Clone, Default)]
pub struct RankWalkNeighborIndex {
    ranking: Vec<RankedUser>,
    positions: HashMap<UserId, usize>,
}

impl RankWalkNeighborIndex {
    /// Rank every training user by similarity to the popularity user
    #[instrument(skip(store))]
    pub fn build(store: &RatingStore) -> Self {
        let averages = training_averages(store);
        let popularity_sum_of_squares: f64 = averages.values().map(|avg| avg * avg).sum();

        let mut ranking: Vec<RankedUser> = store
            .training_users()
            .map(|user_id| RankedUser {
                user_id,
                scalar: popularity_scalar(
                    store.training_ratings_of(user_id),
                    &averages,
                    popularity_sum_of_squares,
                ),
            })
            .collect();
        // Stable: equal scalars stay in ascending user order
        ranking.sort_by(|a, b| a.scalar.total_cmp(&b.scalar));

        let positions = ranking
            .iter()
            .enumerate()
            .map(|(position, ranked)| (ranked.user_id, position))
            .collect();

        info!("Built rank-walk neighbor index over {} users", ranking.len());
        Self { ranking, positions }
    }

    /// The scalar a user was ranked by
    pub fn scalar_of(&self, user_id: UserId) -> Option<f64> {
        let position = *self.positions.get(&user_id)?;
        Some(self.ranking[position].scalar)
    }

    /// Users in ranking order, lowest scalar first
    pub fn ranking(&self) -> impl Iterator<Item = UserId> + '_ {
        self.ranking.iter().map(|ranked| ranked.user_id)
    }
}

/// Per-movie mean over training ratings only.
///
/// Held-out ratings must not move the ranking, so this cannot reuse
/// `RatingStore::global_average`.
fn training_averages(store: &RatingStore) -> BTreeMap<MovieId, f64> {
    let mut totals: BTreeMap<MovieId, (u64, u32)> = BTreeMap::new();
    for user_id in store.training_users() {
        for (&movie_id, rating) in store.training_ratings_of(user_id) {
            let (sum, count) = totals.entry(movie_id).or_default();
            *sum += u64::from(rating.value);
            *count += 1;
        }
    }

    totals
        .into_iter()
        .map(|(movie_id, (sum, count))| (movie_id, sum as f64 / f64::from(count)))
        .collect()
}

/// Score a user's ratings against the per-movie training averages.
///
/// Same shape as the pairwise score. A degenerate user lands at 0.
fn popularity_scalar(
    ratings: &MovieRatings,
    averages: &BTreeMap<MovieId, f64>,
    popularity_sum_of_squares: f64,
) -> f64 {
    let mut numerator = 0.0;
    let mut sum_of_squares = 0.0;
    for (movie_id, rating) in ratings {
        let value = rating.as_f64();
        if let Some(avg) = averages.get(movie_id) {
            numerator += value * avg;
        }
        sum_of_squares += value * value;
    }

    let denominator = sum_of_squares * popularity_sum_of_squares;
    if numerator == 0.0 || denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl NeighborIndex for RankWalkNeighborIndex {
    fn name(&self) -> &str {
        "RankWalkNeighborIndex"
    }

    fn neighbors<'a>(&'a self, user_id: UserId) -> Box<dyn Iterator<Item = SimilarityScore> + 'a> {
        match self.positions.get(&user_id) {
            Some(&position) => Box::new(RankWalk {
                ranking: &self.ranking,
                origin: self.ranking[position].scalar,
                left: position,
                right: position + 1,
            }),
            None => Box::new(std::iter::empty::<SimilarityScore>()),
        }
    }
}

/// Outward walk from one slot of the ranking.
///
/// `ranking[..left]` and `ranking[right..]` are still unvisited.
struct RankWalk<'a> {
    ranking: &'a [RankedUser],
    origin: f64,
    left: usize,
    right: usize,
}

impl RankWalk<'_> {
    fn gap(&self, position: usize) -> f64 {
        (self.ranking[position].scalar - self.origin).abs()
    }
}

impl Iterator for RankWalk<'_> {
    type Item = SimilarityScore;

    fn next(&mut self) -> Option<SimilarityScore> {
        let left_gap = (self.left > 0).then(|| self.gap(self.left - 1));
        let right_gap = (self.right < self.ranking.len()).then(|| self.gap(self.right));

        let (position, gap) = match (left_gap, right_gap) {
            (Some(l), Some(r)) if l <= r => (self.left - 1, l),
            (_, Some(r)) => (self.right, r),
            (Some(l), None) => (self.left - 1, l),
            (None, None) => return None,
        };

        if position < self.left {
            self.left -= 1;
        } else {
            self.right += 1;
        }

        // Closeness shrinks as the gap grows, so the walk is best first
        Some(SimilarityScore::new(
            self.ranking[position].user_id,
            1.0 / (1.0 + gap),
        ))
    }
}
