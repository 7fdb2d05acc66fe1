//! Similarity Engine - cosine-style scores between two users
//!
//! ## Formula
//! For users `a` and `b` with training ratings `r_a`, `r_b`:
//! - numerator: dot product over the movies both rated
//! - `sum1`, `sum2`: sum of squares over *all* of each user's ratings
//! - score: `numerator / (sum1 * sum2)`
//!
//! The denominator is the product of the sums of squares, not of the norms,
//! so scores are not confined to [-1, 1]. Rankings depend on this exact
//! shape, so it is kept as is.

use data_loader::{MovieId, MovieRatings, NEUTRAL_RATING, RatingStore, UserId};

/// The raw terms of a pair score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub numerator: f64,
    pub sum1: f64,
    pub sum2: f64,
}

impl PairScore {
    pub fn denominator(&self) -> f64 {
        self.sum1 * self.sum2
    }

    /// `true` when the pair shares nothing usable (no overlap, or a zero vector)
    pub fn is_degenerate(&self) -> bool {
        self.numerator == 0.0 || self.denominator() == 0.0
    }

    /// The score, or `None` for a degenerate pair
    pub fn cosine(&self) -> Option<f64> {
        if self.is_degenerate() {
            None
        } else {
            Some(self.numerator / self.denominator())
        }
    }
}

/// Compute the score terms for two users' rating rows.
///
/// Shared movies are visited in ascending movie ID whichever side drives
/// the loop, so `pair_score(a, b)` and `pair_score(b, a)` agree bit for bit.
pub fn pair_score(a: &MovieRatings, b: &MovieRatings) -> PairScore {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let numerator: f64 = small
        .iter()
        .filter_map(|(movie_id, rating)| {
            large
                .get(movie_id)
                .map(|other| rating.as_f64() * other.as_f64())
        })
        .sum();

    PairScore {
        numerator,
        sum1: sum_of_squares(a),
        sum2: sum_of_squares(b),
    }
}

fn sum_of_squares(ratings: &MovieRatings) -> f64 {
    ratings.values().map(|r| r.as_f64() * r.as_f64()).sum()
}

/// Where a score is being asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreContext {
    /// Building the neighbor index; no movie is in play
    Batch,
    /// Answering a question about one movie
    Movie(MovieId),
}

/// Scores user pairs from the training partition of a store
#[derive(Debug, Clone, Copy)]
pub struct SimilarityEngine<'a> {
    store: &'a RatingStore,
}

impl<'a> SimilarityEngine<'a> {
    pub fn new(store: &'a RatingStore) -> Self {
        Self { store }
    }

    /// Raw terms for a pair, from training ratings only
    pub fn terms(&self, a: UserId, b: UserId) -> PairScore {
        pair_score(
            self.store.training_ratings_of(a),
            self.store.training_ratings_of(b),
        )
    }

    /// Score an unordered pair of users.
    ///
    /// A degenerate pair has no score in the batch context. With a movie in
    /// context it scores as that movie's global average, or the neutral
    /// rating when the movie has never been rated.
    pub fn score(&self, a: UserId, b: UserId, context: ScoreContext) -> Option<f64> {
        let terms = self.terms(a, b);
        if let Some(score) = terms.cosine() {
            return Some(score);
        }

        match context {
            ScoreContext::Batch => None,
            ScoreContext::Movie(movie_id) => Some(
                self.store
                    .global_average(movie_id)
                    .unwrap_or(NEUTRAL_RATING),
            ),
        }
    }
}
