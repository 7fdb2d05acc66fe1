//! Prediction Engine - neighbor-average rating estimates
//!
//! ## Algorithm
//! 1. Walk the user's neighbors, most similar first
//! 2. Keep the training rating of every neighbor who rated the movie
//! 3. Stop after `k` such ratings, or when the neighbors run out
//! 4. Answer with their mean
//!
//! When no neighbor rated the movie the fallback chain takes over:
//! the movie's global average, then the neutral midpoint. Neither case
//! is an error; sparse data makes both routine.

use data_loader::{MovieId, NEUTRAL_RATING, RatingStore, UserId};
use serde::{Deserialize, Serialize};
use similarity::NeighborIndex;
use std::sync::Arc;
use tracing::trace;

/// Which level of the fallback chain produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionSource {
    /// Mean of `count` neighbors' ratings
    Neighbors { count: usize },
    /// No neighbor rated the movie; its global average was used
    GlobalAverage,
    /// Nobody ever rated the movie
    Neutral,
}

/// A rating estimate and where it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub value: f64,
    pub source: PredictionSource,
}

/// Predicts ratings from a store and a neighbor index.
///
/// Both are shared read-only, so a predictor is cheap to clone and safe
/// to use from several threads.
#[derive(Clone)]
pub struct Predictor {
    store: Arc<RatingStore>,
    index: Arc<dyn NeighborIndex>,
}

impl Predictor {
    pub fn new(store: Arc<RatingStore>, index: Arc<dyn NeighborIndex>) -> Self {
        Self { store, index }
    }

    pub fn store(&self) -> &RatingStore {
        &self.store
    }

    pub fn index(&self) -> &dyn NeighborIndex {
        self.index.as_ref()
    }

    /// Estimated rating of `movie_id` by `user_id`, using up to `k` neighbors
    pub fn predict(&self, user_id: UserId, movie_id: MovieId, k: usize) -> f64 {
        self.predict_detailed(user_id, movie_id, k).value
    }

    /// Like [`Predictor::predict`], also reporting which fallback level answered
    pub fn predict_detailed(&self, user_id: UserId, movie_id: MovieId, k: usize) -> Prediction {
        let mut count = 0usize;
        let mut sum = 0.0;

        for neighbor in self.index.neighbors(user_id) {
            if count == k {
                break;
            }
            // Neighbors without a rating for this movie don't use up the budget
            if let Some(rating) = self.store.training_rating(neighbor.user_id, movie_id) {
                count += 1;
                sum += rating.as_f64();
            }
        }

        if count > 0 {
            return Prediction {
                value: sum / count as f64,
                source: PredictionSource::Neighbors { count },
            };
        }

        trace!(user_id, movie_id, "No rated neighbor, falling back");
        match self.store.global_average(movie_id) {
            Some(avg) => Prediction {
                value: avg,
                source: PredictionSource::GlobalAverage,
            },
            None => Prediction {
                value: NEUTRAL_RATING,
                source: PredictionSource::Neutral,
            },
        }
    }
}
