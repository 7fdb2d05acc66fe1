//! Hold-out evaluation across neighborhood sizes.
//!
//! For each `k`, every validation rating is predicted, rounded to the
//! rating scale, and compared with the real value. The mean absolute
//! difference is reported per `k`, overall and per user.

use crate::predictor::Predictor;
use data_loader::UserId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Round half away from zero: `round_rating(2.5) == 3`, `round_rating(-2.5) == -3`
pub fn round_rating(r: f64) -> i64 {
    if r < 0.0 {
        (r - 0.5).ceil() as i64
    } else {
        (r + 0.5).floor() as i64
    }
}

/// Range of neighborhood sizes to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub start: usize,
    pub end: usize,
    pub step: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start: 10,
            end: 200,
            step: 10,
        }
    }
}

impl SweepConfig {
    /// Configure the inclusive range of k (default: 10..=200)
    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Configure the increment between k values (default: 10)
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Every k in the sweep, ascending. A zero step is treated as 1.
    pub fn ks(&self) -> Vec<usize> {
        (self.start..=self.end).step_by(self.step.max(1)).collect()
    }
}

/// Error figures for one neighborhood size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub predictions: usize,
    pub absolute_error_sum: u64,
    /// `None` when there was nothing to validate against
    pub mean_absolute_error: Option<f64>,
    /// Mean absolute error of each validation user
    pub per_user: BTreeMap<UserId, f64>,
}

/// Runs predictions against the validation partition
#[derive(Clone)]
pub struct Evaluator {
    predictor: Predictor,
}

impl Evaluator {
    pub fn new(predictor: Predictor) -> Self {
        Self { predictor }
    }

    /// Predict every validation rating with `k` neighbors
    #[instrument(skip(self))]
    pub fn evaluate(&self, k: usize) -> EvaluationReport {
        let store = self.predictor.store();

        let mut predictions = 0usize;
        let mut absolute_error_sum = 0u64;
        let mut per_user_sums: BTreeMap<UserId, (u64, usize)> = BTreeMap::new();

        for (user_id, movie_id, rating) in store.validation_records() {
            let predicted = round_rating(self.predictor.predict(user_id, movie_id, k));
            let diff = (i64::from(rating.value) - predicted).unsigned_abs();

            predictions += 1;
            absolute_error_sum += diff;
            let user_entry = per_user_sums.entry(user_id).or_insert((0, 0));
            user_entry.0 += diff;
            user_entry.1 += 1;
        }

        let per_user = per_user_sums
            .into_iter()
            .map(|(user_id, (sum, count))| (user_id, sum as f64 / count as f64))
            .collect();
        let mean_absolute_error =
            (predictions > 0).then(|| absolute_error_sum as f64 / predictions as f64);

        debug!(
            "k = {}: {} predictions, mean absolute error {:?}",
            k, predictions, mean_absolute_error
        );

        EvaluationReport {
            k,
            predictions,
            absolute_error_sum,
            mean_absolute_error,
            per_user,
        }
    }

    /// Evaluate every k in `config`, returned in ascending k.
    ///
    /// The k values are independent, so they run on the rayon pool.
    pub fn sweep(&self, config: &SweepConfig) -> Vec<EvaluationReport> {
        let ks = config.ks();
        info!(
            "Sweeping {} neighborhood sizes with {}",
            ks.len(),
            self.predictor.index().name()
        );

        ks.par_iter().map(|&k| self.evaluate(k)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Rating, RatingStore};
    use similarity::ExactNeighborIndex;
    use std::sync::Arc;

    #[test]
    fn test_rounding_law() {
        assert_eq!(round_rating(2.5), 3);
        assert_eq!(round_rating(-2.5), -3);
        assert_eq!(round_rating(2.4), 2);
        assert_eq!(round_rating(2.6), 3);
        assert_eq!(round_rating(-2.4), -2);
        assert_eq!(round_rating(0.0), 0);
        assert_eq!(round_rating(4.5), 5);
    }

    #[test]
    fn test_default_sweep() {
        let ks = SweepConfig::default().ks();
        assert_eq!(ks.len(), 20);
        assert_eq!(ks.first(), Some(&10));
        assert_eq!(ks.last(), Some(&200));
    }

    #[test]
    fn test_custom_sweep() {
        let config = SweepConfig::default().with_range(1, 7).with_step(3);
        assert_eq!(config.ks(), vec![1, 4, 7]);

        let zero_step = SweepConfig::default().with_range(2, 4).with_step(0);
        assert_eq!(zero_step.ks(), vec![2, 3, 4]);
    }

    fn evaluator_for(store: RatingStore) -> Evaluator {
        let store = Arc::new(store);
        let index = Arc::new(ExactNeighborIndex::build(&store));
        Evaluator::new(Predictor::new(store, index))
    }

    #[test]
    fn test_empty_validation_has_no_error_figure() {
        let evaluator = evaluator_for(RatingStore::new());

        let report = evaluator.evaluate(10);
        assert_eq!(report.predictions, 0);
        assert_eq!(report.mean_absolute_error, None);
        assert!(report.per_user.is_empty());
    }

    #[test]
    fn test_single_held_out_rating() {
        let mut store = RatingStore::new();
        store.record(1, 10, Rating::new(4, 1));
        store.record(1, 20, Rating::new(4, 2));
        store.record(1, 30, Rating::new(1, 3)); // held out
        store.record(2, 10, Rating::new(4, 4));
        store.record(2, 30, Rating::new(5, 5));

        let report = evaluator_for(store).evaluate(5);

        // User 2 is the only neighbor and rated movie 30 a 5
        assert_eq!(report.predictions, 1);
        assert_eq!(report.absolute_error_sum, 4);
        assert_eq!(report.mean_absolute_error, Some(4.0));
        assert_eq!(report.per_user.get(&1), Some(&4.0));
    }

    #[test]
    fn test_sweep_keeps_k_order() {
        let mut store = RatingStore::new();
        for user_id in 1..=6u32 {
            for movie_id in 1..=6u32 {
                let value = ((user_id + movie_id) % 5 + 1) as u8;
                store.record(user_id, movie_id, Rating::new(value, 1));
            }
        }
        let evaluator = evaluator_for(store);

        let config = SweepConfig::default().with_range(1, 5).with_step(1);
        let reports = evaluator.sweep(&config);

        let ks: Vec<usize> = reports.iter().map(|r| r.k).collect();
        assert_eq!(ks, vec![1, 2, 3, 4, 5]);
        for report in &reports {
            assert_eq!(report.predictions, 12);
            assert_eq!(report, &evaluator.evaluate(report.k));
        }
    }
}
