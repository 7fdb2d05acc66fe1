//! Rating prediction and hold-out evaluation.
//!
//! This crate provides:
//! - `Predictor`: neighbor-average estimates with a global fallback chain
//! - `Evaluator`: mean absolute error over the validation partition,
//!   swept across neighborhood sizes
//!
//! ## Example Usage
//! ```ignore
//! use prediction::{Evaluator, Predictor, SweepConfig};
//! use similarity::{build_neighbor_index, NeighborStrategy};
//! use std::sync::Arc;
//!
//! let store = Arc::new(store);
//! let index = Arc::from(build_neighbor_index(&store, NeighborStrategy::Exact));
//! let predictor = Predictor::new(store, index);
//!
//! let rating = predictor.predict(1, 1193, 20);
//! let reports = Evaluator::new(predictor).sweep(&SweepConfig::default());
//! ```

pub mod predictor;
pub mod evaluation;

// Re-export main types
pub use predictor::{Prediction, PredictionSource, Predictor};
pub use evaluation::{round_rating, EvaluationReport, Evaluator, SweepConfig};
