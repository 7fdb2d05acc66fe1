//! # Data Loader Crate
//!
//! This crate loads a `userId::movieId::rating::timestamp` rating log and
//! partitions it into training and validation ratings.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Rating, RatingRecord, Partition)
//! - **parser**: Parse log lines into Rust structs, skipping malformed ones
//! - **store**: The partitioned `RatingStore` with per-movie averages
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::RatingStore;
//! use std::path::Path;
//!
//! let (store, report) = RatingStore::load_from_file(Path::new("data/ratings.txt"))?;
//!
//! let training = store.training_ratings_of(1);
//! let fallback = store.global_average(1193);
//!
//! println!("User 1 has {} training ratings ({} lines skipped)", training.len(), report.skipped);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use store::RatingStore;
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    MovieRatings,
    // Core types
    Rating,
    RatingRecord,
    Partition,
    StoreCounts,
    LoadReport,
    // Rating scale
    MIN_RATING,
    MAX_RATING,
    NEUTRAL_RATING,
};
