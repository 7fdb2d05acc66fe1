//! Core domain types for the rating log.
//!
//! Type aliases keep user IDs and movie IDs apart, `Rating` is a small
//! `Copy` value object, and `MovieRatings` is the per-user sparse row
//! that every later stage reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

/// One user's ratings keyed by movie.
///
/// A `BTreeMap` so iteration order is the movie ID order on every run.
pub type MovieRatings = BTreeMap<MovieId, Rating>;

// =============================================================================
// Rating scale
// =============================================================================

/// Lowest value on the rating scale
pub const MIN_RATING: u8 = 1;

/// Highest value on the rating scale
pub const MAX_RATING: u8 = 5;

/// Midpoint of the rating scale, used when nothing is known about a movie
pub const NEUTRAL_RATING: f64 = 3.0;

// =============================================================================
// Rating Types
// =============================================================================

/// A single rating value with the time it was made.
///
/// Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    /// Rating value from 1 to 5
    pub value: u8,
    /// Unix timestamp when rating was made
    pub timestamp: i64,
}

impl Rating {
    pub fn new(value: u8, timestamp: i64) -> Self {
        Self { value, timestamp }
    }

    /// The value as a float, for the similarity and prediction arithmetic
    pub fn as_f64(&self) -> f64 {
        f64::from(self.value)
    }
}

/// One line of the rating log: who rated what, and how
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: Rating,
}

/// Which side of the training/validation split a rating landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    Training,
    Validation,
}

impl Partition {
    /// Route the `nth` rating seen for a user (1-indexed).
    ///
    /// Every third rating is held out for validation.
    pub fn for_nth_rating(nth: u32) -> Self {
        if nth % 3 == 0 {
            Partition::Validation
        } else {
            Partition::Training
        }
    }
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Sizes of a populated store, for logging and the `stats` command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub users: usize,
    pub movies: usize,
    pub training_ratings: usize,
    pub validation_ratings: usize,
}

/// Outcome of reading a rating log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Lines that produced a rating
    pub parsed: usize,
    /// Non-blank lines that were malformed and dropped
    pub skipped: usize,
}
