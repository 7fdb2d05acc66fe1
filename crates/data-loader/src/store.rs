//! RatingStore - the partitioned in-memory rating matrix.
//!
//! Ratings are routed into a training and a validation partition as they
//! arrive, using a per-user round-robin counter. Per-movie sums and counts
//! cover both partitions and back the global average fallback.

use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

static NO_RATINGS: MovieRatings = BTreeMap::new();

/// Training and validation ratings for every user.
///
/// Populated once, then only read. Components receive it by reference
/// (or through an `Arc`) rather than reaching for shared global state.
#[derive(Debug, Clone, Default)]
pub struct RatingStore {
    training: BTreeMap<UserId, MovieRatings>,
    validation: BTreeMap<UserId, MovieRatings>,

    /// Ratings seen per user, across both partitions
    ratings_seen: HashMap<UserId, u32>,

    // Aggregates over every rating ever recorded
    movie_rating_sum: HashMap<MovieId, u64>,
    movie_rating_count: HashMap<MovieId, u32>,
}

impl RatingStore {
    /// Creates a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store by recording `records` in log order
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RatingRecord>,
    {
        let mut store = Self::new();
        for record in records {
            store.record(record.user_id, record.movie_id, record.rating);
        }
        store
    }

    /// Load and partition the rating log at `path`.
    ///
    /// Malformed lines are skipped and counted in the returned report.
    pub fn load_from_file(path: &Path) -> Result<(Self, LoadReport)> {
        info!("Loading ratings from {:?}", path);

        let parsed = parser::parse_ratings(path)?;
        let store = Self::from_records(parsed.records);

        let counts = store.counts();
        info!(
            "Loaded {} users, {} movies, {} training and {} validation ratings",
            counts.users, counts.movies, counts.training_ratings, counts.validation_ratings
        );
        Ok((store, parsed.report))
    }

    /// Record a rating and return the partition it was routed to.
    ///
    /// The n-th rating seen for `user_id` goes to validation when
    /// `n % 3 == 0`. A repeated movie overwrites in place inside the
    /// partition chosen for this call. The per-movie aggregates are
    /// updated either way.
    pub fn record(&mut self, user_id: UserId, movie_id: MovieId, rating: Rating) -> Partition {
        let seen = self.ratings_seen.entry(user_id).or_insert(0);
        *seen += 1;
        let partition = Partition::for_nth_rating(*seen);

        let target = match partition {
            Partition::Training => &mut self.training,
            Partition::Validation => &mut self.validation,
        };
        target.entry(user_id).or_default().insert(movie_id, rating);

        *self.movie_rating_sum.entry(movie_id).or_insert(0) += u64::from(rating.value);
        *self.movie_rating_count.entry(movie_id).or_insert(0) += 1;

        partition
    }

    /// Training ratings of a user, empty if the user has none
    pub fn training_ratings_of(&self, user_id: UserId) -> &MovieRatings {
        self.training.get(&user_id).unwrap_or(&NO_RATINGS)
    }

    /// Validation ratings of a user, empty if the user has none
    pub fn validation_ratings_of(&self, user_id: UserId) -> &MovieRatings {
        self.validation.get(&user_id).unwrap_or(&NO_RATINGS)
    }

    /// A user's training rating for one movie
    pub fn training_rating(&self, user_id: UserId, movie_id: MovieId) -> Option<Rating> {
        self.training
            .get(&user_id)
            .and_then(|ratings| ratings.get(&movie_id))
            .copied()
    }

    /// Mean of every rating recorded for the movie, `None` for an unknown movie
    pub fn global_average(&self, movie_id: MovieId) -> Option<f64> {
        let count = *self.movie_rating_count.get(&movie_id)?;
        if count == 0 {
            return None;
        }
        let sum = self.movie_rating_sum.get(&movie_id).copied().unwrap_or(0);
        Some(sum as f64 / f64::from(count))
    }

    /// Users with at least one training rating, ascending
    pub fn training_users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.training.keys().copied()
    }

    /// Users with at least one validation rating, ascending
    pub fn validation_users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.validation.keys().copied()
    }

    /// Every held-out rating as `(user, movie, rating)`, in user then movie order
    pub fn validation_records(&self) -> impl Iterator<Item = (UserId, MovieId, Rating)> + '_ {
        self.validation.iter().flat_map(|(&user_id, ratings)| {
            ratings
                .iter()
                .map(move |(&movie_id, &rating)| (user_id, movie_id, rating))
        })
    }

    /// Movies with at least one rating, in either partition
    pub fn movies(&self) -> impl Iterator<Item = MovieId> + '_ {
        self.movie_rating_count.keys().copied()
    }

    /// Get counts for debugging/validation
    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            users: self.ratings_seen.len(),
            movies: self.movie_rating_count.len(),
            training_ratings: self.training.values().map(|r| r.len()).sum(),
            validation_ratings: self.validation.values().map(|r| r.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ratings_seen.is_empty()
    }
}
