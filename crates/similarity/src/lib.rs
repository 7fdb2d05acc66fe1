//! # Similarity Crate
//!
//! This crate turns the training partition of a `RatingStore` into ranked
//! lists of similar users.
//!
//! ## Components
//!
//! ### Similarity Engine (`cosine`)
//! Cosine-style score between two users' training ratings, with a
//! movie-average fallback for degenerate pairs when a movie is in context.
//!
//! ### Neighbor Index (`neighbors`)
//! The `NeighborIndex` trait and its two implementations:
//! - `ExactNeighborIndex`: all pairwise scores, sorted per user
//! - `RankWalkNeighborIndex`: approximate walk over one global ranking
//!
//! ## Example Usage
//!
//! ```ignore
//! use similarity::{build_neighbor_index, NeighborStrategy};
//!
//! let index = build_neighbor_index(&store, NeighborStrategy::Exact);
//! for neighbor in index.top_k(1, 10) {
//!     println!("user {} scores {:.4}", neighbor.user_id, neighbor.score);
//! }
//! ```

// Public modules
pub mod cosine;
pub mod neighbors;
pub mod exact;
pub mod rank_walk;

// Re-export commonly used types
pub use cosine::{pair_score, PairScore, ScoreContext, SimilarityEngine};
pub use exact::{BuildStats, ExactNeighborIndex, NeighborList};
pub use neighbors::{build_neighbor_index, NeighborIndex, NeighborStrategy, SimilarityScore};
pub use rank_walk::RankWalkNeighborIndex;
