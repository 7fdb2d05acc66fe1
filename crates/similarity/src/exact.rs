//! Exact neighbor index - every pairwise score, ranked per user
//!
//! ## Algorithm
//! 1. Walk the training users in ascending ID order
//! 2. For each user, score it against every user with a larger ID
//!    (pairs with a smaller ID were settled on that user's turn)
//! 3. Record each non-degenerate score in both users' lists at once
//! 4. Once a user's turn ends its list is complete: sort it, best first
//!
//! This is O(U²·M) and single-threaded.

use crate::cosine::{ScoreContext, SimilarityEngine};
use crate::neighbors::{NeighborIndex, SimilarityScore};
use data_loader::{RatingStore, UserId};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// One user's neighbors, plus where each neighbor sits in the list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborList {
    entries: Vec<SimilarityScore>,
    positions: HashMap<UserId, usize>,
}

impl NeighborList {
    fn push(&mut self, entry: SimilarityScore) {
        self.positions.insert(entry.user_id, self.entries.len());
        self.entries.push(entry);
    }

    /// Descending by score. The sort is stable, so ties stay in the order
    /// they were pushed.
    fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.user_id, position))
            .collect();
    }

    pub fn entries(&self) -> &[SimilarityScore] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank of `user_id` in this list, 0 being the most similar
    pub fn position_of(&self, user_id: UserId) -> Option<usize> {
        self.positions.get(&user_id).copied()
    }

    pub fn score_of(&self, user_id: UserId) -> Option<f64> {
        self.position_of(user_id).map(|position| self.entries[position].score)
    }
}

/// Summary of a build, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub users: usize,
    pub pairs_scored: usize,
    pub pairs_degenerate: usize,
}

/// Neighbor index holding every non-degenerate pairwise score
#[derive(Debug, Clone, Default)]
pub struct ExactNeighborIndex {
    lists: HashMap<UserId, NeighborList>,
    stats: BuildStats,
}

impl ExactNeighborIndex {
    /// Score every pair of training users and rank each user's neighbors
    #[instrument(skip(store))]
    pub fn build(store: &RatingStore) -> Self {
        let engine = SimilarityEngine::new(store);
        let users: Vec<UserId> = store.training_users().collect();

        let mut lists: HashMap<UserId, NeighborList> = users
            .iter()
            .map(|&user_id| (user_id, NeighborList::default()))
            .collect();
        let mut stats = BuildStats {
            users: users.len(),
            ..BuildStats::default()
        };

        for (i, &user_id) in users.iter().enumerate() {
            // `users` is ascending, so only later users are unseen pairs
            for &other_id in &users[i + 1..] {
                match engine.score(user_id, other_id, ScoreContext::Batch) {
                    Some(score) => {
                        Self::append_pair(&mut lists, user_id, other_id, score);
                        stats.pairs_scored += 1;
                    }
                    None => stats.pairs_degenerate += 1,
                }
            }

            if let Some(list) = lists.get_mut(&user_id) {
                list.sort();
                debug!("User {} has {} scored neighbors", user_id, list.len());
            }
        }

        info!(
            "Built exact neighbor index: {} users, {} pairs scored, {} degenerate pairs skipped",
            stats.users, stats.pairs_scored, stats.pairs_degenerate
        );

        Self { lists, stats }
    }

    /// Record one score in both directions
    fn append_pair(
        lists: &mut HashMap<UserId, NeighborList>,
        user_id: UserId,
        other_id: UserId,
        score: f64,
    ) {
        let list = lists.entry(user_id).or_default();
        debug_assert!(list.position_of(other_id).is_none(), "pair scored twice");
        list.push(SimilarityScore::new(other_id, score));

        lists
            .entry(other_id)
            .or_default()
            .push(SimilarityScore::new(user_id, score));
    }

    /// The full ranked list for a user
    pub fn list(&self, user_id: UserId) -> Option<&NeighborList> {
        self.lists.get(&user_id)
    }

    /// Score of a pair, if one was recorded
    pub fn score(&self, user_id: UserId, other_id: UserId) -> Option<f64> {
        self.lists.get(&user_id)?.score_of(other_id)
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }
}

impl NeighborIndex for ExactNeighborIndex {
    fn name(&self) -> &str {
        "ExactNeighborIndex"
    }

    fn neighbors<'a>(&'a self, user_id: UserId) -> Box<dyn Iterator<Item = SimilarityScore> + 'a> {
        let entries = self
            .lists
            .get(&user_id)
            .map(|list| list.entries())
            .unwrap_or(&[]);
        Box::new(entries.iter().copied())
    }
}
