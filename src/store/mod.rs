//! Remote leaderboard store
//!
//! The shared score store is a collaborator behind a trait so the
//! aggregation and submission layers never touch a concrete backend.
//! Entries are append-only historical facts; `PlayerStats` is a
//! read-modify-write record with last-write-wins semantics - two
//! submissions from the same player racing each other can lose one
//! increment, and no cross-submission serialization is guaranteed.

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod rest;

pub use memory::MemoryLeaderboard;
#[cfg(target_arch = "wasm32")]
pub use rest::RestLeaderboard;

use async_trait::async_trait;
use std::fmt;

use crate::leaderboard::aggregate::{PlayerStats, ScoreEntry};

/// Store-assigned entry identity
pub type EntryId = String;

/// Callback invoked with a fresh raw snapshot on every store change
pub type ScoreCallback = Box<dyn Fn(Vec<ScoreEntry>)>;

/// Why a store operation failed
#[derive(Debug, Clone)]
pub enum StoreError {
    /// The backend could not be reached or refused the request
    Transport(String),
    /// The backend answered with data we could not understand
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Transport(msg) => write!(f, "store unreachable: {}", msg),
            StoreError::Corrupt(msg) => write!(f, "corrupt store data: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Live push subscription; unsubscribing is idempotent and implied by drop
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Operations the shared score store offers. Raw query results are
/// ordered by the query's natural key (score or recency, descending);
/// per-player dedup belongs to the aggregation layer, so score queries
/// over-fetch two times the requested limit.
#[async_trait(?Send)]
pub trait LeaderboardStore {
    /// Append one immutable entry, returning its assigned id
    async fn append(&self, entry: ScoreEntry) -> Result<EntryId, StoreError>;

    /// Raw top entries by score
    async fn query_top_by_score(&self, limit: usize) -> Result<Vec<ScoreEntry>, StoreError>;

    /// Push a raw top-by-score snapshot to `callback` on every change
    fn subscribe(&self, limit: usize, callback: ScoreCallback) -> Result<Subscription, StoreError>;

    async fn get_stats(&self, player: &str) -> Result<Option<PlayerStats>, StoreError>;

    async fn update_stats(&self, player: &str, stats: PlayerStats) -> Result<(), StoreError>;

    /// A single player's entries, best first
    async fn query_by_player(
        &self,
        player: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError>;

    /// Entries with score in `[min, max]`, best first
    async fn query_by_score_band(
        &self,
        min: u32,
        max: u32,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError>;

    /// Entries submitted at or after `since_ms`, newest first
    async fn query_by_recency(
        &self,
        since_ms: f64,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError>;
}

/// Raw fetch size for a deduplicated view of `limit` rows
pub fn raw_fetch_limit(limit: usize) -> usize {
    limit * 2
}
