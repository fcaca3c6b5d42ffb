//! In-memory leaderboard store
//!
//! Backs native runs and tests. Shares one interior-mutable state
//! between clones, like every handle to a real remote store would.

use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::{EntryId, LeaderboardStore, ScoreCallback, StoreError, Subscription, raw_fetch_limit};
use crate::leaderboard::aggregate::{PlayerStats, ScoreEntry};

#[derive(Default)]
struct Inner {
    entries: Vec<ScoreEntry>,
    stats: HashMap<String, PlayerStats>,
    subscribers: Vec<(u64, usize, ScoreCallback)>,
    next_entry_id: u64,
    next_subscriber_id: u64,
}

impl Inner {
    /// Raw snapshot ordered by score descending, over-fetched for dedup
    fn top_by_score(&self, limit: usize) -> Vec<ScoreEntry> {
        let mut snapshot = self.entries.clone();
        snapshot.sort_by(|a, b| b.score.cmp(&a.score));
        snapshot.truncate(raw_fetch_limit(limit));
        snapshot
    }
}

/// Shared in-memory store handle
#[derive(Clone, Default)]
pub struct MemoryLeaderboard {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify_subscribers(&self) {
        // Snapshots are computed before invoking callbacks so a callback
        // that queries the store again never deadlocks the borrow.
        let pushes: Vec<Vec<ScoreEntry>> = {
            let inner = self.inner.borrow();
            inner
                .subscribers
                .iter()
                .map(|(_, limit, _)| inner.top_by_score(*limit))
                .collect()
        };
        let inner = self.inner.borrow();
        for ((_, _, callback), snapshot) in inner.subscribers.iter().zip(pushes) {
            callback(snapshot);
        }
    }
}

#[async_trait(?Send)]
impl LeaderboardStore for MemoryLeaderboard {
    async fn append(&self, mut entry: ScoreEntry) -> Result<EntryId, StoreError> {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = format!("entry-{}", inner.next_entry_id);
            inner.next_entry_id += 1;
            entry.id = Some(id.clone());
            inner.entries.push(entry);
            id
        };
        self.notify_subscribers();
        Ok(id)
    }

    async fn query_top_by_score(&self, limit: usize) -> Result<Vec<ScoreEntry>, StoreError> {
        Ok(self.inner.borrow().top_by_score(limit))
    }

    fn subscribe(&self, limit: usize, callback: ScoreCallback) -> Result<Subscription, StoreError> {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_subscriber_id;
            inner.next_subscriber_id += 1;
            inner.subscribers.push((id, limit, callback));
            id
        };

        // Initial push so a new subscriber starts from the current state
        self.notify_subscribers();

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subscribers.retain(|(sid, _, _)| *sid != id);
            }
        }))
    }

    async fn get_stats(&self, player: &str) -> Result<Option<PlayerStats>, StoreError> {
        Ok(self.inner.borrow().stats.get(player).cloned())
    }

    async fn update_stats(&self, player: &str, stats: PlayerStats) -> Result<(), StoreError> {
        self.inner
            .borrow_mut()
            .stats
            .insert(player.to_string(), stats);
        Ok(())
    }

    async fn query_by_player(
        &self,
        player: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let mut matching: Vec<ScoreEntry> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|e| e.player_name == player)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.score.cmp(&a.score));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn query_by_score_band(
        &self,
        min: u32,
        max: u32,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let mut matching: Vec<ScoreEntry> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|e| e.score >= min && e.score <= max)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.score.cmp(&a.score));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn query_by_recency(
        &self,
        since_ms: f64,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let mut matching: Vec<ScoreEntry> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|e| e.timestamp_ms >= since_ms)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp_ms.total_cmp(&a.timestamp_ms));
        matching.truncate(raw_fetch_limit(limit));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn entry(player: &str, score: u32, timestamp_ms: f64) -> ScoreEntry {
        ScoreEntry {
            id: None,
            player_name: player.to_string(),
            score,
            speed: 5.0,
            timestamp_ms,
            obstacles_avoided: 0,
        }
    }

    #[test]
    fn test_append_assigns_sequential_ids() {
        let store = MemoryLeaderboard::new();
        let a = block_on(store.append(entry("A", 10, 0.0))).unwrap();
        let b = block_on(store.append(entry("B", 20, 1.0))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_top_query_is_score_ordered() {
        let store = MemoryLeaderboard::new();
        block_on(store.append(entry("A", 10, 0.0))).unwrap();
        block_on(store.append(entry("B", 30, 1.0))).unwrap();
        block_on(store.append(entry("C", 20, 2.0))).unwrap();

        let top = block_on(store.query_top_by_score(10)).unwrap();
        let scores: Vec<u32> = top.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![30, 20, 10]);
    }

    #[test]
    fn test_subscription_pushes_on_append() {
        let store = MemoryLeaderboard::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        let mut subscription = store
            .subscribe(10, Box::new(move |snapshot| sink.borrow_mut().push(snapshot.len())))
            .unwrap();

        block_on(store.append(entry("A", 10, 0.0))).unwrap();
        block_on(store.append(entry("B", 20, 1.0))).unwrap();

        // Initial push plus one per append
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);

        subscription.unsubscribe();
        subscription.unsubscribe();
        block_on(store.append(entry("C", 30, 2.0))).unwrap();
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_recency_query_newest_first() {
        let store = MemoryLeaderboard::new();
        block_on(store.append(entry("A", 10, 100.0))).unwrap();
        block_on(store.append(entry("B", 20, 300.0))).unwrap();
        block_on(store.append(entry("C", 30, 200.0))).unwrap();

        let recent = block_on(store.query_by_recency(150.0, 10)).unwrap();
        let names: Vec<_> = recent.iter().map(|e| e.player_name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);
    }

    #[test]
    fn test_band_query_inclusive() {
        let store = MemoryLeaderboard::new();
        block_on(store.append(entry("A", 80, 0.0))).unwrap();
        block_on(store.append(entry("B", 120, 1.0))).unwrap();
        block_on(store.append(entry("C", 121, 2.0))).unwrap();

        let band = block_on(store.query_by_score_band(80, 120, 10)).unwrap();
        assert_eq!(band.len(), 2);
    }
}
