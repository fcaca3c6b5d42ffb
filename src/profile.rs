//! Local per-player profiles
//!
//! Profiles live in a durable key-value store as one serialized blob.
//! Every mutation round-trips the whole collection: load, copy, modify,
//! replace. Missing or malformed data reads as an empty collection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage key for the serialized profile collection
pub const PROFILES_KEY: &str = "dino_dash_profiles";

/// Longest accepted player name
pub const MAX_NAME_LEN: usize = 20;

/// Durable key-value collaborator (LocalStorage on the web)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Rejected player name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    Empty,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::Empty => write!(f, "player name is empty"),
        }
    }
}

impl std::error::Error for NameError {}

/// Trim and bound a raw player name. Empty-after-trim is rejected and
/// causes no state mutation anywhere downstream.
pub fn validate_player_name(raw: &str) -> Result<String, NameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }
    Ok(trimmed.chars().take(MAX_NAME_LEN).collect())
}

/// A player's locally persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub high_score: u32,
    pub last_played: String,
}

/// The full profile collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileBook {
    pub profiles: Vec<PlayerProfile>,
}

impl ProfileBook {
    /// Load the collection from the store. Malformed or missing data is
    /// "no data", never an error.
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get(PROFILES_KEY) {
            Some(json) => match serde_json::from_str(&json) {
                Ok(book) => book,
                Err(err) => {
                    log::warn!("Discarding corrupt profile data: {}", err);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Replace the stored collection with this one
    pub fn save(&self, store: &impl KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => store.set(PROFILES_KEY, &json),
            Err(err) => log::error!("Failed to serialize profiles: {}", err),
        }
    }

    /// Apply one finished run: create the profile on first submission,
    /// otherwise take the monotonic max; always refresh the played date.
    pub fn record_score(&mut self, name: &str, score: u32, today: &str) -> PlayerProfile {
        if let Some(profile) = self.profiles.iter_mut().find(|p| p.name == name) {
            profile.high_score = profile.high_score.max(score);
            profile.last_played = today.to_string();
            return profile.clone();
        }

        let profile = PlayerProfile {
            name: name.to_string(),
            high_score: score,
            last_played: today.to_string(),
        };
        self.profiles.push(profile.clone());
        profile
    }

    pub fn high_score_for(&self, name: &str) -> Option<u32> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.high_score)
    }

    /// Profiles ranked by high score descending (local leaderboard view)
    pub fn ranked(&self) -> Vec<&PlayerProfile> {
        let mut sorted: Vec<_> = self.profiles.iter().collect();
        sorted.sort_by(|a, b| b.high_score.cmp(&a.high_score));
        sorted
    }
}

/// One whole-collection read-modify-write against the store. This is the
/// only mutation path, so observers between ticks never see a partial
/// edit.
pub fn submit_local_score(
    store: &impl KeyValueStore,
    name: &str,
    score: u32,
    today: &str,
) -> PlayerProfile {
    let mut book = ProfileBook::load(store);
    let profile = book.record_score(name, score, today);
    book.save(store);
    profile
}

/// In-memory store for native runs and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: std::cell::RefCell<std::collections::HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.data
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

/// LocalStorage-backed store (WASM only)
#[cfg(target_arch = "wasm32")]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok()).flatten()?;
        storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok()).flatten() {
            if storage.set_item(key, value).is_err() {
                log::warn!("LocalStorage write failed for key {}", key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_score_is_monotonic_max() {
        let store = MemoryStore::new();

        let profile = submit_local_score(&store, "Rex", 50, "2026-08-07");
        assert_eq!(profile.high_score, 50);

        // Lower score keeps the max but refreshes the date
        let profile = submit_local_score(&store, "Rex", 30, "2026-08-08");
        assert_eq!(profile.high_score, 50);
        assert_eq!(profile.last_played, "2026-08-08");
    }

    #[test]
    fn test_profile_created_on_first_submission() {
        let store = MemoryStore::new();
        assert!(ProfileBook::load(&store).profiles.is_empty());

        submit_local_score(&store, "Blue", 120, "2026-08-07");
        let book = ProfileBook::load(&store);
        assert_eq!(book.profiles.len(), 1);
        assert_eq!(book.high_score_for("Blue"), Some(120));
    }

    #[test]
    fn test_collection_round_trips_as_one_blob() {
        let store = MemoryStore::new();
        submit_local_score(&store, "Rex", 10, "d");
        submit_local_score(&store, "Blue", 20, "d");

        // Each submit rewrote the full collection under one key
        let raw = store.get(PROFILES_KEY).unwrap();
        let book: ProfileBook = serde_json::from_str(&raw).unwrap();
        assert_eq!(book.profiles.len(), 2);
    }

    #[test]
    fn test_corrupt_data_reads_as_empty() {
        let store = MemoryStore::new();
        store.set(PROFILES_KEY, "{not json");
        assert!(ProfileBook::load(&store).profiles.is_empty());
    }

    #[test]
    fn test_name_validation() {
        assert_eq!(validate_player_name("  Rex  ").unwrap(), "Rex");
        assert_eq!(validate_player_name("   "), Err(NameError::Empty));
        assert_eq!(validate_player_name(""), Err(NameError::Empty));

        let long = "a".repeat(40);
        assert_eq!(validate_player_name(&long).unwrap().len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_ranked_descending() {
        let store = MemoryStore::new();
        submit_local_score(&store, "Rex", 10, "d");
        submit_local_score(&store, "Blue", 90, "d");
        submit_local_score(&store, "Doux", 40, "d");

        let book = ProfileBook::load(&store);
        let names: Vec<_> = book.ranked().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["Blue", "Doux", "Rex"]);
    }
}
