//! Pure leaderboard reductions
//!
//! Every view is a pure function of a raw entry snapshot, so it can be
//! recomputed on demand or on every store push without touching the
//! entries themselves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One immutable historical score submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Store-assigned identity, absent until appended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub player_name: String,
    pub score: u32,
    pub speed: f32,
    pub timestamp_ms: f64,
    pub obstacles_avoided: u32,
}

/// A player's store-side aggregated record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub high_score: u32,
    pub total_games: u32,
    pub total_score: u64,
    pub average_score: u32,
    pub best_speed: f32,
    pub last_played_ms: f64,
}

impl PlayerStats {
    /// Roll one finished run into the stats. `prev = None` seeds a fresh
    /// record. The average is always the integer-rounded mean of the
    /// cumulative score, and the high-water marks never decrease.
    pub fn record(prev: Option<&PlayerStats>, score: u32, speed: f32, now_ms: f64) -> PlayerStats {
        match prev {
            Some(stats) => {
                let total_games = stats.total_games + 1;
                let total_score = stats.total_score + u64::from(score);
                PlayerStats {
                    high_score: stats.high_score.max(score),
                    total_games,
                    total_score,
                    average_score: rounded_mean(total_score, total_games),
                    best_speed: stats.best_speed.max(speed),
                    last_played_ms: now_ms,
                }
            }
            None => PlayerStats {
                high_score: score,
                total_games: 1,
                total_score: u64::from(score),
                average_score: score,
                best_speed: speed,
                last_played_ms: now_ms,
            },
        }
    }
}

fn rounded_mean(total: u64, games: u32) -> u32 {
    ((total as f64) / f64::from(games)).round() as u32
}

/// Keep only the best entry per player, ranked descending, truncated.
/// When a player has several entries with the same best score the
/// earliest-seen one wins.
pub fn reduce_to_top_per_player(entries: &[ScoreEntry], limit: usize) -> Vec<ScoreEntry> {
    let mut best: Vec<ScoreEntry> = Vec::new();
    let mut index_by_name: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        match index_by_name.get(entry.player_name.as_str()) {
            Some(&i) => {
                if entry.score > best[i].score {
                    best[i] = entry.clone();
                }
            }
            None => {
                index_by_name.insert(entry.player_name.as_str(), best.len());
                best.push(entry.clone());
            }
        }
    }

    best.sort_by(|a, b| b.score.cmp(&a.score));
    best.truncate(limit);
    best
}

/// The inclusive score band around a reference score
pub fn score_band(reference_score: u32) -> (u32, u32) {
    let min = (f64::from(reference_score) * 0.8).floor() as u32;
    let max = (f64::from(reference_score) * 1.2).ceil() as u32;
    (min, max)
}

/// "Nearby competitors" view: entries within the band around the
/// reference score, excluding the reference player, then the usual
/// dedup/rank/truncate.
pub fn nearby_competitors(
    entries: &[ScoreEntry],
    reference_player: &str,
    reference_score: u32,
    limit: usize,
) -> Vec<ScoreEntry> {
    let (min, max) = score_band(reference_score);
    let in_band: Vec<ScoreEntry> = entries
        .iter()
        .filter(|e| e.player_name != reference_player && e.score >= min && e.score <= max)
        .cloned()
        .collect();
    reduce_to_top_per_player(&in_band, limit)
}
