//! Score submission and leaderboard views
//!
//! The local profile update always happens and always first; the remote
//! submission is best-effort. A remote failure comes back as a
//! `SubmitWarning` for the presentation layer to show - it is never an
//! error and never touches the already-committed local update.

use std::fmt;
use std::rc::Rc;

use crate::leaderboard::aggregate::{
    PlayerStats, ScoreEntry, nearby_competitors, reduce_to_top_per_player, score_band,
};
use crate::profile::{KeyValueStore, NameError, PlayerProfile, submit_local_score, validate_player_name};
use crate::store::{LeaderboardStore, StoreError};

/// A recoverable remote-store failure, with enough context to diagnose
#[derive(Debug, Clone)]
pub struct SubmitWarning {
    pub operation: &'static str,
    pub player: String,
    pub timestamp_ms: f64,
    pub error: StoreError,
}

impl fmt::Display for SubmitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for {} at {:.0}: {}",
            self.operation, self.player, self.timestamp_ms, self.error
        )
    }
}

/// Result of a score submission
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// The locally committed profile
    pub profile: PlayerProfile,
    /// Set when the remote side could not be updated
    pub warning: Option<SubmitWarning>,
}

/// Façade over the local profile store and the shared leaderboard store
pub struct ScoreService<K: KeyValueStore> {
    local: K,
    remote: Rc<dyn LeaderboardStore>,
}

impl<K: KeyValueStore> ScoreService<K> {
    pub fn new(local: K, remote: Rc<dyn LeaderboardStore>) -> Self {
        Self { local, remote }
    }

    pub fn remote(&self) -> &Rc<dyn LeaderboardStore> {
        &self.remote
    }

    /// Submit one finished run. The name is validated first; rejection
    /// mutates nothing anywhere.
    pub async fn submit(
        &self,
        raw_name: &str,
        final_score: u32,
        final_speed: f32,
        obstacles_avoided: u32,
        now_ms: f64,
        today: &str,
    ) -> Result<SubmitOutcome, NameError> {
        let name = validate_player_name(raw_name)?;

        let profile = submit_local_score(&self.local, &name, final_score, today);
        log::info!(
            "Recorded local score {} for {} (high score {})",
            final_score,
            name,
            profile.high_score
        );

        let warning = self
            .submit_remote(&name, final_score, final_speed, obstacles_avoided, now_ms)
            .await
            .err();
        if let Some(warning) = &warning {
            log::warn!("Remote submission degraded: {}", warning);
        }

        Ok(SubmitOutcome { profile, warning })
    }

    async fn submit_remote(
        &self,
        name: &str,
        score: u32,
        speed: f32,
        obstacles_avoided: u32,
        now_ms: f64,
    ) -> Result<(), SubmitWarning> {
        let warn = |operation: &'static str, error: StoreError| SubmitWarning {
            operation,
            player: name.to_string(),
            timestamp_ms: now_ms,
            error,
        };

        let entry = ScoreEntry {
            id: None,
            player_name: name.to_string(),
            score,
            speed,
            timestamp_ms: now_ms,
            obstacles_avoided,
        };
        self.remote
            .append(entry)
            .await
            .map_err(|err| warn("append entry", err))?;

        // Read-modify-write; last write wins across racing submissions
        let previous = self
            .remote
            .get_stats(name)
            .await
            .map_err(|err| warn("read stats", err))?;
        let stats = PlayerStats::record(previous.as_ref(), score, speed, now_ms);
        self.remote
            .update_stats(name, stats)
            .await
            .map_err(|err| warn("write stats", err))?;

        Ok(())
    }

    /// Deduplicated global top list
    pub async fn top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, StoreError> {
        let raw = self.remote.query_top_by_score(limit).await?;
        Ok(reduce_to_top_per_player(&raw, limit))
    }

    /// Deduplicated competitors within the score band around a player
    pub async fn nearby(
        &self,
        player: &str,
        reference_score: u32,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let (min, max) = score_band(reference_score);
        let raw = self.remote.query_by_score_band(min, max, 20).await?;
        Ok(nearby_competitors(&raw, player, reference_score, limit))
    }

    /// Deduplicated recent submissions
    pub async fn recent(
        &self,
        since_ms: f64,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        let raw = self.remote.query_by_recency(since_ms, limit).await?;
        Ok(reduce_to_top_per_player(&raw, limit))
    }

    pub async fn player_stats(&self, player: &str) -> Result<Option<PlayerStats>, StoreError> {
        self.remote.get_stats(player).await
    }

    pub async fn player_bests(
        &self,
        player: &str,
        limit: usize,
    ) -> Result<Vec<ScoreEntry>, StoreError> {
        self.remote.query_by_player(player, limit).await
    }
}
