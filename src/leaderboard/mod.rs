//! Leaderboard aggregation and score submission
//!
//! `aggregate` holds the pure reductions over raw entry snapshots;
//! `service` combines the local profile update with best-effort remote
//! submission.

pub mod aggregate;
pub mod service;

pub use aggregate::{
    PlayerStats, ScoreEntry, nearby_competitors, reduce_to_top_per_player, score_band,
};
pub use service::{ScoreService, SubmitOutcome, SubmitWarning};
