//! Dino Dash - An endless-runner dinosaur game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, collisions, spawning, game state)
//! - `schedule`: Frame-driven tick gating and the browser scheduler
//! - `input`: Device events translated into abstract activation signals
//! - `profile`: Local per-player profiles over a key-value store
//! - `leaderboard`: Score aggregation and submission
//! - `store`: Remote leaderboard store (trait + implementations)

pub mod input;
pub mod leaderboard;
pub mod profile;
pub mod schedule;
pub mod settings;
pub mod sim;
pub mod store;

pub use profile::{PlayerProfile, ProfileBook};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Minimum interval between accepted simulation ticks (ms)
    pub const TICK_INTERVAL_MS: f64 = 16.0;

    /// Horizontal spawn position for new obstacles and clouds
    pub const SPAWN_X: f32 = 800.0;
    /// Obstacles at or past this x are dropped from the active set
    pub const OBSTACLE_CULL_X: f32 = -50.0;
    /// Clouds at or past this x are dropped from the active set
    pub const CLOUD_CULL_X: f32 = -100.0;

    /// Player hitbox - fixed, distinct from the sprite bounds
    pub const PLAYER_X: f32 = 50.0;
    pub const PLAYER_WIDTH: f32 = 40.0;
    pub const PLAYER_HEIGHT: f32 = 50.0;

    /// Obstacle hitbox
    pub const OBSTACLE_WIDTH: f32 = 30.0;
    pub const OBSTACLE_HEIGHT: f32 = 50.0;

    /// Jump arc: rise per tick, apex, fall per tick
    pub const JUMP_RISE_STEP: f32 = 8.0;
    pub const JUMP_APEX: f32 = 150.0;
    pub const JUMP_FALL_STEP: f32 = 5.0;

    /// Scroll speed: starting value, ramp step, score interval, ceiling
    pub const START_SPEED: f32 = 5.0;
    pub const SPEED_STEP: f32 = 0.5;
    pub const SPEED_SCORE_INTERVAL: u32 = 500;
    pub const MAX_SPEED: f32 = 15.0;

    /// Obstacle spawn gate: base minus speed scaling, floored
    pub const OBSTACLE_GATE_BASE_MS: f64 = 1500.0;
    pub const OBSTACLE_GATE_PER_SPEED_MS: f64 = 100.0;
    pub const OBSTACLE_GATE_FLOOR_MS: f64 = 200.0;

    /// Cloud spawn gate and vertical placement band
    pub const CLOUD_GATE_MS: f64 = 3000.0;
    pub const CLOUD_Y_MIN: f32 = 50.0;
    pub const CLOUD_Y_MAX: f32 = 150.0;

    /// How long the Ended state holds before the score is handed off (ms)
    pub const GAME_OVER_GRACE_MS: f64 = 2000.0;

    /// Cheat sequence: presses required and the rolling window (ms)
    pub const CHEAT_PRESSES: u32 = 3;
    pub const CHEAT_WINDOW_MS: f64 = 2000.0;
}
