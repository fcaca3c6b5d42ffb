//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed tick cadence only (the scheduler owns wall-clock gating)
//! - Seeded RNG only
//! - Stable entity order (insertion order, culled by retain)
//! - No rendering or platform dependencies

pub mod collision;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Hitbox, detect_collision, obstacle_hitbox, player_hitbox};
pub use spawn::Spawner;
pub use state::{Cloud, ControlMode, GamePhase, GameState, JumpArc, Obstacle, Player};
pub use tick::{TickInput, tick};
