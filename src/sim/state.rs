//! Game state and core simulation types
//!
//! All state for one run lives here; a replay rebuilds it from scratch.

use serde::{Deserialize, Serialize};

use super::spawn::Spawner;
use crate::consts::*;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to start a run
    Ready,
    /// Active gameplay
    Running,
    /// Run ended; holds for a grace period before the score is handed off
    Ended {
        /// Timestamp (ms) of the collision that ended the run
        at_ms: f64,
    },
}

/// How activation input drives the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlMode {
    /// Activation starts a jump arc
    #[default]
    Jump,
    /// Activation toggles a sustained elevated state
    Hover,
}

/// Vertical motion sub-state, advanced inside the main tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JumpArc {
    #[default]
    Grounded,
    Rising,
    Falling,
}

/// The player-controlled runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Height above the ground, never negative
    pub vertical_offset: f32,
    /// Jump arc sub-state (Jump mode)
    pub arc: JumpArc,
    /// Sustained elevation flag (Hover mode)
    pub hovering: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            vertical_offset: 0.0,
            arc: JumpArc::Grounded,
            hovering: false,
        }
    }
}

impl Player {
    /// Whether the player is off the ground via a jump arc
    pub fn is_airborne(&self) -> bool {
        self.arc != JumpArc::Grounded
    }

    /// Start a jump arc. Ignored while airborne - no double jump and no
    /// interrupting an in-flight arc.
    pub fn try_jump(&mut self) {
        if self.arc == JumpArc::Grounded {
            self.arc = JumpArc::Rising;
        }
    }

    /// Advance the jump arc by one tick (Jump mode only)
    pub fn step_arc(&mut self) {
        match self.arc {
            JumpArc::Grounded => {}
            JumpArc::Rising => {
                self.vertical_offset = (self.vertical_offset + JUMP_RISE_STEP).min(JUMP_APEX);
                if self.vertical_offset >= JUMP_APEX {
                    self.arc = JumpArc::Falling;
                }
            }
            JumpArc::Falling => {
                self.vertical_offset = (self.vertical_offset - JUMP_FALL_STEP).max(0.0);
                if self.vertical_offset <= 0.0 {
                    self.vertical_offset = 0.0;
                    self.arc = JumpArc::Grounded;
                }
            }
        }
    }

    /// Toggle hover and snap the offset - no intermediate animation
    pub fn toggle_hover(&mut self) {
        self.hovering = !self.hovering;
        self.vertical_offset = if self.hovering { JUMP_APEX } else { 0.0 };
        self.arc = JumpArc::Grounded;
    }
}

/// A scrolling obstacle (cactus)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// Cosmetic scenery, scrolls at half rate and never collides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cloud {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// Complete session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Score, incremented once per accepted tick while Running
    pub score: u32,
    /// Scroll speed, non-decreasing within a run, capped
    pub speed: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Current phase
    pub phase: GamePhase,
    /// Active control scheme
    pub control_mode: ControlMode,
    /// The runner
    pub player: Player,
    /// Active obstacles, insertion order
    pub obstacles: Vec<Obstacle>,
    /// Active clouds, insertion order
    pub clouds: Vec<Cloud>,
    /// Obstacles that scrolled fully past while the run was live
    pub obstacles_avoided: u32,
    /// Set once the ended score has been handed off to the aggregator
    pub score_handed_off: bool,
    /// Rate-limited obstacle/cloud generator
    pub spawner: Spawner,
}

impl GameState {
    /// Create a fresh session in the Ready phase
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            score: 0,
            speed: START_SPEED,
            time_ticks: 0,
            phase: GamePhase::Ready,
            control_mode: ControlMode::Jump,
            player: Player::default(),
            obstacles: Vec::new(),
            clouds: Vec::new(),
            obstacles_avoided: 0,
            score_handed_off: false,
            spawner: Spawner::new(seed),
        }
    }

    /// Ready -> Running, resetting score/speed/entities/position
    pub fn start(&mut self) {
        self.score = 0;
        self.speed = START_SPEED;
        self.time_ticks = 0;
        self.player = Player::default();
        self.obstacles.clear();
        self.clouds.clear();
        self.obstacles_avoided = 0;
        self.score_handed_off = false;
        self.spawner = Spawner::new(self.seed);
        self.phase = GamePhase::Running;
    }

    /// Ended -> Ready. Only legal after the final score was handed off.
    pub fn replay(&mut self) {
        if matches!(self.phase, GamePhase::Ended { .. }) && self.score_handed_off {
            self.phase = GamePhase::Ready;
        }
    }

    /// The final score, once the grace period has elapsed. Returns
    /// `Some` exactly once; the caller hands it to the aggregator.
    pub fn take_final_score(&mut self, now_ms: f64) -> Option<u32> {
        match self.phase {
            GamePhase::Ended { at_ms }
                if !self.score_handed_off && now_ms - at_ms >= GAME_OVER_GRACE_MS =>
            {
                self.score_handed_off = true;
                Some(self.score)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_arc_ignores_double_jump() {
        let mut player = Player::default();
        player.try_jump();
        assert_eq!(player.arc, JumpArc::Rising);
        player.step_arc();
        let offset = player.vertical_offset;

        // Second activation mid-arc changes nothing
        player.try_jump();
        assert_eq!(player.arc, JumpArc::Rising);
        assert_eq!(player.vertical_offset, offset);
    }

    #[test]
    fn test_jump_arc_timing() {
        let mut player = Player::default();
        player.try_jump();

        // ceil(150 / 8) = 19 rising ticks to reach the apex
        for _ in 0..18 {
            player.step_arc();
            assert_eq!(player.arc, JumpArc::Rising);
        }
        player.step_arc();
        assert_eq!(player.arc, JumpArc::Falling);
        assert!(player.vertical_offset >= JUMP_APEX);

        // 150 / 5 = 30 falling ticks back to exactly zero
        for _ in 0..29 {
            player.step_arc();
            assert_eq!(player.arc, JumpArc::Falling);
            assert!(player.vertical_offset > 0.0);
        }
        player.step_arc();
        assert_eq!(player.vertical_offset, 0.0);
        assert_eq!(player.arc, JumpArc::Grounded);
    }

    #[test]
    fn test_hover_snaps() {
        let mut player = Player::default();
        player.toggle_hover();
        assert!(player.hovering);
        assert_eq!(player.vertical_offset, JUMP_APEX);

        player.toggle_hover();
        assert!(!player.hovering);
        assert_eq!(player.vertical_offset, 0.0);
    }

    #[test]
    fn test_replay_requires_handoff() {
        let mut state = GameState::new(7);
        state.start();
        state.phase = GamePhase::Ended { at_ms: 1000.0 };

        // Grace not yet elapsed
        assert_eq!(state.take_final_score(1500.0), None);
        state.replay();
        assert!(matches!(state.phase, GamePhase::Ended { .. }));

        // Grace elapsed: score handed off exactly once
        assert_eq!(state.take_final_score(3000.0), Some(0));
        assert_eq!(state.take_final_score(3000.0), None);
        state.replay();
        assert_eq!(state.phase, GamePhase::Ready);
    }
}
