//! Fixed-cadence simulation tick
//!
//! One accepted tick advances the whole session: score, difficulty ramp,
//! scrolling, spawning, and collision. Vertical motion is a sub-state of
//! the same tick, so nothing mutates the player after the run ends.

use super::collision::{detect_collision, player_hitbox};
use super::state::{ControlMode, GamePhase, GameState};
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Abstract activation signal: jump in Jump mode, toggle in Hover mode
    pub activate: bool,
}

/// Advance the session by one tick. `now_ms` is the scheduler's timestamp
/// for this tick; spawn gates and the end-of-run grace period key off it.
pub fn tick(state: &mut GameState, input: &TickInput, now_ms: f64) {
    // No processing outside of a live run
    match state.phase {
        GamePhase::Running => {}
        GamePhase::Ready | GamePhase::Ended { .. } => return,
    }

    state.time_ticks += 1;
    state.score += 1;

    // Difficulty ramp: step the speed at every score interval, capped
    if state.score % SPEED_SCORE_INTERVAL == 0 {
        state.speed = (state.speed + SPEED_STEP).min(MAX_SPEED);
    }

    // Activation and vertical motion
    match state.control_mode {
        ControlMode::Jump => {
            if input.activate {
                state.player.try_jump();
            }
            state.player.step_arc();
        }
        ControlMode::Hover => {
            if input.activate {
                state.player.toggle_hover();
            }
        }
    }

    // Scroll obstacles; everything fully off-screen was avoided
    for obstacle in &mut state.obstacles {
        obstacle.x -= state.speed;
    }
    let before = state.obstacles.len();
    state.obstacles.retain(|o| o.x > OBSTACLE_CULL_X);
    state.obstacles_avoided += (before - state.obstacles.len()) as u32;

    // Clouds scroll at half rate
    for cloud in &mut state.clouds {
        cloud.x -= state.speed * 0.5;
    }
    state.clouds.retain(|c| c.x > CLOUD_CULL_X);

    // Procedural generation
    let speed = state.speed;
    if let Some(obstacle) = state.spawner.maybe_spawn_obstacle(now_ms, speed) {
        state.obstacles.push(obstacle);
    }
    if let Some(cloud) = state.spawner.maybe_spawn_cloud(now_ms) {
        state.clouds.push(cloud);
    }

    // Collision ends the run
    let hitbox = player_hitbox(state.player.vertical_offset);
    if detect_collision(&hitbox, &state.obstacles) {
        state.phase = GamePhase::Ended { at_ms: now_ms };
        log::info!(
            "Run ended at score {} (speed {:.1}, {} obstacles avoided)",
            state.score,
            state.speed,
            state.obstacles_avoided
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{JumpArc, Obstacle};
    use proptest::prelude::*;

    /// Tick with a frozen clock so the spawn gates stay closed
    fn quiet_tick(state: &mut GameState, input: &TickInput) {
        tick(state, input, 0.0);
    }

    fn running_state() -> GameState {
        let mut state = GameState::new(12345);
        state.start();
        state
    }

    #[test]
    fn test_no_processing_outside_running() {
        let mut state = GameState::new(1);
        assert_eq!(state.phase, GamePhase::Ready);
        quiet_tick(&mut state, &TickInput::default());
        assert_eq!(state.score, 0);
        assert_eq!(state.time_ticks, 0);

        state.phase = GamePhase::Ended { at_ms: 100.0 };
        quiet_tick(&mut state, &TickInput { activate: true });
        assert_eq!(state.score, 0);
        assert_eq!(state.player.vertical_offset, 0.0);
    }

    #[test]
    fn test_score_increments_once_per_tick() {
        let mut state = running_state();
        for expected in 1..=100 {
            quiet_tick(&mut state, &TickInput::default());
            assert_eq!(state.score, expected);
        }
    }

    #[test]
    fn test_speed_ramps_every_interval() {
        let mut state = running_state();
        for _ in 0..499 {
            quiet_tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.speed, START_SPEED);

        quiet_tick(&mut state, &TickInput::default());
        assert_eq!(state.speed, START_SPEED + SPEED_STEP);
    }

    #[test]
    fn test_jump_arc_through_ticks() {
        let mut state = running_state();

        quiet_tick(&mut state, &TickInput { activate: true });
        assert_eq!(state.player.arc, JumpArc::Rising);
        assert_eq!(state.player.vertical_offset, JUMP_RISE_STEP);

        // 19 rising ticks total to the apex, then falling
        for _ in 0..18 {
            quiet_tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.player.arc, JumpArc::Falling);
        assert_eq!(state.player.vertical_offset, JUMP_APEX);

        // Activation mid-air is ignored
        quiet_tick(&mut state, &TickInput { activate: true });
        assert_eq!(state.player.arc, JumpArc::Falling);

        // 30 falling ticks back to the ground (one already taken above)
        for _ in 0..29 {
            quiet_tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.player.vertical_offset, 0.0);
        assert_eq!(state.player.arc, JumpArc::Grounded);
    }

    #[test]
    fn test_hover_toggle_through_ticks() {
        let mut state = running_state();
        state.control_mode = ControlMode::Hover;

        quiet_tick(&mut state, &TickInput { activate: true });
        assert!(state.player.hovering);
        assert_eq!(state.player.vertical_offset, JUMP_APEX);

        // Stays elevated without further input
        quiet_tick(&mut state, &TickInput::default());
        assert_eq!(state.player.vertical_offset, JUMP_APEX);

        quiet_tick(&mut state, &TickInput { activate: true });
        assert!(!state.player.hovering);
        assert_eq!(state.player.vertical_offset, 0.0);
    }

    #[test]
    fn test_obstacles_scroll_and_cull() {
        let mut state = running_state();
        state.obstacles.push(Obstacle {
            id: 0,
            x: 700.0,
            y: 0.0,
        });
        state.obstacles.push(Obstacle {
            id: 1,
            x: OBSTACLE_CULL_X + 1.0,
            y: 0.0,
        });

        quiet_tick(&mut state, &TickInput::default());
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.obstacles[0].id, 0);
        assert_eq!(state.obstacles[0].x, 700.0 - START_SPEED);
        assert_eq!(state.obstacles_avoided, 1);

        // Cull is idempotent: nothing at or past the threshold survives a tick
        quiet_tick(&mut state, &TickInput::default());
        assert!(state.obstacles.iter().all(|o| o.x > OBSTACLE_CULL_X));
    }

    #[test]
    fn test_clouds_scroll_at_half_rate() {
        let mut state = running_state();
        state.clouds.push(crate::sim::Cloud {
            id: 0,
            x: 400.0,
            y: 80.0,
        });

        quiet_tick(&mut state, &TickInput::default());
        assert_eq!(state.clouds[0].x, 400.0 - START_SPEED * 0.5);
    }

    #[test]
    fn test_collision_ends_run() {
        let mut state = running_state();
        // Parked just right of the player so the scroll step lands it inside
        state.obstacles.push(Obstacle {
            id: 0,
            x: PLAYER_X + PLAYER_WIDTH + 2.0,
            y: 0.0,
        });

        tick(&mut state, &TickInput::default(), 500.0);
        assert!(matches!(state.phase, GamePhase::Ended { at_ms } if at_ms == 500.0));

        // Ended state is frozen
        let score = state.score;
        tick(&mut state, &TickInput::default(), 600.0);
        assert_eq!(state.score, score);
    }

    #[test]
    fn test_spawn_gate_opens_with_clock() {
        let mut state = running_state();
        tick(&mut state, &TickInput::default(), 500.0);
        assert!(state.obstacles.is_empty());

        tick(&mut state, &TickInput::default(), 1100.0);
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.obstacles[0].x, SPAWN_X);
    }

    proptest! {
        #[test]
        fn prop_speed_capped_and_monotonic(ticks in 0usize..12_000) {
            let mut state = running_state();
            let mut last_speed = state.speed;
            for _ in 0..ticks {
                quiet_tick(&mut state, &TickInput::default());
                prop_assert!(state.speed >= last_speed);
                prop_assert!(state.speed <= MAX_SPEED);
                last_speed = state.speed;
            }
        }

        #[test]
        fn prop_jump_arc_returns_to_ground(start_tick in 0usize..50) {
            let mut state = running_state();
            for _ in 0..start_tick {
                quiet_tick(&mut state, &TickInput::default());
            }
            quiet_tick(&mut state, &TickInput { activate: true });

            // A full arc is 19 rising + 30 falling ticks; one was just taken
            for _ in 0..48 {
                quiet_tick(&mut state, &TickInput::default());
            }
            prop_assert_eq!(state.player.vertical_offset, 0.0);
            prop_assert_eq!(state.player.arc, JumpArc::Grounded);
        }
    }
}
