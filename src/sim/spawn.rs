//! Procedural obstacle and scenery generation
//!
//! Spawning is wall-clock gated, not tick-gated: each kind keeps its own
//! last-spawn time and minimum inter-arrival. The obstacle gate shrinks
//! linearly with speed and is floored so the spawn rate stays bounded at
//! the speed ceiling.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{Cloud, Obstacle};
use crate::consts::*;

/// Rate-limited generator for obstacles and clouds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    seed: u64,
    last_obstacle_ms: f64,
    last_cloud_ms: f64,
    next_obstacle_id: u32,
    next_cloud_id: u32,
}

impl Spawner {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            last_obstacle_ms: 0.0,
            last_cloud_ms: 0.0,
            next_obstacle_id: 0,
            next_cloud_id: 0,
        }
    }

    /// Minimum obstacle inter-arrival for the given speed
    pub fn obstacle_gate_ms(speed: f32) -> f64 {
        (OBSTACLE_GATE_BASE_MS - f64::from(speed) * OBSTACLE_GATE_PER_SPEED_MS)
            .max(OBSTACLE_GATE_FLOOR_MS)
    }

    /// Emit a new obstacle if the speed-scaled gate has elapsed
    pub fn maybe_spawn_obstacle(&mut self, now_ms: f64, speed: f32) -> Option<Obstacle> {
        if now_ms - self.last_obstacle_ms <= Self::obstacle_gate_ms(speed) {
            return None;
        }
        self.last_obstacle_ms = now_ms;

        let id = self.next_obstacle_id;
        self.next_obstacle_id += 1;
        Some(Obstacle {
            id,
            x: SPAWN_X,
            y: 0.0,
        })
    }

    /// Emit a new cloud if the fixed gate has elapsed
    pub fn maybe_spawn_cloud(&mut self, now_ms: f64) -> Option<Cloud> {
        if now_ms - self.last_cloud_ms <= CLOUD_GATE_MS {
            return None;
        }
        self.last_cloud_ms = now_ms;

        let id = self.next_cloud_id;
        self.next_cloud_id += 1;
        Some(Cloud {
            id,
            x: SPAWN_X,
            y: self.cloud_y(id),
        })
    }

    /// Vertical placement drawn from [CLOUD_Y_MIN, CLOUD_Y_MAX).
    /// Seeded per cloud so a session replays identically from its seed.
    fn cloud_y(&self, id: u32) -> f32 {
        let mut rng = Pcg32::seed_from_u64(self.seed.wrapping_add(u64::from(id)));
        rng.random_range(CLOUD_Y_MIN..CLOUD_Y_MAX)
    }
}
