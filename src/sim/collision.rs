//! Axis-aligned collision detection
//!
//! The runner's hitbox is a fixed rectangle distinct from its sprite;
//! obstacles are fixed-size rectangles anchored to the ground. Y grows
//! upward from the ground line, so a box's top edge is `y + height`.

use glam::Vec2;

use super::state::Obstacle;
use crate::consts::*;

/// An axis-aligned hitbox: bottom-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Hitbox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Strict-inequality overlap test: touching edges do not collide
    #[inline]
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.bottom() < other.top()
            && self.top() > other.bottom()
    }
}

/// The player hitbox at a given vertical offset
pub fn player_hitbox(vertical_offset: f32) -> Hitbox {
    Hitbox::new(PLAYER_X, vertical_offset, PLAYER_WIDTH, PLAYER_HEIGHT)
}

/// An obstacle's hitbox
pub fn obstacle_hitbox(obstacle: &Obstacle) -> Hitbox {
    Hitbox::new(obstacle.x, obstacle.y, OBSTACLE_WIDTH, OBSTACLE_HEIGHT)
}

/// True if the player overlaps any obstacle. Short-circuits on the first hit.
pub fn detect_collision(player: &Hitbox, obstacles: &[Obstacle]) -> bool {
    obstacles
        .iter()
        .any(|obstacle| player.overlaps(&obstacle_hitbox(obstacle)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_overlap() {
        let player = player_hitbox(0.0);
        let obstacles = [Obstacle {
            id: 0,
            x: 50.0,
            y: 0.0,
        }];
        assert!(detect_collision(&player, &obstacles));
    }

    #[test]
    fn test_edge_boundary() {
        let player = player_hitbox(0.0);

        // Player spans [50, 90): an obstacle at x=90 only touches, x=89 overlaps
        let touching = [Obstacle {
            id: 0,
            x: 90.0,
            y: 0.0,
        }];
        assert!(!detect_collision(&player, &touching));

        let overlapping = [Obstacle {
            id: 0,
            x: 89.0,
            y: 0.0,
        }];
        assert!(detect_collision(&player, &overlapping));
    }

    #[test]
    fn test_jump_clears_obstacle() {
        // Obstacle top is 50; a player at offset 50 only touches it
        let player = player_hitbox(50.0);
        let obstacles = [Obstacle {
            id: 0,
            x: 60.0,
            y: 0.0,
        }];
        assert!(!detect_collision(&player, &obstacles));

        let player = player_hitbox(49.0);
        assert!(detect_collision(&player, &obstacles));
    }

    #[test]
    fn test_short_circuit_on_first_hit() {
        let player = player_hitbox(0.0);
        let obstacles = [
            Obstacle {
                id: 0,
                x: 400.0,
                y: 0.0,
            },
            Obstacle {
                id: 1,
                x: 55.0,
                y: 0.0,
            },
            Obstacle {
                id: 2,
                x: 700.0,
                y: 0.0,
            },
        ];
        assert!(detect_collision(&player, &obstacles));
    }

    #[test]
    fn test_empty_set_never_collides() {
        let player = player_hitbox(0.0);
        assert!(!detect_collision(&player, &[]));
    }
}
