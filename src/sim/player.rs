//! The player character

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_MAX_HEALTH;
use crate::sim::collision::{clamp_to_arena, push_out_of_obstacle};
use crate::tuning::{Obstacle, PlayerTuning};

/// Movement input below this length does not count as walking
const FOOTSTEP_INPUT_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Velocity of the last step (used for impact checks)
    pub vel: Vec2,
    pub radius: f32,
    pub facing: Facing,
    pub health: f32,
    pub max_health: f32,
    pub base_speed: f32,
    pub footstep_interval: f32,
    /// Seconds until the next footstep while walking
    pub footstep_timer: f32,
}

impl Player {
    pub fn new(tuning: &PlayerTuning, spawn: Vec2) -> Self {
        let max_health = tuning.max_health.max(MIN_MAX_HEALTH);
        Self {
            pos: spawn,
            vel: Vec2::ZERO,
            radius: tuning.radius,
            facing: Facing::Right,
            health: tuning.health.clamp(0.0, max_health),
            max_health,
            base_speed: tuning.base_speed,
            footstep_interval: tuning.footstep_interval,
            footstep_timer: 0.0,
        }
    }

    /// Move by a raw input vector. Returns true when a footstep should play.
    pub fn move_by(&mut self, input: Vec2, dt: f32, half_extents: Vec2, obstacles: &[Obstacle]) -> bool {
        let start = self.pos;
        let mut pos = self.pos + input * self.base_speed * dt;
        for obstacle in obstacles {
            pos = push_out_of_obstacle(pos, self.radius, obstacle);
        }
        self.pos = clamp_to_arena(pos, self.radius, half_extents);
        self.vel = if dt > 0.0 { (self.pos - start) / dt } else { Vec2::ZERO };

        if input.x > 0.0 {
            self.facing = Facing::Right;
        } else if input.x < 0.0 {
            self.facing = Facing::Left;
        }

        if input.length() > FOOTSTEP_INPUT_THRESHOLD {
            self.footstep_timer -= dt;
            if self.footstep_timer <= 0.0 {
                self.footstep_timer = self.footstep_interval;
                return true;
            }
        }
        false
    }

    /// Add (or subtract) health, clamped to [0, max]
    pub fn change_health(&mut self, amount: f32) {
        self.health = (self.health + amount).clamp(0.0, self.max_health);
        if self.is_dead() {
            log::info!("Player died");
        }
    }

    /// Raise (or lower) max health; never drops below the floor
    pub fn change_max_health(&mut self, amount: f32) {
        self.max_health = (self.max_health + amount).max(MIN_MAX_HEALTH);
        self.health = self.health.clamp(0.0, self.max_health);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(&PlayerTuning::default(), Vec2::ZERO)
    }

    const ARENA: Vec2 = Vec2::new(16.0, 10.0);

    #[test]
    fn test_move_and_clamp() {
        let mut p = player();
        p.move_by(Vec2::X, 1.0, ARENA, &[]);
        assert!((p.pos - Vec2::new(5.0, 0.0)).length() < 1e-5);
        p.move_by(Vec2::X, 10.0, ARENA, &[]);
        assert!((p.pos.x - 15.6).abs() < 1e-5);
    }

    #[test]
    fn test_facing_follows_horizontal_input() {
        let mut p = player();
        p.move_by(Vec2::new(-1.0, 0.0), 0.02, ARENA, &[]);
        assert_eq!(p.facing, Facing::Left);
        p.move_by(Vec2::Y, 0.02, ARENA, &[]);
        assert_eq!(p.facing, Facing::Left);
        p.move_by(Vec2::X, 0.02, ARENA, &[]);
        assert_eq!(p.facing, Facing::Right);
    }

    #[test]
    fn test_footsteps_only_while_walking() {
        let mut p = player();
        assert!(p.move_by(Vec2::X, 0.02, ARENA, &[]), "first step plays at once");
        let steps = (0..45)
            .filter(|_| p.move_by(Vec2::X * 0.5, 0.02, ARENA, &[]))
            .count();
        assert_eq!(steps, 2);
        assert!(!p.move_by(Vec2::X * 0.05, 1.0, ARENA, &[]));
    }

    #[test]
    fn test_obstacles_block_movement() {
        let mut p = player();
        let rock = Obstacle { pos: Vec2::new(2.0, 0.0), radius: 1.0 };
        p.move_by(Vec2::X, 0.3, ARENA, &[rock]);
        assert!(p.pos.distance(rock.pos) >= 1.4 - 1e-4);
    }

    #[test]
    fn test_health_clamps() {
        let mut p = player();
        p.change_health(50.0);
        assert_eq!(p.health, 100.0);
        p.change_health(-130.0);
        assert_eq!(p.health, 0.0);
        assert!(p.is_dead());
    }

    #[test]
    fn test_max_health_floor() {
        let mut p = player();
        p.change_max_health(-40.0);
        assert_eq!(p.max_health, 100.0);
        p.change_max_health(20.0);
        assert_eq!(p.max_health, 120.0);
        assert_eq!(p.health, 100.0);
    }
}
