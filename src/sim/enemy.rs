//! Enemy steering and melee
//!
//! Each enemy heads for the player while blending in three corrective
//! vectors: separation from nearby enemies, a periodic sideways dodge and
//! avoidance of obstacles. It stops once inside attack range and hits the
//! player whenever its attack area overlaps them and its cooldown is ready.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::perpendicular;
use crate::sim::collision::{clamp_to_arena, push_out_of_obstacle, repulsion};
use crate::sim::status::StatusEffects;
use crate::tuning::{EnemyTemplate, Obstacle};

/// Jitter added to each new dodge interval
const DODGE_JITTER: f32 = 0.5;

/// Knockback below this speed is dropped
const KNOCKBACK_REST_SPEED: f32 = 0.01;

/// World the enemy steers through on one step
#[derive(Debug, Clone, Copy)]
pub struct SteerContext<'a> {
    pub player_pos: Vec2,
    /// Positions of every other living enemy
    pub neighbours: &'a [Vec2],
    pub obstacles: &'a [Obstacle],
    pub half_extents: Vec2,
    /// Speed multiplier while inside smoke
    pub smoke_slow_factor: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub stats: EnemyTemplate,
    pub pos: Vec2,
    /// Displacement over the last step
    pub vel: Vec2,
    /// Unit direction to the player
    pub dir: Vec2,
    pub health: f32,
    pub dead: bool,

    pub dodge_timer: f32,
    pub dodge_time_left: f32,
    /// -1, 0 or 1
    pub dodge_direction: i8,

    pub attack_timer: f32,
    /// Velocity from explosions, decays over time
    pub knockback: Vec2,
    pub status: StatusEffects,
}

impl Enemy {
    pub fn new<R: Rng>(id: u32, pos: Vec2, stats: EnemyTemplate, rng: &mut R) -> Self {
        // Stagger dodges so a fresh wave doesn't juke in unison
        let dodge_timer = if stats.dodge_interval > 0.0 {
            rng.random_range(0.0..stats.dodge_interval)
        } else {
            0.0
        };

        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            dir: Vec2::X,
            health: stats.health,
            dead: false,
            dodge_timer,
            dodge_time_left: 0.0,
            dodge_direction: 0,
            attack_timer: 0.0,
            knockback: Vec2::ZERO,
            status: StatusEffects::default(),
            stats,
        }
    }

    /// Advance the dodge cycle by one step
    pub fn update_dodge<R: Rng>(&mut self, dt: f32, rng: &mut R) {
        self.dodge_timer -= dt;
        if self.dodge_time_left > 0.0 {
            self.dodge_time_left -= dt;
        } else if self.dodge_timer <= 0.0 {
            self.dodge_time_left = self.stats.dodge_duration;
            self.dodge_timer = self.stats.dodge_interval + rng.random_range(-DODGE_JITTER..DODGE_JITTER);
            self.dodge_direction = if rng.random_bool(0.5) { -1 } else { 1 };
        } else {
            self.dodge_direction = 0;
        }
    }

    /// Blend the chase direction with dodge, separation and avoidance
    pub fn steering(&self, ctx: &SteerContext) -> Vec2 {
        let sep_radius_sq = self.stats.separation_radius * self.stats.separation_radius;
        let separation = repulsion(
            self.pos,
            ctx.neighbours
                .iter()
                .copied()
                .filter(|n| n.distance_squared(self.pos) <= sep_radius_sq),
        );

        let avoid_radius = self.stats.obstacle_avoidance_radius;
        let avoidance = repulsion(
            self.pos,
            ctx.obstacles
                .iter()
                .filter(|o| o.pos.distance(self.pos) <= avoid_radius + o.radius)
                .map(|o| o.pos),
        );

        let dodge = perpendicular(self.dir) * f32::from(self.dodge_direction) * self.stats.dodge_strength;

        self.dir
            + dodge
            + separation * self.stats.separation_strength
            + avoidance * self.stats.obstacle_avoidance_strength
    }

    /// One fixed step of movement
    pub fn step<R: Rng>(&mut self, ctx: &SteerContext, dt: f32, rng: &mut R) {
        if self.dead {
            return;
        }
        let start = self.pos;

        self.attack_timer -= dt;
        self.status.tick(dt);

        let to_player = ctx.player_pos - self.pos;
        let distance = to_player.length();
        if distance > 0.0 {
            self.dir = to_player / distance;
        }

        if self.status.is_stunned() {
            self.dodge_direction = 0;
            self.dodge_time_left = 0.0;
        } else {
            self.update_dodge(dt, rng);
        }

        if !self.status.is_stunned() && distance > self.stats.attack_range {
            let slow = if self.status.in_smoke() { ctx.smoke_slow_factor } else { 1.0 };
            let heading = self.steering(ctx).normalize_or_zero();
            self.pos += heading * self.stats.speed * slow * dt;
        }

        if self.knockback != Vec2::ZERO {
            self.pos += self.knockback * dt;
            self.knockback *= (-self.stats.knockback_damping * dt).exp();
            if self.knockback.length() < KNOCKBACK_REST_SPEED {
                self.knockback = Vec2::ZERO;
            }
        }

        for obstacle in ctx.obstacles {
            self.pos = push_out_of_obstacle(self.pos, self.stats.radius, obstacle);
        }
        self.pos = clamp_to_arena(self.pos, self.stats.radius, ctx.half_extents);
        self.vel = if dt > 0.0 { (self.pos - start) / dt } else { Vec2::ZERO };
    }

    /// Center and radius of the melee area in front of the enemy
    pub fn attack_area(&self) -> (Vec2, f32) {
        (self.pos + self.dir * self.stats.attack_offset, self.stats.attack_reach)
    }

    /// Attempt a melee hit. Returns the damage dealt, if any.
    pub fn try_attack(&mut self) -> Option<f32> {
        if self.dead || self.attack_timer > 0.0 || self.status.is_blinded() {
            return None;
        }
        self.attack_timer = self.stats.attack_cooldown;
        Some(self.stats.attack_damage)
    }

    /// Apply damage. Returns true only on the hit that kills.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.dead = true;
            log::debug!("Enemy {} ({}) died", self.id, self.stats.name);
            return true;
        }
        false
    }

    /// Stun, dropping any dodge in progress
    pub fn stun(&mut self, seconds: f32) {
        self.status.stun(seconds);
        self.dodge_direction = 0;
        self.dodge_time_left = 0.0;
    }

    /// Push by an impulse (force units); heavier enemies move less
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        let mass = self.stats.mass.max(1.0);
        self.knockback += impulse / mass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn enemy(pos: Vec2) -> Enemy {
        let mut rng = Pcg32::seed_from_u64(3);
        Enemy::new(1, pos, EnemyTemplate::default(), &mut rng)
    }

    fn ctx<'a>(player_pos: Vec2, neighbours: &'a [Vec2], obstacles: &'a [Obstacle]) -> SteerContext<'a> {
        SteerContext {
            player_pos,
            neighbours,
            obstacles,
            half_extents: Vec2::new(16.0, 10.0),
            smoke_slow_factor: 0.5,
        }
    }

    #[test]
    fn test_initial_dodge_timer_is_staggered() {
        let mut rng = Pcg32::seed_from_u64(11);
        for i in 0..20 {
            let e = Enemy::new(i, Vec2::ZERO, EnemyTemplate::default(), &mut rng);
            assert!((0.0..2.5).contains(&e.dodge_timer));
        }
    }

    #[test]
    fn test_dodge_cycle() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut e = enemy(Vec2::ZERO);
        e.dodge_timer = 0.01;
        e.update_dodge(0.02, &mut rng);
        assert!(e.dodge_direction == 1 || e.dodge_direction == -1);
        assert_eq!(e.dodge_time_left, 0.4);
        assert!((2.0..3.0).contains(&e.dodge_timer));

        // Direction holds for the whole dodge
        let dir = e.dodge_direction;
        for _ in 0..19 {
            e.update_dodge(0.02, &mut rng);
            assert_eq!(e.dodge_direction, dir);
        }
        for _ in 0..3 {
            e.update_dodge(0.02, &mut rng);
        }
        assert_eq!(e.dodge_direction, 0);
    }

    #[test]
    fn test_chases_player() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut e = enemy(Vec2::new(-5.0, 0.0));
        e.dodge_timer = 100.0;
        e.step(&ctx(Vec2::ZERO, &[], &[]), 0.5, &mut rng);
        assert!((e.pos - Vec2::new(-4.0, 0.0)).length() < 1e-5);
        assert_eq!(e.dir, Vec2::X);
    }

    #[test]
    fn test_stops_inside_attack_range() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut e = enemy(Vec2::new(-1.0, 0.0));
        e.step(&ctx(Vec2::ZERO, &[], &[]), 0.5, &mut rng);
        assert_eq!(e.pos, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_stunned_enemy_holds_still() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut e = enemy(Vec2::new(-5.0, 0.0));
        e.dodge_direction = 1;
        e.dodge_time_left = 0.3;
        e.stun(1.0);
        assert_eq!(e.dodge_direction, 0);
        e.step(&ctx(Vec2::ZERO, &[], &[]), 0.5, &mut rng);
        assert_eq!(e.pos, Vec2::new(-5.0, 0.0));
    }

    #[test]
    fn test_smoke_slows() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut e = enemy(Vec2::new(-5.0, 0.0));
        e.dodge_timer = 100.0;
        e.status.enter_smoke();
        e.step(&ctx(Vec2::ZERO, &[], &[]), 0.5, &mut rng);
        assert!((e.pos.x + 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_steering_blend() {
        let mut e = enemy(Vec2::ZERO);
        e.dir = Vec2::X;
        e.dodge_direction = 1;
        let neighbours = [Vec2::new(0.0, 0.5), Vec2::new(5.0, 0.0)];
        let m = e.steering(&ctx(Vec2::new(5.0, 0.0), &neighbours, &[]));
        // dir (1,0) + dodge (0,1.2) + separation (0,-1)*1.5
        assert!((m - Vec2::new(1.0, -0.3)).length() < 1e-5);
    }

    #[test]
    fn test_obstacle_avoidance_pushes_away() {
        let mut e = enemy(Vec2::ZERO);
        e.dir = Vec2::X;
        let rock = [Obstacle { pos: Vec2::new(0.0, -1.5), radius: 0.5 }];
        let m = e.steering(&ctx(Vec2::new(5.0, 0.0), &[], &rock));
        assert!((m - Vec2::new(1.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn test_attack_cooldown_and_blind() {
        let mut e = enemy(Vec2::ZERO);
        assert_eq!(e.try_attack(), Some(10.0));
        assert_eq!(e.try_attack(), None);
        e.attack_timer = 0.0;
        e.status.blind(1.0);
        assert_eq!(e.try_attack(), None);
    }

    #[test]
    fn test_attack_area_in_front() {
        let mut e = enemy(Vec2::new(1.0, 1.0));
        e.dir = Vec2::Y;
        assert_eq!(e.attack_area(), (Vec2::new(1.0, 1.5), 0.6));
    }

    #[test]
    fn test_dies_once() {
        let mut e = enemy(Vec2::ZERO);
        assert!(!e.take_damage(15.0));
        assert!(e.take_damage(5.0));
        assert!(!e.take_damage(5.0));
        assert!(e.dead);
    }

    #[test]
    fn test_knockback_scales_with_mass_and_decays() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut e = enemy(Vec2::new(-0.5, 0.0));
        e.apply_impulse(Vec2::new(-100.0, 0.0));
        assert_eq!(e.knockback, Vec2::new(-2.0, 0.0));
        e.step(&ctx(Vec2::ZERO, &[], &[]), 0.1, &mut rng);
        assert!(e.pos.x < -0.6);
        assert!(e.knockback.length() < 2.0);
    }
}
