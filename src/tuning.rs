//! Data-driven game balance
//!
//! Every number a designer would tweak lives here. Missing sections or fields
//! in a tuning file fall back to the defaults below, so a file only needs to
//! name what it changes.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::powerups::PowerUpTier;
use crate::sim::weapons::{WeaponKind, WeaponStats};

/// Complete balance configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub weapons: WeaponTuning,
    pub grenades: GrenadeTuning,
    /// Enemy archetypes; each spawn picks one uniformly
    pub enemies: Vec<EnemyTemplate>,
    pub waves: WaveTuning,
    pub cards: CardTuning,
    pub arena: ArenaLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub base_speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub radius: f32,
    /// Seconds between footstep events while moving
    pub footstep_interval: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            base_speed: 5.0,
            health: 100.0,
            max_health: 100.0,
            radius: 0.4,
            footstep_interval: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    pub base_damage: i32,
    pub starting_weapon: WeaponKind,
    pub starting_stats: WeaponStats,
    /// Seconds between laser pulses while the trigger is held
    pub laser_fire_rate: f32,
    pub laser_range: f32,
    /// Laser pulses deal `current_damage * laser_damage_multiplier`
    pub laser_damage_multiplier: i32,
    pub bullet_speed: f32,
    pub bullet_lifetime: f32,
    pub bullet_radius: f32,
    /// Clip granted by a weapon card that carries no stats
    pub fallback_clip_ammo: u32,
    /// Reserve granted by a weapon card that carries no stats
    pub fallback_reserve_ammo: u32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            base_damage: 1,
            starting_weapon: WeaponKind::Pistol,
            starting_stats: WeaponStats::pistol(),
            laser_fire_rate: 0.1,
            laser_range: 100.0,
            laser_damage_multiplier: 2,
            bullet_speed: 100.0,
            bullet_lifetime: 1.0,
            bullet_radius: 0.1,
            fallback_clip_ammo: 100,
            fallback_reserve_ammo: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrenadeTuning {
    pub max_per_slot: u32,
    /// Throw force for grenades without data
    pub throw_force: f32,
    /// Upward bias for grenades without data
    pub upward_bias: f32,
    /// Spawn height above the player
    pub spawn_offset: f32,
    pub explode_on_impact: bool,
    /// Relative speed needed to detonate on impact
    pub impact_threshold: f32,
    pub fallback_fuse_time: f32,
    pub fallback_damage: i32,
    pub fallback_radius: f32,
    pub fallback_force: f32,
    pub radius: f32,
    /// Exponential velocity damping per second
    pub drag: f32,
    /// Speed multiplier for enemies standing in smoke
    pub smoke_slow_factor: f32,
}

impl Default for GrenadeTuning {
    fn default() -> Self {
        Self {
            max_per_slot: 100,
            throw_force: 8.0,
            upward_bias: 0.5,
            spawn_offset: 0.6,
            explode_on_impact: true,
            impact_threshold: 6.0,
            fallback_fuse_time: 2.0,
            fallback_damage: 25,
            fallback_radius: 2.0,
            fallback_force: 300.0,
            radius: 0.15,
            drag: 1.5,
            smoke_slow_factor: 0.5,
        }
    }
}

/// One enemy archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTemplate {
    pub name: String,
    pub speed: f32,
    pub health: f32,
    pub radius: f32,
    pub mass: f32,
    /// Knockback velocity decay per second
    pub knockback_damping: f32,

    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub attack_damage: f32,
    /// Distance of the attack area in front of the enemy
    pub attack_offset: f32,
    /// Radius of the attack area
    pub attack_reach: f32,

    pub separation_radius: f32,
    pub separation_strength: f32,

    pub dodge_interval: f32,
    pub dodge_duration: f32,
    pub dodge_strength: f32,

    pub obstacle_avoidance_radius: f32,
    pub obstacle_avoidance_strength: f32,
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            name: "blue".to_string(),
            speed: 2.0,
            health: 20.0,
            radius: 0.4,
            mass: 50.0,
            knockback_damping: 6.0,
            attack_range: 1.5,
            attack_cooldown: 1.0,
            attack_damage: 10.0,
            attack_offset: 0.5,
            attack_reach: 0.6,
            separation_radius: 1.0,
            separation_strength: 1.5,
            dodge_interval: 2.5,
            dodge_duration: 0.4,
            dodge_strength: 1.2,
            obstacle_avoidance_radius: 1.2,
            obstacle_avoidance_strength: 2.0,
        }
    }
}

impl EnemyTemplate {
    /// Faster, frailer variant
    pub fn runner() -> Self {
        Self {
            name: "blue_runner".to_string(),
            speed: 3.2,
            health: 12.0,
            radius: 0.3,
            mass: 30.0,
            dodge_interval: 1.6,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    pub base_enemies_per_wave: u32,
    pub difficulty_multiplier: f32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base_enemies_per_wave: 5,
            difficulty_multiplier: 1.25,
        }
    }
}

/// Relative draw weight of each power-up tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TierWeights {
    pub minor: f32,
    pub major: f32,
    pub ultimate: f32,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            minor: 0.7,
            major: 0.25,
            ultimate: 0.05,
        }
    }
}

impl TierWeights {
    pub fn weight(&self, tier: PowerUpTier) -> f32 {
        match tier {
            PowerUpTier::Minor => self.minor,
            PowerUpTier::Major => self.major,
            PowerUpTier::Ultimate => self.ultimate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CardTuning {
    /// Cards offered after each wave (capped by catalog size)
    pub card_count: usize,
    /// Unscaled seconds before a card can be picked
    pub input_block: f32,
    /// Seconds between hiding the cards and starting the next wave
    pub continue_delay: f32,
    pub tier_weights: TierWeights,
}

impl Default for CardTuning {
    fn default() -> Self {
        Self {
            card_count: 3,
            input_block: 1.0,
            continue_delay: 0.5,
            tier_weights: TierWeights::default(),
        }
    }
}

/// Static circular obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: Vec2,
    pub radius: f32,
}

/// Arena geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaLayout {
    /// Arena spans [-half_extents, half_extents]
    pub half_extents: Vec2,
    pub player_spawn: Vec2,
    pub spawn_points: Vec<Vec2>,
    pub obstacles: Vec<Obstacle>,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self {
            half_extents: Vec2::new(16.0, 10.0),
            player_spawn: Vec2::ZERO,
            spawn_points: vec![
                Vec2::new(-15.0, -9.0),
                Vec2::new(0.0, -9.0),
                Vec2::new(15.0, -9.0),
                Vec2::new(15.0, 0.0),
                Vec2::new(15.0, 9.0),
                Vec2::new(0.0, 9.0),
                Vec2::new(-15.0, 9.0),
                Vec2::new(-15.0, 0.0),
            ],
            obstacles: vec![
                Obstacle { pos: Vec2::new(-7.0, 4.0), radius: 1.0 },
                Obstacle { pos: Vec2::new(7.0, 4.0), radius: 1.0 },
                Obstacle { pos: Vec2::new(-7.0, -4.0), radius: 1.0 },
                Obstacle { pos: Vec2::new(7.0, -4.0), radius: 1.0 },
            ],
        }
    }
}

impl Tuning {
    /// Default balance with the standard enemy roster
    pub fn standard() -> Self {
        Self {
            enemies: vec![EnemyTemplate::default(), EnemyTemplate::runner()],
            ..Self::default()
        }
    }

    /// Parse and validate a tuning document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut tuning: Tuning = serde_json::from_str(json)?;
        if tuning.enemies.is_empty() {
            tuning.enemies = Tuning::standard().enemies;
        }
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidTuning(msg.to_string()));

        if self.enemies.is_empty() {
            return invalid("at least one enemy template is required");
        }
        if self.arena.spawn_points.is_empty() {
            return invalid("arena needs at least one spawn point");
        }
        if self.arena.half_extents.min_element() <= 0.0 {
            return invalid("arena half extents must be positive");
        }
        if self.player.max_health <= 0.0 || self.player.base_speed < 0.0 {
            return invalid("player max_health must be positive and base_speed non-negative");
        }
        if self.waves.base_enemies_per_wave == 0 {
            return invalid("waves.base_enemies_per_wave must be at least 1");
        }
        if self.waves.difficulty_multiplier <= 0.0 {
            return invalid("waves.difficulty_multiplier must be positive");
        }
        if self.grenades.max_per_slot == 0 {
            return invalid("grenades.max_per_slot must be at least 1");
        }
        if self.weapons.laser_fire_rate <= 0.0 {
            return invalid("weapons.laser_fire_rate must be positive");
        }
        if self.weapons.starting_stats.pellet_count == 0 {
            return invalid("weapons.starting_stats.pellet_count must be at least 1");
        }
        let w = self.cards.tier_weights;
        if w.minor < 0.0 || w.major < 0.0 || w.ultimate < 0.0 {
            return invalid("card tier weights must be non-negative");
        }
        for enemy in &self.enemies {
            if enemy.health <= 0.0 || enemy.speed < 0.0 || enemy.mass <= 0.0 {
                return Err(Error::InvalidTuning(format!(
                    "enemy `{}` needs positive health and mass and non-negative speed",
                    enemy.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tuning_is_valid() {
        assert!(Tuning::standard().validate().is_ok());
    }

    #[test]
    fn test_default_without_enemies_is_invalid() {
        let err = Tuning::default().validate().unwrap_err();
        assert!(matches!(err, Error::InvalidTuning(_)));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json_str(r#"{ "waves": { "base_enemies_per_wave": 8 } }"#)
            .expect("partial tuning should parse");
        assert_eq!(tuning.waves.base_enemies_per_wave, 8);
        assert_eq!(tuning.waves.difficulty_multiplier, 1.25);
        assert_eq!(tuning.player.max_health, 100.0);
        assert_eq!(tuning.enemies.len(), 2);
    }

    #[test]
    fn test_rejects_zero_spawn_points() {
        let err = Tuning::from_json_str(r#"{ "arena": { "spawn_points": [] } }"#).unwrap_err();
        assert!(err.to_string().contains("spawn point"));
    }

    #[test]
    fn test_rejects_zero_base_enemies() {
        let err = Tuning::from_json_str(r#"{ "waves": { "base_enemies_per_wave": 0 } }"#).unwrap_err();
        assert!(err.to_string().contains("base_enemies_per_wave"));
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(Tuning::from_json_str("{ nope"), Err(Error::Json(_))));
    }

    #[test]
    fn test_tier_weights_lookup() {
        let w = TierWeights::default();
        assert_eq!(w.weight(PowerUpTier::Minor), 0.7);
        assert_eq!(w.weight(PowerUpTier::Ultimate), 0.05);
    }
}
