//! Wave Survival - A top-down arena shooter simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player, enemies, weapons, grenades, waves)
//! - `powerups`: Power-up cards, weighted draws and tiered asset authoring
//! - `tuning`: Data-driven game balance
//! - `hud`: Read-only HUD view model built from the game state
//! - `stats`: Session statistics and the lose screen
//! - `records`: Best runs persisted between sessions

pub mod error;
pub mod hud;
pub mod powerups;
pub mod records;
pub mod sim;
pub mod stats;
pub mod tuning;

pub use error::{Error, Result};
pub use records::Records;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz physics step)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Number of weapon slots the player can hold
    pub const MAX_WEAPON_SLOTS: usize = 2;
    /// Number of grenade slots on the belt
    pub const GRENADE_SLOTS: usize = 2;

    /// Max health never drops below this floor
    pub const MIN_MAX_HEALTH: f32 = 100.0;

    /// Aim vectors shorter than this (squared) fall back to straight up
    pub const MIN_AIM_LENGTH_SQ: f32 = 0.001;
}

/// Rotate a vector counter-clockwise by `degrees`
#[inline]
pub fn rotate_deg(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Left-hand perpendicular (-y, x)
#[inline]
pub fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Unit vector at `degrees` from +x
#[inline]
pub fn dir_from_deg(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Clamp to [0, 1]
#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}
