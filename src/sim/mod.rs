//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod enemy;
pub mod grenades;
pub mod player;
pub mod state;
pub mod status;
pub mod tick;
pub mod wave;
pub mod weapons;

pub use collision::{RayHit, circles_overlap, ray_circle, sweep_circle};
pub use enemy::{Enemy, SteerContext};
pub use grenades::{Attachment, Detonation, Grenade, GrenadeBelt, GrenadeData, GrenadeSlot, GrenadeVariant};
pub use player::{Facing, Player};
pub use state::{Bullet, GameEvent, GamePhase, GameState};
pub use status::{SmokeArea, StatusEffects};
pub use tick::{TickInput, tick};
pub use wave::{DeathOutcome, WaveManager};
pub use weapons::{Loadout, Trigger, WeaponKind, WeaponSlot, WeaponStats};
