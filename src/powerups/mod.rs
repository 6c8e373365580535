//! Power-up cards offered between waves
//!
//! A power-up is a data asset: display text, a tier that sets how often it
//! is drawn, and an effect applied to the player when its card is picked.

pub mod catalog;
pub mod selection;

pub use catalog::{Catalog, PowerUpKind, TierValues, tiered_assets, write_tiered_assets};
pub use selection::{CardChoice, CardScreen, CardScreenMode, draw_cards, weighted_pick};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::grenades::{GrenadeBelt, GrenadeData};
use crate::sim::player::Player;
use crate::sim::weapons::{AddWeaponOutcome, Loadout, WeaponKind, WeaponSlot, WeaponStats};
use crate::tuning::WeaponTuning;

/// Rarity tier; rarer tiers are drawn less often
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum PowerUpTier {
    #[default]
    Minor,
    Major,
    Ultimate,
}

impl PowerUpTier {
    pub const ALL: [PowerUpTier; 3] = [PowerUpTier::Minor, PowerUpTier::Major, PowerUpTier::Ultimate];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpTier::Minor => "Minor",
            PowerUpTier::Major => "Major",
            PowerUpTier::Ultimate => "Ultimate",
        }
    }
}

/// What a power-up does when picked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PowerUpEffect {
    /// Raise weapon damage
    Damage { increase: i32 },
    /// Heal
    IncreaseHealth { increase: i32 },
    /// Raise max health, then heal by the same amount
    MaxHealthBoost { increase: f32 },
    /// Give a weapon, asking for a slot to replace when the loadout is full
    AddWeapon {
        kind: WeaponKind,
        #[serde(default)]
        stats: Option<WeaponStats>,
    },
    /// Give grenades; untyped when `grenade` is None
    Grenades {
        amount: u32,
        #[serde(default)]
        grenade: Option<GrenadeData>,
    },
}

impl PowerUpEffect {
    pub fn type_name(&self) -> &'static str {
        match self {
            PowerUpEffect::Damage { .. } => "Damage",
            PowerUpEffect::IncreaseHealth { .. } => "IncreaseHealth",
            PowerUpEffect::MaxHealthBoost { .. } => "MaxHealthBoost",
            PowerUpEffect::AddWeapon { .. } => "AddWeapon",
            PowerUpEffect::Grenades { .. } => "Grenade",
        }
    }
}

fn default_icon_scale() -> Vec2 {
    Vec2::ONE
}

/// A power-up asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_icon_scale")]
    pub icon_scale: Vec2,
    #[serde(default)]
    pub tier: PowerUpTier,
    pub effect: PowerUpEffect,
}

impl PowerUp {
    pub fn new(name: impl Into<String>, description: impl Into<String>, tier: PowerUpTier, effect: PowerUpEffect) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            icon: None,
            icon_scale: Vec2::ONE,
            tier,
            effect,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Everything a power-up can touch
pub struct PowerUpTarget<'a> {
    pub player: &'a mut Player,
    pub loadout: &'a mut Loadout,
    pub grenades: &'a mut GrenadeBelt,
    pub weapon_tuning: &'a WeaponTuning,
}

/// Result of applying a power-up
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied,
    /// The weapon didn't fit; the player must pick a slot to overwrite
    NeedsWeaponReplace { slot: WeaponSlot },
}

impl PowerUp {
    pub fn apply(&self, target: PowerUpTarget<'_>) -> ApplyOutcome {
        log::info!("Applying power-up: {} ({})", self.name, self.tier.as_str());

        match &self.effect {
            PowerUpEffect::Damage { increase } => {
                target.loadout.increase_damage(*increase);
            }
            PowerUpEffect::IncreaseHealth { increase } => {
                target.player.change_health(*increase as f32);
            }
            PowerUpEffect::MaxHealthBoost { increase } => {
                target.player.change_max_health(*increase);
                target.player.change_health(*increase);
            }
            PowerUpEffect::AddWeapon { kind, stats } => {
                let slot = WeaponSlot::full(
                    *kind,
                    stats.clone(),
                    target.weapon_tuning.fallback_clip_ammo,
                    target.weapon_tuning.fallback_reserve_ammo,
                );
                match target.loadout.add_weapon(slot.clone()) {
                    AddWeaponOutcome::Added => {}
                    outcome => {
                        log::debug!("{} not added ({:?}); asking for a slot", kind.as_str(), outcome);
                        return ApplyOutcome::NeedsWeaponReplace { slot };
                    }
                }
            }
            PowerUpEffect::Grenades { amount, grenade } => match grenade {
                Some(data) => {
                    target.grenades.add_typed(data, *amount);
                    log::debug!("Gave {}x {}", amount, data.display_name);
                }
                None => {
                    target.grenades.add_untyped(*amount);
                    log::debug!("Gave {} untyped grenades", amount);
                }
            },
        }
        ApplyOutcome::Applied
    }
}
