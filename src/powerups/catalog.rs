//! Power-up catalog files and tiered asset authoring

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{PowerUp, PowerUpEffect, PowerUpTier};
use crate::sim::grenades::GrenadeData;
use crate::sim::weapons::{WeaponKind, WeaponStats};
use crate::{Error, Result};

/// The deck cards are drawn from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub power_ups: Vec<PowerUp>,
}

impl Catalog {
    /// Built-in deck
    pub fn default_set() -> Self {
        let health = TierValues { minor: 10, major: 25, ultimate: 50 };

        let mut power_ups: Vec<PowerUp> = [
            (PowerUpKind::Damage, TierValues::default()),
            (PowerUpKind::IncreaseHealth, health),
            (PowerUpKind::MaxHealthBoost, health),
        ]
        .into_iter()
        .flat_map(|(kind, values)| PowerUpTier::ALL.map(|tier| kind.asset(tier, values.get(tier))))
        .collect();

        power_ups.push(PowerUp::new(
            "Shotgun",
            "Wide spread, short range",
            PowerUpTier::Major,
            PowerUpEffect::AddWeapon { kind: WeaponKind::Shotgun, stats: Some(WeaponStats::shotgun()) },
        ));
        power_ups.push(PowerUp::new(
            "Laser",
            "Pierces every enemy in line",
            PowerUpTier::Ultimate,
            PowerUpEffect::AddWeapon { kind: WeaponKind::Laser, stats: Some(WeaponStats::laser()) },
        ));

        let grenades = [
            ("Grenades", "+3 Grenades", PowerUpTier::Minor, 3, None),
            ("Frag Pack", "+3 Frag", PowerUpTier::Minor, 3, Some(GrenadeData::frag())),
            ("Flashbangs", "+2 Flashbang", PowerUpTier::Minor, 2, Some(GrenadeData::flashbang())),
            ("Smoke Screen", "+2 Smoke", PowerUpTier::Minor, 2, Some(GrenadeData::smoke())),
            ("Sticky Bombs", "+2 Sticky", PowerUpTier::Major, 2, Some(GrenadeData::sticky())),
            ("Cluster Bomb", "+1 Cluster", PowerUpTier::Ultimate, 1, Some(GrenadeData::cluster())),
        ];
        for (name, description, tier, amount, grenade) in grenades {
            let icon = grenade.as_ref().and_then(|g| g.icon.clone());
            let mut card = PowerUp::new(name, description, tier, PowerUpEffect::Grenades { amount, grenade });
            card.icon = icon;
            power_ups.push(card);
        }

        Self { power_ups }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let catalog = Self::from_json_str(&json)?;
        log::info!("Loaded {} power-ups from {}", catalog.power_ups.len(), path.display());
        Ok(catalog)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| Error::io(path, e))
    }

    /// An empty catalog is allowed (waves then chain without cards)
    pub fn validate(&self) -> Result<()> {
        for p in &self.power_ups {
            if p.name.trim().is_empty() {
                return Err(Error::InvalidCatalog("power-up with empty name".to_string()));
            }
            match &p.effect {
                PowerUpEffect::AddWeapon { stats: Some(stats), .. } if stats.max_clip_ammo == 0 || stats.pellet_count == 0 => {
                    return Err(Error::InvalidCatalog(format!(
                        "`{}` weapon needs a clip and at least one pellet",
                        p.name
                    )));
                }
                PowerUpEffect::Grenades { amount: 0, .. } => {
                    return Err(Error::InvalidCatalog(format!("`{}` gives zero grenades", p.name)));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Power-up kinds with a single numeric value, as made by the batch creator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    Damage,
    IncreaseHealth,
    MaxHealthBoost,
}

impl PowerUpKind {
    /// Type name used in asset names and descriptions
    pub fn type_name(&self) -> &'static str {
        match self {
            PowerUpKind::Damage => "Damage",
            PowerUpKind::IncreaseHealth => "IncreaseHealth",
            PowerUpKind::MaxHealthBoost => "MaxHealthBoost",
        }
    }

    fn effect(&self, value: i32) -> PowerUpEffect {
        match self {
            PowerUpKind::Damage => PowerUpEffect::Damage { increase: value },
            PowerUpKind::IncreaseHealth => PowerUpEffect::IncreaseHealth { increase: value },
            PowerUpKind::MaxHealthBoost => PowerUpEffect::MaxHealthBoost { increase: value as f32 },
        }
    }

    /// Asset named "{Tier} {Type}" described as "+{value} {Type}"
    fn asset(&self, tier: PowerUpTier, value: i32) -> PowerUp {
        let type_name = self.type_name();
        PowerUp::new(
            format!("{} {}", tier.as_str(), type_name),
            format!("+{} {}", value, type_name),
            tier,
            self.effect(value),
        )
    }
}

impl FromStr for PowerUpKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Accept both the bare type name and the asset class name
        match s.trim().trim_end_matches("PowerUp") {
            "Damage" => Ok(PowerUpKind::Damage),
            "IncreaseHealth" => Ok(PowerUpKind::IncreaseHealth),
            "MaxHealthBoost" => Ok(PowerUpKind::MaxHealthBoost),
            _ => Err(Error::UnknownPowerUpKind(s.to_string())),
        }
    }
}

/// Value written into each tier's asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierValues {
    pub minor: i32,
    pub major: i32,
    pub ultimate: i32,
}

impl Default for TierValues {
    fn default() -> Self {
        Self { minor: 1, major: 3, ultimate: 7 }
    }
}

impl TierValues {
    pub fn get(&self, tier: PowerUpTier) -> i32 {
        match tier {
            PowerUpTier::Minor => self.minor,
            PowerUpTier::Major => self.major,
            PowerUpTier::Ultimate => self.ultimate,
        }
    }
}

/// First file in `dir` (by name) whose stem starts with `prefix`
fn find_icon(dir: &Path, prefix: &str) -> Result<Option<String>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut stems: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            entry
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .filter(|stem| stem.starts_with(prefix))
        .collect();
    stems.sort();
    Ok(stems.into_iter().next())
}

/// Build the Minor/Major/Ultimate assets for one kind
pub fn tiered_assets(kind: PowerUpKind, values: TierValues, icon_dir: Option<impl AsRef<Path>>) -> Result<Vec<PowerUp>> {
    let icon_dir: Option<&Path> = icon_dir.as_ref().map(|p| p.as_ref());

    PowerUpTier::ALL
        .iter()
        .map(|&tier| -> Result<PowerUp> {
            let mut asset = kind.asset(tier, values.get(tier));
            if let Some(dir) = icon_dir {
                let base_name = format!("{}{}", tier.as_str(), kind.type_name());
                asset.icon = find_icon(dir, &base_name)?;
                if asset.icon.is_none() {
                    log::warn!("No icon for {} in {}", base_name, dir.display());
                }
            }
            Ok(asset)
        })
        .collect()
}

/// Write `{Tier}{Type}.json` for each tier into `out_dir`
pub fn write_tiered_assets(
    out_dir: impl AsRef<Path>,
    kind: PowerUpKind,
    values: TierValues,
    icon_dir: Option<impl AsRef<Path>>,
) -> Result<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;

    let mut written = Vec::new();
    for asset in tiered_assets(kind, values, icon_dir)? {
        let path = out_dir.join(format!("{}{}.json", asset.tier.as_str(), kind.type_name()));
        let json = serde_json::to_string_pretty(&asset)?;
        fs::write(&path, json).map_err(|e| Error::io(&path, e))?;
        log::info!("Created {}", path.display());
        written.push(path);
    }
    Ok(written)
}
