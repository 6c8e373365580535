//! Weapon slots, ammo bookkeeping and firing
//!
//! The loadout holds at most two weapons. It owns clip/reserve ammo, the
//! reload timer, the fire-rate cooldown and the laser beam state. Firing only
//! produces volleys and laser pulses; the tick turns them into bullets and
//! ray queries against the enemies.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_WEAPON_SLOTS;
use crate::rotate_deg;
use crate::tuning::WeaponTuning;

/// Weapon families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    Pistol,
    Shotgun,
    Laser,
}

impl WeaponKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponKind::Pistol => "Pistol",
            WeaponKind::Shotgun => "Shotgun",
            WeaponKind::Laser => "Laser",
        }
    }
}

/// Per-weapon stats carried by weapon cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponStats {
    pub damage: i32,
    /// Reserve ammo capacity
    pub max_ammo: u32,
    /// Clip capacity
    pub max_clip_ammo: u32,
    /// Seconds between shots
    pub fire_rate: f32,
    /// Total shotgun cone in degrees
    pub spread_angle: f32,
    pub pellet_count: u32,
    pub range: f32,
    /// Seconds to refill the clip
    pub reload_time: f32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            damage: 1,
            max_ammo: 100,
            max_clip_ammo: 10,
            fire_rate: 0.5,
            spread_angle: 0.0,
            pellet_count: 1,
            range: 10.0,
            reload_time: 1.0,
        }
    }
}

impl WeaponStats {
    pub fn pistol() -> Self {
        Self {
            damage: 5,
            max_ammo: 120,
            max_clip_ammo: 12,
            fire_rate: 0.25,
            ..Self::default()
        }
    }

    pub fn shotgun() -> Self {
        Self {
            damage: 3,
            max_ammo: 36,
            max_clip_ammo: 6,
            fire_rate: 0.8,
            spread_angle: 15.0,
            pellet_count: 5,
            range: 6.0,
            reload_time: 1.5,
        }
    }

    pub fn laser() -> Self {
        Self {
            damage: 1,
            max_ammo: 200,
            max_clip_ammo: 50,
            fire_rate: 0.1,
            range: 100.0,
            reload_time: 2.0,
            ..Self::default()
        }
    }
}

/// Runtime state of a held weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSlot {
    pub kind: WeaponKind,
    pub clip_ammo: u32,
    pub max_clip_ammo: u32,
    pub reserve_ammo: u32,
    pub max_reserve_ammo: u32,
    pub stats: Option<WeaponStats>,
}

impl WeaponSlot {
    /// A full weapon. Without stats the fallback capacities apply.
    pub fn full(kind: WeaponKind, stats: Option<WeaponStats>, fallback_clip: u32, fallback_reserve: u32) -> Self {
        let (clip, reserve) = match &stats {
            Some(s) => (s.max_clip_ammo, s.max_ammo),
            None => (fallback_clip, fallback_reserve),
        };
        Self {
            kind,
            clip_ammo: clip,
            max_clip_ammo: clip,
            reserve_ammo: reserve,
            max_reserve_ammo: reserve,
            stats,
        }
    }

    pub fn has_ammo(&self) -> bool {
        self.clip_ammo > 0 || self.reserve_ammo > 0
    }

    fn fire_rate(&self) -> f32 {
        self.stats.as_ref().map_or(0.0, |s| s.fire_rate)
    }

    fn reload_time(&self) -> f32 {
        self.stats.as_ref().map_or(1.0, |s| s.reload_time)
    }

    /// Move ammo from reserve into the clip; returns the amount moved
    fn refill_clip(&mut self) -> u32 {
        let needed = self.max_clip_ammo.saturating_sub(self.clip_ammo);
        let moved = needed.min(self.reserve_ammo);
        self.clip_ammo += moved;
        self.reserve_ammo -= moved;
        moved
    }
}

/// Result of offering a new weapon to the loadout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddWeaponOutcome {
    Added,
    /// Already holding this kind
    Duplicate,
    /// Both slots taken
    SlotsFull,
}

/// Bullets leaving the muzzle in one trigger pull
#[derive(Debug, Clone, PartialEq)]
pub struct Volley {
    pub kind: WeaponKind,
    pub dirs: Vec<Vec2>,
    pub damage: i32,
}

/// What a trigger press did
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Fired(Volley),
    LaserOn,
    CoolingDown,
    Reloading,
    /// Clip empty; a reload or weapon switch may have been started
    Empty,
}

/// Pending clip refill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reload {
    pub slot: usize,
    pub remaining: f32,
}

/// Laser beam state while the trigger is held
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaserBeam {
    pub active: bool,
    /// Seconds until the next pulse
    pub pulse_timer: f32,
    /// Visible beam segment (start, end) for presentation
    pub segment: Option<(Vec2, Vec2)>,
}

/// Per-update loadout output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadoutUpdate {
    /// Damage of a laser pulse fired this update
    pub laser_pulse: Option<i32>,
    /// Weapon whose reload completed this update
    pub reloaded: Option<WeaponKind>,
    /// Weapon switched to because the current one ran dry
    pub auto_switched: Option<WeaponKind>,
}

/// The player's weapons
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loadout {
    pub slots: Vec<WeaponSlot>,
    pub current: usize,
    pub base_damage: i32,
    pub current_damage: i32,
    /// Seconds until the trigger can fire again
    pub cooldown: f32,
    pub reload: Option<Reload>,
    pub laser: LaserBeam,
}

impl Loadout {
    pub fn new(tuning: &WeaponTuning) -> Self {
        Self {
            slots: vec![WeaponSlot::full(
                tuning.starting_weapon,
                Some(tuning.starting_stats.clone()),
                1,
                0,
            )],
            current: 0,
            base_damage: tuning.base_damage,
            current_damage: tuning.base_damage,
            cooldown: 0.0,
            reload: None,
            laser: LaserBeam::default(),
        }
    }

    pub fn current_slot(&self) -> &WeaponSlot {
        &self.slots[self.current]
    }

    pub fn current_kind(&self) -> WeaponKind {
        self.current_slot().kind
    }

    /// Kind in the slot not currently held, if there are two
    pub fn secondary_kind(&self) -> Option<WeaponKind> {
        if self.slots.len() < 2 {
            return None;
        }
        let other = if self.current == 0 { 1 } else { 0 };
        self.slots.get(other).map(|s| s.kind)
    }

    pub fn is_reloading(&self) -> bool {
        self.reload.is_some()
    }

    pub fn increase_damage(&mut self, amount: i32) {
        self.current_damage += amount;
    }

    /// Damage of one bullet from the held weapon, including damage cards
    pub fn shot_damage(&self) -> i32 {
        let slot = self.current_slot();
        let bonus = self.current_damage - self.base_damage;
        match &slot.stats {
            Some(stats) => stats.damage + bonus,
            None => self.current_damage + bonus,
        }
    }

    /// Add a weapon to a free slot
    pub fn add_weapon(&mut self, slot: WeaponSlot) -> AddWeaponOutcome {
        if self.slots.iter().any(|s| s.kind == slot.kind) {
            return AddWeaponOutcome::Duplicate;
        }
        if self.slots.len() >= MAX_WEAPON_SLOTS {
            return AddWeaponOutcome::SlotsFull;
        }
        log::debug!("Added {} to slot {}", slot.kind.as_str(), self.slots.len());
        self.slots.push(slot);
        AddWeaponOutcome::Added
    }

    /// Overwrite a slot; out-of-range indices are ignored
    pub fn replace_weapon(&mut self, index: usize, slot: WeaponSlot) -> bool {
        if index >= self.slots.len() {
            log::warn!("Ignoring weapon replace for missing slot {}", index);
            return false;
        }
        log::debug!(
            "Replacing weapon in slot {}: {} -> {}",
            index,
            self.slots[index].kind.as_str(),
            slot.kind.as_str()
        );
        if self.reload.is_some_and(|r| r.slot == index) {
            self.reload = None;
        }
        if index == self.current {
            self.stop_laser();
        }
        self.slots[index] = slot;
        true
    }

    /// Cycle to the next slot
    pub fn switch_weapon(&mut self) {
        self.stop_laser();
        self.reload = None;
        self.current = (self.current + 1) % self.slots.len();
    }

    /// Start refilling the clip of the held weapon
    pub fn start_reload(&mut self) -> bool {
        if self.reload.is_some() {
            return false;
        }
        let slot = self.current_slot();
        if slot.clip_ammo >= slot.max_clip_ammo || slot.reserve_ammo == 0 {
            return false;
        }
        let remaining = slot.reload_time();
        self.stop_laser();
        self.reload = Some(Reload {
            slot: self.current,
            remaining,
        });
        true
    }

    /// Trigger pressed while aiming along `aim` (normalized)
    pub fn press_trigger(&mut self, aim: Vec2) -> Trigger {
        if self.reload.is_some() {
            return Trigger::Reloading;
        }
        if self.current_slot().clip_ammo == 0 {
            self.handle_empty();
            return Trigger::Empty;
        }
        if self.cooldown > 0.0 {
            return Trigger::CoolingDown;
        }

        let kind = self.current_kind();
        if kind == WeaponKind::Laser {
            if !self.laser.active {
                self.laser.active = true;
                self.laser.pulse_timer = 0.0;
            }
            return Trigger::LaserOn;
        }

        let damage = self.shot_damage();
        let dirs = match kind {
            WeaponKind::Shotgun => {
                let (spread, pellets) = self
                    .current_slot()
                    .stats
                    .as_ref()
                    .map_or((15.0, 5), |s| (s.spread_angle, s.pellet_count));
                pellet_directions(aim, spread, pellets)
            }
            _ => vec![aim],
        };

        let slot = &mut self.slots[self.current];
        slot.clip_ammo -= 1;
        self.cooldown = slot.fire_rate();
        if slot.clip_ammo == 0 {
            self.handle_empty();
        }

        Trigger::Fired(Volley { kind, dirs, damage })
    }

    /// Trigger released; only the laser cares
    pub fn release_trigger(&mut self) {
        if self.current_kind() == WeaponKind::Laser {
            self.stop_laser();
        }
    }

    fn stop_laser(&mut self) {
        self.laser.active = false;
        self.laser.pulse_timer = 0.0;
        self.laser.segment = None;
    }

    /// Out of clip ammo: reload if possible, otherwise switch to a weapon that
    /// still has ammo. Returns the kind switched to.
    fn handle_empty(&mut self) -> Option<WeaponKind> {
        if self.current_slot().clip_ammo > 0 {
            return None;
        }
        if self.start_reload() {
            return None;
        }
        if self.current_slot().reserve_ammo > 0 {
            // Reload already pending
            return None;
        }
        let next = (0..self.slots.len())
            .map(|offset| (self.current + offset) % self.slots.len())
            .find(|&i| i != self.current && self.slots[i].has_ammo())?;

        self.stop_laser();
        self.current = next;
        let kind = self.current_kind();
        log::debug!("Out of ammo, switched to {}", kind.as_str());
        if self.current_slot().clip_ammo == 0 {
            self.start_reload();
        }
        Some(kind)
    }

    /// Advance timers and fire laser pulses
    pub fn update(&mut self, dt: f32, tuning: &WeaponTuning) -> LoadoutUpdate {
        let mut out = LoadoutUpdate::default();

        self.cooldown = (self.cooldown - dt).max(0.0);

        if let Some(reload) = &mut self.reload {
            reload.remaining -= dt;
            if reload.remaining <= 0.0 {
                let slot_index = reload.slot;
                self.reload = None;
                if let Some(slot) = self.slots.get_mut(slot_index) {
                    let moved = slot.refill_clip();
                    log::debug!("Reloaded {} (+{})", slot.kind.as_str(), moved);
                    out.reloaded = Some(slot.kind);
                }
            }
        }

        if self.laser.active {
            if self.current_kind() != WeaponKind::Laser || self.reload.is_some() {
                self.stop_laser();
                return out;
            }
            self.laser.pulse_timer -= dt;
            if self.laser.pulse_timer <= 0.0 {
                self.laser.pulse_timer += tuning.laser_fire_rate;
                let slot = &mut self.slots[self.current];
                slot.clip_ammo = slot.clip_ammo.saturating_sub(1);
                out.laser_pulse = Some(self.current_damage * tuning.laser_damage_multiplier);
                if self.current_slot().clip_ammo == 0 {
                    self.stop_laser();
                    out.auto_switched = self.handle_empty();
                }
            }
        }

        out
    }
}

/// Evenly fan `count` pellets across a `spread` degree cone around `aim`
pub fn pellet_directions(aim: Vec2, spread: f32, count: u32) -> Vec<Vec2> {
    if count <= 1 {
        return vec![aim];
    }
    (0..count)
        .map(|i| {
            let angle = -spread * 0.5 + spread * i as f32 / (count - 1) as f32;
            rotate_deg(aim, angle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> WeaponTuning {
        WeaponTuning::default()
    }

    fn shotgun() -> WeaponSlot {
        WeaponSlot::full(WeaponKind::Shotgun, Some(WeaponStats::shotgun()), 100, 300)
    }

    fn laser() -> WeaponSlot {
        WeaponSlot::full(WeaponKind::Laser, Some(WeaponStats::laser()), 100, 300)
    }

    #[test]
    fn test_starts_with_full_pistol() {
        let loadout = Loadout::new(&tuning());
        assert_eq!(loadout.slots.len(), 1);
        let slot = loadout.current_slot();
        assert_eq!(slot.kind, WeaponKind::Pistol);
        assert_eq!(slot.clip_ammo, 12);
        assert_eq!(slot.reserve_ammo, 120);
    }

    #[test]
    fn test_add_weapon_rules() {
        let mut loadout = Loadout::new(&tuning());
        let pistol = loadout.current_slot().clone();
        assert_eq!(loadout.add_weapon(pistol), AddWeaponOutcome::Duplicate);
        assert_eq!(loadout.add_weapon(shotgun()), AddWeaponOutcome::Added);
        assert_eq!(loadout.add_weapon(laser()), AddWeaponOutcome::SlotsFull);
        assert_eq!(loadout.slots.len(), 2);
    }

    #[test]
    fn test_replace_out_of_range_is_ignored() {
        let mut loadout = Loadout::new(&tuning());
        assert!(!loadout.replace_weapon(3, laser()));
        assert!(loadout.replace_weapon(0, laser()));
        assert_eq!(loadout.current_kind(), WeaponKind::Laser);
    }

    #[test]
    fn test_switch_cycles() {
        let mut loadout = Loadout::new(&tuning());
        loadout.switch_weapon();
        assert_eq!(loadout.current, 0);
        loadout.add_weapon(shotgun());
        loadout.switch_weapon();
        assert_eq!(loadout.current_kind(), WeaponKind::Shotgun);
        assert_eq!(loadout.secondary_kind(), Some(WeaponKind::Pistol));
        loadout.switch_weapon();
        assert_eq!(loadout.current_kind(), WeaponKind::Pistol);
    }

    #[test]
    fn test_pistol_fires_one_and_respects_cooldown() {
        let t = tuning();
        let mut loadout = Loadout::new(&t);
        let Trigger::Fired(volley) = loadout.press_trigger(Vec2::X) else {
            panic!("pistol should fire");
        };
        assert_eq!(volley.dirs.len(), 1);
        assert_eq!(volley.damage, 5);
        assert_eq!(loadout.current_slot().clip_ammo, 11);
        assert_eq!(loadout.press_trigger(Vec2::X), Trigger::CoolingDown);
        loadout.update(0.3, &t);
        assert!(matches!(loadout.press_trigger(Vec2::X), Trigger::Fired(_)));
    }

    #[test]
    fn test_damage_bonus_applies_to_stats_damage() {
        let mut loadout = Loadout::new(&tuning());
        loadout.increase_damage(3);
        assert_eq!(loadout.shot_damage(), 8);
    }

    #[test]
    fn test_shotgun_spread_and_single_clip_cost() {
        let mut loadout = Loadout::new(&tuning());
        loadout.replace_weapon(0, shotgun());
        let Trigger::Fired(volley) = loadout.press_trigger(Vec2::X) else {
            panic!("shotgun should fire");
        };
        assert_eq!(volley.dirs.len(), 5);
        assert_eq!(loadout.current_slot().clip_ammo, 5);
        let first = volley.dirs[0].to_angle().to_degrees();
        let last = volley.dirs[4].to_angle().to_degrees();
        assert!((first + 7.5).abs() < 1e-3);
        assert!((last - 7.5).abs() < 1e-3);
    }

    #[test]
    fn test_single_pellet_goes_straight() {
        assert_eq!(pellet_directions(Vec2::Y, 30.0, 1), vec![Vec2::Y]);
    }

    #[test]
    fn test_empty_clip_starts_reload_then_refills() {
        let t = tuning();
        let mut loadout = Loadout::new(&t);
        loadout.slots[0].clip_ammo = 1;
        loadout.slots[0].reserve_ammo = 5;
        assert!(matches!(loadout.press_trigger(Vec2::X), Trigger::Fired(_)));
        assert!(loadout.is_reloading());
        assert_eq!(loadout.press_trigger(Vec2::X), Trigger::Reloading);

        let update = loadout.update(1.1, &t);
        assert_eq!(update.reloaded, Some(WeaponKind::Pistol));
        assert_eq!(loadout.current_slot().clip_ammo, 5);
        assert_eq!(loadout.current_slot().reserve_ammo, 0);
    }

    #[test]
    fn test_manual_reload_needs_room_and_reserve() {
        let mut loadout = Loadout::new(&tuning());
        assert!(!loadout.start_reload(), "full clip");
        loadout.slots[0].clip_ammo = 3;
        assert!(loadout.start_reload());
        loadout.slots[0].reserve_ammo = 0;
        loadout.reload = None;
        assert!(!loadout.start_reload(), "no reserve");
    }

    #[test]
    fn test_reload_takes_held_weapon_time() {
        let mut loadout = Loadout::new(&tuning());
        loadout.slots[0].clip_ammo = 0;
        let expected = loadout.slots[0].reload_time();
        assert!(loadout.start_reload());
        let reload = loadout.reload.expect("reload started");
        assert_eq!(reload.slot, 0);
        assert_eq!(reload.remaining, expected);
    }

    #[test]
    fn test_switch_cancels_reload() {
        let mut loadout = Loadout::new(&tuning());
        loadout.add_weapon(shotgun());
        loadout.slots[0].clip_ammo = 0;
        loadout.start_reload();
        loadout.switch_weapon();
        assert!(!loadout.is_reloading());
        assert_eq!(loadout.slots[0].clip_ammo, 0);
    }

    #[test]
    fn test_dry_weapon_auto_switches() {
        let mut loadout = Loadout::new(&tuning());
        loadout.add_weapon(shotgun());
        loadout.slots[0].clip_ammo = 1;
        loadout.slots[0].reserve_ammo = 0;
        assert!(matches!(loadout.press_trigger(Vec2::X), Trigger::Fired(_)));
        assert_eq!(loadout.current_kind(), WeaponKind::Shotgun);
    }

    #[test]
    fn test_completely_dry_reports_empty() {
        let mut loadout = Loadout::new(&tuning());
        loadout.slots[0].clip_ammo = 0;
        loadout.slots[0].reserve_ammo = 0;
        assert_eq!(loadout.press_trigger(Vec2::X), Trigger::Empty);
        assert_eq!(loadout.current_kind(), WeaponKind::Pistol);
    }

    #[test]
    fn test_laser_pulses_while_held() {
        let t = tuning();
        let mut loadout = Loadout::new(&t);
        loadout.replace_weapon(0, laser());
        assert_eq!(loadout.press_trigger(Vec2::X), Trigger::LaserOn);

        let first = loadout.update(0.02, &t);
        assert_eq!(first.laser_pulse, Some(2));
        assert_eq!(loadout.current_slot().clip_ammo, 49);

        // Next pulse 0.1s later
        let mut pulses = 0;
        for _ in 0..5 {
            if loadout.update(0.02, &t).laser_pulse.is_some() {
                pulses += 1;
            }
        }
        assert_eq!(pulses, 1);

        loadout.release_trigger();
        assert!(!loadout.laser.active);
        assert!(loadout.update(0.5, &t).laser_pulse.is_none());
    }

    #[test]
    fn test_laser_stops_when_clip_runs_out() {
        let t = tuning();
        let mut loadout = Loadout::new(&t);
        loadout.replace_weapon(0, laser());
        loadout.slots[0].clip_ammo = 1;
        loadout.press_trigger(Vec2::X);
        let update = loadout.update(0.02, &t);
        assert!(update.laser_pulse.is_some());
        assert!(!loadout.laser.active);
        assert!(loadout.is_reloading());
    }
}
