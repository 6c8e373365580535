//! Grenade assets, the two-slot grenade belt and detonation effects
//!
//! The belt holds up to two grenade types. A slot without data holds
//! "untyped" grenades, which detonate with the fallback frag values from
//! tuning. Thrown grenades become `Grenade` entities; when one goes off,
//! `detonate` works out what it does to the enemies around it.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{GRENADE_SLOTS, MIN_AIM_LENGTH_SQ};
use crate::tuning::GrenadeTuning;
use crate::{clamp01, dir_from_deg};

/// Detonation behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GrenadeVariant {
    #[default]
    Frag,
    Flashbang,
    Smoke,
    Sticky,
    Cluster,
}

impl GrenadeVariant {
    /// Sticky and smoke grenades never go off on impact
    pub fn detonates_on_impact(&self) -> bool {
        !matches!(self, GrenadeVariant::Sticky | GrenadeVariant::Smoke)
    }
}

/// Grenade asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrenadeData {
    pub display_name: String,
    pub icon: Option<String>,
    pub variant: GrenadeVariant,

    pub fuse_time: f32,
    pub upward_bias: f32,
    pub throw_force: f32,

    pub damage: i32,
    pub explosion_radius: f32,
    pub explosion_force: f32,

    pub cluster_count: u32,
    pub cluster_spread: f32,
    /// Grenade spawned for each cluster fragment
    pub cluster_fragment: Option<Box<GrenadeData>>,

    pub flash_stun_duration: f32,

    /// Lifetime of lingering effects (smoke)
    pub effect_duration: f32,
}

impl Default for GrenadeData {
    fn default() -> Self {
        Self {
            display_name: "Grenade".to_string(),
            icon: None,
            variant: GrenadeVariant::Frag,
            fuse_time: 2.0,
            upward_bias: 0.5,
            throw_force: 8.0,
            damage: 25,
            explosion_radius: 2.0,
            explosion_force: 300.0,
            cluster_count: 6,
            cluster_spread: 2.0,
            cluster_fragment: None,
            flash_stun_duration: 2.0,
            effect_duration: 1.5,
        }
    }
}

impl GrenadeData {
    pub fn frag() -> Self {
        Self {
            display_name: "Frag".to_string(),
            icon: Some("grenade_frag".to_string()),
            ..Self::default()
        }
    }

    pub fn flashbang() -> Self {
        Self {
            display_name: "Flashbang".to_string(),
            icon: Some("grenade_flash".to_string()),
            variant: GrenadeVariant::Flashbang,
            fuse_time: 1.5,
            damage: 0,
            explosion_radius: 3.5,
            ..Self::default()
        }
    }

    pub fn smoke() -> Self {
        Self {
            display_name: "Smoke".to_string(),
            icon: Some("grenade_smoke".to_string()),
            variant: GrenadeVariant::Smoke,
            fuse_time: 1.0,
            damage: 0,
            explosion_radius: 3.0,
            effect_duration: 5.0,
            ..Self::default()
        }
    }

    pub fn sticky() -> Self {
        Self {
            display_name: "Sticky".to_string(),
            icon: Some("grenade_sticky".to_string()),
            variant: GrenadeVariant::Sticky,
            fuse_time: 2.5,
            damage: 30,
            explosion_radius: 1.8,
            ..Self::default()
        }
    }

    pub fn cluster() -> Self {
        Self {
            display_name: "Cluster".to_string(),
            icon: Some("grenade_cluster".to_string()),
            variant: GrenadeVariant::Cluster,
            cluster_fragment: Some(Box::new(Self::fragment())),
            ..Self::default()
        }
    }

    /// Small frag thrown out by a cluster grenade
    pub fn fragment() -> Self {
        Self {
            display_name: "Fragment".to_string(),
            fuse_time: 0.6,
            damage: 10,
            explosion_radius: 1.2,
            explosion_force: 150.0,
            ..Self::default()
        }
    }

    /// Values used by grenades thrown without data
    pub fn fallback(tuning: &GrenadeTuning) -> Self {
        Self {
            display_name: "Grenade".to_string(),
            variant: GrenadeVariant::Frag,
            fuse_time: tuning.fallback_fuse_time,
            upward_bias: tuning.upward_bias,
            throw_force: tuning.throw_force,
            damage: tuning.fallback_damage,
            explosion_radius: tuning.fallback_radius,
            explosion_force: tuning.fallback_force,
            ..Self::default()
        }
    }

    /// Slot identity: two assets stack when they share name and variant
    pub fn same_type(&self, other: &GrenadeData) -> bool {
        self.display_name == other.display_name && self.variant == other.variant
    }
}

/// One belt slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrenadeSlot {
    /// None = untyped grenades
    pub data: Option<GrenadeData>,
    pub count: u32,
}

impl GrenadeSlot {
    pub fn has_grenades(&self) -> bool {
        self.count > 0
    }
}

/// A grenade taken off the belt
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedGrenade {
    pub slot: usize,
    /// None for untyped grenades
    pub data: Option<GrenadeData>,
}

/// Two grenade slots with a selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrenadeBelt {
    pub slots: [GrenadeSlot; GRENADE_SLOTS],
    pub max_per_slot: u32,
    /// None when no slot holds grenades
    pub selected: Option<usize>,
}

impl GrenadeBelt {
    pub fn new(max_per_slot: u32) -> Self {
        Self {
            slots: Default::default(),
            max_per_slot,
            selected: None,
        }
    }

    pub fn total(&self) -> u32 {
        self.slots.iter().map(|s| s.count).sum()
    }

    fn stocked(&self) -> (bool, bool) {
        (self.slots[0].has_grenades(), self.slots[1].has_grenades())
    }

    /// Pick a sensible default selection from the slot contents
    pub fn initialize_selection(&mut self) {
        self.selected = match self.stocked() {
            (true, false) => Some(0),
            (false, true) => Some(1),
            (true, true) => Some(0),
            (false, false) => None,
        };
    }

    /// Swap between stocked slots
    pub fn toggle_selection(&mut self) {
        self.selected = match self.stocked() {
            (false, false) => None,
            (true, true) => Some(if self.selected == Some(0) { 1 } else { 0 }),
            (true, false) => Some(0),
            (false, true) => Some(1),
        };
        log::debug!("Grenade selection -> {:?}", self.selected);
    }

    /// Add grenades without a type
    pub fn add_untyped(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        let cap = self.max_per_slot;

        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.data.is_none() && s.count < cap)
        {
            slot.count = cap.min(slot.count + amount);
        } else {
            self.slots[0] = GrenadeSlot {
                data: None,
                count: cap.min(amount),
            };
        }
        self.initialize_selection();
    }

    /// Add grenades of a specific type
    pub fn add_typed(&mut self, data: &GrenadeData, amount: u32) {
        if amount == 0 {
            return;
        }
        let cap = self.max_per_slot;

        if let Some((i, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.data.as_ref().is_some_and(|d| d.same_type(data)))
        {
            slot.count = cap.min(slot.count + amount);
            log::debug!("Added {}x {} to slot {}, now {}", amount, data.display_name, i, slot.count);
        } else if let Some((i, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.count == 0 || s.data.is_none())
        {
            *slot = GrenadeSlot {
                data: Some(data.clone()),
                count: cap.min(amount),
            };
            log::debug!("Assigned {}x {} to slot {}", amount, data.display_name, i);
        } else {
            self.slots[0] = GrenadeSlot {
                data: Some(data.clone()),
                count: cap.min(amount),
            };
            log::debug!("Replaced slot 0 with {}x {}", amount, data.display_name);
        }
        self.initialize_selection();
    }

    /// Take one grenade, preferring the selected slot
    pub fn try_consume(&mut self) -> Option<ConsumedGrenade> {
        if let Some(i) = self.selected.filter(|&i| self.slots[i].has_grenades()) {
            let slot = &mut self.slots[i];
            slot.count -= 1;
            let data = slot.data.clone();
            if slot.count == 0 {
                slot.data = None;
                let other = 1 - i;
                self.selected = self.slots[other].has_grenades().then_some(other);
            }
            return Some(ConsumedGrenade { slot: i, data });
        }

        let i = self.slots.iter().position(GrenadeSlot::has_grenades)?;
        let slot = &mut self.slots[i];
        slot.count -= 1;
        let data = slot.data.clone();
        if slot.count == 0 {
            slot.data = None;
        }
        self.initialize_selection();
        Some(ConsumedGrenade { slot: i, data })
    }
}

/// Where a sticky grenade is stuck
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Attachment {
    /// Riding an enemy at a fixed offset
    Enemy { id: u32, offset: Vec2 },
    /// Stuck to a wall or obstacle
    Static,
}

/// A live grenade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grenade {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub data: GrenadeData,
    /// Seconds until detonation
    pub fuse: f32,
    pub attached: Option<Attachment>,
    pub exploded: bool,
}

impl Grenade {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, data: GrenadeData) -> Self {
        Self {
            id,
            pos,
            vel,
            fuse: data.fuse_time,
            data,
            attached: None,
            exploded: false,
        }
    }

    /// React to hitting something. Returns true if it should explode now.
    pub fn on_impact(&mut self, relative_speed: f32, hit: Attachment, tuning: &GrenadeTuning) -> bool {
        if tuning.explode_on_impact
            && relative_speed >= tuning.impact_threshold
            && self.data.variant.detonates_on_impact()
        {
            return true;
        }
        if self.data.variant == GrenadeVariant::Sticky && self.attached.is_none() {
            self.vel = Vec2::ZERO;
            self.attached = Some(hit);
        }
        false
    }
}

/// Spawn position and launch velocity of a throw
pub fn throw_grenade(
    player_pos: Vec2,
    aim_point: Vec2,
    data: Option<&GrenadeData>,
    tuning: &GrenadeTuning,
) -> (Vec2, Vec2) {
    let spawn = player_pos + Vec2::Y * tuning.spawn_offset;

    let mut dir = aim_point - spawn;
    if dir.length_squared() < MIN_AIM_LENGTH_SQ {
        dir = Vec2::Y;
    }
    let dir = dir.normalize();

    let bias = data.map_or(tuning.upward_bias, |d| d.upward_bias);
    let dir = (dir + Vec2::Y * bias).normalize_or(Vec2::Y);

    let force = data.map_or(tuning.throw_force, |d| d.throw_force);
    (spawn, dir * force)
}

/// One enemy caught by a frag blast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlastHit {
    pub enemy: u32,
    pub damage: i32,
    /// Impulse (force units) pushing the enemy away from the blast
    pub impulse: Vec2,
}

/// Fragment to spawn from a cluster grenade
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpawn {
    pub pos: Vec2,
    pub vel: Vec2,
    pub data: GrenadeData,
}

/// What a detonation does
#[derive(Debug, Clone, PartialEq)]
pub enum Detonation {
    Blast(Vec<BlastHit>),
    Flash { enemies: Vec<u32>, seconds: f32 },
    Smoke { pos: Vec2, radius: f32, duration: f32 },
    Cluster(Vec<FragmentSpawn>),
}

/// Resolve a grenade going off at `pos` against enemies given as (id, position, body radius).
/// An enemy is caught when its body overlaps the blast circle.
pub fn detonate<R: Rng>(data: &GrenadeData, pos: Vec2, enemies: &[(u32, Vec2, f32)], rng: &mut R) -> Detonation {
    let radius = data.explosion_radius;
    let in_radius = enemies
        .iter()
        .filter(move |(_, p, body)| p.distance(pos) <= radius + body.max(0.0))
        .map(|&(id, p, _)| (id, p));

    match data.variant {
        GrenadeVariant::Frag | GrenadeVariant::Sticky => {
            let hits = in_radius
                .map(|(id, p)| {
                    let offset = p - pos;
                    let dist = offset.length().max(0.01);
                    let falloff = clamp01(1.0 - dist / radius);
                    let damage = ((data.damage as f32 * falloff).round_ties_even() as i32).max(1);
                    BlastHit {
                        enemy: id,
                        damage,
                        impulse: offset.normalize_or_zero() * data.explosion_force * falloff,
                    }
                })
                .collect();
            Detonation::Blast(hits)
        }
        GrenadeVariant::Flashbang => Detonation::Flash {
            enemies: in_radius.map(|(id, _)| id).collect(),
            seconds: data.flash_stun_duration,
        },
        GrenadeVariant::Smoke => Detonation::Smoke {
            pos,
            radius: data.explosion_radius,
            duration: data.effect_duration,
        },
        GrenadeVariant::Cluster => {
            let Some(fragment) = data.cluster_fragment.as_deref() else {
                log::warn!("Cluster grenade `{}` has no fragment data", data.display_name);
                return Detonation::Cluster(Vec::new());
            };
            let count = data.cluster_count.max(1);
            let spread = data.cluster_spread.abs();
            let fragments = (0..data.cluster_count)
                .map(|i| {
                    let jitter = if spread > 0.0 {
                        rng.random_range(-spread..=spread)
                    } else {
                        0.0
                    };
                    let angle = 360.0 / count as f32 * i as f32 + jitter;
                    FragmentSpawn {
                        pos,
                        vel: dir_from_deg(angle) * (data.throw_force * 0.5),
                        data: fragment.clone(),
                    }
                })
                .collect();
            Detonation::Cluster(fragments)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn belt() -> GrenadeBelt {
        GrenadeBelt::new(100)
    }

    #[test]
    fn test_initialize_selection_table() {
        let mut b = belt();
        b.initialize_selection();
        assert_eq!(b.selected, None);
        b.slots[1].count = 2;
        b.initialize_selection();
        assert_eq!(b.selected, Some(1));
        b.slots[0].count = 1;
        b.initialize_selection();
        assert_eq!(b.selected, Some(0));
    }

    #[test]
    fn test_toggle_between_stocked_slots() {
        let mut b = belt();
        b.add_typed(&GrenadeData::frag(), 2);
        b.add_typed(&GrenadeData::smoke(), 2);
        assert_eq!(b.selected, Some(0));
        b.toggle_selection();
        assert_eq!(b.selected, Some(1));
        b.toggle_selection();
        assert_eq!(b.selected, Some(0));
    }

    #[test]
    fn test_toggle_with_one_slot_picks_it() {
        let mut b = belt();
        b.slots[1].count = 3;
        b.toggle_selection();
        assert_eq!(b.selected, Some(1));
        b.slots[1].count = 0;
        b.toggle_selection();
        assert_eq!(b.selected, None);
    }

    #[test]
    fn test_add_untyped_fills_then_replaces_slot_zero() {
        let mut b = belt();
        b.add_untyped(0);
        assert_eq!(b.total(), 0);
        b.add_untyped(3);
        assert_eq!(b.slots[0].count, 3);
        assert_eq!(b.selected, Some(0));

        // Both slots typed and stocked: slot 0 is replaced
        b.slots[0] = GrenadeSlot { data: Some(GrenadeData::smoke()), count: 4 };
        b.slots[1] = GrenadeSlot { data: Some(GrenadeData::frag()), count: 1 };
        b.add_untyped(2);
        assert_eq!(b.slots[0], GrenadeSlot { data: None, count: 2 });
        assert_eq!(b.slots[1].count, 1);
    }

    #[test]
    fn test_add_untyped_caps_count() {
        let mut b = belt();
        b.add_untyped(90);
        b.add_untyped(50);
        assert_eq!(b.slots[0].count, 100);
    }

    #[test]
    fn test_add_typed_stacks_same_type() {
        let mut b = belt();
        b.add_typed(&GrenadeData::frag(), 3);
        b.add_typed(&GrenadeData::frag(), 4);
        assert_eq!(b.slots[0].count, 7);
        assert_eq!(b.slots[1].count, 0);
    }

    #[test]
    fn test_add_typed_third_type_replaces_slot_zero() {
        let mut b = belt();
        b.add_typed(&GrenadeData::frag(), 3);
        b.add_typed(&GrenadeData::smoke(), 3);
        b.add_typed(&GrenadeData::flashbang(), 250);
        assert_eq!(b.slots[0].data.as_ref().unwrap().variant, GrenadeVariant::Flashbang);
        assert_eq!(b.slots[0].count, 100);
        assert_eq!(b.slots[1].data.as_ref().unwrap().variant, GrenadeVariant::Smoke);
    }

    #[test]
    fn test_consume_from_selected_and_move_selection() {
        let mut b = belt();
        b.add_typed(&GrenadeData::frag(), 1);
        b.add_typed(&GrenadeData::smoke(), 2);
        b.toggle_selection();
        assert_eq!(b.selected, Some(1));

        let c = b.try_consume().unwrap();
        assert_eq!(c.slot, 1);
        assert_eq!(c.data.unwrap().variant, GrenadeVariant::Smoke);
        b.try_consume();
        assert_eq!(b.slots[1].data, None, "emptied slot loses its type");
        assert_eq!(b.selected, Some(0));

        b.try_consume();
        assert_eq!(b.selected, None);
        assert!(b.try_consume().is_none());
    }

    #[test]
    fn test_consume_fallback_when_nothing_selected() {
        let mut b = belt();
        b.slots[1] = GrenadeSlot { data: None, count: 1 };
        b.selected = None;
        let c = b.try_consume().expect("untyped grenade still counts");
        assert_eq!(c.slot, 1);
        assert!(c.data.is_none());
        assert_eq!(b.total(), 0);
        assert_eq!(b.selected, None);
    }

    #[test]
    fn test_throw_direction_with_bias() {
        let tuning = GrenadeTuning::default();
        let (spawn, vel) = throw_grenade(Vec2::ZERO, Vec2::new(10.0, 0.6), None, &tuning);
        assert_eq!(spawn, Vec2::new(0.0, 0.6));
        let expected = (Vec2::X + Vec2::Y * 0.5).normalize() * 8.0;
        assert!((vel - expected).length() < 1e-4);
    }

    #[test]
    fn test_throw_at_own_feet_goes_up() {
        let tuning = GrenadeTuning::default();
        let data = GrenadeData { throw_force: 4.0, ..GrenadeData::frag() };
        let (spawn, vel) = throw_grenade(Vec2::ZERO, Vec2::new(0.0, 0.6), Some(&data), &tuning);
        assert!((vel - Vec2::Y * 4.0).length() < 1e-4);
        assert_eq!(spawn.y, 0.6);
    }

    #[test]
    fn test_frag_damage_falloff_and_minimum() {
        let mut rng = Pcg32::seed_from_u64(1);
        let data = GrenadeData::frag();
        let enemies = [
            (1, Vec2::new(0.5, 0.0), 0.0),
            (2, Vec2::new(1.99, 0.0), 0.0),
            (3, Vec2::new(5.0, 0.0), 0.0),
        ];
        let Detonation::Blast(hits) = detonate(&data, Vec2::ZERO, &enemies, &mut rng) else {
            panic!("frag should blast");
        };
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].enemy, 1);
        assert_eq!(hits[0].damage, 19); // 25 * 0.75 = 18.75
        assert_eq!(hits[1].damage, 1);
        assert!(hits[0].impulse.x > 0.0);
    }

    #[test]
    fn test_frag_half_falloff_rounds_to_even() {
        let mut rng = Pcg32::seed_from_u64(1);
        let data = GrenadeData::frag();
        let Detonation::Blast(hits) = detonate(&data, Vec2::ZERO, &[(1, Vec2::new(1.0, 0.0), 0.0)], &mut rng) else {
            panic!("frag should blast");
        };
        assert_eq!(hits[0].damage, 12); // 25 * 0.5 = 12.5
    }

    #[test]
    fn test_blast_catches_overlapping_bodies() {
        let mut rng = Pcg32::seed_from_u64(1);
        let data = GrenadeData::frag();
        let enemies = [(1, Vec2::new(2.3, 0.0), 0.5), (2, Vec2::new(2.3, 0.0), 0.2)];
        let Detonation::Blast(hits) = detonate(&data, Vec2::ZERO, &enemies, &mut rng) else {
            panic!("frag should blast");
        };
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].enemy, 1);
        assert_eq!(hits[0].damage, 1);
        assert_eq!(hits[0].impulse, Vec2::ZERO);
    }

    #[test]
    fn test_flashbang_targets_in_radius() {
        let mut rng = Pcg32::seed_from_u64(1);
        let data = GrenadeData::flashbang();
        let enemies = [(4, Vec2::new(3.0, 0.0), 0.0), (5, Vec2::new(9.0, 0.0), 0.0)];
        let d = detonate(&data, Vec2::ZERO, &enemies, &mut rng);
        assert_eq!(d, Detonation::Flash { enemies: vec![4], seconds: 2.0 });
    }

    #[test]
    fn test_smoke_spawns_area() {
        let mut rng = Pcg32::seed_from_u64(1);
        let d = detonate(&GrenadeData::smoke(), Vec2::ONE, &[], &mut rng);
        assert_eq!(d, Detonation::Smoke { pos: Vec2::ONE, radius: 3.0, duration: 5.0 });
    }

    #[test]
    fn test_cluster_fragments() {
        let mut rng = Pcg32::seed_from_u64(7);
        let Detonation::Cluster(frags) = detonate(&GrenadeData::cluster(), Vec2::ZERO, &[], &mut rng) else {
            panic!("cluster should split");
        };
        assert_eq!(frags.len(), 6);
        for f in &frags {
            assert!((f.vel.length() - 4.0).abs() < 1e-4);
            assert_eq!(f.data.display_name, "Fragment");
        }
        // Second fragment near 60 degrees (+-2)
        let angle = frags[1].vel.to_angle().to_degrees();
        assert!((angle - 60.0).abs() <= 2.0 + 1e-3);
    }

    #[test]
    fn test_cluster_without_fragment_spawns_nothing() {
        let mut rng = Pcg32::seed_from_u64(7);
        let data = GrenadeData { cluster_fragment: None, ..GrenadeData::cluster() };
        assert_eq!(detonate(&data, Vec2::ZERO, &[], &mut rng), Detonation::Cluster(Vec::new()));
    }

    #[test]
    fn test_impact_rules() {
        let tuning = GrenadeTuning::default();
        let mut frag = Grenade::new(1, Vec2::ZERO, Vec2::X * 8.0, GrenadeData::frag());
        assert!(frag.on_impact(7.0, Attachment::Static, &tuning));
        assert!(!frag.on_impact(2.0, Attachment::Static, &tuning));

        let mut sticky = Grenade::new(2, Vec2::ZERO, Vec2::X * 8.0, GrenadeData::sticky());
        assert!(!sticky.on_impact(9.0, Attachment::Enemy { id: 3, offset: Vec2::ZERO }, &tuning));
        assert_eq!(sticky.vel, Vec2::ZERO);
        assert!(matches!(sticky.attached, Some(Attachment::Enemy { id: 3, .. })));

        let mut smoke = Grenade::new(3, Vec2::ZERO, Vec2::X, GrenadeData::smoke());
        assert!(!smoke.on_impact(20.0, Attachment::Static, &tuning));
        assert!(smoke.attached.is_none());
    }
}
