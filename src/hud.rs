//! HUD view model
//!
//! A snapshot of everything the on-screen HUD shows, built from the game
//! state after each tick. Layout and drawing are up to the front end.

use glam::Vec2;

use crate::clamp01;
use crate::sim::grenades::GrenadeBelt;
use crate::sim::{GameState, WeaponKind};

/// Health bar and its labels
#[derive(Debug, Clone, PartialEq)]
pub struct HealthView {
    /// Bar fill in [0, 1]
    pub normalized: f32,
    pub current_text: String,
    pub max_text: String,
}

impl HealthView {
    pub fn new(current: f32, max: f32) -> Self {
        let normalized = if max > 0.0 { clamp01(current / max) } else { 0.0 };
        Self {
            normalized,
            current_text: (current.round_ties_even() as i64).to_string(),
            max_text: (max.round_ties_even() as i64).to_string(),
        }
    }
}

/// Held weapon panel
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponView {
    pub kind: WeaponKind,
    pub clip_text: String,
    pub reserve_text: String,
    /// The other held weapon, if there are two
    pub secondary: Option<WeaponKind>,
    pub reloading: bool,
}

/// One grenade slot on the HUD
#[derive(Debug, Clone, PartialEq)]
pub struct GrenadeSlotView {
    pub icon: Option<String>,
    pub count: u32,
    /// Icon only shows when the slot is stocked and typed
    pub icon_visible: bool,
    /// Empty when the slot holds nothing
    pub count_text: String,
    pub alpha: f32,
}

/// Grenade panel
#[derive(Debug, Clone, PartialEq)]
pub struct GrenadeView {
    pub slots: [GrenadeSlotView; 2],
    /// 0 = none, otherwise the highlighted slot (1-based)
    pub visible_selection: usize,
    /// Throw-key hint; hidden when no grenades are left
    pub control_visible: bool,
    pub control_alpha: f32,
}

/// Which slot the HUD highlights (1-based, 0 for none)
pub fn visible_selection(belt: &GrenadeBelt) -> usize {
    let has = [belt.slots[0].has_grenades(), belt.slots[1].has_grenades()];
    if let Some(i) = belt.selected.filter(|&i| i < has.len() && has[i]) {
        return i + 1;
    }
    match has {
        [true, false] => 1,
        [false, true] => 2,
        _ => 0,
    }
}

impl GrenadeView {
    pub fn new(belt: &GrenadeBelt) -> Self {
        let selection = visible_selection(belt);

        let slot_view = |index: usize| {
            let slot = &belt.slots[index];
            let icon = slot.data.as_ref().and_then(|d| d.icon.clone());
            let stocked = slot.has_grenades();
            let alpha = match (stocked, selection == index + 1) {
                (false, _) => 0.0,
                (true, true) => 1.0,
                (true, false) => 0.5,
            };
            GrenadeSlotView {
                icon_visible: stocked && icon.is_some(),
                icon,
                count: slot.count,
                count_text: if stocked { slot.count.to_string() } else { String::new() },
                alpha,
            }
        };

        let slots = [slot_view(0), slot_view(1)];
        let any = slots.iter().any(|s| s.count > 0);
        Self {
            control_visible: any,
            control_alpha: match (any, selection) {
                (false, _) => 0.0,
                (true, 0) => 0.5,
                (true, _) => 1.0,
            },
            slots,
            visible_selection: selection,
        }
    }
}

/// Everything on screen for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub health: HealthView,
    pub weapon: WeaponView,
    pub grenades: GrenadeView,
    pub wave: u32,
    pub enemies_alive: u32,
    /// (title, description) of each card while the card screen is up
    pub cards: Vec<(String, String)>,
    /// Visible laser beam (start, end)
    pub laser: Option<(Vec2, Vec2)>,
}

impl Hud {
    pub fn from_state(state: &GameState) -> Self {
        let slot = state.loadout.current_slot();
        Self {
            health: HealthView::new(state.player.health, state.player.max_health),
            weapon: WeaponView {
                kind: slot.kind,
                clip_text: slot.clip_ammo.to_string(),
                reserve_text: slot.reserve_ammo.to_string(),
                secondary: state.loadout.secondary_kind(),
                reloading: state.loadout.is_reloading(),
            },
            grenades: GrenadeView::new(&state.grenades),
            wave: state.waves.current_wave,
            enemies_alive: state.waves.enemies_alive,
            cards: state
                .card_screen
                .as_ref()
                .map(|screen| screen.card_texts())
                .unwrap_or_default(),
            laser: state.loadout.laser.segment,
        }
    }
}
