//! Status effects on enemies and lingering smoke clouds

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Timed conditions on an enemy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    /// Seconds of stun left
    pub stun: f32,
    /// Seconds of blindness left
    pub blind: f32,
    /// Number of smoke clouds the enemy is inside
    pub smoke_count: u32,
}

impl StatusEffects {
    /// Stun for `seconds`, restarting any running stun
    pub fn stun(&mut self, seconds: f32) {
        self.stun = seconds.max(0.0);
    }

    /// Blind for `seconds` unless already blinded
    pub fn blind(&mut self, seconds: f32) {
        if !self.is_blinded() {
            self.blind = seconds.max(0.0);
        }
    }

    pub fn enter_smoke(&mut self) {
        self.smoke_count += 1;
    }

    pub fn exit_smoke(&mut self) {
        self.smoke_count = self.smoke_count.saturating_sub(1);
    }

    pub fn is_stunned(&self) -> bool {
        self.stun > 0.0
    }

    pub fn is_blinded(&self) -> bool {
        self.blind > 0.0
    }

    pub fn in_smoke(&self) -> bool {
        self.smoke_count > 0
    }

    /// Count timers down
    pub fn tick(&mut self, dt: f32) {
        self.stun = (self.stun - dt).max(0.0);
        self.blind = (self.blind - dt).max(0.0);
    }
}

/// Change in smoke membership for one enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmokeChange {
    Enter(u32),
    Exit(u32),
}

/// A smoke cloud left by a smoke grenade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmokeArea {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Seconds until the cloud clears
    pub remaining: f32,
    /// Enemies currently inside (sorted)
    pub inside: Vec<u32>,
}

impl SmokeArea {
    pub fn new(id: u32, pos: Vec2, radius: f32, duration: f32) -> Self {
        Self {
            id,
            pos,
            radius,
            remaining: duration,
            inside: Vec::new(),
        }
    }

    pub fn expired(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Age the cloud and diff which enemies (id, position) are inside.
    ///
    /// Once expired, every enemy still tracked gets an exit.
    pub fn update(&mut self, dt: f32, enemies: &[(u32, Vec2)]) -> Vec<SmokeChange> {
        self.remaining -= dt;

        if self.expired() {
            return self.inside.drain(..).map(SmokeChange::Exit).collect();
        }

        let mut now: Vec<u32> = enemies
            .iter()
            .filter(|(_, p)| p.distance(self.pos) <= self.radius)
            .map(|(id, _)| *id)
            .collect();
        now.sort_unstable();

        let mut changes: Vec<SmokeChange> = self
            .inside
            .iter()
            .filter(|&&id| now.binary_search(&id).is_err())
            .map(|&id| SmokeChange::Exit(id))
            .collect();
        changes.extend(
            now.iter()
                .filter(|&&id| self.inside.binary_search(&id).is_err())
                .map(|&id| SmokeChange::Enter(id)),
        );

        self.inside = now;
        changes
    }
}
