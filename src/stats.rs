//! Session statistics and the defeat screen

use serde::{Deserialize, Serialize};

/// Counters for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub active: bool,
    /// Game time the session started at
    pub started_at: f32,
    pub enemies_defeated: u32,
    pub damage_dealt: f32,
    pub damage_received: f32,
    pub highest_wave: u32,
}

/// Final numbers of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub highest_wave: u32,
    pub enemies_defeated: u32,
    pub damage_dealt: f32,
    pub damage_received: f32,
    /// Seconds
    pub time_survived: f32,
}

impl SessionStats {
    /// Reset counters and start recording
    pub fn start(&mut self, now: f32) {
        *self = Self {
            active: true,
            started_at: now,
            ..Self::default()
        };
    }

    pub fn record_kill(&mut self) {
        if self.active {
            self.enemies_defeated += 1;
        }
    }

    pub fn record_damage_dealt(&mut self, amount: f32) {
        if self.active {
            self.damage_dealt += amount.max(0.0);
        }
    }

    pub fn record_damage_received(&mut self, amount: f32) {
        if self.active {
            self.damage_received += amount.max(0.0);
        }
    }

    pub fn record_wave(&mut self, wave: u32) {
        if self.active {
            self.highest_wave = self.highest_wave.max(wave);
        }
    }

    /// Stop recording; counters stay until the next `start`
    pub fn end(&mut self, now: f32) -> Summary {
        self.active = false;
        Summary {
            highest_wave: self.highest_wave,
            enemies_defeated: self.enemies_defeated,
            damage_dealt: self.damage_dealt,
            damage_received: self.damage_received,
            time_survived: (now - self.started_at).max(0.0),
        }
    }
}

/// Text of the defeat screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoseScreen {
    pub title: String,
    pub wave: String,
    pub enemies: String,
    pub damage_dealt: String,
    pub damage_received: String,
    pub time_survived: String,
}

impl LoseScreen {
    pub fn from_summary(summary: &Summary) -> Self {
        let secs = summary.time_survived.max(0.0) as u64;
        Self {
            title: format!("Defeat\nWave {} Reached", summary.highest_wave),
            wave: format!("Highest wave cleared: {}", summary.highest_wave),
            enemies: format!("Total enemies defeated: {}", summary.enemies_defeated),
            damage_dealt: format!("Total damage dealt: {}", summary.damage_dealt.round_ties_even() as i64),
            damage_received: format!("Total damage received: {}", summary.damage_received.round_ties_even() as i64),
            time_survived: format!("Time survived: {:02}:{:02}", (secs / 60) % 60, secs % 60),
        }
    }

    pub fn lines(&self) -> [&str; 6] {
        [
            &self.title,
            &self.wave,
            &self.enemies,
            &self.damage_dealt,
            &self.damage_received,
            &self.time_survived,
        ]
    }
}
