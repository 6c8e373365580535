//! Best-runs leaderboard
//!
//! Persisted as JSON next to the binary (or wherever `--records` points),
//! tracks the top 10 runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stats::Summary;

/// Maximum number of runs to keep
pub const MAX_RECORDS: usize = 10;

/// A single finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Highest wave reached
    pub wave: u32,
    pub kills: u32,
    pub damage_dealt: f32,
    /// Seconds survived
    pub time_survived: f32,
    /// Run seed, so a record can be replayed
    pub seed: u64,
}

impl RunRecord {
    pub fn from_summary(summary: &Summary, seed: u64) -> Self {
        Self {
            wave: summary.highest_wave,
            kills: summary.enemies_defeated,
            damage_dealt: summary.damage_dealt,
            time_survived: summary.time_survived,
            seed,
        }
    }

    /// True if this run ranks above `other`
    fn beats(&self, other: &RunRecord) -> bool {
        (self.wave, self.kills) > (other.wave, other.kills)
    }
}

/// Leaderboard, best first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Records {
    pub entries: Vec<RunRecord>,
}

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a run makes the board
    pub fn qualifies(&self, run: &RunRecord) -> bool {
        if run.wave == 0 {
            return false;
        }
        if self.entries.len() < MAX_RECORDS {
            return true;
        }
        self.entries.last().is_none_or(|last| run.beats(last))
    }

    /// Add a run. Returns the rank achieved (1-indexed), None if it didn't qualify.
    pub fn add(&mut self, run: RunRecord) -> Option<usize> {
        if !self.qualifies(&run) {
            return None;
        }

        // Ties go after existing entries
        let pos = self
            .entries
            .iter()
            .position(|e| run.beats(e))
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, run);
        self.entries.truncate(MAX_RECORDS);

        Some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best run so far
    pub fn best(&self) -> Option<&RunRecord> {
        self.entries.first()
    }

    /// Load from disk. A missing file is an empty board.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No records at {}, starting fresh", path.display());
            return Ok(Self::new());
        }

        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut records: Records = serde_json::from_str(&json)?;
        records.entries.truncate(MAX_RECORDS);
        log::info!("Loaded {} records", records.entries.len());
        Ok(records)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))?;
        log::info!("Records saved ({} entries)", self.entries.len());
        Ok(())
    }
}
