//! Wave scaling and spawning

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::{EnemyTemplate, WaveTuning};

/// Where and what to spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawn {
    pub pos: Vec2,
    /// Index into the tuning's enemy templates
    pub template: usize,
}

/// Result of reporting a death to the wave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathOutcome {
    Remaining(u32),
    WaveCleared(u32),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaveManager {
    pub base_enemies_per_wave: u32,
    pub difficulty_multiplier: f32,
    /// 1-based; 0 before the first wave
    pub current_wave: u32,
    pub enemies_alive: u32,
    pub active: bool,
}

impl WaveManager {
    pub fn new(tuning: &WaveTuning) -> Self {
        Self {
            base_enemies_per_wave: tuning.base_enemies_per_wave,
            difficulty_multiplier: tuning.difficulty_multiplier,
            ..Self::default()
        }
    }

    /// Enemies in wave `wave` (1-based)
    pub fn enemy_count(&self, wave: u32) -> u32 {
        let exponent = wave.saturating_sub(1) as i32;
        let count = self.base_enemies_per_wave as f32 * self.difficulty_multiplier.powi(exponent);
        count.round_ties_even().max(0.0) as u32
    }

    /// Begin the next wave. Returns None while a wave is already running.
    pub fn start_wave<R: Rng>(
        &mut self,
        templates: &[EnemyTemplate],
        spawn_points: &[Vec2],
        rng: &mut R,
    ) -> Option<Vec<EnemySpawn>> {
        if self.active {
            return None;
        }
        if templates.is_empty() || spawn_points.is_empty() {
            log::error!("Cannot start wave: no enemy templates or spawn points");
            return None;
        }
        self.active = true;
        self.current_wave += 1;

        let count = self.enemy_count(self.current_wave);
        self.enemies_alive = count;

        let mut shuffled = spawn_points.to_vec();
        for i in 0..shuffled.len() {
            let j = rng.random_range(i..shuffled.len());
            shuffled.swap(i, j);
        }

        let spawns = (0..count as usize)
            .map(|i| EnemySpawn {
                pos: shuffled[i % shuffled.len()],
                template: rng.random_range(0..templates.len()),
            })
            .collect();

        log::info!("Wave {} started with {} enemies.", self.current_wave, count);
        Some(spawns)
    }

    /// Count one enemy death
    pub fn on_enemy_death(&mut self) -> DeathOutcome {
        self.enemies_alive = self.enemies_alive.saturating_sub(1);
        if self.enemies_alive == 0 && self.active {
            self.active = false;
            log::info!("Wave {} cleared", self.current_wave);
            return DeathOutcome::WaveCleared(self.current_wave);
        }
        DeathOutcome::Remaining(self.enemies_alive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn manager() -> WaveManager {
        WaveManager::new(&WaveTuning::default())
    }

    #[test]
    fn test_enemy_count_scaling() {
        let w = manager();
        let counts: Vec<u32> = (1..=6).map(|n| w.enemy_count(n)).collect();
        assert_eq!(counts, vec![5, 6, 8, 10, 12, 15]);
    }

    #[test]
    fn test_start_wave_guard() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut w = manager();
        let templates = [EnemyTemplate::default()];
        let points = [Vec2::ZERO, Vec2::ONE];
        let spawns = w.start_wave(&templates, &points, &mut rng).unwrap();
        assert_eq!(spawns.len(), 5);
        assert_eq!(w.current_wave, 1);
        assert!(w.start_wave(&templates, &points, &mut rng).is_none());
        assert_eq!(w.current_wave, 1);
    }

    #[test]
    fn test_spawns_cycle_shuffled_points() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut w = manager();
        let templates = [EnemyTemplate::default(), EnemyTemplate::runner()];
        let points = [Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0)];
        let spawns = w.start_wave(&templates, &points, &mut rng).unwrap();

        // Every point used before any repeats
        let mut first: Vec<f32> = spawns[..3].iter().map(|s| s.pos.x).collect();
        first.sort_by(f32::total_cmp);
        assert_eq!(first, vec![1.0, 2.0, 3.0]);
        assert_eq!(spawns[3].pos, spawns[0].pos);
        assert!(spawns.iter().all(|s| s.template < 2));
    }

    #[test]
    fn test_deaths_clear_wave() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut w = manager();
        w.start_wave(&[EnemyTemplate::default()], &[Vec2::ZERO], &mut rng);
        for left in (1..5).rev() {
            assert_eq!(w.on_enemy_death(), DeathOutcome::Remaining(left));
        }
        assert_eq!(w.on_enemy_death(), DeathOutcome::WaveCleared(1));
        assert!(!w.active);
        assert!(w.start_wave(&[EnemyTemplate::default()], &[Vec2::ZERO], &mut rng).is_some());
        assert_eq!(w.enemies_alive, 6);
    }

    #[test]
    fn test_empty_spawn_points_refused() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut w = manager();
        assert!(w.start_wave(&[EnemyTemplate::default()], &[], &mut rng).is_none());
        assert!(!w.active);
    }
}
