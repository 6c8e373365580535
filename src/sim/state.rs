//! Game state and core simulation types
//!
//! Everything a run needs to continue deterministically lives here. The RNG
//! is not serialized; a restored snapshot must call `reseed` before ticking.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use super::grenades::{Grenade, GrenadeBelt, GrenadeVariant};
use super::player::Player;
use super::status::SmokeArea;
use super::wave::WaveManager;
use super::weapons::{Loadout, WeaponKind};
use crate::powerups::{CardScreen, Catalog, draw_cards};
use crate::stats::{SessionStats, Summary};
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Wave in progress
    Playing,
    /// Game is paused
    Paused,
    /// Power-up cards shown; world frozen
    CardSelect,
    /// Picking a weapon slot to overwrite; world frozen
    WeaponReplace,
    /// Short delay between the card pick and the next wave
    Intermission,
    /// Player died
    GameOver,
}

impl GamePhase {
    /// True while the world is frozen behind the card screen
    pub fn is_card_screen(&self) -> bool {
        matches!(self, GamePhase::CardSelect | GamePhase::WeaponReplace)
    }
}

/// A player bullet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: i32,
    /// Seconds before it despawns
    pub lifetime: f32,
    /// Distance it may still travel
    pub range_left: f32,
}

/// Something presentation layers may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Footstep,
    ShotFired { kind: WeaponKind, pellets: usize },
    LaserPulse { hits: usize },
    EnemyHit { id: u32, damage: f32 },
    EnemyKilled { id: u32 },
    PlayerHit { damage: f32 },
    WeaponSwitched { kind: WeaponKind },
    Reloaded { kind: WeaponKind },
    GrenadeThrown { variant: GrenadeVariant },
    GrenadeExploded { variant: GrenadeVariant, pos: Vec2 },
    WaveStarted { wave: u32, enemies: u32 },
    WaveCleared { wave: u32 },
    CardsShown { count: usize },
    PowerUpApplied { name: String },
    WeaponReplaced { slot: usize, kind: WeaponKind },
    PlayerDied,
}

fn unseeded_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    #[serde(skip, default = "unseeded_rng")]
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Phase to return to when unpausing
    pub resume_phase: Option<GamePhase>,
    /// World ticks simulated (frozen phases don't count)
    pub time_ticks: u64,
    /// Scaled game time in seconds
    pub elapsed: f32,
    /// Wall time in seconds; keeps running behind the card screen
    pub unscaled_time: f32,

    pub tuning: Tuning,
    pub catalog: Catalog,

    pub player: Player,
    pub loadout: Loadout,
    pub grenades: GrenadeBelt,
    /// Last aim point in world space
    pub aim: Vec2,

    /// Active enemies (sorted by id for determinism)
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub live_grenades: Vec<Grenade>,
    pub smoke: Vec<SmokeArea>,

    pub waves: WaveManager,
    pub stats: SessionStats,
    /// Set once the run ends
    pub summary: Option<Summary>,
    pub card_screen: Option<CardScreen>,
    /// Seconds left before the next wave starts
    pub intermission: f32,

    /// Events raised during the last tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,

    next_id: u32,
}

impl GameState {
    /// Create a new run and start wave 1
    pub fn new(seed: u64, tuning: Tuning, catalog: Catalog) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            resume_phase: None,
            time_ticks: 0,
            elapsed: 0.0,
            unscaled_time: 0.0,
            player: Player::new(&tuning.player, tuning.arena.player_spawn),
            loadout: Loadout::new(&tuning.weapons),
            grenades: GrenadeBelt::new(tuning.grenades.max_per_slot),
            aim: tuning.arena.player_spawn + Vec2::X,
            enemies: Vec::new(),
            bullets: Vec::new(),
            live_grenades: Vec::new(),
            smoke: Vec::new(),
            waves: WaveManager::new(&tuning.waves),
            stats: SessionStats::default(),
            summary: None,
            card_screen: None,
            intermission: 0.0,
            events: Vec::new(),
            next_id: 1,
            tuning,
            catalog,
        };

        state.stats.start(0.0);
        state.start_next_wave();
        state
    }

    /// Standard tuning and the built-in deck
    pub fn with_defaults(seed: u64) -> Self {
        Self::new(seed, Tuning::standard(), Catalog::default_set())
    }

    /// Restore the RNG after loading a snapshot
    pub fn reseed(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed ^ self.time_ticks.rotate_left(32));
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.bullets.sort_by_key(|b| b.id);
        self.live_grenades.sort_by_key(|g| g.id);
        self.smoke.sort_by_key(|s| s.id);
    }

    /// (id, position) of every living enemy
    pub fn enemy_positions(&self) -> Vec<(u32, Vec2)> {
        self.enemies
            .iter()
            .filter(|e| !e.dead)
            .map(|e| (e.id, e.pos))
            .collect()
    }

    /// (id, position, body radius) of every living enemy
    pub fn enemy_bodies(&self) -> Vec<(u32, Vec2, f32)> {
        self.enemies
            .iter()
            .filter(|e| !e.dead)
            .map(|e| (e.id, e.pos, e.stats.radius))
            .collect()
    }

    pub fn enemy_mut(&mut self, id: u32) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id && !e.dead)
    }

    /// Deal damage to one enemy, keeping stats in step
    pub fn damage_enemy(&mut self, id: u32, amount: f32) {
        let Some(enemy) = self.enemies.iter_mut().find(|e| e.id == id && !e.dead) else {
            return;
        };
        enemy.take_damage(amount);
        self.stats.record_damage_dealt(amount);
        self.events.push(GameEvent::EnemyHit { id, damage: amount });
    }

    /// Spawn the next wave and resume play
    pub fn start_next_wave(&mut self) {
        let Some(spawns) = self
            .waves
            .start_wave(&self.tuning.enemies, &self.tuning.arena.spawn_points, &mut self.rng)
        else {
            return;
        };

        for spawn in &spawns {
            let id = self.next_entity_id();
            let template = self.tuning.enemies[spawn.template].clone();
            let enemy = Enemy::new(id, spawn.pos, template, &mut self.rng);
            self.enemies.push(enemy);
        }

        let wave = self.waves.current_wave;
        self.stats.record_wave(wave);
        self.events.push(GameEvent::WaveStarted {
            wave,
            enemies: spawns.len() as u32,
        });
        self.phase = GamePhase::Playing;

        // A zero-enemy wave is over as soon as it starts. Without cards to
        // show, wait out the intermission so empty waves advance once per countdown.
        if spawns.is_empty() {
            self.waves.active = false;
            if self.catalog.power_ups.is_empty() {
                log::warn!("Wave {} has no enemies and no power-ups to offer", wave);
                self.close_card_screen();
            } else {
                self.open_card_screen();
            }
        }
    }

    /// Show power-up cards after a cleared wave
    pub fn open_card_screen(&mut self) {
        if self.catalog.power_ups.is_empty() {
            log::warn!("No power-ups in catalog; starting next wave");
            self.start_next_wave();
            return;
        }

        let cards = draw_cards(
            &self.catalog.power_ups,
            self.tuning.cards.card_count,
            &self.tuning.cards.tier_weights,
            &mut self.rng,
        );
        self.events.push(GameEvent::CardsShown { count: cards.len() });
        self.card_screen = Some(CardScreen::cards(cards, self.unscaled_time, self.tuning.cards.input_block));
        self.loadout.release_trigger();
        self.phase = GamePhase::CardSelect;
    }

    /// Hide the card screen and count down to the next wave
    pub fn close_card_screen(&mut self) {
        self.card_screen = None;
        self.intermission = self.tuning.cards.continue_delay;
        self.phase = GamePhase::Intermission;
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }
}
