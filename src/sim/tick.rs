//! Fixed timestep simulation tick
//!
//! One call advances the world by `dt`. Systems run in a fixed order so that
//! identical seeds and inputs always produce identical states.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{circles_overlap, clamp_to_arena, ray_circle, sweep_circle, touches_arena_wall};
use super::enemy::SteerContext;
use super::grenades::{Attachment, Detonation, Grenade, GrenadeData, detonate, throw_grenade};
use super::state::{Bullet, GameEvent, GamePhase, GameState};
use super::status::{SmokeArea, SmokeChange};
use super::wave::DeathOutcome;
use super::weapons::{Trigger, WeaponKind, WeaponStats};
use crate::consts::MIN_AIM_LENGTH_SQ;
use crate::powerups::{ApplyOutcome, CardChoice, CardScreen, PowerUpTarget};

/// Enemies within this distance make the autopilot back off
const AUTOPILOT_DANGER_RADIUS: f32 = 4.0;
/// Autopilot throws a grenade when this many enemies are close
const AUTOPILOT_GRENADE_CROWD: usize = 3;
/// Fraction of speed kept by a grenade bouncing off something
const GRENADE_BOUNCE: f32 = 0.5;

/// Input for a single tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickInput {
    /// Movement (length clamped to 1)
    pub move_dir: Vec2,
    /// Aim point in world space
    pub aim: Option<Vec2>,
    pub attack_pressed: bool,
    pub attack_released: bool,
    pub switch_weapon: bool,
    pub reload: bool,
    pub throw_grenade: bool,
    pub toggle_grenade: bool,
    /// Pause toggle
    pub pause: bool,
    /// Card picked on the card screen
    pub card_choice: Option<usize>,
    /// Demo mode - AI plays the game
    pub autopilot: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.events.clear();
    state.unscaled_time += dt;

    let input = if input.autopilot {
        autopilot_input(state, input)
    } else {
        input.clone()
    };

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing | GamePhase::Intermission => {
                state.resume_phase = Some(state.phase);
                state.phase = GamePhase::Paused;
                state.loadout.release_trigger();
                return;
            }
            GamePhase::Paused => {
                state.phase = state.resume_phase.take().unwrap_or(GamePhase::Playing);
                return;
            }
            _ => {}
        }
    }

    match state.phase {
        GamePhase::Paused | GamePhase::GameOver => return,
        GamePhase::CardSelect | GamePhase::WeaponReplace => {
            // World is frozen; only the card screen reacts
            if let Some(choice) = input.card_choice {
                pick_card(state, choice);
            }
            return;
        }
        GamePhase::Playing | GamePhase::Intermission => {}
    }

    state.time_ticks += 1;
    state.elapsed += dt;

    if state.phase == GamePhase::Intermission {
        state.intermission -= dt;
        if state.intermission <= 0.0 {
            log::info!("Starting next wave...");
            state.start_next_wave();
        }
    }

    update_player(state, &input, dt);
    update_weapons(state, &input, dt);
    update_grenade_input(state, &input);
    update_bullets(state, dt);
    update_grenades(state, dt);
    update_smoke(state, dt);
    update_enemies(state, dt);
    resolve_deaths(state);

    if state.player.is_dead() {
        let summary = state.stats.end(state.elapsed);
        log::info!(
            "Run over: wave {}, {} kills, {:.0}s",
            summary.highest_wave,
            summary.enemies_defeated,
            summary.time_survived
        );
        state.summary = Some(summary);
        state.loadout.release_trigger();
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::PlayerDied);
    }

    state.normalize_order();
}

/// Resolve a card pick on the card screen
fn pick_card(state: &mut GameState, index: usize) {
    let Some(screen) = &state.card_screen else {
        log::warn!("Card pick with no card screen open");
        return;
    };
    let Some(choice) = screen.choose(index, state.unscaled_time) else {
        return;
    };

    match choice {
        CardChoice::PowerUp(power_up) => {
            let outcome = power_up.apply(PowerUpTarget {
                player: &mut state.player,
                loadout: &mut state.loadout,
                grenades: &mut state.grenades,
                weapon_tuning: &state.tuning.weapons,
            });
            state.events.push(GameEvent::PowerUpApplied { name: power_up.name.clone() });

            match outcome {
                ApplyOutcome::Applied => state.close_card_screen(),
                ApplyOutcome::NeedsWeaponReplace { slot } => {
                    let held = state.loadout.slots.iter().map(|s| s.kind).collect();
                    state.card_screen = Some(CardScreen::replace_weapon(
                        slot,
                        held,
                        state.unscaled_time,
                        state.tuning.cards.input_block,
                    ));
                    state.phase = GamePhase::WeaponReplace;
                }
            }
        }
        CardChoice::ReplaceSlot { index, slot } => {
            let kind = slot.kind;
            if state.loadout.replace_weapon(index, slot) {
                state.events.push(GameEvent::WeaponReplaced { slot: index, kind });
            }
            state.close_card_screen();
        }
    }
}

fn update_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let move_dir = input.move_dir.clamp_length_max(1.0);
    let footstep = state.player.move_by(
        move_dir,
        dt,
        state.tuning.arena.half_extents,
        &state.tuning.arena.obstacles,
    );
    if footstep {
        state.events.push(GameEvent::Footstep);
    }
    if let Some(aim) = input.aim {
        state.aim = aim;
    }
}

/// Unit aim direction from the player to the aim point
fn aim_direction(state: &GameState) -> Vec2 {
    let aim = state.aim - state.player.pos;
    if aim.length_squared() < MIN_AIM_LENGTH_SQ {
        return Vec2::Y;
    }
    aim.normalize()
}

fn update_weapons(state: &mut GameState, input: &TickInput, dt: f32) {
    let kind_before = state.loadout.current_kind();
    let aim = aim_direction(state);

    if input.switch_weapon && state.loadout.slots.len() > 1 {
        state.loadout.switch_weapon();
    }
    if input.reload {
        state.loadout.start_reload();
    }

    if input.attack_pressed {
        let range = state
            .loadout
            .current_slot()
            .stats
            .as_ref()
            .map_or(WeaponStats::default().range, |s| s.range);

        if let Trigger::Fired(volley) = state.loadout.press_trigger(aim) {
            let speed = state.tuning.weapons.bullet_speed;
            for dir in &volley.dirs {
                let id = state.next_entity_id();
                state.bullets.push(Bullet {
                    id,
                    pos: state.player.pos,
                    vel: *dir * speed,
                    radius: state.tuning.weapons.bullet_radius,
                    damage: volley.damage,
                    lifetime: state.tuning.weapons.bullet_lifetime,
                    range_left: range,
                });
            }
            state.events.push(GameEvent::ShotFired {
                kind: volley.kind,
                pellets: volley.dirs.len(),
            });
        }
    }
    if input.attack_released {
        state.loadout.release_trigger();
    }

    let update = state.loadout.update(dt, &state.tuning.weapons);
    if let Some(damage) = update.laser_pulse {
        fire_laser(state, aim, damage);
    }
    if let Some(kind) = update.reloaded {
        state.events.push(GameEvent::Reloaded { kind });
    }

    if state.loadout.laser.active {
        state.loadout.laser.segment = Some(laser_segment(state, aim));
    }

    let kind_after = state.loadout.current_kind();
    if kind_after != kind_before {
        state.events.push(GameEvent::WeaponSwitched { kind: kind_after });
    }
}

/// Visible beam: from the player to the first thing in the way
fn laser_segment(state: &GameState, aim: Vec2) -> (Vec2, Vec2) {
    let origin = state.player.pos;
    let range = state.tuning.weapons.laser_range;

    let enemy_hits = state
        .enemies
        .iter()
        .filter(|e| !e.dead)
        .filter_map(|e| ray_circle(origin, aim, range, e.pos, e.stats.radius));
    let obstacle_hits = state
        .tuning
        .arena
        .obstacles
        .iter()
        .filter_map(|o| ray_circle(origin, aim, range, o.pos, o.radius));

    let nearest = enemy_hits
        .chain(obstacle_hits)
        .map(|hit| hit.distance)
        .fold(range, f32::min);

    let end = clamp_to_arena(origin + aim * nearest, 0.0, state.tuning.arena.half_extents);
    (origin, end)
}

/// One laser pulse: every enemy along the ray takes damage
fn fire_laser(state: &mut GameState, aim: Vec2, damage: i32) {
    let origin = state.player.pos;
    let range = state.tuning.weapons.laser_range;

    let hits: Vec<u32> = state
        .enemies
        .iter()
        .filter(|e| !e.dead)
        .filter(|e| ray_circle(origin, aim, range, e.pos, e.stats.radius).is_some())
        .map(|e| e.id)
        .collect();

    for &id in &hits {
        state.damage_enemy(id, damage as f32);
    }
    state.events.push(GameEvent::LaserPulse { hits: hits.len() });
}

fn update_grenade_input(state: &mut GameState, input: &TickInput) {
    if input.toggle_grenade {
        state.grenades.toggle_selection();
    }
    if !input.throw_grenade {
        return;
    }

    let Some(consumed) = state.grenades.try_consume() else {
        log::debug!("No grenades to throw");
        return;
    };

    let (pos, vel) = throw_grenade(
        state.player.pos,
        state.aim,
        consumed.data.as_ref(),
        &state.tuning.grenades,
    );
    let data = consumed
        .data
        .unwrap_or_else(|| GrenadeData::fallback(&state.tuning.grenades));
    let variant = data.variant;

    let id = state.next_entity_id();
    state.live_grenades.push(Grenade::new(id, pos, vel, data));
    state.events.push(GameEvent::GrenadeThrown { variant });
}

fn update_bullets(state: &mut GameState, dt: f32) {
    let mut hits: Vec<(u32, f32)> = Vec::new();
    let half_extents = state.tuning.arena.half_extents;

    for bullet in &mut state.bullets {
        let start = bullet.pos;
        let step = bullet.vel * dt;
        let end = start + step;

        // Earliest enemy along the swept path
        let enemy_hit = state
            .enemies
            .iter()
            .filter(|e| !e.dead)
            .filter_map(|e| {
                sweep_circle(start, end, bullet.radius, e.pos, e.stats.radius).map(|t| (t, e.id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        let obstacle_hit = state
            .tuning
            .arena
            .obstacles
            .iter()
            .filter_map(|o| sweep_circle(start, end, bullet.radius, o.pos, o.radius))
            .min_by(f32::total_cmp);

        match (enemy_hit, obstacle_hit) {
            (Some((t, id)), obstacle) if obstacle.is_none_or(|o| t <= o) => {
                hits.push((id, bullet.damage as f32));
                bullet.lifetime = 0.0;
            }
            (_, Some(_)) => bullet.lifetime = 0.0,
            _ => {
                bullet.pos = end;
                bullet.lifetime -= dt;
                bullet.range_left -= step.length();
                if touches_arena_wall(bullet.pos, 0.0, half_extents) {
                    bullet.lifetime = 0.0;
                }
            }
        }
    }

    state.bullets.retain(|b| b.lifetime > 0.0 && b.range_left > 0.0);

    for (id, damage) in hits {
        state.damage_enemy(id, damage);
    }
}

fn update_grenades(state: &mut GameState, dt: f32) {
    let tuning = state.tuning.grenades.clone();
    let half_extents = state.tuning.arena.half_extents;
    let mut explosions: Vec<(GrenadeData, Vec2)> = Vec::new();

    for grenade in &mut state.live_grenades {
        if grenade.exploded {
            continue;
        }
        grenade.fuse -= dt;

        match grenade.attached {
            Some(Attachment::Enemy { id, offset }) => {
                match state.enemies.iter().find(|e| e.id == id && !e.dead) {
                    Some(enemy) => grenade.pos = enemy.pos + offset,
                    None => grenade.attached = Some(Attachment::Static),
                }
            }
            Some(Attachment::Static) => {}
            None => {
                let start = grenade.pos;
                let vel = grenade.vel;
                let end = start + vel * dt;
                // Only bodies it is heading into; a bounced grenade may still touch
                let approaching = |center: Vec2| vel.dot(center - start) > 0.0;

                let enemy_hit = state
                    .enemies
                    .iter()
                    .filter(|e| !e.dead && approaching(e.pos))
                    .filter_map(|e| {
                        sweep_circle(start, end, tuning.radius, e.pos, e.stats.radius).map(|t| (t, e))
                    })
                    .min_by(|a, b| a.0.total_cmp(&b.0));
                let obstacle_hit = state
                    .tuning
                    .arena
                    .obstacles
                    .iter()
                    .filter(|o| approaching(o.pos))
                    .filter_map(|o| {
                        sweep_circle(start, end, tuning.radius, o.pos, o.radius).map(|t| (t, o))
                    })
                    .min_by(|a, b| a.0.total_cmp(&b.0));

                let contact = match (enemy_hit, obstacle_hit) {
                    (Some((te, e)), obstacle) if obstacle.is_none_or(|(to, _)| te <= to) => {
                        Some((te, e.pos, e.vel, Attachment::Enemy { id: e.id, offset: Vec2::ZERO }))
                    }
                    (_, Some((to, o))) => Some((to, o.pos, Vec2::ZERO, Attachment::Static)),
                    _ => None,
                };

                match contact {
                    Some((t, center, target_vel, hit)) => {
                        let pos = start.lerp(end, t);
                        let relative_speed = (grenade.vel - target_vel).length();
                        grenade.pos = pos;
                        let hit = match hit {
                            Attachment::Enemy { id, .. } => Attachment::Enemy { id, offset: pos - center },
                            other => other,
                        };
                        if grenade.on_impact(relative_speed, hit, &tuning) {
                            grenade.fuse = 0.0;
                        } else if grenade.attached.is_none() {
                            let normal = (pos - center).normalize_or(Vec2::Y);
                            grenade.vel = grenade.vel.reflect(normal) * GRENADE_BOUNCE;
                        }
                    }
                    None => {
                        grenade.pos = end;
                        grenade.vel *= (-tuning.drag * dt).exp();
                    }
                }

                if grenade.attached.is_none()
                    && touches_arena_wall(grenade.pos, tuning.radius, half_extents)
                {
                    grenade.pos = clamp_to_arena(grenade.pos, tuning.radius, half_extents);
                    let limit = half_extents - Vec2::splat(tuning.radius);
                    let into_x = grenade.pos.x.abs() >= limit.x && grenade.vel.x * grenade.pos.x > 0.0;
                    let into_y = grenade.pos.y.abs() >= limit.y && grenade.vel.y * grenade.pos.y > 0.0;

                    if (into_x || into_y) && grenade.on_impact(grenade.vel.length(), Attachment::Static, &tuning) {
                        grenade.fuse = 0.0;
                    } else if grenade.attached.is_none() {
                        if into_x {
                            grenade.vel.x = -grenade.vel.x * GRENADE_BOUNCE;
                        }
                        if into_y {
                            grenade.vel.y = -grenade.vel.y * GRENADE_BOUNCE;
                        }
                    }
                }
            }
        }

        if grenade.fuse <= 0.0 {
            grenade.exploded = true;
            explosions.push((grenade.data.clone(), grenade.pos));
        }
    }

    state.live_grenades.retain(|g| !g.exploded);

    for (data, pos) in explosions {
        explode(state, &data, pos);
    }
}

/// Apply a detonation to the world
fn explode(state: &mut GameState, data: &GrenadeData, pos: Vec2) {
    log::debug!("{} exploded at ({:.1}, {:.1})", data.display_name, pos.x, pos.y);
    state.events.push(GameEvent::GrenadeExploded { variant: data.variant, pos });

    let targets = state.enemy_bodies();
    match detonate(data, pos, &targets, &mut state.rng) {
        Detonation::Blast(hits) => {
            for hit in hits {
                if let Some(enemy) = state.enemy_mut(hit.enemy) {
                    enemy.apply_impulse(hit.impulse);
                }
                state.damage_enemy(hit.enemy, hit.damage as f32);
            }
        }
        Detonation::Flash { enemies, seconds } => {
            for id in enemies {
                if let Some(enemy) = state.enemy_mut(id) {
                    enemy.stun(seconds);
                    enemy.status.blind(seconds);
                }
            }
        }
        Detonation::Smoke { pos, radius, duration } => {
            let id = state.next_entity_id();
            state.smoke.push(SmokeArea::new(id, pos, radius, duration));
        }
        Detonation::Cluster(fragments) => {
            for fragment in fragments {
                let id = state.next_entity_id();
                state
                    .live_grenades
                    .push(Grenade::new(id, fragment.pos, fragment.vel, fragment.data));
            }
        }
    }
}

fn update_smoke(state: &mut GameState, dt: f32) {
    let positions = state.enemy_positions();

    for area in &mut state.smoke {
        for change in area.update(dt, &positions) {
            let (id, entering) = match change {
                SmokeChange::Enter(id) => (id, true),
                SmokeChange::Exit(id) => (id, false),
            };
            if let Some(enemy) = state.enemies.iter_mut().find(|e| e.id == id) {
                if entering {
                    enemy.status.enter_smoke();
                } else {
                    enemy.status.exit_smoke();
                }
            }
        }
    }

    state.smoke.retain(|s| !s.expired());
}

fn update_enemies(state: &mut GameState, dt: f32) {
    let positions: Vec<(u32, Vec2)> = state.enemy_positions();
    let mut neighbours: Vec<Vec2> = Vec::with_capacity(positions.len());

    for enemy in &mut state.enemies {
        if enemy.dead {
            continue;
        }
        neighbours.clear();
        neighbours.extend(positions.iter().filter(|(id, _)| *id != enemy.id).map(|(_, p)| *p));

        let ctx = SteerContext {
            player_pos: state.player.pos,
            neighbours: &neighbours,
            obstacles: &state.tuning.arena.obstacles,
            half_extents: state.tuning.arena.half_extents,
            smoke_slow_factor: state.tuning.grenades.smoke_slow_factor,
        };
        enemy.step(&ctx, dt, &mut state.rng);

        let (center, reach) = enemy.attack_area();
        if circles_overlap(center, reach, state.player.pos, state.player.radius) {
            if let Some(damage) = enemy.try_attack() {
                state.player.change_health(-damage);
                state.stats.record_damage_received(damage);
                state.events.push(GameEvent::PlayerHit { damage });
            }
        }
    }
}

/// Remove dead enemies, counting each death once
fn resolve_deaths(state: &mut GameState) {
    let dead: Vec<u32> = state.enemies.iter().filter(|e| e.dead).map(|e| e.id).collect();
    if dead.is_empty() {
        return;
    }
    state.enemies.retain(|e| !e.dead);

    for id in dead {
        state.stats.record_kill();
        state.events.push(GameEvent::EnemyKilled { id });
        for area in &mut state.smoke {
            area.inside.retain(|&inside| inside != id);
        }

        if let DeathOutcome::WaveCleared(wave) = state.waves.on_enemy_death() {
            state.events.push(GameEvent::WaveCleared { wave });
            if !state.player.is_dead() {
                state.open_card_screen();
            }
        }
    }
}

/// Demo AI: kite away from the nearest enemy while shooting at it
fn autopilot_input(state: &GameState, input: &TickInput) -> TickInput {
    let mut input = input.clone();

    if state.phase.is_card_screen() {
        input.card_choice = Some(0);
        return input;
    }

    let me = state.player.pos;
    let nearest = state
        .enemies
        .iter()
        .filter(|e| !e.dead)
        .min_by(|a, b| a.pos.distance_squared(me).total_cmp(&b.pos.distance_squared(me)));

    let Some(target) = nearest else {
        input.move_dir = (-me).clamp_length_max(1.0);
        input.attack_released = true;
        return input;
    };

    let away = me - target.pos;
    let dist = away.length();
    input.aim = Some(target.pos);

    // Circle-strafe: back off when close, orbit otherwise
    let side = crate::perpendicular(away.normalize_or(Vec2::X));
    input.move_dir = if dist < AUTOPILOT_DANGER_RADIUS {
        (away.normalize_or(Vec2::X) + side * 0.5).normalize_or_zero()
    } else {
        side
    };
    // Stay off the walls
    let half = state.tuning.arena.half_extents;
    if me.x.abs() > half.x * 0.8 || me.y.abs() > half.y * 0.8 {
        input.move_dir = (input.move_dir - me.normalize_or_zero()).normalize_or_zero();
    }

    let laser = state.loadout.current_kind() == WeaponKind::Laser;
    input.attack_pressed = !laser || !state.loadout.laser.active;
    input.attack_released = false;
    if !state.loadout.current_slot().has_ammo() && state.loadout.slots.len() > 1 {
        input.switch_weapon = true;
    }
    input.reload = state.loadout.current_slot().clip_ammo == 0;

    let crowd = state
        .enemies
        .iter()
        .filter(|e| !e.dead && e.pos.distance(me) < AUTOPILOT_DANGER_RADIUS)
        .count();
    input.throw_grenade = crowd >= AUTOPILOT_GRENADE_CROWD && state.live_grenades.is_empty();

    input
}
