//! Mode controller
//!
//! - Arena: fixed roster on a ring, win by clearing every bot
//! - Survival: bots stream in through the hazard openings, no win condition
//! - Duel: one boss over three rounds, gaining weapons as rounds advance

use std::str::FromStr;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::physics::PhysicsPort;
use super::state::{EntityId, GameEvent, GamePhase, Role, SimulationSession};
use super::weapons;
use crate::polar_to_cartesian;
use crate::settings::{DuelTuning, Settings, ShrinkTuning};

/// Which ruleset a match runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    Arena,
    Survival,
    Duel,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Arena => "arena",
            MatchMode::Survival => "survival",
            MatchMode::Duel => "duel",
        }
    }

    /// Safe zone shrink rate and floor for this mode
    pub fn shrink(&self, settings: &Settings) -> ShrinkTuning {
        match self {
            MatchMode::Arena => settings.modes.arena.shrink,
            MatchMode::Survival => settings.modes.survival.shrink,
            MatchMode::Duel => settings.modes.duel.shrink,
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arena" => Ok(MatchMode::Arena),
            "survival" | "endless" => Ok(MatchMode::Survival),
            "duel" | "boss" => Ok(MatchMode::Duel),
            other => Err(format!("unknown mode '{other}' (expected arena, survival or duel)")),
        }
    }
}

/// Duel progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelState {
    /// 1-based round number
    pub round: u32,
    pub boss: EntityId,
    /// Tick the current round began (weapon cadence counts from here)
    pub round_started_tick: u64,
}

/// Per-mode runtime state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeState {
    Arena,
    Survival { next_spawn_tick: u64 },
    Duel(DuelState),
}

impl ModeState {
    pub fn round(&self) -> Option<u32> {
        match self {
            ModeState::Duel(duel) => Some(duel.round),
            _ => None,
        }
    }
}

/// Number of duel rounds
pub fn duel_rounds(duel: &DuelTuning) -> u32 {
    duel.boss_rpm_caps.len() as u32
}

/// Boss RPM cap for a 1-based round
pub fn boss_cap(round: u32, duel: &DuelTuning) -> f32 {
    let idx = (round.max(1) - 1) as usize;
    duel.boss_rpm_caps
        .get(idx)
        .or(duel.boss_rpm_caps.last())
        .copied()
        .unwrap_or(crate::consts::MAX_RPM)
}

pub fn player_spawn(mode: MatchMode, settings: &Settings) -> Vec2 {
    match mode {
        MatchMode::Arena | MatchMode::Survival => Vec2::ZERO,
        MatchMode::Duel => Vec2::new(0.0, settings.modes.duel.spawn_distance),
    }
}

fn boss_spawn(settings: &Settings) -> Vec2 {
    Vec2::new(0.0, -settings.modes.duel.spawn_distance)
}

/// Spawn the mode's starting roster
pub fn setup<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    s.mode_state = match s.mode {
        MatchMode::Arena => {
            let count = s.settings.modes.arena.bot_count;
            let ring = s.settings.zone.arena_radius * s.settings.modes.arena.ring_fraction;
            for i in 0..count {
                let angle = i as f32 / count as f32 * std::f32::consts::TAU;
                let rpm = s.rng.random_range(45.0..75.0);
                let personality = s.rng.random::<f32>();
                s.spawn_entity(Role::Bot, polar_to_cartesian(ring, angle), Vec2::ZERO, rpm, personality);
            }
            ModeState::Arena
        }
        MatchMode::Survival => ModeState::Survival {
            next_spawn_tick: s.settings.modes.survival.spawn_interval_ticks,
        },
        MatchMode::Duel => {
            let cap = boss_cap(1, &s.settings.modes.duel);
            let personality = s.rng.random::<f32>();
            let boss = s.spawn_entity(Role::Boss, boss_spawn(&s.settings), Vec2::ZERO, cap, personality);
            if let Some(entity) = s.entity_mut(boss) {
                entity.rpm_cap = cap;
                entity.set_rpm(cap);
            }
            ModeState::Duel(DuelState {
                round: 1,
                boss,
                round_started_tick: 0,
            })
        }
    };
}

/// Per-tick mode work: survival spawning and boss weapons
pub fn update<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    match s.mode_state {
        ModeState::Arena => {}
        ModeState::Survival { next_spawn_tick } => {
            if s.time_ticks >= next_spawn_tick {
                let tuning = &s.settings.modes.survival;
                let next = next_spawn_tick + tuning.spawn_interval_ticks;
                if (s.bots_alive() as u32) < tuning.max_alive {
                    spawn_from_opening(s);
                }
                s.mode_state = ModeState::Survival { next_spawn_tick: next };
            }
        }
        ModeState::Duel(duel) => weapons::fire(s, duel),
    }
}

/// Spawn a bot just inside a random hazard opening, heading for the center
fn spawn_from_opening<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    let angle = if s.openings.is_empty() {
        s.rng.random::<f32>() * std::f32::consts::TAU
    } else {
        let idx = s.rng.random_range(0..s.openings.len());
        s.openings[idx].angle
    };
    let tuning = &s.settings.modes.survival;
    let pos = polar_to_cartesian(s.settings.zone.arena_radius - tuning.spawn_inset, angle);
    let vel = -pos.normalize_or_zero() * tuning.spawn_speed;

    let rpm = s.rng.random_range(45.0..75.0);
    let personality = s.rng.random::<f32>();
    let id = s.spawn_entity(Role::Bot, pos, vel, rpm, personality);
    log::debug!("Survival spawn: bot {} at ({:.0}, {:.0})", id, pos.x, pos.y);
    s.push_event(GameEvent::BotSpawned { entity: id, pos });
}

/// Decide victory/defeat or start a duel round transition
pub fn check_outcome<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    let player_ok = s.player().is_some_and(|p| p.alive && p.rpm > 0.0);
    if !player_ok {
        s.phase = GamePhase::Defeat;
        log::info!("Defeat at tick {} ({} bots eliminated)", s.time_ticks, s.stats.bots_eliminated);
        s.push_event(GameEvent::Defeat);
        return;
    }
    s.stats.survived_ticks += 1;

    match s.mode_state {
        ModeState::Arena => {
            let roster_cleared = s.entities.iter().filter(|e| e.is_bot()).all(|e| !e.alive);
            if roster_cleared {
                declare_victory(s);
            }
        }
        // Endless: the run only ends when the player goes down
        ModeState::Survival { .. } => {}
        ModeState::Duel(duel) => {
            let boss_down = s.entity(duel.boss).is_none_or(|b| !b.alive);
            if !boss_down {
                return;
            }
            s.push_event(GameEvent::RoundCleared { round: duel.round });
            if duel.round >= duel_rounds(&s.settings.modes.duel) {
                declare_victory(s);
            } else {
                log::info!("Duel round {} cleared", duel.round);
                s.phase = GamePhase::RoundTransition {
                    ticks_left: s.settings.modes.duel.transition_ticks,
                };
            }
        }
    }
}

fn declare_victory<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    s.phase = GamePhase::Victory;
    log::info!("Victory at tick {} ({} bots eliminated)", s.time_ticks, s.stats.bots_eliminated);
    s.push_event(GameEvent::Victory);
}

/// Count down the round banner; reset the arena when it ends
pub fn advance_transition<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    let GamePhase::RoundTransition { ticks_left } = s.phase else {
        return;
    };
    if ticks_left > 1 {
        s.phase = GamePhase::RoundTransition { ticks_left: ticks_left - 1 };
        return;
    }
    start_next_round(s);
}

/// Reset positions, RPM, zone and projectiles for the next duel round
fn start_next_round<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    let ModeState::Duel(duel) = s.mode_state else {
        s.phase = GamePhase::Playing;
        return;
    };
    let round = duel.round + 1;
    let cap = boss_cap(round, &s.settings.modes.duel);

    let player_id = s.player_id();
    let player_pos = player_spawn(MatchMode::Duel, &s.settings);
    let player_rpm = s.settings.rpm.player_start;
    s.respawn_entity(player_id, player_pos);
    if let Some(player) = s.player_mut() {
        player.set_rpm(player_rpm);
    }

    let boss_pos = boss_spawn(&s.settings);
    s.respawn_entity(duel.boss, boss_pos);
    if let Some(boss) = s.entity_mut(duel.boss) {
        boss.rpm_cap = cap;
        boss.set_rpm(cap);
    }

    s.zone.reset(&s.settings.zone);
    s.projectiles.clear();
    // Contacts from the old layout must not leak into the new round
    s.physics.drain_collision_starts();

    s.mode_state = ModeState::Duel(DuelState {
        round,
        boss: duel.boss,
        round_started_tick: s.time_ticks,
    });
    s.phase = GamePhase::Playing;
    log::info!("Duel round {} begins (boss cap {:.0})", round, cap);
    s.push_event(GameEvent::RoundStarted { round });
}
