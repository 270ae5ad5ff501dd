//! Bot and boss AI
//!
//! Each tick every living AI top runs RPM housekeeping, then picks one state
//! by priority (first match wins):
//! 1. Dodge: something stronger (or a hazard opening) is too close
//! 2. Survival: outside or near the edge of the safe zone
//! 3. Chase a weaker target, or Wander when there is none
//! 4. Flee: too weak to chase
//!
//! Bots are processed in entity order and see RPM changes made by bots
//! earlier in the same tick.

use glam::Vec2;
use rand::Rng;

use super::arc::HazardOpening;
use super::mode::MatchMode;
use super::physics::PhysicsPort;
use super::rpm::{decay_amount, gain_amount, move_multiplier};
use super::state::{AiState, Entity, EntityId, Role, SimulationSession};
use super::zone::SafeZone;
use crate::settings::{AiTuning, Settings};
use crate::{direction_or_default, unit_or_default};

/// The outcome of one decision: a state and a unit steering direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intent {
    pub state: AiState,
    pub direction: Vec2,
}

/// Linear falloff weight `1 - d/r` inside radius `r`, zero outside
#[inline]
fn falloff(d: f32, r: f32) -> f32 {
    if r <= 0.0 || d >= r { 0.0 } else { 1.0 - d / r }
}

/// Living entities other than `id`
fn others(id: EntityId, entities: &[Entity]) -> impl Iterator<Item = &Entity> {
    entities.iter().filter(move |e| e.alive && e.id != id)
}

/// Push away from stronger tops and hazard openings
fn threat_repulsion(me: &Entity, entities: &[Entity], openings: &[HazardOpening], ai: &AiTuning) -> Vec2 {
    let mut rep = Vec2::ZERO;
    for other in others(me.id, entities).filter(|o| o.rpm - me.rpm >= ai.dodge_rpm_margin) {
        let w = falloff(me.pos.distance(other.pos), ai.dodge_radius);
        if w > 0.0 {
            rep += direction_or_default(other.pos, me.pos) * w;
        }
    }
    for opening in openings {
        let w = falloff(me.pos.distance(opening.mouth), ai.hazard_radius);
        if w > 0.0 {
            rep += direction_or_default(opening.mouth, me.pos) * w * ai.hazard_weight;
        }
    }
    rep
}

/// Best weaker target in range, scored by advantage over distance
fn pick_target<'a>(me: &Entity, entities: &'a [Entity], ai: &AiTuning) -> Option<&'a Entity> {
    let bias = 0.5 + me.personality;
    let mut best: Option<(&Entity, f32)> = None;
    for other in others(me.id, entities) {
        let advantage = me.rpm - other.rpm;
        let d = me.pos.distance(other.pos);
        if advantage < ai.target_rpm_margin || d > ai.detection_radius {
            continue;
        }
        let score = advantage / (d + 1.0) * bias;
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((other, score));
        }
    }
    best.map(|(e, _)| e)
}

/// Choose a state and steering direction for one AI top
pub fn decide(
    me: &Entity,
    entities: &[Entity],
    zone: &SafeZone,
    openings: &[HazardOpening],
    tick: u64,
    settings: &Settings,
) -> Intent {
    let ai = &settings.ai;

    let rep = threat_repulsion(me, entities, openings, ai);
    if rep.length() > ai.dodge_threshold {
        return Intent {
            state: AiState::Dodge,
            direction: unit_or_default(rep),
        };
    }

    if me.pos.distance(zone.center) > zone.radius * ai.survival_margin {
        return Intent {
            state: AiState::Survival,
            direction: direction_or_default(me.pos, zone.center),
        };
    }

    let phase = me.personality * std::f32::consts::TAU;
    if me.rpm >= settings.rpm.low + ai.chase_rpm_margin {
        if let Some(target) = pick_target(me, entities, ai) {
            let toward = direction_or_default(me.pos, target.pos);
            let flank = ai.flank_amplitude * (tick as f32 * ai.flank_frequency + phase).sin();
            return Intent {
                state: AiState::Chase { target: target.id },
                direction: unit_or_default(toward + toward.perp() * flank),
            };
        }
        let heading = phase + tick as f32 * ai.wander_turn_rate;
        return Intent {
            state: AiState::Wander,
            direction: Vec2::from_angle(heading),
        };
    }

    let mut rep = Vec2::ZERO;
    for other in others(me.id, entities) {
        let w = falloff(me.pos.distance(other.pos), ai.flee_radius);
        if w > 0.0 {
            rep += direction_or_default(other.pos, me.pos) * w;
        }
    }
    rep += direction_or_default(me.pos, zone.center) * ai.flee_center_bias;
    Intent {
        state: AiState::Flee,
        direction: unit_or_default(rep),
    }
}

/// Extra push away from nearby bots so they don't clump
pub fn separation(me: &Entity, entities: &[Entity], ai: &AiTuning) -> Vec2 {
    others(me.id, entities)
        .filter(|o| o.role == Role::Bot)
        .map(|o| {
            let w = falloff(me.pos.distance(o.pos), ai.separation_radius);
            if w > 0.0 {
                direction_or_default(o.pos, me.pos) * w * ai.separation_strength
            } else {
                Vec2::ZERO
            }
        })
        .sum()
}

/// Per-tick RPM upkeep: decay, random spins, regen and floor inside the zone
pub fn housekeeping(me: &mut Entity, inside: bool, duel_boss: bool, settings: &Settings, rng: &mut impl Rng) {
    let (ai, rpm) = (&settings.ai, &settings.rpm);
    me.add_rpm(-decay_amount(rpm.bot_decay, !inside, rpm));

    if rng.random::<f32>() < ai.spin_chance {
        me.add_rpm(gain_amount(ai.spin_gain, !inside, rpm));
    }
    if me.rpm < rpm.low && rng.random::<f32>() < ai.emergency_spin_chance {
        me.add_rpm(gain_amount(ai.spin_gain, !inside, rpm));
    }

    if inside && !duel_boss {
        me.add_rpm(ai.regen);
        if me.rpm < ai.rpm_floor {
            me.set_rpm(ai.rpm_floor);
        }
    }
}

/// Run housekeeping, decisions and steering forces for every AI top
pub fn update_bots<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    let tick = s.time_ticks;
    for i in 0..s.entities.len() {
        let entity = &s.entities[i];
        if !entity.alive || entity.role == Role::Player {
            continue;
        }
        let inside = s.zone.contains(entity.pos);
        let duel_boss = entity.role == Role::Boss && s.mode == MatchMode::Duel;

        housekeeping(&mut s.entities[i], inside, duel_boss, &s.settings, &mut s.rng);

        let me = &s.entities[i];
        let intent = decide(me, &s.entities, &s.zone, &s.openings, tick, &s.settings);
        let push = separation(me, &s.entities, &s.settings.ai);

        let aggression = match intent.state {
            AiState::Chase { .. } => 0.8 + 0.4 * me.personality,
            _ => 1.0,
        };
        let outside_factor = if inside { 1.0 } else { s.settings.rpm.outside_speed_factor };
        let force = (intent.direction + push)
            * s.settings.ai.move_force
            * move_multiplier(me.rpm, &s.settings.rpm)
            * outside_factor
            * aggression;
        let body = me.body;

        s.entities[i].ai_state = Some(intent.state);
        s.physics.apply_force(body, force);
    }
}
