//! Combat resolution
//!
//! Every new contact between two tops is a hit. The top with more RPM is the
//! attacker; the defender is knocked back along the attacker→defender axis and
//! loses RPM. The closing speed that feeds the knockback is the one the
//! physics port measured at first contact, before its own bounce response.
//! Contacts are gathered for the whole physics step and resolved in
//! sorted entity-id order so the outcome doesn't depend on the engine's event
//! ordering.

use glam::Vec2;

use super::mode::MatchMode;
use super::physics::PhysicsPort;
use super::rpm::RpmZone;
use super::state::{EliminationCause, Entity, EntityId, GameEvent, Role, SimulationSession};
use crate::direction_or_default;
use crate::settings::{CombatTuning, RpmTuning};

/// Knockback to apply for one hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knockback {
    /// Unit vector from attacker to defender
    pub direction: Vec2,
    /// Impulse on the defender
    pub magnitude: f32,
    /// Impulse on the attacker, opposite `direction` (Over-Spin only)
    pub recoil: f32,
}

/// Pick the attacker of a pair; ties go to `a`
pub fn attacker_of<'a>(a: &'a Entity, b: &'a Entity) -> (&'a Entity, &'a Entity) {
    if b.rpm > a.rpm { (b, a) } else { (a, b) }
}

/// `closing_speed` is `|v_attacker - v_defender|` at the moment of contact
pub fn knockback(
    attacker: &Entity,
    defender: &Entity,
    closing_speed: f32,
    boss_duel: bool,
    combat: &CombatTuning,
    rpm: &RpmTuning,
) -> Knockback {
    let direction = direction_or_default(attacker.pos, defender.pos);
    let mut magnitude = combat.knockback_base
        + attacker.rpm * combat.knockback_rpm_scale
        + closing_speed * combat.knockback_velocity_scale;

    if boss_duel && attacker.role == Role::Boss {
        magnitude *= combat.boss_knockback_multiplier;
    }
    let overspin = RpmZone::of(attacker.rpm, rpm) == RpmZone::OverSpin;
    if overspin {
        magnitude *= combat.overspin_knockback_multiplier;
    }
    if RpmZone::of(defender.rpm, rpm) == RpmZone::Wobble {
        magnitude *= combat.wobble_knockback_multiplier;
    }

    Knockback {
        direction,
        magnitude,
        recoil: if overspin { magnitude * combat.recoil_fraction } else { 0.0 },
    }
}

/// RPM the player loses when hit; `multiplier` is the boss damage
/// multiplier in a duel and 1 otherwise
pub fn player_drain(attacker_rpm: f32, defender_rpm: f32, multiplier: f32, combat: &CombatTuning) -> f32 {
    let diff = (attacker_rpm - defender_rpm).max(0.0);
    (combat.player_hit_base + diff * combat.player_hit_diff_scale) * multiplier
}

/// Update a bot's chain memory for a hit at `tick` and return the drain
pub fn chain_drain(defender: &mut Entity, tick: u64, combat: &CombatTuning) -> f32 {
    let in_window = defender
        .last_hit_tick
        .is_some_and(|last| tick.saturating_sub(last) <= combat.chain_window_ticks);
    defender.chain_hits = if in_window { defender.chain_hits + 1 } else { 1 };
    defender.last_hit_tick = Some(tick);
    combat.chain_base + (defender.chain_hits - 1) as f32 * combat.chain_step
}

/// Resolve every collision the physics port reported this step
pub fn resolve_collisions<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    let mut pairs: Vec<(EntityId, EntityId, f32)> = s
        .physics
        .drain_collision_starts()
        .into_iter()
        .filter_map(|contact| {
            // Walls and removed bodies have no entity
            let (a, b) = (s.entity_for_body(contact.a)?, s.entity_for_body(contact.b)?);
            (a != b).then(|| (a.min(b), a.max(b), contact.relative_speed))
        })
        .collect();
    // Stable sort: a pair reported twice keeps its first closing speed
    pairs.sort_by_key(|&(a, b, _)| (a, b));
    pairs.dedup_by_key(|&mut (a, b, _)| (a, b));

    for (a, b, closing_speed) in pairs {
        resolve_hit(s, a, b, closing_speed);
    }
}

fn resolve_hit<P: PhysicsPort>(s: &mut SimulationSession<P>, a: EntityId, b: EntityId, closing_speed: f32) {
    // Either side may have been eliminated by an earlier hit this tick
    let (Some(ea), Some(eb)) = (s.entity(a).filter(|e| e.alive), s.entity(b).filter(|e| e.alive)) else {
        return;
    };
    let (attacker, defender) = attacker_of(ea, eb);
    let boss_duel = s.mode == MatchMode::Duel;
    let kb = knockback(attacker, defender, closing_speed, boss_duel, &s.settings.combat, &s.settings.rpm);
    let by_boss = boss_duel && attacker.role == Role::Boss;
    let (attacker_id, attacker_body, attacker_rpm) = (attacker.id, attacker.body, attacker.rpm);
    let (defender_id, defender_body) = (defender.id, defender.body);

    s.physics.apply_impulse(defender_body, kb.direction * kb.magnitude);
    if kb.recoil > 0.0 {
        s.physics.apply_impulse(attacker_body, -kb.direction * kb.recoil);
        s.push_event(GameEvent::Recoil {
            entity: attacker_id,
            impulse: kb.recoil,
        });
    }

    let tick = s.time_ticks;
    let combat = s.settings.combat;
    let multiplier = if by_boss { s.settings.modes.duel.boss_damage_multiplier } else { 1.0 };
    let Some(defender) = s.entity_mut(defender_id) else {
        return;
    };
    let drain = match defender.role {
        Role::Player => player_drain(attacker_rpm, defender.rpm, multiplier, &combat),
        Role::Bot | Role::Boss => chain_drain(defender, tick, &combat),
    };
    defender.add_rpm(-drain);
    let chain = defender.chain_hits;
    let spun_out = defender.rpm <= 0.0;

    log::trace!(
        "Hit {} -> {}: knockback {:.1}, drain {:.1}, chain {}",
        attacker_id,
        defender_id,
        kb.magnitude,
        drain,
        chain
    );
    s.push_event(GameEvent::Hit {
        attacker: attacker_id,
        defender: defender_id,
        knockback: kb.magnitude,
        drain,
        chain,
    });

    if spun_out {
        s.eliminate(defender_id, EliminationCause::SpunOut);
    }
}
