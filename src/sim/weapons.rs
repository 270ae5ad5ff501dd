//! Boss weapons (duel rounds 2 and 3)
//!
//! Beams home in on the player and vanish on contact. Bombs are lobbed at the
//! player's position, detonate when their fuse runs out, and hit everything
//! in range with damage and knockback falling off linearly with distance.

use glam::Vec2;

use super::mode::DuelState;
use super::physics::PhysicsPort;
use super::state::{EliminationCause, GameEvent, Projectile, ProjectileState, Role, SimulationSession};
use crate::consts::SIM_DT;
use crate::{direction_or_default, unit_or_default};

/// First round the beam is available
pub const BEAM_ROUND: u32 = 2;
/// First round the bomb is available
pub const BOMB_ROUND: u32 = 3;

/// Emit projectiles on the round's fixed cadence; a zero interval disables
/// that weapon
pub fn fire<P: PhysicsPort>(s: &mut SimulationSession<P>, duel: DuelState) {
    let (Some(boss), Some(player)) = (s.entity(duel.boss), s.player()) else {
        return;
    };
    if !boss.alive || !player.alive {
        return;
    }
    let (boss_pos, boss_radius, player_pos) = (boss.pos, boss.radius, player.pos);
    let elapsed = s.time_ticks.saturating_sub(duel.round_started_tick);
    if elapsed == 0 {
        return;
    }
    let tuning = s.settings.modes.duel.clone();
    let aim = direction_or_default(boss_pos, player_pos);

    if duel.round >= BEAM_ROUND && elapsed.checked_rem(tuning.beam_interval_ticks) == Some(0) {
        let id = s.next_entity_id();
        s.projectiles.push(Projectile {
            id,
            pos: boss_pos + aim * (boss_radius + tuning.beam_radius),
            vel: aim * tuning.beam_speed,
            state: ProjectileState::Beam {
                ticks_left: tuning.beam_lifetime_ticks,
            },
        });
        log::debug!("Boss fired beam {}", id);
        s.push_event(GameEvent::BeamFired { projectile: id });
    }

    if duel.round >= BOMB_ROUND && elapsed.checked_rem(tuning.bomb_interval_ticks) == Some(0) {
        let id = s.next_entity_id();
        s.projectiles.push(Projectile {
            id,
            pos: boss_pos + aim * boss_radius,
            vel: aim * tuning.bomb_speed,
            state: ProjectileState::Armed {
                fuse_ticks: tuning.bomb_fuse_ticks,
            },
        });
        log::debug!("Boss threw bomb {}", id);
        s.push_event(GameEvent::BombThrown { projectile: id });
    }
}

/// Rotate `current` toward `desired` by at most `max_turn` radians
fn steer(current: Vec2, desired: Vec2, max_turn: f32) -> Vec2 {
    let current = unit_or_default(current);
    let angle = current.perp_dot(desired).atan2(current.dot(desired));
    Vec2::from_angle(angle.clamp(-max_turn, max_turn)).rotate(current)
}

/// Advance projectiles: homing, fuses, contact and blasts
pub fn update_projectiles<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    if s.projectiles.is_empty() {
        return;
    }
    let tuning = s.settings.modes.duel.clone();
    let bounds = s.settings.zone.arena_radius + s.settings.zone.exit_margin;
    let mut projectiles = std::mem::take(&mut s.projectiles);

    projectiles.retain_mut(|p| match p.state {
        ProjectileState::Beam { ticks_left } => {
            if ticks_left == 0 {
                return false;
            }
            let Some(player) = s.player().filter(|pl| pl.alive) else {
                return false;
            };
            let (player_pos, player_radius, player_id) = (player.pos, player.radius, player.id);

            let desired = direction_or_default(p.pos, player_pos);
            p.vel = steer(p.vel, desired, tuning.beam_turn_rate) * tuning.beam_speed;
            p.pos += p.vel * SIM_DT;
            p.state = ProjectileState::Beam {
                ticks_left: ticks_left - 1,
            };
            if p.pos.length() > bounds {
                return false;
            }

            if p.pos.distance(player_pos) <= player_radius + tuning.beam_radius {
                let push = unit_or_default(p.vel) * tuning.beam_knockback;
                damage(s, player_id, tuning.beam_drain, push);
                s.push_event(GameEvent::BeamHit {
                    projectile: p.id,
                    drain: tuning.beam_drain,
                });
                return false;
            }
            true
        }
        ProjectileState::Armed { fuse_ticks } => {
            p.vel *= tuning.bomb_drag;
            p.pos += p.vel * SIM_DT;
            if p.pos.length() > bounds {
                return false;
            }
            if fuse_ticks > 1 {
                p.state = ProjectileState::Armed {
                    fuse_ticks: fuse_ticks - 1,
                };
                return true;
            }
            detonate(s, p.pos, &tuning);
            s.push_event(GameEvent::BombDetonated {
                projectile: p.id,
                pos: p.pos,
            });
            p.vel = Vec2::ZERO;
            p.state = ProjectileState::Detonated {
                visual_ticks: tuning.blast_visual_ticks,
            };
            true
        }
        ProjectileState::Detonated { visual_ticks } => {
            if visual_ticks <= 1 {
                return false;
            }
            p.state = ProjectileState::Detonated {
                visual_ticks: visual_ticks - 1,
            };
            true
        }
    });

    s.projectiles = projectiles;
}

/// Apply blast damage and knockback to every non-boss top in range
fn detonate<P: PhysicsPort>(s: &mut SimulationSession<P>, at: Vec2, tuning: &crate::settings::DuelTuning) {
    let victims: Vec<_> = s
        .entities
        .iter()
        .filter(|e| e.alive && e.role != Role::Boss)
        .filter_map(|e| {
            let d = e.pos.distance(at);
            (d < tuning.blast_radius).then(|| (e.id, direction_or_default(at, e.pos), 1.0 - d / tuning.blast_radius))
        })
        .collect();

    for (id, dir, falloff) in victims {
        damage(s, id, tuning.blast_drain * falloff, dir * tuning.blast_knockback * falloff);
    }
}

/// Drain RPM and shove; eliminates on zero
fn damage<P: PhysicsPort>(s: &mut SimulationSession<P>, id: u32, drain: f32, impulse: Vec2) {
    let Some(entity) = s.entity_mut(id).filter(|e| e.alive) else {
        return;
    };
    entity.add_rpm(-drain);
    let (body, spun_out) = (entity.body, entity.rpm <= 0.0);
    s.physics.apply_impulse(body, impulse);
    if spun_out {
        s.eliminate(id, EliminationCause::SpunOut);
    }
}
