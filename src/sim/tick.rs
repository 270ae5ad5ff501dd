//! Fixed timestep simulation tick
//!
//! Core game loop that advances a session deterministically. Same seed and
//! same inputs give the same match.

use glam::Vec2;

use super::ai;
use super::combat;
use super::input::SpinKey;
use super::mode;
use super::physics::PhysicsPort;
use super::rpm::{decay_amount, friction_for, gain_amount, jitter_force, move_multiplier};
use super::state::{EliminationCause, EntityId, GamePhase, SimulationSession};
use super::weapons;
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement direction from held keys (unit length or zero)
    pub movement: Vec2,
    /// Spin key presses since the last tick, in order
    pub spin_presses: Vec<SpinKey>,
    /// Idle/demo mode - AI plays the player
    pub idle_mode: bool,
}

/// Advance the session by one fixed timestep
pub fn tick<P: PhysicsPort>(s: &mut SimulationSession<P>, input: &TickInput) {
    if s.phase.is_over() {
        return;
    }
    // Round banner: only the countdown runs, presses are dropped
    if matches!(s.phase, GamePhase::RoundTransition { .. }) {
        mode::advance_transition(s);
        return;
    }

    s.time_ticks += 1;
    s.sync_kinematics();

    let input = if input.idle_mode { autopilot(s) } else { input.clone() };
    update_player(s, &input);

    let tick = s.time_ticks;
    s.zone.update(tick, &s.settings.zone, &mut s.rng);

    ai::update_bots(s);
    apply_spin_physics(s);
    mode::update(s);

    s.physics.step(SIM_DT * 1000.0);
    s.sync_kinematics();

    combat::resolve_collisions(s);
    weapons::update_projectiles(s);
    sweep_eliminations(s);

    mode::check_outcome(s);
    s.prune_corpses();
}

/// Spin presses, movement force and decay for the player
fn update_player<P: PhysicsPort>(s: &mut SimulationSession<P>, input: &TickInput) {
    let Some(player) = s.player().filter(|p| p.alive) else {
        return;
    };
    let (body, pos) = (player.body, player.pos);
    let outside = s.is_outside_zone(pos);
    let tuning = s.settings.rpm.clone();

    let accepted = input.spin_presses.iter().filter(|key| s.spin_gate.accept(**key)).count();
    let Some(player) = s.player_mut() else {
        return;
    };
    for _ in 0..accepted {
        player.add_rpm(gain_amount(tuning.spin_gain, outside, &tuning));
    }
    player.add_rpm(-decay_amount(tuning.player_decay, outside, &tuning));
    let rpm = player.rpm;

    if input.movement != Vec2::ZERO {
        let outside_factor = if outside { tuning.outside_speed_factor } else { 1.0 };
        let force = input.movement * tuning.player_move_force * move_multiplier(rpm, &tuning) * outside_factor;
        s.physics.apply_force(body, force);
    }
}

/// Zone-dependent air friction and Over-Spin jitter for every living top
fn apply_spin_physics<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    for i in 0..s.entities.len() {
        let (body, rpm, alive) = (s.entities[i].body, s.entities[i].rpm, s.entities[i].alive);
        if !alive {
            continue;
        }
        s.physics.set_friction_air(body, friction_for(rpm, &s.settings.rpm));
        let jitter = jitter_force(rpm, &s.settings.rpm, &mut s.rng);
        if jitter != Vec2::ZERO {
            s.physics.apply_force(body, jitter);
        }
    }
}

/// Spun out or knocked through an opening
fn sweep_eliminations<P: PhysicsPort>(s: &mut SimulationSession<P>) {
    let bounds = s.settings.zone.arena_radius + s.settings.zone.exit_margin;
    let doomed: Vec<(EntityId, EliminationCause)> = s
        .entities
        .iter()
        .filter(|e| e.alive)
        .filter_map(|e| {
            if e.rpm <= 0.0 {
                Some((e.id, EliminationCause::SpunOut))
            } else if e.pos.length() > bounds {
                Some((e.id, EliminationCause::FellOut))
            } else {
                None
            }
        })
        .collect();

    for (id, cause) in doomed {
        s.eliminate(id, cause);
    }
}

/// Demo player: steer like a bot and keep the spin up
fn autopilot<P: PhysicsPort>(s: &SimulationSession<P>) -> TickInput {
    let Some(player) = s.player().filter(|p| p.alive) else {
        return TickInput::default();
    };
    let intent = ai::decide(player, &s.entities, &s.zone, &s.openings, s.time_ticks, &s.settings);

    let mut spin_presses = Vec::new();
    if player.rpm < s.settings.rpm.high {
        spin_presses.push(match s.spin_gate.last() {
            Some(SpinKey::Left) => SpinKey::Right,
            _ => SpinKey::Left,
        });
    }
    TickInput {
        movement: intent.direction,
        spin_presses,
        idle_mode: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::mode::{MatchMode, ModeState};
    use crate::sim::physics::CircleWorld;
    use crate::sim::state::{GameEvent, Role};

    fn quiet_survival() -> SimulationSession<CircleWorld> {
        let mut settings = Settings::default();
        settings.rpm.player_decay = 0.0;
        let mut s = SimulationSession::new(CircleWorld::new(), MatchMode::Survival, settings, 12345);
        if let Some(p) = s.player_mut() {
            p.set_rpm(50.0);
        }
        s
    }

    fn presses(keys: &[SpinKey]) -> TickInput {
        TickInput {
            spin_presses: keys.to_vec(),
            ..Default::default()
        }
    }

    fn player_rpm(s: &SimulationSession<CircleWorld>) -> f32 {
        s.player().map(|p| p.rpm).unwrap_or_default()
    }

    #[test]
    fn test_alternating_presses_all_count() {
        let mut s = quiet_survival();
        tick(&mut s, &presses(&[SpinKey::Left, SpinKey::Right, SpinKey::Left]));
        assert!((player_rpm(&s) - (50.0 + 3.0 * s.settings.rpm.spin_gain)).abs() < 1e-4);
    }

    #[test]
    fn test_repeated_press_counts_once() {
        let mut s = quiet_survival();
        tick(&mut s, &presses(&[SpinKey::Left, SpinKey::Left]));
        assert!((player_rpm(&s) - (50.0 + s.settings.rpm.spin_gain)).abs() < 1e-4);

        // Alternation memory spans ticks
        tick(&mut s, &presses(&[SpinKey::Left]));
        assert!((player_rpm(&s) - (50.0 + s.settings.rpm.spin_gain)).abs() < 1e-4);
    }

    #[test]
    fn test_outside_zone_decays_faster() {
        let mut s = SimulationSession::new(CircleWorld::new(), MatchMode::Survival, Settings::default(), 5);
        s.zone.center = Vec2::new(200.0, 0.0);
        s.zone.drift_target = s.zone.center;
        s.zone.radius = 10.0;
        let before = player_rpm(&s);
        tick(&mut s, &TickInput::default());
        let expected = s.settings.rpm.player_decay * s.settings.rpm.outside_decay_multiplier;
        assert!((before - player_rpm(&s) - expected).abs() < 1e-4);
    }

    #[test]
    fn test_player_spins_out() {
        let mut s = SimulationSession::new(CircleWorld::new(), MatchMode::Survival, Settings::default(), 5);
        if let Some(p) = s.player_mut() {
            p.set_rpm(0.01);
        }
        tick(&mut s, &TickInput::default());
        assert_eq!(s.phase, GamePhase::Defeat);
        assert!(s.events().contains(&GameEvent::Defeat));

        // Terminal phases don't advance
        let t = s.time_ticks;
        tick(&mut s, &TickInput::default());
        assert_eq!(s.time_ticks, t);
    }

    #[test]
    fn test_bot_falls_out_through_opening() {
        let mut settings = Settings::default();
        settings.modes.arena.bot_count = 0;
        let mut s = SimulationSession::new(CircleWorld::new(), MatchMode::Arena, settings, 5);
        let angle = s.openings[0].angle;
        let bot = s.spawn_entity(Role::Bot, crate::polar_to_cartesian(420.0, angle), Vec2::ZERO, 60.0, 0.5);
        tick(&mut s, &TickInput::default());
        assert!(s.entity(bot).is_some_and(|b| !b.alive));
        assert!(s.events().iter().any(|e| matches!(
            e,
            GameEvent::Eliminated {
                cause: EliminationCause::FellOut,
                ..
            }
        )));
        assert_eq!(s.phase, GamePhase::Victory);
    }

    #[test]
    fn test_round_transition_freezes_everything() {
        let mut s = SimulationSession::new(CircleWorld::new(), MatchMode::Duel, Settings::default(), 9);
        let ModeState::Duel(duel) = s.mode_state else {
            panic!("duel state expected");
        };
        s.spin_gate.accept(SpinKey::Right);
        s.eliminate(duel.boss, EliminationCause::SpunOut);
        mode::check_outcome(&mut s);
        assert!(matches!(s.phase, GamePhase::RoundTransition { .. }));

        let (t, rpm) = (s.time_ticks, player_rpm(&s));
        tick(&mut s, &presses(&[SpinKey::Left]));
        assert_eq!(s.time_ticks, t);
        assert_eq!(player_rpm(&s), rpm);
        // Dropped press leaves the alternation memory alone
        assert_eq!(s.spin_gate.last(), Some(SpinKey::Right));
    }

    #[test]
    fn test_zone_shrinks_each_second() {
        let mut s = quiet_survival();
        let start = s.zone.radius;
        for _ in 0..TICKS_PER_SECOND * 3 {
            tick(&mut s, &TickInput::default());
        }
        let expected = start - 3.0 * s.settings.modes.survival.shrink.per_second;
        assert!((s.zone.radius - expected).abs() < 1e-3);
    }

    #[test]
    fn test_idle_mode_keeps_player_spinning() {
        let mut s = SimulationSession::new(CircleWorld::new(), MatchMode::Survival, Settings::default(), 5);
        let idle = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        // Before the first survival spawn
        for _ in 0..200 {
            tick(&mut s, &idle);
        }
        assert!(s.player().is_some_and(|p| p.alive && p.rpm >= s.settings.rpm.low));
    }

    #[test]
    fn test_determinism() {
        // Two sessions with the same seed should produce identical results
        let mut s1 = SimulationSession::new(CircleWorld::new(), MatchMode::Arena, Settings::default(), 99999);
        let mut s2 = SimulationSession::new(CircleWorld::new(), MatchMode::Arena, Settings::default(), 99999);

        let inputs = [
            TickInput {
                movement: Vec2::X,
                spin_presses: vec![SpinKey::Left],
                ..Default::default()
            },
            TickInput {
                movement: Vec2::new(0.0, -1.0),
                spin_presses: vec![SpinKey::Right, SpinKey::Left],
                ..Default::default()
            },
            TickInput::default(),
        ];

        for i in 0..300 {
            let input = &inputs[i % inputs.len()];
            tick(&mut s1, input);
            tick(&mut s2, input);
        }

        assert_eq!(s1.time_ticks, s2.time_ticks);
        assert_eq!(s1.entities.len(), s2.entities.len());
        for (a, b) in s1.entities.iter().zip(&s2.entities) {
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.rpm, b.rpm);
            assert_eq!(a.alive, b.alive);
        }
        assert_eq!(s1.zone.center, s2.zone.center);
    }
}
