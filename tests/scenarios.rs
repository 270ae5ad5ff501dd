//! End-to-end match scenarios through `Game` and the session API

use glam::Vec2;
use spin_arena::consts::SIM_DT;
use spin_arena::sim::{EliminationCause, GameEvent, GamePhase, Key, MatchMode, ModeState, SimulationSession, tick};
use spin_arena::sim::{CircleWorld, TickInput};
use spin_arena::{Game, Settings};

fn step(game: &mut Game, ticks: u32) {
    for _ in 0..ticks {
        // Slightly over one tick so float drift never skips a frame
        game.advance(SIM_DT * 1.001);
    }
}

#[test]
fn test_spin_alternation_through_key_events() {
    let mut settings = Settings::default();
    settings.rpm.player_decay = 0.0;
    let gain = settings.rpm.spin_gain;
    let mut game: Game = Game::start_match(MatchMode::Survival, settings, 3);
    let start = game.snapshot().player_rpm;

    // J, K, J all count
    for key in [Key::SpinLeft, Key::SpinRight, Key::SpinLeft] {
        game.key_down(key);
        game.key_up(key);
    }
    step(&mut game, 1);
    let after_alternating = game.snapshot().player_rpm;
    assert!((after_alternating - start - 3.0 * gain).abs() < 1e-3);

    // K then K again: only the first counts
    game.key_down(Key::SpinRight);
    game.key_up(Key::SpinRight);
    game.key_down(Key::SpinRight);
    game.key_up(Key::SpinRight);
    step(&mut game, 1);
    assert!((game.snapshot().player_rpm - after_alternating - gain).abs() < 1e-3);
}

#[test]
fn test_arena_clear_is_victory() {
    let mut settings = Settings::default();
    settings.modes.arena.bot_count = 3;
    let mut s = SimulationSession::new(CircleWorld::new(), MatchMode::Arena, settings, 8);
    let bots: Vec<_> = s.entities.iter().filter(|e| e.is_bot()).map(|e| e.id).collect();
    assert_eq!(bots.len(), 3);

    for id in &bots {
        s.eliminate(*id, EliminationCause::SpunOut);
    }
    tick(&mut s, &TickInput::default());
    assert_eq!(s.phase, GamePhase::Victory);
    assert_eq!(s.stats.bots_eliminated, 3);
    let events = s.take_events();
    assert!(events.contains(&GameEvent::Victory));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::Eliminated { cause: EliminationCause::SpunOut, .. }))
            .count(),
        3
    );
}

#[test]
fn test_duel_runs_three_rounds_to_victory() {
    let mut s = SimulationSession::new(CircleWorld::new(), MatchMode::Duel, Settings::default(), 21);
    let ModeState::Duel(duel) = s.mode_state else {
        panic!("duel state expected");
    };
    let mut rounds_started = Vec::new();

    for round in 1..=3 {
        assert_eq!(s.mode_state.round(), Some(round));
        s.eliminate(duel.boss, EliminationCause::SpunOut);
        tick(&mut s, &TickInput::default());
        while matches!(s.phase, GamePhase::RoundTransition { .. }) {
            tick(&mut s, &TickInput::default());
        }
        rounds_started.extend(s.take_events().into_iter().filter_map(|e| match e {
            GameEvent::RoundStarted { round } => Some(round),
            _ => None,
        }));
    }

    assert_eq!(rounds_started, vec![2, 3]);
    assert_eq!(s.phase, GamePhase::Victory);
}

#[test]
fn test_duel_boss_cap_and_reset_between_rounds() {
    let mut s = SimulationSession::new(CircleWorld::new(), MatchMode::Duel, Settings::default(), 4);
    let ModeState::Duel(duel) = s.mode_state else {
        panic!("duel state expected");
    };
    // Move a bit so positions and zone change
    for _ in 0..30 {
        tick(
            &mut s,
            &TickInput {
                movement: Vec2::X,
                ..Default::default()
            },
        );
    }
    s.eliminate(duel.boss, EliminationCause::SpunOut);
    tick(&mut s, &TickInput::default());
    while matches!(s.phase, GamePhase::RoundTransition { .. }) {
        tick(&mut s, &TickInput::default());
    }

    let boss = s.entity(duel.boss).expect("boss");
    assert_eq!(boss.rpm_cap, 85.0);
    assert_eq!(boss.rpm, 85.0);
    let player = s.player().expect("player");
    assert_eq!(player.pos, Vec2::new(0.0, s.settings.modes.duel.spawn_distance));
    assert_eq!(player.rpm, s.settings.rpm.player_start);
    assert_eq!(s.zone.radius, s.settings.zone.start_radius);
    assert_eq!(s.zone.center, Vec2::ZERO);
}

#[test]
fn test_pause_freezes_decay_and_zone() {
    let mut game: Game = Game::start_match(MatchMode::Arena, Settings::default(), 77);
    step(&mut game, 30);
    game.pause();
    let frozen = game.snapshot();
    for _ in 0..100 {
        game.advance(0.1);
    }
    let still = game.snapshot();
    assert_eq!(still.tick, frozen.tick);
    assert_eq!(still.player_rpm, frozen.player_rpm);
    assert_eq!(still.zone_radius, frozen.zone_radius);
    assert_eq!(still.zone_center, frozen.zone_center);
}

#[test]
fn test_idle_match_is_repeatable() {
    let run = || {
        let mut game: Game = Game::start_match(MatchMode::Arena, Settings::default(), 2024);
        game.set_idle_mode(true);
        step(&mut game, 600);
        let snap = game.snapshot();
        (snap.tick, snap.player_rpm, snap.bots_alive, snap.stats.bots_eliminated)
    };
    assert_eq!(run(), run());
}
