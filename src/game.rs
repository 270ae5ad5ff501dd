//! Host-facing driver
//!
//! Wraps a [`SimulationSession`] with the fixed-step accumulator, pause and
//! restart, and the raw key queue. Hosts feed it wall-clock time and key
//! events, then read a [`Snapshot`] and drain [`GameEvent`]s each frame.

use crate::consts::{MAX_FRAME_TIME, MAX_SUBSTEPS, SIM_DT};
use crate::settings::Settings;
use crate::sim::input::{Key, KeyState, SpinKey};
use crate::sim::mode::MatchMode;
use crate::sim::physics::{CircleWorld, PhysicsPort};
use crate::sim::snapshot::Snapshot;
use crate::sim::state::{GameEvent, GamePhase, SimulationSession};
use crate::sim::tick::{TickInput, tick};

/// Everything needed to (re)create a match
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub mode: MatchMode,
    pub settings: Settings,
    pub seed: u64,
}

/// Game instance holding the session and host-side input state
pub struct Game<P: PhysicsPort + Default = CircleWorld> {
    session: SimulationSession<P>,
    config: MatchConfig,
    accumulator: f32,
    keys: KeyState,
    /// Spin presses waiting for the next tick
    pending_spins: Vec<SpinKey>,
    paused: bool,
    idle_mode: bool,
}

impl<P: PhysicsPort + Default> Game<P> {
    /// Create a fresh session with a new physics world. Settings that fail
    /// validation are replaced by the defaults.
    pub fn start_match(mode: MatchMode, settings: Settings, seed: u64) -> Self {
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                log::warn!("{}; falling back to default settings", e);
                Settings::default()
            }
        };
        let config = MatchConfig { mode, settings, seed };
        Self {
            session: SimulationSession::new(P::default(), mode, config.settings.clone(), seed),
            config,
            accumulator: 0.0,
            keys: KeyState::default(),
            pending_spins: Vec::new(),
            paused: false,
            idle_mode: false,
        }
    }

    /// Drop the session and physics world and start over with the same config
    pub fn restart(&mut self) {
        let MatchConfig { mode, seed, .. } = self.config;
        self.session = SimulationSession::new(P::default(), mode, self.config.settings.clone(), seed);
        self.accumulator = 0.0;
        self.keys.clear();
        self.pending_spins.clear();
        self.paused = false;
        log::info!("Match restarted (seed {})", seed);
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.pending_spins.clear();
            log::debug!("Paused at tick {}", self.session.time_ticks);
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // Time spent paused must not be replayed
            self.accumulator = 0.0;
            log::debug!("Resumed at tick {}", self.session.time_ticks);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_idle_mode(&mut self, on: bool) {
        self.idle_mode = on;
        log::info!("Idle mode: {}", on);
    }

    /// Raw key-down; auto-repeat of a held key is ignored
    pub fn key_down(&mut self, key: Key) {
        if !self.keys.press(key) {
            return;
        }
        let Some(spin) = key.spin() else {
            return;
        };
        // Held state is tracked either way; lockout only drops the press
        let locked = self.paused || !matches!(self.session.phase, GamePhase::Playing);
        if !locked {
            self.pending_spins.push(spin);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.keys.release(key);
    }

    /// Feed wall-clock time; runs the ticks it covers and returns how many
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        if self.paused {
            return 0;
        }
        self.accumulator += elapsed.clamp(0.0, MAX_FRAME_TIME);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = TickInput {
                movement: self.keys.movement(),
                spin_presses: std::mem::take(&mut self.pending_spins),
                idle_mode: self.idle_mode,
            };
            tick(&mut self.session, &input);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            paused: self.paused,
            ..self.session.snapshot()
        }
    }

    pub fn session(&self) -> &SimulationSession<P> {
        &self.session
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.session.take_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survival() -> Game {
        Game::start_match(MatchMode::Survival, Settings::default(), 42)
    }

    #[test]
    fn test_accumulator_runs_whole_ticks() {
        let mut game = survival();
        assert_eq!(game.advance(SIM_DT * 0.5), 0);
        assert_eq!(game.advance(SIM_DT * 0.6), 1);
        assert_eq!(game.session().time_ticks, 1);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut game = survival();
        let ran = game.advance(5.0);
        assert!(ran <= (MAX_FRAME_TIME / SIM_DT).ceil() as u32);
        assert!(ran >= 5);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut game = survival();
        game.advance(0.05);
        let before = game.snapshot();
        game.pause();
        assert_eq!(game.advance(0.1), 0);
        let during = game.snapshot();
        assert!(during.paused);
        assert_eq!(during.tick, before.tick);
        assert_eq!(during.player_rpm, before.player_rpm);

        game.resume();
        assert!(game.advance(0.05) > 0);
        assert!(!game.snapshot().paused);
    }

    #[test]
    fn test_spin_key_auto_repeat_ignored() {
        let mut settings = Settings::default();
        settings.rpm.player_decay = 0.0;
        let mut game: Game = Game::start_match(MatchMode::Survival, settings, 1);
        let start = game.snapshot().player_rpm;
        game.key_down(Key::SpinLeft);
        game.key_down(Key::SpinLeft);
        game.advance(SIM_DT * 1.01);
        assert!((game.snapshot().player_rpm - start - game.config().settings.rpm.spin_gain).abs() < 1e-4);
    }

    #[test]
    fn test_presses_while_paused_are_dropped() {
        let mut settings = Settings::default();
        settings.rpm.player_decay = 0.0;
        let mut game: Game = Game::start_match(MatchMode::Survival, settings, 1);
        let start = game.snapshot().player_rpm;
        game.pause();
        game.key_down(Key::SpinLeft);
        game.key_up(Key::SpinLeft);
        game.resume();
        game.advance(SIM_DT * 1.01);
        assert_eq!(game.snapshot().player_rpm, start);
        assert_eq!(game.session().spin_gate.last(), None);
    }

    #[test]
    fn test_invalid_settings_fall_back_to_defaults() {
        let mut settings = Settings::default();
        settings.modes.duel.beam_interval_ticks = 0;
        settings.modes.duel.shrink.min_radius = settings.zone.start_radius + 50.0;
        let mut game: Game = Game::start_match(MatchMode::Duel, settings, 9);

        let defaults = Settings::default();
        let config = &game.config().settings;
        assert_eq!(config.modes.duel.beam_interval_ticks, defaults.modes.duel.beam_interval_ticks);
        assert_eq!(config.modes.duel.shrink.min_radius, defaults.modes.duel.shrink.min_radius);
        assert_eq!(game.session().zone.min_radius, defaults.modes.duel.shrink.min_radius);

        game.advance(0.1);
        game.restart();
        let restarted = &game.session().settings.modes.duel;
        assert_eq!(restarted.beam_interval_ticks, defaults.modes.duel.beam_interval_ticks);
    }

    #[test]
    fn test_restart_resets_session() {
        let mut game = survival();
        game.advance(0.1);
        game.advance(0.1);
        assert!(game.session().time_ticks > 0);
        game.restart();
        assert_eq!(game.session().time_ticks, 0);
        assert_eq!(game.session().seed, 42);
        assert!(game.drain_events().is_empty());
    }
}
