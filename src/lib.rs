//! Spin Arena - a top-down spinning-top battle simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (RPM model, safe zone, combat, AI, modes)
//! - `game`: Host driver (fixed-step accumulator, pause, restart, key queue)
//! - `settings`: Data-driven game balance

pub mod game;
pub mod settings;
pub mod sim;

pub use game::Game;
pub use settings::{Settings, SettingsError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Simulation ticks per second
    pub const TICKS_PER_SECOND: u64 = 60;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest host frame fed into the accumulator (seconds)
    pub const MAX_FRAME_TIME: f32 = 0.1;

    /// Upper bound of the RPM scale
    pub const MAX_RPM: f32 = 100.0;

    /// Arena dimensions
    pub const ARENA_RADIUS: f32 = 350.0;
    pub const WALL_THICKNESS: f32 = 16.0;

    /// Top defaults
    pub const TOP_RADIUS: f32 = 18.0;
    pub const BOSS_RADIUS: f32 = 28.0;
    pub const TOP_MASS: f32 = 1.0;
    pub const BOSS_MASS: f32 = 2.0;
}

/// Fallback direction for degenerate (zero-length) vectors
pub const DEFAULT_DIR: Vec2 = Vec2::X;

/// Unit vector from `from` to `to`, or [`DEFAULT_DIR`] when the points coincide
#[inline]
pub fn direction_or_default(from: Vec2, to: Vec2) -> Vec2 {
    unit_or_default(to - from)
}

/// Normalize `v`, falling back to [`DEFAULT_DIR`] for zero-length input
#[inline]
pub fn unit_or_default(v: Vec2) -> Vec2 {
    v.try_normalize().unwrap_or(DEFAULT_DIR)
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}
