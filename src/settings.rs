//! Game balance settings
//!
//! Every tuning constant of the simulation lives here so balance passes can be
//! made from a JSON file without recompiling. Missing fields fall back to the
//! defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{ARENA_RADIUS, MAX_RPM};

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// RPM thresholds, decay/gain and zone-dependent modifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpmTuning {
    /// Lower bound of the Sweet Spot (Wobble below)
    pub low: f32,
    /// Upper bound of the Sweet Spot (Over-Spin above)
    pub high: f32,
    pub player_start: f32,
    pub player_decay: f32,
    pub bot_decay: f32,
    /// Decay multiplier while outside the safe zone
    pub outside_decay_multiplier: f32,
    /// RPM added per accepted spin press
    pub spin_gain: f32,
    /// Gain efficiency while outside the safe zone
    pub outside_gain_factor: f32,
    /// Movement force multiplier while outside the safe zone
    pub outside_speed_factor: f32,
    pub wobble_move: f32,
    pub sweet_move: f32,
    pub overspin_move_min: f32,
    pub overspin_move_max: f32,
    /// Air friction at rpm = 0
    pub wobble_friction_max: f32,
    /// Air friction at rpm = low
    pub wobble_friction_min: f32,
    pub sweet_friction: f32,
    /// Air friction at rpm = 100
    pub overspin_friction_min: f32,
    /// Jitter force at rpm = 100
    pub overspin_jitter: f32,
    pub player_move_force: f32,
}

impl Default for RpmTuning {
    fn default() -> Self {
        Self {
            low: 40.0,
            high: 60.0,
            player_start: 60.0,
            player_decay: 0.05,
            bot_decay: 0.03,
            outside_decay_multiplier: 4.0,
            spin_gain: 4.0,
            outside_gain_factor: 0.15,
            outside_speed_factor: 0.7,
            wobble_move: 0.4,
            sweet_move: 1.0,
            overspin_move_min: 1.3,
            overspin_move_max: 2.3,
            wobble_friction_max: 0.12,
            wobble_friction_min: 0.04,
            sweet_friction: 0.03,
            overspin_friction_min: 0.005,
            overspin_jitter: 120.0,
            player_move_force: 400.0,
        }
    }
}

/// Safe zone geometry and movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneTuning {
    pub arena_radius: f32,
    pub start_radius: f32,
    /// Drift speed (units per tick)
    pub drift_speed: f32,
    /// Distance at which a drift target counts as reached
    pub drift_epsilon: f32,
    /// Gap kept between the drifting zone and the outer wall
    pub drift_margin: f32,
    /// Smallest radius a drift target may be picked within
    pub drift_min_range: f32,
    /// Hazard opening centres (radians)
    pub opening_angles: Vec<f32>,
    /// Angular width of each hazard opening (radians)
    pub opening_width: f32,
    /// Distance past the wall at which an entity counts as fallen out
    pub exit_margin: f32,
}

impl Default for ZoneTuning {
    fn default() -> Self {
        use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};
        Self {
            arena_radius: ARENA_RADIUS,
            start_radius: 330.0,
            drift_speed: 0.3,
            drift_epsilon: 2.0,
            drift_margin: 30.0,
            drift_min_range: 50.0,
            opening_angles: vec![FRAC_PI_4, FRAC_PI_4 + FRAC_PI_2, FRAC_PI_4 + PI, -FRAC_PI_4],
            opening_width: 0.35,
            exit_margin: 30.0,
        }
    }
}

/// Collision knockback and RPM drain
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub knockback_base: f32,
    pub knockback_rpm_scale: f32,
    pub knockback_velocity_scale: f32,
    pub boss_knockback_multiplier: f32,
    pub overspin_knockback_multiplier: f32,
    /// Fraction of the final knockback returned to an Over-Spin attacker
    pub recoil_fraction: f32,
    pub wobble_knockback_multiplier: f32,
    pub player_hit_base: f32,
    pub player_hit_diff_scale: f32,
    pub chain_window_ticks: u64,
    pub chain_base: f32,
    pub chain_step: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            knockback_base: 150.0,
            knockback_rpm_scale: 2.0,
            knockback_velocity_scale: 0.3,
            boss_knockback_multiplier: 2.0,
            overspin_knockback_multiplier: 1.6,
            recoil_fraction: 0.5,
            wobble_knockback_multiplier: 1.5,
            player_hit_base: 6.0,
            player_hit_diff_scale: 0.25,
            chain_window_ticks: 120,
            chain_base: 8.0,
            chain_step: 4.0,
        }
    }
}

/// Bot decision making and housekeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    pub move_force: f32,
    pub dodge_radius: f32,
    /// RPM advantage that makes another entity a threat
    pub dodge_rpm_margin: f32,
    pub hazard_radius: f32,
    pub hazard_weight: f32,
    pub dodge_threshold: f32,
    /// Fraction of the zone radius past which a bot heads back in
    pub survival_margin: f32,
    /// RPM above `low` needed before a bot goes hunting
    pub chase_rpm_margin: f32,
    /// RPM advantage required over a chase target
    pub target_rpm_margin: f32,
    pub detection_radius: f32,
    pub flank_amplitude: f32,
    pub flank_frequency: f32,
    pub wander_turn_rate: f32,
    pub flee_radius: f32,
    pub flee_center_bias: f32,
    pub separation_radius: f32,
    pub separation_strength: f32,
    pub spin_chance: f32,
    pub emergency_spin_chance: f32,
    pub spin_gain: f32,
    pub regen: f32,
    pub rpm_floor: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            move_force: 300.0,
            dodge_radius: 120.0,
            dodge_rpm_margin: 10.0,
            hazard_radius: 90.0,
            hazard_weight: 1.5,
            dodge_threshold: 0.6,
            survival_margin: 0.85,
            chase_rpm_margin: 10.0,
            target_rpm_margin: 8.0,
            detection_radius: 300.0,
            flank_amplitude: 0.3,
            flank_frequency: 0.05,
            wander_turn_rate: 0.01,
            flee_radius: 150.0,
            flee_center_bias: 0.3,
            separation_radius: 45.0,
            separation_strength: 0.8,
            spin_chance: 0.05,
            emergency_spin_chance: 0.15,
            spin_gain: 3.0,
            regen: 0.02,
            rpm_floor: 15.0,
        }
    }
}

/// Per-mode shrink rates and floors
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShrinkTuning {
    pub per_second: f32,
    pub min_radius: f32,
}

/// Arena mode roster
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub bot_count: u32,
    /// Spawn ring radius as a fraction of the arena radius
    pub ring_fraction: f32,
    pub shrink: ShrinkTuning,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            bot_count: 10,
            ring_fraction: 0.6,
            shrink: ShrinkTuning {
                per_second: 3.0,
                min_radius: 80.0,
            },
        }
    }
}

/// Survival mode spawning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivalTuning {
    pub spawn_interval_ticks: u64,
    pub max_alive: u32,
    pub spawn_speed: f32,
    /// How far inside the wall a bot appears
    pub spawn_inset: f32,
    pub shrink: ShrinkTuning,
}

impl Default for SurvivalTuning {
    fn default() -> Self {
        Self {
            spawn_interval_ticks: 240,
            max_alive: 15,
            spawn_speed: 120.0,
            spawn_inset: 25.0,
            shrink: ShrinkTuning {
                per_second: 1.5,
                min_radius: 120.0,
            },
        }
    }
}

/// Duel mode boss, rounds and weapons
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelTuning {
    /// Boss RPM cap per round (index 0 = round 1)
    pub boss_rpm_caps: Vec<f32>,
    /// Drain multiplier applied when the boss hits the player
    pub boss_damage_multiplier: f32,
    pub spawn_distance: f32,
    pub transition_ticks: u32,
    pub beam_interval_ticks: u64,
    pub beam_speed: f32,
    pub beam_turn_rate: f32,
    pub beam_lifetime_ticks: u32,
    pub beam_radius: f32,
    pub beam_drain: f32,
    pub beam_knockback: f32,
    pub bomb_interval_ticks: u64,
    pub bomb_speed: f32,
    pub bomb_drag: f32,
    pub bomb_fuse_ticks: u32,
    pub blast_radius: f32,
    pub blast_drain: f32,
    pub blast_knockback: f32,
    pub blast_visual_ticks: u32,
    pub shrink: ShrinkTuning,
}

impl Default for DuelTuning {
    fn default() -> Self {
        Self {
            boss_rpm_caps: vec![70.0, 85.0, 100.0],
            boss_damage_multiplier: 1.5,
            spawn_distance: 150.0,
            transition_ticks: 120,
            beam_interval_ticks: 90,
            beam_speed: 260.0,
            beam_turn_rate: 0.05,
            beam_lifetime_ticks: 150,
            beam_radius: 6.0,
            beam_drain: 6.0,
            beam_knockback: 180.0,
            bomb_interval_ticks: 150,
            bomb_speed: 200.0,
            bomb_drag: 0.97,
            bomb_fuse_ticks: 75,
            blast_radius: 110.0,
            blast_drain: 18.0,
            blast_knockback: 320.0,
            blast_visual_ticks: 30,
            shrink: ShrinkTuning {
                per_second: 2.0,
                min_radius: 100.0,
            },
        }
    }
}

/// Mode-specific tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTuning {
    pub arena: ArenaTuning,
    pub survival: SurvivalTuning,
    pub duel: DuelTuning,
}

/// Complete simulation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rpm: RpmTuning,
    pub zone: ZoneTuning,
    pub combat: CombatTuning,
    pub ai: AiTuning,
    pub modes: ModeTuning,
}

impl Settings {
    /// Parse settings from JSON; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Check cross-field constraints the type system can't express
    pub fn validate(&self) -> Result<(), SettingsError> {
        let rpm = &self.rpm;
        if !(0.0 < rpm.low && rpm.low < rpm.high && rpm.high < MAX_RPM) {
            return Err(SettingsError::Invalid(format!(
                "zone thresholds must satisfy 0 < low < high < {MAX_RPM} (got {}/{})",
                rpm.low, rpm.high
            )));
        }
        if self.zone.arena_radius <= 0.0 || self.zone.start_radius <= 0.0 {
            return Err(SettingsError::Invalid("arena and zone radii must be positive".into()));
        }
        if self.zone.start_radius > self.zone.arena_radius {
            return Err(SettingsError::Invalid(
                "safe zone cannot start larger than the arena".into(),
            ));
        }
        let shrinks = [
            ("arena", &self.modes.arena.shrink),
            ("survival", &self.modes.survival.shrink),
            ("duel", &self.modes.duel.shrink),
        ];
        for (mode, shrink) in shrinks {
            if !(0.0..=self.zone.start_radius).contains(&shrink.min_radius) {
                return Err(SettingsError::Invalid(format!(
                    "{mode} zone floor must be within 0..={} (got {})",
                    self.zone.start_radius, shrink.min_radius
                )));
            }
        }
        if self.modes.survival.spawn_interval_ticks == 0
            || self.modes.duel.beam_interval_ticks == 0
            || self.modes.duel.bomb_interval_ticks == 0
        {
            return Err(SettingsError::Invalid("spawn/weapon intervals must be non-zero".into()));
        }
        if self.modes.duel.boss_rpm_caps.is_empty() {
            return Err(SettingsError::Invalid("duel needs at least one round".into()));
        }
        Ok(())
    }
}
