//! RPM & zone model
//!
//! Spin energy lives on a 0–100 scale partitioned into three zones:
//! - Wobble `[0, low)`: sluggish, sticky, takes extra knockback
//! - Sweet Spot `[low, high]`: balanced
//! - Over-Spin `(high, 100]`: fast, slippery, jittery, hits harder but recoils

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_RPM;
use crate::settings::RpmTuning;

/// Which band of the RPM scale an entity is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpmZone {
    Wobble,
    SweetSpot,
    OverSpin,
}

impl RpmZone {
    pub fn of(rpm: f32, tuning: &RpmTuning) -> Self {
        if rpm < tuning.low {
            RpmZone::Wobble
        } else if rpm <= tuning.high {
            RpmZone::SweetSpot
        } else {
            RpmZone::OverSpin
        }
    }
}

/// Clamp an RPM value into `[0, cap]` (cap itself never above 100)
#[inline]
pub fn clamp_rpm(rpm: f32, cap: f32) -> f32 {
    rpm.clamp(0.0, cap.clamp(0.0, MAX_RPM))
}

/// How far into Over-Spin `rpm` is, 0 at `high` and 1 at 100
#[inline]
fn overspin_depth(rpm: f32, tuning: &RpmTuning) -> f32 {
    ((rpm - tuning.high) / (MAX_RPM - tuning.high)).clamp(0.0, 1.0)
}

/// RPM lost this tick
pub fn decay_amount(base_decay: f32, outside_zone: bool, tuning: &RpmTuning) -> f32 {
    if outside_zone {
        base_decay * tuning.outside_decay_multiplier
    } else {
        base_decay
    }
}

/// RPM gained from one accepted spin press
pub fn gain_amount(base_gain: f32, outside_zone: bool, tuning: &RpmTuning) -> f32 {
    if outside_zone {
        base_gain * tuning.outside_gain_factor
    } else {
        base_gain
    }
}

/// Movement force multiplier for the current RPM
pub fn move_multiplier(rpm: f32, tuning: &RpmTuning) -> f32 {
    match RpmZone::of(rpm, tuning) {
        RpmZone::Wobble => tuning.wobble_move,
        RpmZone::SweetSpot => tuning.sweet_move,
        RpmZone::OverSpin => {
            let t = overspin_depth(rpm, tuning);
            tuning.overspin_move_min + t * (tuning.overspin_move_max - tuning.overspin_move_min)
        }
    }
}

/// Air friction for the current RPM
///
/// Wobble is sticky (high friction easing off toward `low`), Over-Spin is ice.
pub fn friction_for(rpm: f32, tuning: &RpmTuning) -> f32 {
    match RpmZone::of(rpm, tuning) {
        RpmZone::Wobble => {
            let t = (rpm / tuning.low).clamp(0.0, 1.0);
            tuning.wobble_friction_max + t * (tuning.wobble_friction_min - tuning.wobble_friction_max)
        }
        RpmZone::SweetSpot => tuning.sweet_friction,
        RpmZone::OverSpin => {
            let t = overspin_depth(rpm, tuning);
            tuning.sweet_friction + t * (tuning.overspin_friction_min - tuning.sweet_friction)
        }
    }
}

/// Random lateral jitter force for an Over-Spin top (zero elsewhere)
pub fn jitter_force(rpm: f32, tuning: &RpmTuning, rng: &mut impl Rng) -> Vec2 {
    if RpmZone::of(rpm, tuning) != RpmZone::OverSpin {
        return Vec2::ZERO;
    }
    let magnitude = overspin_depth(rpm, tuning) * tuning.overspin_jitter;
    let angle = rng.random::<f32>() * std::f32::consts::TAU;
    Vec2::new(angle.cos(), angle.sin()) * magnitude
}
