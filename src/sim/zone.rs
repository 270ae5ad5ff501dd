//! Safe zone controller
//!
//! A circle that shrinks once per simulated second and drifts toward randomly
//! chosen targets. Being outside it costs RPM.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::TICKS_PER_SECOND;
use crate::polar_to_cartesian;
use crate::settings::{ShrinkTuning, ZoneTuning};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeZone {
    pub center: Vec2,
    pub radius: f32,
    pub drift_target: Vec2,
    pub min_radius: f32,
    pub shrink_per_second: f32,
}

impl SafeZone {
    /// The floor is clamped to `0..=start_radius`, so the zone can only shrink
    pub fn new(zone: &ZoneTuning, shrink: ShrinkTuning) -> Self {
        let start = zone.start_radius.max(0.0);
        Self {
            center: Vec2::ZERO,
            radius: start,
            drift_target: Vec2::ZERO,
            min_radius: shrink.min_radius.clamp(0.0, start),
            shrink_per_second: shrink.per_second.max(0.0),
        }
    }

    /// Restore the starting geometry (duel round transitions only)
    pub fn reset(&mut self, zone: &ZoneTuning) {
        self.center = Vec2::ZERO;
        self.radius = zone.start_radius.max(self.min_radius);
        self.drift_target = Vec2::ZERO;
    }

    #[inline]
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.distance(self.center) <= self.radius
    }

    /// Advance shrink and drift by one tick
    pub fn update(&mut self, tick: u64, zone: &ZoneTuning, rng: &mut impl Rng) {
        if tick > 0 && tick % TICKS_PER_SECOND == 0 && self.radius > self.min_radius {
            self.radius = (self.radius - self.shrink_per_second).max(self.min_radius);
        }

        let to_target = self.drift_target - self.center;
        let dist = to_target.length();
        if dist < zone.drift_epsilon {
            self.drift_target = self.pick_target(zone, rng);
        } else {
            let step = zone.drift_speed.min(dist);
            self.center += to_target / dist * step;
        }
    }

    /// Random point the center may drift to without pushing the zone into the wall
    fn pick_target(&self, zone: &ZoneTuning, rng: &mut impl Rng) -> Vec2 {
        let range = (zone.arena_radius - self.radius - zone.drift_margin).max(zone.drift_min_range);
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        // sqrt for uniform area density
        let r = rng.random::<f32>().sqrt() * range;
        polar_to_cartesian(r, angle)
    }
}
