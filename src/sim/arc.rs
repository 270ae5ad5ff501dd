//! Arc segment geometry for the arena wall
//!
//! The outer wall is a ring broken by hazard openings. Each solid piece between
//! two openings is a thick arc running counter-clockwise from `theta_start` to
//! `theta_end`, with its inner face flush with the arena radius.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{normalize_angle, polar_to_cartesian};

/// A thickened arc segment in polar space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSegment {
    /// Centerline radius from arena center
    pub radius: f32,
    /// Radial thickness (extends radius ± thickness/2)
    pub thickness: f32,
    /// Start angle (radians, normalized to [-π, π))
    pub theta_start: f32,
    /// End angle (radians, normalized to [-π, π))
    pub theta_end: f32,
}

impl ArcSegment {
    pub fn new(radius: f32, thickness: f32, theta_start: f32, theta_end: f32) -> Self {
        Self {
            radius,
            thickness,
            theta_start: normalize_angle(theta_start),
            theta_end: normalize_angle(theta_end),
        }
    }

    #[inline]
    pub fn inner_radius(&self) -> f32 {
        self.radius - self.thickness / 2.0
    }

    #[inline]
    pub fn outer_radius(&self) -> f32 {
        self.radius + self.thickness / 2.0
    }

    /// Angular span of the arc (handles wraparound)
    pub fn angular_span(&self) -> f32 {
        let mut span = self.theta_end - self.theta_start;
        if span < 0.0 {
            span += std::f32::consts::TAU;
        }
        span
    }

    /// Check if an angle is within the arc's angular extent
    pub fn contains_angle(&self, theta: f32) -> bool {
        let theta = normalize_angle(theta);
        let start = self.theta_start;
        let end = self.theta_end;

        if start <= end {
            theta >= start && theta <= end
        } else {
            // Wraparound case (e.g., start=170°, end=-170°)
            theta >= start || theta <= end
        }
    }

    /// Surface normal at a given angle pointing away from the arena center
    pub fn outward_normal_at(&self, theta: f32) -> Vec2 {
        Vec2::new(theta.cos(), theta.sin())
    }

    /// Surface normal at a given angle pointing toward the arena center
    pub fn inward_normal_at(&self, theta: f32) -> Vec2 {
        -self.outward_normal_at(theta)
    }
}

/// A gap in the arena wall an entity can be knocked through
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardOpening {
    /// Center angle of the gap (radians)
    pub angle: f32,
    /// Angular width of the gap (radians)
    pub width: f32,
    /// Point on the wall centerline in the middle of the gap
    pub mouth: Vec2,
}

/// Build the hazard openings for a wall of the given radius
pub fn hazard_openings(arena_radius: f32, angles: &[f32], width: f32) -> Vec<HazardOpening> {
    let mut angles: Vec<f32> = angles.iter().map(|a| normalize_angle(*a)).collect();
    angles.sort_by(f32::total_cmp);
    angles
        .into_iter()
        .map(|angle| HazardOpening {
            angle,
            width,
            mouth: polar_to_cartesian(arena_radius, angle),
        })
        .collect()
}

/// Solid wall pieces between consecutive openings
///
/// Openings are expected sorted by angle (as returned by [`hazard_openings`]).
/// With no openings the ring is returned as two half-circles, since a single
/// arc cannot span the full circle.
pub fn wall_segments(arena_radius: f32, thickness: f32, openings: &[HazardOpening]) -> Vec<ArcSegment> {
    use std::f32::consts::PI;

    let wall_r = arena_radius + thickness / 2.0;
    if openings.is_empty() {
        return vec![
            ArcSegment::new(wall_r, thickness, -PI, 0.0),
            ArcSegment::new(wall_r, thickness, 0.0, PI - f32::EPSILON),
        ];
    }

    let n = openings.len();
    (0..n)
        .filter_map(|i| {
            let a = openings[i];
            let b = openings[(i + 1) % n];
            let start = a.angle + a.width / 2.0;
            let end = b.angle - b.width / 2.0;
            let arc = ArcSegment::new(wall_r, thickness, start, end);
            // Overlapping gaps leave no solid wall between them
            let gap = if n == 1 {
                std::f32::consts::TAU - a.width
            } else {
                let mut d = b.angle - a.angle;
                if d <= 0.0 {
                    d += std::f32::consts::TAU;
                }
                d - (a.width + b.width) / 2.0
            };
            (gap > 0.0).then_some(arc)
        })
        .collect()
}
