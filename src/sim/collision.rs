//! Contact tests used by the reference physics world
//!
//! Tops are circles; the arena wall is a set of thick arc segments. Each test
//! returns the contact normal and penetration so the caller can separate the
//! bodies and reflect velocities.

use glam::Vec2;

use super::arc::ArcSegment;
use crate::{cartesian_to_polar, polar_to_cartesian, unit_or_default};

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    pub hit: bool,
    /// Closest point on the other shape
    pub point: Vec2,
    /// Unit normal pointing from the obstacle toward the circle being tested
    pub normal: Vec2,
    /// Overlap depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }

    fn from_closest(center: Vec2, radius: f32, closest: Vec2, fallback_normal: Vec2) -> Self {
        let offset = center - closest;
        let dist = offset.length();
        if dist >= radius {
            return Self::miss();
        }
        let normal = if dist > 1e-4 { offset / dist } else { fallback_normal };
        Self {
            hit: true,
            point: closest,
            normal,
            penetration: radius - dist,
        }
    }
}

/// Check a circle against a thick arc segment (annular sector)
pub fn circle_arc_collision(center: Vec2, radius: f32, arc: &ArcSegment) -> CollisionResult {
    let (r, theta) = cartesian_to_polar(center);
    let inner_r = arc.inner_radius();
    let outer_r = arc.outer_radius();

    if arc.contains_angle(theta) {
        if r > inner_r && r < outer_r {
            // Tunneled into the band: push out through the nearer face
            return if r - inner_r < outer_r - r {
                CollisionResult {
                    hit: true,
                    point: polar_to_cartesian(inner_r, theta),
                    normal: arc.inward_normal_at(theta),
                    penetration: r - inner_r + radius,
                }
            } else {
                CollisionResult {
                    hit: true,
                    point: polar_to_cartesian(outer_r, theta),
                    normal: arc.outward_normal_at(theta),
                    penetration: outer_r - r + radius,
                }
            };
        }
        let (face_r, face_normal) = if r <= inner_r {
            (inner_r, arc.inward_normal_at(theta))
        } else {
            (outer_r, arc.outward_normal_at(theta))
        };
        return CollisionResult::from_closest(center, radius, polar_to_cartesian(face_r, theta), face_normal);
    }

    // Outside the angular span: test the two end caps
    let start_hit = cap_collision(center, radius, arc, arc.theta_start);
    let end_hit = cap_collision(center, radius, arc, arc.theta_end);
    match (start_hit.hit, end_hit.hit) {
        (true, true) if end_hit.penetration > start_hit.penetration => end_hit,
        (true, _) => start_hit,
        (false, true) => end_hit,
        (false, false) => CollisionResult::miss(),
    }
}

/// Check a circle against the radial line closing one end of an arc
fn cap_collision(center: Vec2, radius: f32, arc: &ArcSegment, theta: f32) -> CollisionResult {
    let inner = polar_to_cartesian(arc.inner_radius(), theta);
    let outer = polar_to_cartesian(arc.outer_radius(), theta);
    let line = outer - inner;
    let len_sq = line.length_squared();
    if len_sq < 1e-4 {
        return CollisionResult::miss();
    }
    let t = ((center - inner).dot(line) / len_sq).clamp(0.0, 1.0);
    let closest = inner + line * t;
    // Tangent pointing out of the arc, for a circle centred exactly on the cap
    let tangent = Vec2::new(-theta.sin(), theta.cos());
    let mid = polar_to_cartesian(arc.radius, arc.theta_start + arc.angular_span() / 2.0);
    let away = if tangent.dot(mid - closest) > 0.0 { -tangent } else { tangent };
    CollisionResult::from_closest(center, radius, closest, away)
}

/// Check two circles; the normal points from `b` toward `a`
pub fn circle_circle_collision(a: Vec2, ra: f32, b: Vec2, rb: f32) -> CollisionResult {
    let offset = a - b;
    let dist_sq = offset.length_squared();
    let reach = ra + rb;
    if dist_sq >= reach * reach {
        return CollisionResult::miss();
    }
    let dist = dist_sq.sqrt();
    let normal = unit_or_default(offset);
    CollisionResult {
        hit: true,
        point: b + normal * rb,
        normal,
        penetration: reach - dist,
    }
}

/// Reflect velocity off a surface: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}
