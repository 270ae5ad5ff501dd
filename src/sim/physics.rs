//! Physics port
//!
//! The simulation never moves bodies directly: it issues forces and impulses
//! through [`PhysicsPort`] and reads positions/velocities back. Spawning and
//! round resets are the only places positions are written.
//!
//! [`CircleWorld`] is a small reference implementation (circles against circles
//! and arc walls) used by the headless runner and the tests.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arc::ArcSegment;
use super::collision::{circle_arc_collision, circle_circle_collision, reflect_velocity};

/// Opaque handle to a body owned by the physics port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Two bodies that started touching, with their closing speed before the
/// contact response was applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactStart {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// `|v_a - v_b|` at first contact
    pub relative_speed: f32,
}

/// Material properties for a dynamic body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyProps {
    pub mass: f32,
    /// Bounciness of contacts (0 = dead stop, 1 = perfectly elastic)
    pub restitution: f32,
    /// Fraction of velocity lost per step
    pub friction_air: f32,
}

impl Default for BodyProps {
    fn default() -> Self {
        Self {
            mass: 1.0,
            restitution: 0.6,
            friction_air: 0.03,
        }
    }
}

/// Rigid-body world consumed by the simulation
pub trait PhysicsPort {
    /// Create a dynamic circle body
    fn create_circle_body(&mut self, pos: Vec2, radius: f32, props: BodyProps) -> BodyHandle;
    /// Create an immovable wall piece
    fn create_static_segment(&mut self, arc: ArcSegment) -> BodyHandle;
    fn remove_body(&mut self, body: BodyHandle);

    fn position(&self, body: BodyHandle) -> Vec2;
    fn velocity(&self, body: BodyHandle) -> Vec2;
    fn mass(&self, body: BodyHandle) -> f32;

    /// Accumulate a force for the next step
    fn apply_force(&mut self, body: BodyHandle, force: Vec2);
    fn set_velocity(&mut self, body: BodyHandle, vel: Vec2);
    fn set_position(&mut self, body: BodyHandle, pos: Vec2);
    fn set_friction_air(&mut self, body: BodyHandle, friction: f32);

    /// Advance the world by `dt_ms` milliseconds
    fn step(&mut self, dt_ms: f32);
    /// Pairs of bodies that started touching during the last step(s)
    fn drain_collision_starts(&mut self) -> Vec<ContactStart>;

    /// Instantaneous velocity change of `impulse / mass`
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2) {
        let mass = self.mass(body).max(1e-3);
        let vel = self.velocity(body);
        self.set_velocity(body, vel + impulse / mass);
    }
}

#[derive(Debug, Clone)]
enum Shape {
    Circle { radius: f32 },
    Wall(ArcSegment),
}

#[derive(Debug, Clone)]
struct Body {
    shape: Shape,
    pos: Vec2,
    vel: Vec2,
    force: Vec2,
    mass: f32,
    restitution: f32,
    friction_air: f32,
}

impl Body {
    fn is_static(&self) -> bool {
        matches!(self.shape, Shape::Wall(_))
    }
}

/// Reference physics world: circles, arc walls, air friction and contacts
#[derive(Debug, Clone, Default)]
pub struct CircleWorld {
    bodies: BTreeMap<BodyHandle, Body>,
    next_handle: u32,
    /// Pairs touching at the end of the previous step
    touching: BTreeSet<(BodyHandle, BodyHandle)>,
    started: Vec<ContactStart>,
}

impl CircleWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, body: Body) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, body);
        handle
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn integrate(&mut self, dt: f32) {
        for body in self.bodies.values_mut().filter(|b| !b.is_static()) {
            body.vel += body.force / body.mass * dt;
            body.vel *= 1.0 - body.friction_air.clamp(0.0, 1.0);
            body.pos += body.vel * dt;
            body.force = Vec2::ZERO;
        }
    }

    /// Resolve overlaps and return every pair currently touching, keyed to
    /// the pair's relative speed before the response
    fn resolve_contacts(&mut self) -> BTreeMap<(BodyHandle, BodyHandle), f32> {
        let handles: Vec<BodyHandle> = self.bodies.keys().copied().collect();
        let mut touching = BTreeMap::new();

        for (i, &ha) in handles.iter().enumerate() {
            for &hb in &handles[i + 1..] {
                let (Some(a), Some(b)) = (self.bodies.get(&ha), self.bodies.get(&hb)) else {
                    continue;
                };
                let relative_speed = (a.vel - b.vel).length();
                let resolved = match (&a.shape, &b.shape) {
                    (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
                        let contact = circle_circle_collision(a.pos, *ra, b.pos, *rb);
                        contact.hit.then(|| resolve_circle_pair(a, b, contact.normal, contact.penetration))
                    }
                    (Shape::Circle { radius }, Shape::Wall(arc)) => {
                        let contact = circle_arc_collision(a.pos, *radius, arc);
                        contact
                            .hit
                            .then(|| (resolve_against_wall(a, contact.normal, contact.penetration), b.clone()))
                    }
                    (Shape::Wall(arc), Shape::Circle { radius }) => {
                        let contact = circle_arc_collision(b.pos, *radius, arc);
                        contact
                            .hit
                            .then(|| (a.clone(), resolve_against_wall(b, contact.normal, contact.penetration)))
                    }
                    (Shape::Wall(_), Shape::Wall(_)) => None,
                };

                if let Some((new_a, new_b)) = resolved {
                    self.bodies.insert(ha, new_a);
                    self.bodies.insert(hb, new_b);
                    touching.insert((ha, hb), relative_speed);
                }
            }
        }
        touching
    }
}

fn resolve_circle_pair(a: &Body, b: &Body, normal: Vec2, penetration: f32) -> (Body, Body) {
    let inv_a = 1.0 / a.mass;
    let inv_b = 1.0 / b.mass;
    let inv_sum = inv_a + inv_b;
    let mut a = a.clone();
    let mut b = b.clone();

    // Split the overlap by inverse mass; normal points from b toward a
    a.pos += normal * penetration * (inv_a / inv_sum);
    b.pos -= normal * penetration * (inv_b / inv_sum);

    let approach = (a.vel - b.vel).dot(normal);
    if approach < 0.0 {
        let restitution = a.restitution.min(b.restitution);
        let j = -(1.0 + restitution) * approach / inv_sum;
        a.vel += normal * j * inv_a;
        b.vel -= normal * j * inv_b;
    }
    (a, b)
}

fn resolve_against_wall(body: &Body, normal: Vec2, penetration: f32) -> Body {
    let mut body = body.clone();
    body.pos += normal * penetration;
    if body.vel.dot(normal) < 0.0 {
        let reflected = reflect_velocity(body.vel, normal);
        // Keep the tangential part, damp the bounce
        let normal_part = reflected.dot(normal) * normal;
        body.vel = reflected - normal_part + normal_part * body.restitution;
    }
    body
}

impl PhysicsPort for CircleWorld {
    fn create_circle_body(&mut self, pos: Vec2, radius: f32, props: BodyProps) -> BodyHandle {
        self.insert(Body {
            shape: Shape::Circle { radius },
            pos,
            vel: Vec2::ZERO,
            force: Vec2::ZERO,
            mass: props.mass.max(1e-3),
            restitution: props.restitution,
            friction_air: props.friction_air,
        })
    }

    fn create_static_segment(&mut self, arc: ArcSegment) -> BodyHandle {
        self.insert(Body {
            shape: Shape::Wall(arc),
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            force: Vec2::ZERO,
            mass: f32::INFINITY,
            restitution: 0.0,
            friction_air: 0.0,
        })
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.bodies.remove(&body);
        self.touching.retain(|(a, b)| *a != body && *b != body);
        self.started.retain(|c| c.a != body && c.b != body);
    }

    fn position(&self, body: BodyHandle) -> Vec2 {
        self.bodies.get(&body).map_or(Vec2::ZERO, |b| b.pos)
    }

    fn velocity(&self, body: BodyHandle) -> Vec2 {
        self.bodies.get(&body).map_or(Vec2::ZERO, |b| b.vel)
    }

    fn mass(&self, body: BodyHandle) -> f32 {
        self.bodies.get(&body).map_or(1.0, |b| b.mass)
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body).filter(|b| !b.is_static()) {
            b.force += force;
        }
    }

    fn set_velocity(&mut self, body: BodyHandle, vel: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body).filter(|b| !b.is_static()) {
            b.vel = vel;
        }
    }

    fn set_position(&mut self, body: BodyHandle, pos: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body).filter(|b| !b.is_static()) {
            b.pos = pos;
        }
    }

    fn set_friction_air(&mut self, body: BodyHandle, friction: f32) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.friction_air = friction;
        }
    }

    fn step(&mut self, dt_ms: f32) {
        self.integrate(dt_ms / 1000.0);
        let touching = self.resolve_contacts();
        for (&(a, b), &relative_speed) in &touching {
            if !self.touching.contains(&(a, b)) {
                self.started.push(ContactStart { a, b, relative_speed });
            }
        }
        self.touching = touching.into_keys().collect();
    }

    fn drain_collision_starts(&mut self) -> Vec<ContactStart> {
        std::mem::take(&mut self.started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP_MS: f32 = 1000.0 / 60.0;

    #[test]
    fn test_force_accelerates_body() {
        let mut world = CircleWorld::new();
        let props = BodyProps {
            friction_air: 0.0,
            ..Default::default()
        };
        let body = world.create_circle_body(Vec2::ZERO, 10.0, props);
        world.apply_force(body, Vec2::new(60.0, 0.0));
        world.step(STEP_MS);
        assert!((world.velocity(body).x - 1.0).abs() < 1e-4);
        assert!(world.position(body).x > 0.0);

        // Forces don't persist past one step
        world.step(STEP_MS);
        assert!((world.velocity(body).x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_air_friction_slows_body() {
        let mut world = CircleWorld::new();
        let props = BodyProps {
            friction_air: 0.1,
            ..Default::default()
        };
        let body = world.create_circle_body(Vec2::ZERO, 10.0, props);
        world.set_velocity(body, Vec2::new(100.0, 0.0));
        world.step(STEP_MS);
        assert!((world.velocity(body).x - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_collision_start_reported_once() {
        let mut world = CircleWorld::new();
        let props = BodyProps {
            restitution: 0.5,
            friction_air: 0.0,
            ..Default::default()
        };
        let a = world.create_circle_body(Vec2::new(-11.0, 0.0), 10.0, props);
        let b = world.create_circle_body(Vec2::new(11.0, 0.0), 10.0, props);
        world.set_velocity(a, Vec2::new(120.0, 0.0));
        world.set_velocity(b, Vec2::new(-120.0, 0.0));

        world.step(STEP_MS);
        let events = world.drain_collision_starts();
        assert_eq!(events.len(), 1);
        assert_eq!((events[0].a, events[0].b), (a, b));
        // Closing speed from before the bounce, not the separation speed
        assert!((events[0].relative_speed - 240.0).abs() < 1e-3);
        assert!(world.velocity(a).x < 0.0);

        // Already separated; nothing new
        world.step(STEP_MS);
        assert!(world.drain_collision_starts().is_empty());
    }

    #[test]
    fn test_wall_keeps_body_inside() {
        use std::f32::consts::PI;
        let mut world = CircleWorld::new();
        world.create_static_segment(ArcSegment::new(108.0, 16.0, -PI / 2.0, PI / 2.0));
        let props = BodyProps {
            friction_air: 0.0,
            ..Default::default()
        };
        let body = world.create_circle_body(Vec2::new(80.0, 0.0), 10.0, props);
        world.set_velocity(body, Vec2::new(300.0, 0.0));
        for _ in 0..30 {
            world.step(STEP_MS);
        }
        assert!(world.position(body).length() < 100.0);
        assert!(world.velocity(body).x < 0.0);
    }

    #[test]
    fn test_removed_body_reads_default() {
        let mut world = CircleWorld::new();
        let body = world.create_circle_body(Vec2::new(5.0, 5.0), 10.0, BodyProps::default());
        world.remove_body(body);
        assert_eq!(world.position(body), Vec2::ZERO);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_apply_impulse_scales_by_mass() {
        let mut world = CircleWorld::new();
        let props = BodyProps {
            mass: 2.0,
            ..Default::default()
        };
        let heavy = world.create_circle_body(Vec2::ZERO, 10.0, props);
        world.apply_impulse(heavy, Vec2::new(100.0, 0.0));
        assert!((world.velocity(heavy).x - 50.0).abs() < 1e-4);
    }
}
