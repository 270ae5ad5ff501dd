//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies
//!
//! Physics is reached only through [`PhysicsPort`]; [`CircleWorld`] is the
//! built-in implementation.

pub mod ai;
pub mod arc;
pub mod collision;
pub mod combat;
pub mod input;
pub mod mode;
pub mod physics;
pub mod rpm;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod weapons;
pub mod zone;

pub use arc::{ArcSegment, HazardOpening};
pub use collision::{CollisionResult, circle_arc_collision, circle_circle_collision};
pub use input::{Key, KeyState, SpinGate, SpinKey};
pub use mode::{MatchMode, ModeState};
pub use physics::{BodyHandle, BodyProps, CircleWorld, ContactStart, PhysicsPort};
pub use rpm::RpmZone;
pub use snapshot::Snapshot;
pub use state::{
    AiState, EliminationCause, Entity, EntityId, GameEvent, GamePhase, MatchStats, Projectile, ProjectileState, Role,
    SimulationSession,
};
pub use tick::{TickInput, tick};
pub use zone::SafeZone;
