//! Simulation state and core types
//!
//! The session owns everything gameplay-relevant for one match. The physics
//! port owns spatial truth; entities keep a read-only copy of position and
//! velocity that is refreshed from the port each tick.

use std::collections::HashMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arc::{HazardOpening, hazard_openings, wall_segments};
use super::input::SpinGate;
use super::mode::{self, MatchMode, ModeState};
use super::physics::{BodyHandle, BodyProps, PhysicsPort};
use super::rpm::clamp_rpm;
use super::zone::SafeZone;
use crate::consts::*;
use crate::settings::Settings;

/// Stable entity identifier, allocated in increasing order
pub type EntityId = u32;

/// What an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Player,
    Bot,
    Boss,
}

/// AI decision state (bots and boss only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    Dodge,
    Survival,
    Chase { target: EntityId },
    Wander,
    Flee,
}

/// Why an entity left the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EliminationCause {
    /// RPM reached zero
    SpunOut,
    /// Knocked through a hazard opening
    FellOut,
}

/// A spinning top
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub role: Role,
    pub body: BodyHandle,
    /// Copy of the physics position (read-only from the core's side)
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub rpm: f32,
    /// Highest RPM this entity can hold (the duel boss's cap rises per round)
    pub rpm_cap: f32,
    pub alive: bool,
    pub ai_state: Option<AiState>,
    /// Aggression / tie-break bias in [0, 1], fixed at spawn
    pub personality: f32,
    pub chain_hits: u32,
    pub last_hit_tick: Option<u64>,
    pub eliminated_at: Option<u64>,
}

impl Entity {
    /// Set RPM, clamped to `[0, rpm_cap]`
    pub fn set_rpm(&mut self, rpm: f32) {
        self.rpm = clamp_rpm(rpm, self.rpm_cap);
    }

    pub fn add_rpm(&mut self, delta: f32) {
        self.set_rpm(self.rpm + delta);
    }

    pub fn is_bot(&self) -> bool {
        self.role == Role::Bot
    }
}

/// Projectile lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileState {
    /// Homing beam, removed when the lifetime runs out
    Beam { ticks_left: u32 },
    /// Thrown bomb counting down to detonation
    Armed { fuse_ticks: u32 },
    /// Blast already applied; kept around for the explosion visual
    Detonated { visual_ticks: u32 },
}

/// A boss weapon projectile (duel mode)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub state: ProjectileState,
}

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Duel round banner; everything but the countdown is frozen
    RoundTransition { ticks_left: u32 },
    Victory,
    Defeat,
}

impl GamePhase {
    pub fn is_over(self) -> bool {
        matches!(self, GamePhase::Victory | GamePhase::Defeat)
    }
}

/// Things that happened during a tick, for audio/particles/HUD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Hit {
        attacker: EntityId,
        defender: EntityId,
        knockback: f32,
        drain: f32,
        chain: u32,
    },
    Recoil {
        entity: EntityId,
        impulse: f32,
    },
    Eliminated {
        entity: EntityId,
        role: Role,
        cause: EliminationCause,
    },
    BotSpawned {
        entity: EntityId,
        pos: Vec2,
    },
    BeamFired {
        projectile: u32,
    },
    BeamHit {
        projectile: u32,
        drain: f32,
    },
    BombThrown {
        projectile: u32,
    },
    BombDetonated {
        projectile: u32,
        pos: Vec2,
    },
    RoundCleared {
        round: u32,
    },
    RoundStarted {
        round: u32,
    },
    Victory,
    Defeat,
}

/// Running match statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MatchStats {
    pub bots_eliminated: u32,
    /// Ticks the player has been alive in the Playing phase
    pub survived_ticks: u64,
}

/// Authoritative state of one match
pub struct SimulationSession<P: PhysicsPort> {
    pub settings: Settings,
    pub mode: MatchMode,
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Sorted by id (ids are allocated increasing, so pushes keep order)
    pub entities: Vec<Entity>,
    body_index: HashMap<BodyHandle, EntityId>,
    pub zone: SafeZone,
    pub openings: Vec<HazardOpening>,
    pub projectiles: Vec<Projectile>,
    pub mode_state: ModeState,
    pub stats: MatchStats,
    pub spin_gate: SpinGate,
    pub physics: P,
    events: Vec<GameEvent>,
    player_id: EntityId,
    next_id: u32,
}

/// How long an eliminated bot lingers before it is pruned
pub const CORPSE_TICKS: u64 = 60;

impl<P: PhysicsPort> SimulationSession<P> {
    /// Build the arena, spawn the player and set up the mode's roster.
    /// `settings` are used as given; `Game::start_match` validates them.
    pub fn new(physics: P, mode: MatchMode, settings: Settings, seed: u64) -> Self {
        let zone_tuning = &settings.zone;
        let openings = hazard_openings(
            zone_tuning.arena_radius,
            &zone_tuning.opening_angles,
            zone_tuning.opening_width,
        );
        let zone = SafeZone::new(zone_tuning, mode.shrink(&settings));

        let mut session = Self {
            mode,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            phase: GamePhase::Playing,
            entities: Vec::new(),
            body_index: HashMap::new(),
            zone,
            openings,
            projectiles: Vec::new(),
            mode_state: ModeState::Arena,
            stats: MatchStats::default(),
            spin_gate: SpinGate::default(),
            physics,
            events: Vec::new(),
            player_id: 0,
            next_id: 1,
            settings,
        };

        for arc in wall_segments(session.settings.zone.arena_radius, WALL_THICKNESS, &session.openings) {
            session.physics.create_static_segment(arc);
        }

        let player_start = session.settings.rpm.player_start;
        let player_pos = mode::player_spawn(mode, &session.settings);
        session.player_id = session.spawn_entity(Role::Player, player_pos, Vec2::ZERO, player_start, 0.5);

        mode::setup(&mut session);

        log::info!(
            "Match started: mode={}, seed={}, entities={}",
            mode.as_str(),
            seed,
            session.entities.len()
        );
        session
    }

    /// Allocate a new id (shared by entities and projectiles)
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Create a body and its entity
    pub fn spawn_entity(&mut self, role: Role, pos: Vec2, vel: Vec2, rpm: f32, personality: f32) -> EntityId {
        let (radius, mass) = match role {
            Role::Boss => (BOSS_RADIUS, BOSS_MASS),
            Role::Player | Role::Bot => (TOP_RADIUS, TOP_MASS),
        };
        let props = BodyProps {
            mass,
            ..BodyProps::default()
        };
        let body = self.physics.create_circle_body(pos, radius, props);
        self.physics.set_velocity(body, vel);

        let id = self.next_entity_id();
        let mut entity = Entity {
            id,
            role,
            body,
            pos,
            vel,
            radius,
            rpm: 0.0,
            rpm_cap: MAX_RPM,
            alive: true,
            ai_state: (role != Role::Player).then_some(AiState::Wander),
            personality: personality.clamp(0.0, 1.0),
            chain_hits: 0,
            last_hit_tick: None,
            eliminated_at: None,
        };
        entity.set_rpm(rpm);
        self.body_index.insert(body, id);
        self.entities.push(entity);
        id
    }

    /// Give an entity a fresh body at `pos` (duel round reset)
    pub fn respawn_entity(&mut self, id: EntityId, pos: Vec2) {
        let Some(idx) = self.index_of(id) else {
            return;
        };
        let old_body = self.entities[idx].body;
        let body = if self.body_index.contains_key(&old_body) {
            self.physics.set_position(old_body, pos);
            self.physics.set_velocity(old_body, Vec2::ZERO);
            old_body
        } else {
            let mass = if self.entities[idx].role == Role::Boss { BOSS_MASS } else { TOP_MASS };
            let props = BodyProps {
                mass,
                ..BodyProps::default()
            };
            let body = self.physics.create_circle_body(pos, self.entities[idx].radius, props);
            self.body_index.insert(body, id);
            body
        };

        let entity = &mut self.entities[idx];
        entity.body = body;
        entity.pos = pos;
        entity.vel = Vec2::ZERO;
        entity.alive = true;
        entity.eliminated_at = None;
        entity.chain_hits = 0;
        entity.last_hit_tick = None;
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(move |i| &mut self.entities[i])
    }

    pub fn entity_for_body(&self, body: BodyHandle) -> Option<EntityId> {
        self.body_index.get(&body).copied()
    }

    pub fn player_id(&self) -> EntityId {
        self.player_id
    }

    pub fn player(&self) -> Option<&Entity> {
        self.entity(self.player_id)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.entity_mut(self.player_id)
    }

    /// Living bots (the duel boss is not a bot)
    pub fn bots_alive(&self) -> usize {
        self.entities.iter().filter(|e| e.is_bot() && e.alive).count()
    }

    pub fn is_outside_zone(&self, pos: Vec2) -> bool {
        !self.zone.contains(pos)
    }

    /// Refresh cached positions/velocities from the physics port
    pub fn sync_kinematics(&mut self) {
        for entity in self.entities.iter_mut().filter(|e| e.alive) {
            entity.pos = self.physics.position(entity.body);
            entity.vel = self.physics.velocity(entity.body);
        }
    }

    /// Take an entity out of play and drop its body
    pub fn eliminate(&mut self, id: EntityId, cause: EliminationCause) {
        let tick = self.time_ticks;
        let Some(entity) = self.entity_mut(id).filter(|e| e.alive) else {
            return;
        };
        entity.alive = false;
        entity.eliminated_at = Some(tick);
        entity.vel = Vec2::ZERO;
        let (body, role) = (entity.body, entity.role);

        self.physics.remove_body(body);
        self.body_index.remove(&body);
        if role == Role::Bot {
            self.stats.bots_eliminated += 1;
        }
        log::debug!("Entity {} ({:?}) eliminated: {:?}", id, role, cause);
        self.push_event(GameEvent::Eliminated { entity: id, role, cause });
    }

    /// Drop bots that have been dead for a while
    pub fn prune_corpses(&mut self) {
        let now = self.time_ticks;
        self.entities.retain(|e| {
            !(e.is_bot() && e.eliminated_at.is_some_and(|t| now.saturating_sub(t) >= CORPSE_TICKS))
        });
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand accumulated events to the host
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }
}
