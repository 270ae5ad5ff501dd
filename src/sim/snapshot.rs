//! Read-only view of a session for rendering and HUD

use glam::Vec2;
use serde::Serialize;

use super::mode::MatchMode;
use super::physics::PhysicsPort;
use super::rpm::RpmZone;
use super::state::{AiState, EntityId, GamePhase, MatchStats, ProjectileState, Role, SimulationSession};

#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub role: Role,
    pub pos: Vec2,
    pub radius: f32,
    pub rpm: f32,
    pub rpm_zone: RpmZone,
    pub alive: bool,
    pub ai_state: Option<AiState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub id: u32,
    pub pos: Vec2,
    pub state: ProjectileState,
}

/// Everything a renderer or HUD needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub mode: MatchMode,
    pub phase: GamePhase,
    /// Duel round (1-based), `None` outside duel
    pub round: Option<u32>,
    pub player_rpm: f32,
    pub player_alive: bool,
    pub zone_center: Vec2,
    pub zone_radius: f32,
    pub bots_alive: usize,
    pub entities: Vec<EntityView>,
    pub projectiles: Vec<ProjectileView>,
    pub stats: MatchStats,
    pub paused: bool,
}

impl<P: PhysicsPort> SimulationSession<P> {
    pub fn snapshot(&self) -> Snapshot {
        let player = self.player();
        Snapshot {
            tick: self.time_ticks,
            mode: self.mode,
            phase: self.phase,
            round: self.mode_state.round(),
            player_rpm: player.map_or(0.0, |p| p.rpm),
            player_alive: player.is_some_and(|p| p.alive),
            zone_center: self.zone.center,
            zone_radius: self.zone.radius,
            bots_alive: self.bots_alive(),
            entities: self
                .entities
                .iter()
                .map(|e| EntityView {
                    id: e.id,
                    role: e.role,
                    pos: e.pos,
                    radius: e.radius,
                    rpm: e.rpm,
                    rpm_zone: RpmZone::of(e.rpm, &self.settings.rpm),
                    alive: e.alive,
                    ai_state: e.ai_state,
                })
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    id: p.id,
                    pos: p.pos,
                    state: p.state,
                })
                .collect(),
            stats: self.stats,
            paused: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::physics::CircleWorld;

    #[test]
    fn test_snapshot_reflects_session() {
        let s = SimulationSession::new(CircleWorld::new(), MatchMode::Duel, Settings::default(), 1);
        let snap = s.snapshot();
        assert_eq!(snap.round, Some(1));
        assert_eq!(snap.entities.len(), 2);
        assert_eq!(snap.player_rpm, s.settings.rpm.player_start);
        assert!(snap.player_alive);
        assert_eq!(snap.bots_alive, 0);
        assert_eq!(snap.zone_radius, s.settings.zone.start_radius);
    }

    #[test]
    fn test_snapshot_serializes() {
        let s = SimulationSession::new(CircleWorld::new(), MatchMode::Arena, Settings::default(), 1);
        let json = serde_json::to_string(&s.snapshot()).expect("serialize");
        assert!(json.contains("\"mode\":\"Arena\""));
        assert!(json.contains("\"bots_alive\":10"));
    }
}
