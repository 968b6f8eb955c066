//! Game simulation modules

pub mod collision;
pub mod combat;
pub mod entities;
pub mod r#match;
pub mod physics;
pub mod session;
pub mod snapshot;
pub mod weapons;

pub use r#match::{Command, MatchOutcome, MatchPhase, MatchState, MatchStats};
pub use session::{GameMatch, MatchHandle, MatchRegistry, MatchSummary};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::util::time::{SimMicros, MICROS_PER_SEC};

use entities::{EnemyId, ProjectileId};
use physics::ArenaBounds;
use weapons::WeaponId;

/// Held movement keys for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    #[serde(default)]
    pub forward: bool,
    #[serde(default)]
    pub backward: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

impl MoveIntent {
    /// x = strafe (right positive), y = forward positive
    pub fn axis(&self) -> Vec2 {
        let x = f32::from(u8::from(self.right)) - f32::from(u8::from(self.left));
        let y = f32::from(u8::from(self.forward)) - f32::from(u8::from(self.backward));
        Vec2::new(x, y)
    }
}

/// Raw input for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    #[serde(default)]
    pub movement: MoveIntent,
    /// New look direction; `None` keeps the previous one
    #[serde(default)]
    pub look: Option<Vec3>,
}

/// Simulation tunables
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub enemy_count: u32,
    /// Longest frame the simulation will integrate in one step
    pub max_frame_delta: SimMicros,
    /// Delay between the last kill and the victory screen
    pub grace_delay: SimMicros,
    pub bounds: ArenaBounds,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            enemy_count: 10,
            max_frame_delta: 250_000,
            grace_delay: MICROS_PER_SEC,
            bounds: ArenaBounds::default(),
        }
    }
}

/// Things that happened while applying a command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    MatchStarted {
        epoch: u64,
        enemy_count: u32,
    },
    ShotFired {
        projectile_id: ProjectileId,
        weapon: WeaponId,
        origin: Vec3,
        direction: Vec3,
    },
    ProjectileExpired {
        projectile_id: ProjectileId,
    },
    EnemyHit {
        enemy_id: EnemyId,
        projectile_id: Option<ProjectileId>,
        damage: i32,
        remaining_health: i32,
    },
    EnemyKilled {
        enemy_id: EnemyId,
        kills: u32,
        total: u32,
    },
    PlayerHit {
        enemy_id: Option<EnemyId>,
        damage: i32,
        health: i32,
    },
    WeaponSwitched {
        weapon: WeaponId,
    },
    /// Every enemy is down; the match ends after the grace delay
    VictoryPending {
        /// Simulated ms since match start
        due_at_ms: u64,
    },
    MatchOver {
        outcome: MatchOutcome,
    },
}
