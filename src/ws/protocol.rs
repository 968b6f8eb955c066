//! WebSocket protocol message definitions
//! These are the wire types between a presentation client and its match

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::entities::{EnemyId, ProjectileId};
use crate::game::weapons::{ProjectileColor, WeaponId};
use crate::game::{FrameInput, GameEvent, MatchOutcome, MatchPhase, MatchStats};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Spawn a fresh wave (also valid mid-match)
    StartMatch,

    /// Full reset after a match, or abandon the current one
    RestartMatch,

    /// Held input, applied on every tick until replaced
    Input {
        /// Sequence number; stale inputs are dropped
        seq: u32,
        #[serde(flatten)]
        input: FrameInput,
    },

    /// Fire the current weapon
    Fire {
        origin: Vec3,
        aim: Vec3,
    },

    SwitchWeapon {
        weapon: WeaponId,
    },

    /// Hit flash has been displayed
    ClearHitFlash {
        enemy_id: EnemyId,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },

    /// Close the match
    Leave,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        match_id: Uuid,
        server_time: u64,
        tick_rate: u32,
        hit_flash_ms: u64,
    },

    /// Match state snapshot (sent at regular intervals)
    Snapshot(Box<MatchSnapshot>),

    /// Match has ended
    MatchOver {
        outcome: MatchOutcome,
        stats: MatchStats,
    },

    /// Error message
    Error {
        code: String,
        message: String,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSnapshot {
    /// Server tick number
    pub tick: u64,
    pub phase: MatchPhase,
    pub player: PlayerSnapshot,
    pub kills: u32,
    pub total_enemies: u32,
    pub weapon: WeaponId,
    pub enemies: Vec<EnemySnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Events that occurred since the last snapshot
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub look: Vec3,
    /// Health (0-100)
    pub health: i32,
    /// Last processed input sequence
    pub last_input_seq: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemySnapshot {
    pub id: EnemyId,
    pub position: Vec3,
    /// Height to draw at, including the hover
    pub render_height: f32,
    pub health: i32,
    pub max_health: i32,
    pub alive: bool,
    pub hit_flash: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileSnapshot {
    pub id: ProjectileId,
    pub position: Vec3,
    pub color: ProjectileColor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_client_messages() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"start_match"}"#).unwrap();
        assert_eq!(msg, ClientMsg::StartMatch);

        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"switch_weapon","weapon":"cannon"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMsg::SwitchWeapon {
                weapon: WeaponId::Cannon
            }
        );

        let msg: ClientMsg = serde_json::from_str(
            r#"{"type":"input","seq":4,"movement":{"left":true},"look":[1.0,0.0,0.0]}"#,
        )
        .unwrap();
        match msg {
            ClientMsg::Input { seq, input } => {
                assert_eq!(seq, 4);
                assert!(input.movement.left);
                assert_eq!(input.look, Some(Vec3::X));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_weapons() {
        let parsed = serde_json::from_str::<ClientMsg>(r#"{"type":"switch_weapon","weapon":"bfg"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn server_messages_are_tagged() {
        let json = serde_json::to_value(ServerMsg::Pong { t: 9 }).unwrap();
        assert_eq!(json["type"], "pong");
        assert_eq!(json["t"], 9);
    }
}
