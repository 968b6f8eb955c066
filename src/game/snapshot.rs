//! Snapshot building for the presentation client

use crate::ws::protocol::{
    EnemySnapshot, MatchSnapshot, PlayerSnapshot, ProjectileSnapshot, ServerMsg,
};

use super::physics::PhysicsSystem;
use super::{GameEvent, MatchState};

/// Builds snapshots at a fixed tick interval
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
    /// Events accumulated between snapshots
    pending_events: Vec<GameEvent>,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
            pending_events: Vec::new(),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for phase changes)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Queue events for the next snapshot
    pub fn record(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        self.pending_events.extend(events);
    }

    /// Build a snapshot message, draining queued events
    pub fn build(&mut self, state: &MatchState, last_input_seq: u32) -> ServerMsg {
        let time_secs = crate::util::time::micros_to_secs(state.now());
        let player = state.player();

        let enemies = state
            .enemies()
            .iter()
            .map(|e| EnemySnapshot {
                id: e.id,
                position: e.position,
                render_height: if e.alive {
                    PhysicsSystem::bob_height(e.index(), time_secs)
                } else {
                    e.position.y
                },
                health: e.health,
                max_health: e.max_health,
                alive: e.alive,
                hit_flash: e.hit_flash,
            })
            .collect();

        let projectiles = state
            .projectiles()
            .iter()
            .map(|p| ProjectileSnapshot {
                id: p.id,
                position: p.position,
                color: p.color,
            })
            .collect();

        ServerMsg::Snapshot(Box::new(MatchSnapshot {
            tick: state.tick(),
            phase: state.phase(),
            player: PlayerSnapshot {
                position: player.position,
                look: player.look,
                health: player.health,
                last_input_seq,
            },
            kills: state.kills(),
            total_enemies: state.total_enemies(),
            weapon: state.weapon(),
            enemies,
            projectiles,
            events: std::mem::take(&mut self.pending_events),
        }))
    }
}
