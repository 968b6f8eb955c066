//! Match task - runs one player's match on a fixed tick

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::tick_delta;
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::snapshot::SnapshotBuilder;
use super::weapons::WeaponId;
use super::{FrameInput, MatchOutcome, MatchPhase, MatchState, MatchStats, SimConfig};

/// Read-only summary refreshed every tick
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub phase: MatchPhase,
    pub outcome: Option<MatchOutcome>,
    pub tick: u64,
    pub player_health: i32,
    pub kills: u32,
    pub total_enemies: u32,
    pub weapon: WeaponId,
    pub stats: MatchStats,
}

impl MatchSummary {
    pub fn of(state: &MatchState) -> Self {
        Self {
            match_id: state.id(),
            phase: state.phase(),
            outcome: state.outcome(),
            tick: state.tick(),
            player_health: state.player_health(),
            kills: state.kills(),
            total_enemies: state.total_enemies(),
            weapon: state.weapon(),
            stats: state.stats(),
        }
    }
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub input_tx: mpsc::Sender<ClientMsg>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
    summary: Arc<RwLock<MatchSummary>>,
}

impl MatchHandle {
    pub fn summary(&self) -> MatchSummary {
        self.summary.read().clone()
    }
}

/// Registry of all active matches
pub struct MatchRegistry {
    matches: DashMap<Uuid, MatchHandle>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.get(id).map(|m| m.value().clone())
    }

    pub fn insert(&self, handle: MatchHandle) {
        self.matches.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.remove(id).map(|(_, h)| h)
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }

    /// Matches whose player is still in a running wave
    pub fn playing_matches(&self) -> usize {
        self.matches
            .iter()
            .filter(|m| m.value().summary().phase == MatchPhase::Playing)
            .count()
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Tick settings for a match task
#[derive(Debug, Clone, Copy)]
pub struct TickSettings {
    pub tick_rate: u32,
    pub snapshot_rate: u32,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            snapshot_rate: 20,
        }
    }
}

/// The match loop for one connected player
pub struct GameMatch {
    state: MatchState,
    input_rx: mpsc::Receiver<ClientMsg>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
    summary: Arc<RwLock<MatchSummary>>,
    settings: TickSettings,
    current_input: FrameInput,
    last_input_seq: u32,
    closed: bool,
}

impl GameMatch {
    /// Create a new match
    pub fn new(config: SimConfig, seed: u64, settings: TickSettings) -> (Self, MatchHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);

        let state = MatchState::new(config, seed);
        let summary = Arc::new(RwLock::new(MatchSummary::of(&state)));

        let handle = MatchHandle {
            id: state.id(),
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
            summary: summary.clone(),
        };

        let snapshot_interval = settings.tick_rate / settings.snapshot_rate.max(1);
        let game_match = Self {
            state,
            input_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(snapshot_interval),
            summary,
            settings,
            current_input: FrameInput::default(),
            last_input_seq: 0,
            closed: false,
        };

        (game_match, handle)
    }

    /// Run the tick loop until the player leaves
    pub async fn run(mut self) {
        let match_id = self.state.id();
        info!(match_id = %match_id, tick_rate = self.settings.tick_rate, "Match task started");

        let dt = tick_delta(self.settings.tick_rate);
        let tick_duration = Duration::from_micros(1_000_000 / self.settings.tick_rate.max(1) as u64);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            let phase_before = self.state.phase();

            // Drain input queue
            self.process_inputs();
            if self.closed {
                break;
            }

            // Run simulation tick
            let events = self.state.advance_frame(dt, self.current_input);
            self.snapshot_builder.record(events);

            let phase_after = self.state.phase();
            if phase_after != phase_before {
                self.snapshot_builder.force_next();
            }

            *self.summary.write() = MatchSummary::of(&self.state);

            if self.snapshot_builder.should_send() {
                let snapshot = self.snapshot_builder.build(&self.state, self.last_input_seq);
                let _ = self.snapshot_tx.send(snapshot);
            }

            if phase_before != MatchPhase::Over && phase_after == MatchPhase::Over {
                if let Some(outcome) = self.state.outcome() {
                    let _ = self.snapshot_tx.send(ServerMsg::MatchOver {
                        outcome,
                        stats: self.state.stats(),
                    });
                }
            }
        }

        info!(match_id = %match_id, "Match task stopped");
    }

    /// Process all pending client messages
    fn process_inputs(&mut self) {
        loop {
            let msg = match self.input_rx.try_recv() {
                Ok(msg) => msg,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            };

            match msg {
                ClientMsg::StartMatch => {
                    let events = self.state.start_match();
                    self.snapshot_builder.record(events);
                    self.current_input = FrameInput::default();
                }
                ClientMsg::RestartMatch => {
                    let events = self.state.restart_match();
                    self.snapshot_builder.record(events);
                    self.current_input = FrameInput::default();
                }
                ClientMsg::Input { seq, input } => {
                    if seq > self.last_input_seq {
                        self.last_input_seq = seq;
                        self.current_input = input;
                    } else {
                        debug!(match_id = %self.state.id(), seq, "Dropping stale input");
                    }
                }
                ClientMsg::Fire { origin, aim } => {
                    let events = self.state.fire_weapon(origin, aim);
                    self.snapshot_builder.record(events);
                }
                ClientMsg::SwitchWeapon { weapon } => {
                    let events = self.state.switch_weapon(weapon);
                    if events.is_empty() && self.state.phase() != MatchPhase::Playing {
                        warn!(match_id = %self.state.id(), "Weapon switch outside of play");
                    }
                    self.snapshot_builder.record(events);
                }
                ClientMsg::ClearHitFlash { enemy_id } => {
                    self.state.clear_hit_flash(enemy_id);
                }
                ClientMsg::Ping { t } => {
                    let _ = self.snapshot_tx.send(ServerMsg::Pong { t });
                }
                ClientMsg::Leave => {
                    self.closed = true;
                    break;
                }
            }
        }
    }
}
