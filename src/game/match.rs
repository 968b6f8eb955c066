//! Match controller - phase machine and the per-frame simulation tick

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::util::time::{micros_to_secs, secs_to_micros, SimClock, SimMicros};

use super::combat::{CombatSystem, Scoreboard};
use super::entities::{
    DamageOutcome, Enemy, EnemyId, EntityStore, Player, Projectile, ProjectileId,
};
use super::physics::PhysicsSystem;
use super::weapons::{self, FireGate, WeaponId};
use super::{FrameInput, GameEvent, SimConfig};

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Nothing spawned yet
    Idle,
    Playing,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Victory,
    Defeat,
}

/// Deferred phase change, valid only for the match epoch it was made in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTransition {
    pub epoch: u64,
    pub due_at: SimMicros,
}

/// Everything the outside world can ask of a match
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartMatch,
    RestartMatch,
    FireWeapon { origin: Vec3, aim: Vec3 },
    SwitchWeapon(WeaponId),
    DamageEnemy { enemy_id: EnemyId, amount: i32 },
    DamagePlayer(i32),
    ClearHitFlash(EnemyId),
    AdvanceFrame { dt: f32, input: FrameInput },
}

/// End-of-match statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    pub duration_secs: f32,
    pub kills: u32,
    pub total_enemies: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
    pub accuracy: f32,
}

/// Authoritative state of one single-player match
#[derive(Debug, Clone)]
pub struct MatchState {
    id: Uuid,
    config: SimConfig,
    rng: ChaCha8Rng,
    phase: MatchPhase,
    outcome: Option<MatchOutcome>,
    /// Bumped on every start/restart
    epoch: u64,
    tick: u64,
    clock: SimClock,
    player: Player,
    entities: EntityStore,
    board: Scoreboard,
    weapon: WeaponId,
    fire_gate: FireGate,
    pending_over: Option<ScheduledTransition>,
    ended_at: Option<SimMicros>,
}

impl MatchState {
    pub fn new(config: SimConfig, seed: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            board: Scoreboard::new(config.enemy_count),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            phase: MatchPhase::Idle,
            outcome: None,
            epoch: 0,
            tick: 0,
            clock: SimClock::new(),
            player: Player::new(),
            entities: EntityStore::new(),
            weapon: WeaponId::default(),
            fire_gate: FireGate::default(),
            pending_over: None,
            ended_at: None,
        }
    }

    /// Apply one command and report what happened
    pub fn apply(&mut self, command: Command) -> Vec<GameEvent> {
        match command {
            Command::StartMatch => self.start_match(),
            Command::RestartMatch => self.restart_match(),
            Command::FireWeapon { origin, aim } => self.fire_weapon(origin, aim),
            Command::SwitchWeapon(weapon) => self.switch_weapon(weapon),
            Command::DamageEnemy { enemy_id, amount } => self.damage_enemy(enemy_id, amount),
            Command::DamagePlayer(amount) => self.damage_player(amount),
            Command::ClearHitFlash(enemy_id) => {
                self.clear_hit_flash(enemy_id);
                Vec::new()
            }
            Command::AdvanceFrame { dt, input } => self.advance_frame(dt, input),
        }
    }

    /// By-value form of [`MatchState::apply`], for replaying command logs
    pub fn transition(mut self, command: Command) -> Self {
        self.apply(command);
        self
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Full reset into a fresh wave. Valid from any phase.
    pub fn start_match(&mut self) -> Vec<GameEvent> {
        self.reset();
        info!(
            match_id = %self.id,
            epoch = self.epoch,
            enemies = self.config.enemy_count,
            "Match started"
        );
        vec![GameEvent::MatchStarted {
            epoch: self.epoch,
            enemy_count: self.config.enemy_count,
        }]
    }

    /// Same reset as [`MatchState::start_match`]; any pending end of the
    /// previous match is discarded.
    pub fn restart_match(&mut self) -> Vec<GameEvent> {
        if self.pending_over.is_some() {
            debug!(match_id = %self.id, epoch = self.epoch, "Discarding pending match end");
        }
        info!(match_id = %self.id, previous_phase = ?self.phase, "Match restart requested");
        self.start_match()
    }

    fn reset(&mut self) {
        self.pending_over = None;
        self.epoch += 1;
        self.tick = 0;
        self.clock.reset();
        self.player = Player::new();
        self.entities.spawn_match(self.config.enemy_count, &mut self.rng);
        self.board = Scoreboard::new(self.config.enemy_count);
        self.weapon = WeaponId::default();
        self.fire_gate.reset();
        self.outcome = None;
        self.ended_at = None;
        self.phase = MatchPhase::Playing;
    }

    fn finish(&mut self, outcome: MatchOutcome) -> GameEvent {
        self.pending_over = None;
        self.phase = MatchPhase::Over;
        self.outcome = Some(outcome);
        self.ended_at = Some(self.clock.now());

        info!(
            match_id = %self.id,
            outcome = ?outcome,
            kills = self.board.kills,
            total = self.board.total_enemies,
            health = self.player.health,
            "Match over"
        );
        GameEvent::MatchOver { outcome }
    }

    /// Dying ends the match at once. A cleared wave still counts as a win.
    fn finish_on_player_death(&mut self) -> GameEvent {
        let outcome = if self.board.all_killed() {
            MatchOutcome::Victory
        } else {
            MatchOutcome::Defeat
        };
        self.finish(outcome)
    }

    fn schedule_victory(&mut self) -> Option<GameEvent> {
        if self.pending_over.is_some() {
            return None;
        }
        let due_at = self.clock.now() + self.config.grace_delay;
        self.pending_over = Some(ScheduledTransition {
            epoch: self.epoch,
            due_at,
        });
        debug!(match_id = %self.id, due_at, "All enemies down, victory pending");
        Some(GameEvent::VictoryPending {
            due_at_ms: due_at / 1000,
        })
    }

    fn poll_scheduled(&mut self) -> Option<GameEvent> {
        let pending = self.pending_over?;
        if pending.epoch != self.epoch {
            self.pending_over = None;
            return None;
        }
        if self.clock.now() < pending.due_at {
            return None;
        }
        Some(self.finish(MatchOutcome::Victory))
    }

    // ------------------------------------------------------------------
    // Player actions
    // ------------------------------------------------------------------

    /// Spawn a projectile if the fire-rate gate allows it. Early shots are
    /// dropped.
    pub fn fire_weapon(&mut self, origin: Vec3, aim: Vec3) -> Vec<GameEvent> {
        if self.phase != MatchPhase::Playing {
            return Vec::new();
        }
        let direction = aim.normalize_or_zero();
        if direction == Vec3::ZERO || !origin.is_finite() {
            debug!(match_id = %self.id, "Ignoring shot with degenerate aim");
            return Vec::new();
        }

        let weapon = weapons::lookup(self.weapon);
        let now = self.clock.now();
        if !self.fire_gate.can_fire(weapon, now) {
            return Vec::new();
        }

        let projectile_id = self.entities.spawn_projectile(origin, direction, weapon, now);
        self.fire_gate.record_shot(now);
        self.board.shots_fired += 1;

        vec![GameEvent::ShotFired {
            projectile_id,
            weapon: weapon.id,
            origin,
            direction,
        }]
    }

    /// Select a weapon. Only honored while playing.
    pub fn switch_weapon(&mut self, weapon: WeaponId) -> Vec<GameEvent> {
        if self.phase != MatchPhase::Playing || self.weapon == weapon {
            return Vec::new();
        }
        self.weapon = weapon;
        vec![GameEvent::WeaponSwitched { weapon }]
    }

    /// Direct damage to an enemy, counted exactly like a projectile hit
    pub fn damage_enemy(&mut self, enemy_id: EnemyId, amount: i32) -> Vec<GameEvent> {
        if self.phase != MatchPhase::Playing {
            return Vec::new();
        }
        let outcome = CombatSystem::damage_enemy(
            &mut self.entities,
            &mut self.board,
            enemy_id,
            amount,
            self.clock.now(),
        );
        let mut events = Vec::new();
        self.record_enemy_damage(enemy_id, None, outcome, &mut events);
        events
    }

    /// Direct damage to the player
    pub fn damage_player(&mut self, amount: i32) -> Vec<GameEvent> {
        if self.phase != MatchPhase::Playing {
            return Vec::new();
        }
        let damage = CombatSystem::damage_player(&mut self.player, &mut self.board, amount);
        if damage == 0 {
            return Vec::new();
        }
        let mut events = vec![GameEvent::PlayerHit {
            enemy_id: None,
            damage,
            health: self.player.health,
        }];
        if !self.player.is_alive() {
            events.push(self.finish_on_player_death());
        }
        events
    }

    /// Presentation calls this once the hit flash has been shown
    pub fn clear_hit_flash(&mut self, enemy_id: EnemyId) {
        self.entities.clear_hit_flash(enemy_id);
    }

    fn record_enemy_damage(
        &mut self,
        enemy_id: EnemyId,
        projectile_id: Option<ProjectileId>,
        outcome: DamageOutcome,
        events: &mut Vec<GameEvent>,
    ) {
        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Hit { dealt, remaining } => {
                debug!(enemy_id = enemy_id.0, dealt, remaining, "Enemy hit");
                events.push(GameEvent::EnemyHit {
                    enemy_id,
                    projectile_id,
                    damage: dealt,
                    remaining_health: remaining,
                });
            }
            DamageOutcome::Killed { dealt } => {
                debug!(
                    enemy_id = enemy_id.0,
                    kills = self.board.kills,
                    remaining = self.board.remaining(),
                    "Enemy killed"
                );
                events.push(GameEvent::EnemyHit {
                    enemy_id,
                    projectile_id,
                    damage: dealt,
                    remaining_health: 0,
                });
                events.push(GameEvent::EnemyKilled {
                    enemy_id,
                    kills: self.board.kills,
                    total: self.board.total_enemies,
                });
                if self.board.all_killed() {
                    events.extend(self.schedule_victory());
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Frame tick
    // ------------------------------------------------------------------

    /// Run one simulation frame: motion, then collision against the moved
    /// geometry, then damage, then any due scheduled transition.
    pub fn advance_frame(&mut self, dt: f32, input: FrameInput) -> Vec<GameEvent> {
        if self.phase != MatchPhase::Playing {
            return Vec::new();
        }
        let delta = secs_to_micros(dt).min(self.config.max_frame_delta);
        if delta == 0 {
            return Vec::new();
        }

        let mut events = Vec::new();
        self.tick += 1;
        self.clock.advance(delta);
        let dt = micros_to_secs(delta);
        let now = self.clock.now();

        // Motion
        if let Some(look) = input.look {
            let look = look.normalize_or_zero();
            if look != Vec3::ZERO {
                self.player.look = look;
            }
        }
        self.player.position =
            PhysicsSystem::move_player(&self.player, input.movement, dt, &self.config.bounds);
        PhysicsSystem::update_enemies(&mut self.entities, self.player.position, dt);
        PhysicsSystem::advance_projectiles(&mut self.entities, dt);

        // Projectile collisions and damage, then range expiry
        let hits = CombatSystem::resolve_projectile_hits(&mut self.entities, &mut self.board, now);
        for hit in hits {
            self.record_enemy_damage(hit.target_id, Some(hit.projectile_id), hit.outcome, &mut events);
        }
        for projectile_id in PhysicsSystem::expire_projectiles(&mut self.entities) {
            events.push(GameEvent::ProjectileExpired { projectile_id });
        }

        // Enemy contact
        let melee =
            CombatSystem::resolve_melee(&mut self.entities, &mut self.player, &mut self.board, now);
        for hit in melee {
            events.push(GameEvent::PlayerHit {
                enemy_id: Some(hit.enemy_id),
                damage: hit.damage,
                health: hit.player_health,
            });
        }
        if !self.player.is_alive() {
            events.push(self.finish_on_player_death());
            return events;
        }

        events.extend(self.poll_scheduled());
        events
    }

    // ------------------------------------------------------------------
    // Read-only views
    // ------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time since the match started
    pub fn now(&self) -> SimMicros {
        self.clock.now()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_health(&self) -> i32 {
        self.player.health
    }

    pub fn kills(&self) -> u32 {
        self.board.kills
    }

    pub fn total_enemies(&self) -> u32 {
        self.board.total_enemies
    }

    pub fn enemies(&self) -> &[Enemy] {
        self.entities.enemies()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        self.entities.projectiles()
    }

    pub fn weapon(&self) -> WeaponId {
        self.weapon
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.board
    }

    pub fn pending_transition(&self) -> Option<ScheduledTransition> {
        self.pending_over
    }

    pub fn stats(&self) -> MatchStats {
        let end = self.ended_at.unwrap_or_else(|| self.clock.now());
        MatchStats {
            duration_secs: micros_to_secs(end),
            kills: self.board.kills,
            total_enemies: self.board.total_enemies,
            shots_fired: self.board.shots_fired,
            shots_hit: self.board.shots_hit,
            damage_dealt: self.board.damage_dealt,
            damage_taken: self.board.damage_taken,
            accuracy: self.board.accuracy(),
        }
    }
}
