//! Combat resolution - damage, kills, melee contact

use serde::Serialize;

use crate::util::time::SimMicros;

use super::collision::CollisionSystem;
use super::entities::{DamageOutcome, EnemyId, EntityStore, Player, ProjectileId};

/// Damage an enemy deals per melee hit
pub const MELEE_DAMAGE: i32 = 10;

/// Per-match combat tally
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scoreboard {
    pub kills: u32,
    pub total_enemies: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
}

impl Scoreboard {
    pub fn new(total_enemies: u32) -> Self {
        Self {
            total_enemies,
            ..Default::default()
        }
    }

    pub fn all_killed(&self) -> bool {
        self.total_enemies > 0 && self.kills >= self.total_enemies
    }

    pub fn remaining(&self) -> u32 {
        self.total_enemies.saturating_sub(self.kills)
    }

    /// Fraction of fired shots that connected
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f32 / self.shots_fired as f32
        }
    }
}

/// A projectile credited against an enemy
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub projectile_id: ProjectileId,
    pub target_id: EnemyId,
    pub outcome: DamageOutcome,
}

/// An enemy reaching the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeleeHit {
    pub enemy_id: EnemyId,
    pub damage: i32,
    pub player_health: i32,
}

pub struct CombatSystem;

impl CombatSystem {
    /// Damage an enemy and count the kill if this call killed it.
    pub fn damage_enemy(
        store: &mut EntityStore,
        board: &mut Scoreboard,
        id: EnemyId,
        amount: i32,
        now: SimMicros,
    ) -> DamageOutcome {
        let outcome = store.apply_damage(id, amount, now);
        board.damage_dealt += outcome.dealt() as u32;
        if let DamageOutcome::Killed { .. } = outcome {
            board.kills += 1;
        }
        outcome
    }

    /// Damage the player, floored at zero. Returns the damage taken.
    pub fn damage_player(player: &mut Player, board: &mut Scoreboard, amount: i32) -> i32 {
        let taken = player.take_damage(amount);
        board.damage_taken += taken as u32;
        taken
    }

    /// Credit each projectile against the first enemy it touches.
    ///
    /// Projectiles are resolved one at a time against the current enemy
    /// state, so an enemy killed by an earlier projectile this frame is no
    /// longer a target for later ones. A credited projectile is consumed.
    pub fn resolve_projectile_hits(
        store: &mut EntityStore,
        board: &mut Scoreboard,
        now: SimMicros,
    ) -> Vec<HitResult> {
        let mut hits = Vec::new();
        let mut i = 0;

        while i < store.projectiles().len() {
            let (candidate_id, position) = {
                let p = &store.projectiles()[i];
                (p.id, p.position)
            };
            let Some(target_id) = CollisionSystem::projectile_target(position, store.enemies())
            else {
                i += 1;
                continue;
            };

            let Some(projectile) = store.remove_projectile(candidate_id) else {
                break;
            };
            let outcome = Self::damage_enemy(store, board, target_id, projectile.damage, now);
            board.shots_hit += 1;

            hits.push(HitResult {
                projectile_id: projectile.id,
                target_id,
                outcome,
            });
        }

        hits
    }

    /// Let every enemy in reach and off cooldown strike the player.
    ///
    /// Stops early once the player is dead.
    pub fn resolve_melee(
        store: &mut EntityStore,
        player: &mut Player,
        board: &mut Scoreboard,
        now: SimMicros,
    ) -> Vec<MeleeHit> {
        let mut hits = Vec::new();

        for enemy_id in CollisionSystem::melee_contacts(store.enemies(), player.position, now) {
            if !player.is_alive() {
                break;
            }
            if let Some(enemy) = store.enemy_mut(enemy_id) {
                enemy.last_attack_at = Some(now);
            }
            let damage = Self::damage_player(player, board, MELEE_DAMAGE);
            hits.push(MeleeHit {
                enemy_id,
                damage,
                player_health: player.health,
            });
        }

        hits
    }
}
