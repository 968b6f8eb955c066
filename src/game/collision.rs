//! Proximity tests between projectiles, enemies and the player.
//!
//! Works on the flat entity index only; render-side offsets such as the
//! enemy hover never enter these tests.

use glam::Vec3;

use crate::util::time::{cooldown_elapsed, SimMicros, MICROS_PER_SEC};

use super::entities::{Enemy, EnemyId};

/// Projectile hit radius around an enemy's pursuit position
pub const PROJECTILE_HIT_RADIUS: f32 = 1.5;
/// Enemy reach when touching the player
pub const MELEE_RANGE: f32 = 2.0;
/// Per-enemy time between two melee hits
pub const MELEE_COOLDOWN: SimMicros = MICROS_PER_SEC;

pub struct CollisionSystem;

impl CollisionSystem {
    /// First alive enemy, in collection order, within hit range of `point`
    pub fn projectile_target(point: Vec3, enemies: &[Enemy]) -> Option<EnemyId> {
        enemies
            .iter()
            .filter(|e| e.alive)
            .find(|e| point.distance(e.position) < PROJECTILE_HIT_RADIUS)
            .map(|e| e.id)
    }

    /// Alive enemies touching the player whose own cooldown has run out
    pub fn melee_contacts(enemies: &[Enemy], player_position: Vec3, now: SimMicros) -> Vec<EnemyId> {
        enemies
            .iter()
            .filter(|e| e.alive)
            .filter(|e| e.position.distance(player_position) < MELEE_RANGE)
            .filter(|e| match e.last_attack_at {
                None => true,
                Some(last) => cooldown_elapsed(now, last, MELEE_COOLDOWN),
            })
            .map(|e| e.id)
            .collect()
    }
}
