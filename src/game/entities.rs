//! Entity store - player, enemies and in-flight projectiles.
//!
//! Enemies live in a flat `Vec` whose order is the spawn order. That order is
//! the collision tie-break, so it never changes during a match and dead
//! enemies are kept in place as inert records.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::util::time::SimMicros;

use super::weapons::{ProjectileColor, Weapon};

/// How long the presentation keeps an enemy flashing after a hit before
/// calling `clear_hit_flash`. Not enforced by the simulation.
pub const HIT_FLASH_DURATION_MS: u64 = 150;

/// Enemy identifier. Sequential per match; doubles as the spawn index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(pub u64);

/// Player avatar
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub position: Vec3,
    /// Unit look direction
    pub look: Vec3,
    pub health: i32,
}

impl Player {
    pub const MAX_HEALTH: i32 = 100;
    pub const EYE_HEIGHT: f32 = 1.7;
    /// Walk speed in units per second
    pub const SPEED: f32 = 15.0;

    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, Self::EYE_HEIGHT, 0.0),
            look: Vec3::NEG_Z,
            health: Self::MAX_HEALTH,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Subtract damage, floored at zero. Returns the damage actually taken.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let before = self.health;
        self.health = (self.health - amount).max(0);
        before - self.health
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Hostile agent
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: EnemyId,
    /// Pursuit position. `y` is always `Enemy::GROUND_HEIGHT`.
    pub position: Vec3,
    pub health: i32,
    pub max_health: i32,
    pub alive: bool,
    /// Units per second
    pub speed: f32,
    pub hit_flash: bool,
    pub last_hit_at: Option<SimMicros>,
    /// Last time this enemy damaged the player
    pub last_attack_at: Option<SimMicros>,
}

impl Enemy {
    pub const MAX_HEALTH: i32 = 100;
    pub const GROUND_HEIGHT: f32 = 1.0;
    pub const SPAWN_MIN_RADIUS: f32 = 15.0;
    pub const SPAWN_MAX_RADIUS: f32 = 35.0;
    pub const MIN_SPEED: f32 = 2.0;
    pub const MAX_SPEED: f32 = 4.0;

    pub fn new(id: EnemyId, position: Vec3, speed: f32) -> Self {
        Self {
            id,
            position: Vec3::new(position.x, Self::GROUND_HEIGHT, position.z),
            health: Self::MAX_HEALTH,
            max_health: Self::MAX_HEALTH,
            alive: true,
            speed,
            hit_flash: false,
            last_hit_at: None,
            last_attack_at: None,
        }
    }

    /// Spawn on the annulus around the arena center
    pub fn random<R: Rng + ?Sized>(id: EnemyId, rng: &mut R) -> Self {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = rng.gen_range(Self::SPAWN_MIN_RADIUS..Self::SPAWN_MAX_RADIUS);
        let speed = rng.gen_range(Self::MIN_SPEED..Self::MAX_SPEED);
        let position = Vec3::new(
            angle.cos() * distance,
            Self::GROUND_HEIGHT,
            angle.sin() * distance,
        );
        Self::new(id, position, speed)
    }

    pub fn index(&self) -> usize {
        self.id.0 as usize
    }
}

/// Result of applying damage to an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Unknown id, dead target, or non-positive amount
    Ignored,
    Hit { dealt: i32, remaining: i32 },
    Killed { dealt: i32 },
}

impl DamageOutcome {
    pub fn dealt(&self) -> i32 {
        match *self {
            DamageOutcome::Ignored => 0,
            DamageOutcome::Hit { dealt, .. } | DamageOutcome::Killed { dealt } => dealt,
        }
    }
}

/// Projectile in flight
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub position: Vec3,
    /// Unit direction
    pub direction: Vec3,
    pub speed: f32,
    pub damage: i32,
    pub color: ProjectileColor,
    pub created_at: SimMicros,
    pub distance_traveled: f32,
}

impl Projectile {
    /// Maximum travel distance before the projectile expires
    pub const MAX_DISTANCE: f32 = 200.0;

    pub fn is_expired(&self) -> bool {
        self.distance_traveled >= Self::MAX_DISTANCE
    }
}

/// Owns all entity records for a match
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    enemies: Vec<Enemy>,
    projectiles: Vec<Projectile>,
    next_projectile_id: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the enemy set with `enemy_count` freshly spawned enemies and
    /// drop any projectiles left from a previous match.
    pub fn spawn_match<R: Rng + ?Sized>(&mut self, enemy_count: u32, rng: &mut R) -> &[Enemy] {
        self.enemies = (0..enemy_count)
            .map(|i| Enemy::random(EnemyId(i), rng))
            .collect();
        self.projectiles.clear();
        self.next_projectile_id = 0;
        &self.enemies
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(id.0 as usize).filter(|e| e.id == id)
    }

    pub(crate) fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.get_mut(id.0 as usize).filter(|e| e.id == id)
    }

    pub fn alive_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }

    pub fn dead_count(&self) -> usize {
        self.enemies.len() - self.alive_count()
    }

    /// Reduce an enemy's health, floored at zero.
    ///
    /// Dead enemies and non-positive amounts are left untouched.
    pub fn apply_damage(&mut self, id: EnemyId, amount: i32, now: SimMicros) -> DamageOutcome {
        if amount <= 0 {
            return DamageOutcome::Ignored;
        }
        let Some(enemy) = self.enemy_mut(id) else {
            return DamageOutcome::Ignored;
        };
        if !enemy.alive {
            return DamageOutcome::Ignored;
        }

        let dealt = amount.min(enemy.health);
        enemy.health -= dealt;
        enemy.hit_flash = true;
        enemy.last_hit_at = Some(now);

        if enemy.health == 0 {
            enemy.alive = false;
            DamageOutcome::Killed { dealt }
        } else {
            DamageOutcome::Hit {
                dealt,
                remaining: enemy.health,
            }
        }
    }

    /// Returns false for an unknown id
    pub fn clear_hit_flash(&mut self, id: EnemyId) -> bool {
        match self.enemy_mut(id) {
            Some(enemy) => {
                enemy.hit_flash = false;
                true
            }
            None => false,
        }
    }

    pub fn update_position(&mut self, id: EnemyId, position: Vec3) {
        if let Some(enemy) = self.enemy_mut(id) {
            enemy.position = position;
        }
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub(crate) fn projectiles_mut(&mut self) -> &mut Vec<Projectile> {
        &mut self.projectiles
    }

    pub fn spawn_projectile(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        weapon: &Weapon,
        now: SimMicros,
    ) -> ProjectileId {
        let id = ProjectileId(self.next_projectile_id);
        self.next_projectile_id += 1;
        self.projectiles.push(Projectile {
            id,
            position: origin,
            direction,
            speed: weapon.projectile_speed,
            damage: weapon.damage,
            color: weapon.projectile_color,
            created_at: now,
            distance_traveled: 0.0,
        });
        id
    }

    /// Remove a projectile by id. Missing ids are ignored.
    pub fn remove_projectile(&mut self, id: ProjectileId) -> Option<Projectile> {
        let pos = self.projectiles.iter().position(|p| p.id == id)?;
        Some(self.projectiles.remove(pos))
    }
}
