//! Motion and targeting: enemy pursuit, projectile flight, player locomotion

use glam::Vec3;

use super::entities::{Enemy, EntityStore, Player, Projectile, ProjectileId};
use super::MoveIntent;

/// Square arena centered on the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub half_extent: f32,
}

impl ArenaBounds {
    pub const fn new(half_extent: f32) -> Self {
        Self { half_extent }
    }

    /// Clamp a ground-plane position, leaving height alone
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        Vec3::new(
            position.x.clamp(-self.half_extent, self.half_extent),
            position.y,
            position.z.clamp(-self.half_extent, self.half_extent),
        )
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self::new(45.0)
    }
}

/// Presentation-only hover
pub const BOB_AMPLITUDE: f32 = 0.1;
/// Radians per second
pub const BOB_FREQUENCY: f32 = 3.0;

pub struct PhysicsSystem;

impl PhysicsSystem {
    /// One pursuit step from `position` toward `target`.
    ///
    /// The result is pinned to the ground plane. An enemy already standing
    /// on the target does not move.
    pub fn pursue(position: Vec3, target: Vec3, speed: f32, dt: f32) -> Vec3 {
        let direction = (target - position).normalize_or_zero();
        let mut next = position + direction * speed * dt;
        next.y = Enemy::GROUND_HEIGHT;
        next
    }

    /// Height at which the renderer should draw an enemy. Never used for
    /// collision.
    pub fn bob_height(index: usize, time_secs: f32) -> f32 {
        Enemy::GROUND_HEIGHT + (time_secs * BOB_FREQUENCY + index as f32).sin() * BOB_AMPLITUDE
    }

    /// Move every alive enemy toward the player
    pub fn update_enemies(store: &mut EntityStore, player_position: Vec3, dt: f32) {
        let moves: Vec<_> = store
            .enemies()
            .iter()
            .filter(|e| e.alive)
            .map(|e| (e.id, Self::pursue(e.position, player_position, e.speed, dt)))
            .collect();

        for (id, position) in moves {
            store.update_position(id, position);
        }
    }

    pub fn advance_projectile(projectile: &mut Projectile, dt: f32) {
        let step = projectile.direction * projectile.speed * dt;
        projectile.position += step;
        projectile.distance_traveled += step.length();
    }

    pub fn advance_projectiles(store: &mut EntityStore, dt: f32) {
        for projectile in store.projectiles_mut() {
            Self::advance_projectile(projectile, dt);
        }
    }

    /// Drop projectiles past their maximum distance. Runs after the
    /// collision pass so a shot landing on its last frame still counts.
    pub fn expire_projectiles(store: &mut EntityStore) -> Vec<ProjectileId> {
        let mut expired = Vec::new();
        store.projectiles_mut().retain(|p| {
            if p.is_expired() {
                expired.push(p.id);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Walk the player relative to the horizontal look direction
    pub fn move_player(
        player: &Player,
        intent: MoveIntent,
        dt: f32,
        bounds: &ArenaBounds,
    ) -> Vec3 {
        let mut position = player.position;
        let axis = intent.axis();

        if axis != glam::Vec2::ZERO {
            let mut forward = Vec3::new(player.look.x, 0.0, player.look.z).normalize_or_zero();
            if forward == Vec3::ZERO {
                forward = Vec3::NEG_Z;
            }
            let right = forward.cross(Vec3::Y);
            let velocity = (forward * axis.y + right * axis.x).normalize_or_zero();
            position += velocity * Player::SPEED * dt;
        }

        let mut position = bounds.clamp(position);
        position.y = Player::EYE_HEIGHT;
        position
    }
}
