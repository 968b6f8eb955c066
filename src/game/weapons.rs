//! Weapon registry - fixed weapon configuration

use serde::{Deserialize, Serialize};

use crate::util::time::{cooldown_elapsed, SimMicros, MICROS_PER_SEC};

/// Weapons available to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponId {
    /// Rapid fire, low damage
    #[default]
    Blaster,
    /// Slow fire, high damage
    Cannon,
}

impl WeaponId {
    pub const ALL: [WeaponId; 2] = [WeaponId::Blaster, WeaponId::Cannon];
}

/// Projectile color tag, resolved to a material by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileColor {
    Cyan,
    Magenta,
}

/// Weapon stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Weapon {
    pub id: WeaponId,
    pub name: &'static str,
    /// Damage per hit
    pub damage: i32,
    /// Shots per second
    pub fire_rate: f32,
    /// Projectile speed (units per second)
    pub projectile_speed: f32,
    pub projectile_color: ProjectileColor,
}

const BLASTER: Weapon = Weapon {
    id: WeaponId::Blaster,
    name: "Pulse Blaster",
    damage: 25,
    fire_rate: 8.0,
    projectile_speed: 80.0,
    projectile_color: ProjectileColor::Cyan,
};

const CANNON: Weapon = Weapon {
    id: WeaponId::Cannon,
    name: "Ion Cannon",
    damage: 50,
    fire_rate: 1.5,
    projectile_speed: 50.0,
    projectile_color: ProjectileColor::Magenta,
};

/// Look up a weapon. Total over the closed set of ids.
pub fn lookup(id: WeaponId) -> &'static Weapon {
    match id {
        WeaponId::Blaster => &BLASTER,
        WeaponId::Cannon => &CANNON,
    }
}

impl Weapon {
    /// Minimum simulated time between two shots
    pub fn shot_interval(&self) -> SimMicros {
        (MICROS_PER_SEC as f64 / f64::from(self.fire_rate)).round() as SimMicros
    }
}

/// Tracks when the player last fired, independent of the selected weapon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireGate {
    last_shot: Option<SimMicros>,
}

impl FireGate {
    pub fn can_fire(&self, weapon: &Weapon, now: SimMicros) -> bool {
        match self.last_shot {
            None => true,
            Some(last) => cooldown_elapsed(now, last, weapon.shot_interval()),
        }
    }

    pub fn record_shot(&mut self, now: SimMicros) {
        self.last_shot = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_shot = None;
    }
}
