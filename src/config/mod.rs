//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::game::session::TickSettings;
use crate::game::SimConfig;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,

    /// Enemies spawned per match
    pub enemy_count: u32,
    /// Fixed seed for enemy spawns; random per match when unset
    pub match_seed: Option<u64>,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Snapshots sent per second
    pub snapshot_rate: u32,
    /// Largest frame delta integrated in one step (milliseconds)
    pub max_frame_delta_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            log_json: false,
            enemy_count: 10,
            match_seed: None,
            tick_rate: 60,
            snapshot_rate: 20,
            max_frame_delta_ms: 250,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr: SocketAddr = match (lookup("PORT"), lookup("SERVER_ADDR")) {
            (Some(port), _) => format!("0.0.0.0:{}", port)
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            (None, Some(addr)) => addr.parse().map_err(|_| ConfigError::InvalidAddress)?,
            (None, None) => defaults.server_addr,
        };

        let enemy_count = parse_or(&lookup, "ENEMY_COUNT", defaults.enemy_count)?;
        if enemy_count == 0 {
            return Err(ConfigError::OutOfRange("ENEMY_COUNT"));
        }

        let tick_rate = parse_or(&lookup, "TICK_RATE", defaults.tick_rate)?;
        if !(1..=240).contains(&tick_rate) {
            return Err(ConfigError::OutOfRange("TICK_RATE"));
        }

        let snapshot_rate = parse_or(&lookup, "SNAPSHOT_RATE", defaults.snapshot_rate)?;
        if snapshot_rate == 0 || snapshot_rate > tick_rate {
            return Err(ConfigError::OutOfRange("SNAPSHOT_RATE"));
        }

        let max_frame_delta_ms = parse_or(&lookup, "MAX_FRAME_DELTA_MS", defaults.max_frame_delta_ms)?;
        if max_frame_delta_ms == 0 {
            return Err(ConfigError::OutOfRange("MAX_FRAME_DELTA_MS"));
        }

        let match_seed = match lookup("MATCH_SEED") {
            Some(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid("MATCH_SEED"))?),
            None => None,
        };

        let log_json = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") | Some("text") => false,
            Some("json") => true,
            Some(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        Ok(Self {
            server_addr,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json,
            enemy_count,
            match_seed,
            tick_rate,
            snapshot_rate,
            max_frame_delta_ms,
        })
    }

    /// Simulation tunables for a new match
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            enemy_count: self.enemy_count,
            max_frame_delta: self.max_frame_delta_ms.saturating_mul(1000),
            ..SimConfig::default()
        }
    }

    pub fn tick_settings(&self) -> TickSettings {
        TickSettings {
            tick_rate: self.tick_rate,
            snapshot_rate: self.snapshot_rate,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Environment variable out of range: {0}")]
    OutOfRange(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
