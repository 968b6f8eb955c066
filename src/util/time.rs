//! Time utilities for the simulation and the session server

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Simulated time, in microseconds since the match started.
pub type SimMicros = u64;

/// Convert a frame delta in seconds to whole simulated microseconds.
///
/// Non-finite and non-positive deltas map to zero.
pub fn secs_to_micros(secs: f32) -> SimMicros {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (f64::from(secs) * MICROS_PER_SEC as f64).round() as SimMicros
}

pub fn micros_to_secs(micros: SimMicros) -> f32 {
    (micros as f64 / MICROS_PER_SEC as f64) as f32
}

/// True once at least `interval` has passed since `since`
pub fn cooldown_elapsed(now: SimMicros, since: SimMicros, interval: SimMicros) -> bool {
    now.saturating_sub(since) >= interval
}

/// Frame-accumulated simulation clock.
///
/// Only advanced by the frame tick, so every timestamp in a match is
/// reproducible from the sequence of frame deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    now: SimMicros,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> SimMicros {
        self.now
    }

    pub fn advance(&mut self, delta: SimMicros) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn reset(&mut self) {
        self.now = 0;
    }
}

/// Fixed tick delta for a given tick rate (in seconds)
pub fn tick_delta(tick_rate: u32) -> f32 {
    1.0 / tick_rate.max(1) as f32
}
