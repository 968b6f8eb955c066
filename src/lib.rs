//! Arena Sim - single-player arena combat simulation
//!
//! The `game` modules hold the simulation core. `http` and `ws` expose one
//! match per WebSocket connection to a presentation client.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
