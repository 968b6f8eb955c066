//! WebSocket session surface

pub mod handler;
pub mod protocol;
