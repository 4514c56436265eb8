//! Real-time synchronization core for a multiplayer sailing simulation
//!
//! The server half is the authoritative session registry behind a WebSocket
//! transport; the client half (prediction, jitter buffering, clock-offset
//! estimation, roster reconciliation) is embedded by game frontends.

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod session;
pub mod sync;
pub mod util;
pub mod ws;
