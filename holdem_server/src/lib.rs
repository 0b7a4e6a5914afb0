//! HTTP and WebSocket front for the holdem table engine.

pub mod api;
pub mod config;
pub mod logging;
