//! PlayHub player crate.
//!
//! This crate contains the realtime event layer of the player client: the
//! reconnecting WebSocket channels, the subscription registry, the per-feature
//! feeds built on top of them, and a headless runner.

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;
pub mod runner;
