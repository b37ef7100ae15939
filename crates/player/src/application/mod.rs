//! Application layer: feature feeds, toasts and the connection status badge.

pub mod feeds;
pub mod status;
pub mod toasts;

pub use status::RealtimeStatus;
pub use toasts::{Toast, ToastCenter};
