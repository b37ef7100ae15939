//! Shared constants for every reconnecting channel.
//!
//! Kept in one place so the realtime channel and the Caro channels back off
//! identically unless configured otherwise.

// Reconnection constants
pub const INITIAL_RETRY_DELAY_MS: u64 = 1_000;
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;
pub const MAX_RETRY_ATTEMPTS: u32 = 5;
pub const BACKOFF_MULTIPLIER: u64 = 2;

/// How long a closing handshake may take before the link is simply dropped.
pub const CLOSE_TIMEOUT_MS: u64 = 1_000;
