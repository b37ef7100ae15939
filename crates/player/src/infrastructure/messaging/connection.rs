//! Connection lifecycle state.
//!
//! This module provides the state of a reconnecting channel and an observer
//! type for consumers (status indicators, tests) that want to watch it.

use std::fmt;

use tokio::sync::watch;

/// Why a channel stopped for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// `disconnect()` was called.
    Closed,
    /// Every reconnect attempt failed.
    Exhausted,
}

/// Connection state of a channel.
///
/// ```text
/// Idle -> Connecting -> Connected -> Disconnected -> Reconnecting -> Connecting ...
///                                               \-> Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Never opened
    #[default]
    Idle,
    /// Attempting to establish connection
    Connecting,
    /// Successfully connected
    Connected,
    /// Connection lost or refused
    Disconnected,
    /// Waiting out the backoff delay before the next attempt
    Reconnecting,
    /// Stopped until the next explicit `connect()`
    Terminated(TerminationReason),
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    /// Whether the channel is still trying to reach the server.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting
                | ConnectionState::Disconnected
                | ConnectionState::Reconnecting
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Terminated(TerminationReason::Closed) => "terminated",
            ConnectionState::Terminated(TerminationReason::Exhausted) => "terminated (exhausted)",
        };
        f.write_str(name)
    }
}

/// Observable connection state for UI binding.
///
/// Multiple observers can share the same underlying state; each one sees
/// changes independently.
#[derive(Clone)]
pub struct ConnectionStateObserver {
    rx: watch::Receiver<ConnectionState>,
}

impl ConnectionStateObserver {
    pub fn new(rx: watch::Receiver<ConnectionState>) -> Self {
        Self { rx }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.rx.borrow()
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Wait for the next state change.
    ///
    /// Returns `None` once the channel owning the state is dropped.
    pub async fn changed(&mut self) -> Option<ConnectionState> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Wait until the state satisfies `predicate` (checked immediately first).
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(ConnectionState) -> bool,
    ) -> Option<ConnectionState> {
        self.rx
            .wait_for(|state| predicate(*state))
            .await
            .ok()
            .map(|state| *state)
    }
}
