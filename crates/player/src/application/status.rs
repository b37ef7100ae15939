//! Realtime status indicator shown next to the user's name.

use std::fmt;

use crate::infrastructure::messaging::ConnectionState;

/// What the header badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeStatus {
    /// Nobody is logged in; the badge is not shown.
    Hidden,
    Connecting,
    Live,
    Offline,
}

impl RealtimeStatus {
    pub fn derive(logged_in: bool, state: ConnectionState) -> Self {
        if !logged_in {
            return RealtimeStatus::Hidden;
        }
        match state {
            ConnectionState::Connected => RealtimeStatus::Live,
            ConnectionState::Idle
            | ConnectionState::Connecting
            | ConnectionState::Disconnected
            | ConnectionState::Reconnecting => RealtimeStatus::Connecting,
            ConnectionState::Terminated(_) => RealtimeStatus::Offline,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RealtimeStatus::Hidden => "",
            RealtimeStatus::Connecting => "Connecting",
            RealtimeStatus::Live => "Live",
            RealtimeStatus::Offline => "Offline",
        }
    }

    /// Tooltip text of the badge.
    pub fn tooltip(self) -> &'static str {
        match self {
            RealtimeStatus::Live => "Realtime connection active",
            RealtimeStatus::Hidden => "",
            RealtimeStatus::Connecting | RealtimeStatus::Offline => "Realtime connection lost",
        }
    }
}

impl fmt::Display for RealtimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::messaging::TerminationReason;

    #[test]
    fn hidden_without_user() {
        assert_eq!(
            RealtimeStatus::derive(false, ConnectionState::Connected),
            RealtimeStatus::Hidden
        );
    }

    #[test]
    fn follows_connection_state() {
        assert_eq!(
            RealtimeStatus::derive(true, ConnectionState::Connected),
            RealtimeStatus::Live
        );
        assert_eq!(
            RealtimeStatus::derive(true, ConnectionState::Reconnecting),
            RealtimeStatus::Connecting
        );
        assert_eq!(
            RealtimeStatus::derive(true, ConnectionState::Terminated(TerminationReason::Exhausted)),
            RealtimeStatus::Offline
        );
        assert_eq!(RealtimeStatus::Live.to_string(), "Live");
    }

    #[test]
    fn tooltip_reports_lost_connection_while_not_live() {
        assert_eq!(RealtimeStatus::Live.tooltip(), "Realtime connection active");
        assert_eq!(RealtimeStatus::Connecting.tooltip(), "Realtime connection lost");
        assert_eq!(RealtimeStatus::Offline.tooltip(), "Realtime connection lost");
        assert_eq!(RealtimeStatus::Hidden.tooltip(), "");
    }
}
