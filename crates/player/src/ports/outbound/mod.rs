//! Outbound ports - Interfaces for external collaborators
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing the realtime core to reach the UI and session layers without
//! depending on concrete implementations.

pub mod connection_control;
pub mod notifier;

pub use connection_control::ConnectionControl;
pub use notifier::{Notifier, ToastDuration, ToastLevel, ToastRequest};

#[cfg(any(test, feature = "testing"))]
pub use connection_control::MockConnectionControl;
#[cfg(any(test, feature = "testing"))]
pub use notifier::MockNotifier;
