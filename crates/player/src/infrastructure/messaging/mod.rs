//! Subscription registry and connection-state messaging infrastructure.
//!
//! This module provides the in-process half of the realtime layer:
//! - `SubscriptionRegistry`: fan inbound envelopes out to feature handlers
//! - `HandlerSlot`: stable registration with swappable behavior
//! - `ConnectionState` / `ConnectionStateObserver`: observe channel lifecycle
//!
//! The WebSocket channels (in the websocket module) feed these from the transport.

pub mod connection;
pub mod handler_slot;
pub mod registry;

pub use connection::{ConnectionState, ConnectionStateObserver, TerminationReason};
pub use handler_slot::HandlerSlot;
pub use registry::{EventHandler, Subscription, SubscriptionId, SubscriptionRegistry, SubscriptionSet};
