//! WebSocket channels to the backend
//!
//! - `channel`: the reconnecting channel every socket is built on
//! - `core`: backoff math, free of socket and timer dependencies
//! - `transport`: the connector seam and its tokio-tungstenite implementation
//! - `endpoints`: URLs of the backend's WebSocket routes

mod channel;
mod core;
mod endpoints;
mod shared;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use channel::{ExhaustionAlert, FrameHandler, ReconnectingChannel, SendError};
pub use core::{BackoffState, ReconnectPolicy};
pub use endpoints::{redacted, Endpoints};
pub use transport::{Connector, Frame, FrameSink, FrameStream, Link, TransportError, TungsteniteConnector};
