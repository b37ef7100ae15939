//! Errors produced while decoding inbound frames.

use thiserror::Error;

use crate::events::EventKind;

/// Why an inbound realtime frame could not be turned into an [`crate::Envelope`].
///
/// Every variant is recoverable: the frame is dropped and the connection stays up.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("frame is not a JSON envelope: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("envelope has no event type")]
    MissingKind,

    #[error("unknown event type {0:?}")]
    UnknownKind(String),

    #[error("invalid payload for {kind}: {source}")]
    InvalidPayload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}
