//! Envelope shapes of the shared realtime channel.
//!
//! Inbound and outbound frames share one wire shape:
//!
//! ```json
//! { "type": "wallet.updated", "data": { "balance": 5000 }, "timestamp": "2024-05-01T10:00:00Z" }
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EnvelopeError;
use crate::events::{EventKind, RealtimeEvent};

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub event: RealtimeEvent,
    /// Raw ISO-8601 timestamp as sent by the server, if any.
    pub timestamp: Option<String>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: Value,
    /// Any JSON value; only strings are kept.
    #[serde(default)]
    timestamp: Value,
}

impl Envelope {
    pub fn new(event: RealtimeEvent) -> Self {
        Self {
            event,
            timestamp: None,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        let raw: RawEnvelope = serde_json::from_str(text).map_err(EnvelopeError::InvalidJson)?;
        let kind = raw
            .kind
            .filter(|kind| !kind.is_empty())
            .ok_or(EnvelopeError::MissingKind)?
            .parse::<EventKind>()?;
        let event = RealtimeEvent::from_payload(kind, raw.data)?;
        Ok(Self {
            event,
            timestamp: match raw.timestamp {
                Value::String(timestamp) => Some(timestamp),
                _ => None,
            },
        })
    }

    /// Server timestamp as UTC.
    ///
    /// Timestamps without an offset are taken as UTC. Unparseable values yield `None`.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.as_deref()?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// A frame sent by the client on the shared channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl OutboundMessage {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self::at(kind, data, Utc::now())
    }

    pub fn at(kind: impl Into<String>, data: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: kind.into(),
            data,
            timestamp,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WalletUpdated;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn parses_wallet_update() {
        let envelope = Envelope::parse(
            r#"{"type":"wallet.updated","data":{"balance":5000},"timestamp":"2024-05-01T10:00:00Z"}"#,
        )
        .expect("valid envelope");

        assert_eq!(envelope.kind(), EventKind::WalletUpdated);
        assert_eq!(
            envelope.event,
            RealtimeEvent::WalletUpdated(WalletUpdated {
                balance: Some(5000)
            })
        );
        assert_eq!(
            envelope.timestamp_utc(),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).single()
        );
    }

    #[test]
    fn naive_timestamp_is_read_as_utc() {
        let envelope = Envelope::parse(
            r#"{"type":"notification.new","data":{"message":"hi"},"timestamp":"2024-05-01T10:00:00.250"}"#,
        )
        .expect("valid envelope");

        let ts = envelope.timestamp_utc().expect("naive timestamp parses");
        assert_eq!(ts.timestamp_millis() % 1000, 250);
    }

    #[test]
    fn non_string_timestamp_keeps_the_event() {
        let envelope = Envelope::parse(
            r#"{"type":"wallet.updated","data":{"balance":5000},"timestamp":1714557600}"#,
        )
        .expect("numeric timestamp is tolerated");

        assert_eq!(envelope.kind(), EventKind::WalletUpdated);
        assert_eq!(envelope.timestamp, None);
        assert_eq!(envelope.timestamp_utc(), None);
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(matches!(
            Envelope::parse("not json at all"),
            Err(EnvelopeError::InvalidJson(_))
        ));
        assert!(matches!(
            Envelope::parse(r#"{"data":{"balance":1}}"#),
            Err(EnvelopeError::MissingKind)
        ));
        assert!(matches!(
            Envelope::parse(r#"{"type":"","data":{}}"#),
            Err(EnvelopeError::MissingKind)
        ));
        assert!(matches!(
            Envelope::parse(r#"{"type":"auction.bid","data":{}}"#),
            Err(EnvelopeError::UnknownKind(_))
        ));
        assert!(matches!(
            Envelope::parse(r#"{"type":"wallet.updated","data":{"balance":"lots"}}"#),
            Err(EnvelopeError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn outbound_message_wire_shape() {
        let ts = Utc
            .with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
            .single()
            .expect("valid date");
        let message = OutboundMessage::at("chat.typing", json!({"room_id": 3}), ts);

        let wire: Value =
            serde_json::from_str(&message.to_json().expect("serializes")).expect("valid json");
        assert_eq!(wire["type"], "chat.typing");
        assert_eq!(wire["data"]["room_id"], 3);
        assert_eq!(wire["timestamp"], "2024-05-01T10:00:00Z");
    }
}
