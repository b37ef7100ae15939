//! Realtime event kinds and their payloads.
//!
//! The shared realtime channel carries a closed set of event kinds. Each kind
//! has exactly one payload shape, so consumers match on [`RealtimeEvent`]
//! instead of comparing strings.
//!
//! ## Versioning Policy
//!
//! - New kinds can be added at the end (clients drop kinds they do not know)
//! - Payload structs keep unrecognised fields in `extra`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EnvelopeError;
use crate::serde_helpers::{coins, id, text};

// =============================================================================
// Event kinds
// =============================================================================

/// Tag of a realtime event, as sent in the envelope's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "wallet.updated")]
    WalletUpdated,
    #[serde(rename = "wallet.transaction")]
    WalletTransaction,
    #[serde(rename = "chat.new_message")]
    ChatNewMessage,
    #[serde(rename = "chat.private_message")]
    ChatPrivateMessage,
    #[serde(rename = "chat.user_status")]
    ChatUserStatus,
    #[serde(rename = "chat.room_updated")]
    ChatRoomUpdated,
    #[serde(rename = "caro.room_created")]
    CaroRoomCreated,
    #[serde(rename = "caro.room_updated")]
    CaroRoomUpdated,
    #[serde(rename = "caro.room_deleted")]
    CaroRoomDeleted,
    #[serde(rename = "caro.game_started")]
    CaroGameStarted,
    #[serde(rename = "caro.game_move")]
    CaroGameMove,
    #[serde(rename = "caro.game_ended")]
    CaroGameEnded,
    #[serde(rename = "farm.crop_ready")]
    FarmCropReady,
    #[serde(rename = "farm.animal_ready")]
    FarmAnimalReady,
    #[serde(rename = "notification.new")]
    NotificationNew,
}

impl EventKind {
    /// Every kind, in wire-enumeration order.
    pub const ALL: [EventKind; 15] = [
        EventKind::WalletUpdated,
        EventKind::WalletTransaction,
        EventKind::ChatNewMessage,
        EventKind::ChatPrivateMessage,
        EventKind::ChatUserStatus,
        EventKind::ChatRoomUpdated,
        EventKind::CaroRoomCreated,
        EventKind::CaroRoomUpdated,
        EventKind::CaroRoomDeleted,
        EventKind::CaroGameStarted,
        EventKind::CaroGameMove,
        EventKind::CaroGameEnded,
        EventKind::FarmCropReady,
        EventKind::FarmAnimalReady,
        EventKind::NotificationNew,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::WalletUpdated => "wallet.updated",
            EventKind::WalletTransaction => "wallet.transaction",
            EventKind::ChatNewMessage => "chat.new_message",
            EventKind::ChatPrivateMessage => "chat.private_message",
            EventKind::ChatUserStatus => "chat.user_status",
            EventKind::ChatRoomUpdated => "chat.room_updated",
            EventKind::CaroRoomCreated => "caro.room_created",
            EventKind::CaroRoomUpdated => "caro.room_updated",
            EventKind::CaroRoomDeleted => "caro.room_deleted",
            EventKind::CaroGameStarted => "caro.game_started",
            EventKind::CaroGameMove => "caro.game_move",
            EventKind::CaroGameEnded => "caro.game_ended",
            EventKind::FarmCropReady => "farm.crop_ready",
            EventKind::FarmAnimalReady => "farm.animal_ready",
            EventKind::NotificationNew => "notification.new",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EnvelopeError::UnknownKind(s.to_string()))
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// `wallet.updated` - the user's coin balance changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletUpdated {
    /// New balance; absent when the backend only signals "something changed".
    #[serde(default, deserialize_with = "coins::option::deserialize")]
    pub balance: Option<i64>,
}

/// `wallet.transaction` - a ledger entry was recorded for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    #[serde(default, deserialize_with = "id::option::deserialize")]
    pub id: Option<String>,
    /// Signed amount: positive for credits, negative for debits.
    #[serde(deserialize_with = "coins::deserialize")]
    pub amount: i64,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "coins::option::deserialize")]
    pub balance_after: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `chat.new_message` / `chat.private_message`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "id::option::deserialize")]
    pub room_id: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `chat.user_status` - presence change of another user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatUserStatus {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `chat.room_updated` - room metadata (members, last message, ...) changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRoomUpdate {
    #[serde(default, deserialize_with = "id::option::deserialize")]
    pub room_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Room row carried by `caro.room_created`, `caro.room_updated` and `caro.room_deleted`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaroRoomSummary {
    #[serde(deserialize_with = "id::option::deserialize")]
    pub id: Option<String>,
    pub game_id: Option<String>,
    pub room_name: Option<String>,
    pub player1: Option<String>,
    pub player2: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "coins::option::deserialize")]
    pub bet_amount: Option<i64>,
    pub created_at: Option<String>,
}

/// Game progress carried by `caro.game_started`, `caro.game_move` and `caro.game_ended`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaroGameUpdate {
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    /// Winner's display name; `None` on a draw or while the game runs.
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub row: Option<u32>,
    #[serde(default)]
    pub col: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `farm.crop_ready`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropReady {
    #[serde(default, deserialize_with = "text::deserialize")]
    pub crop_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `farm.animal_ready`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimalReady {
    #[serde(default, deserialize_with = "text::deserialize")]
    pub animal_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `notification.new` - generic user-facing notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Typed event
// =============================================================================

/// An inbound realtime event with its payload decoded for its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    WalletUpdated(WalletUpdated),
    WalletTransaction(WalletTransaction),
    ChatNewMessage(ChatMessage),
    ChatPrivateMessage(ChatMessage),
    ChatUserStatus(ChatUserStatus),
    ChatRoomUpdated(ChatRoomUpdate),
    CaroRoomCreated(CaroRoomSummary),
    CaroRoomUpdated(CaroRoomSummary),
    CaroRoomDeleted(CaroRoomSummary),
    CaroGameStarted(CaroGameUpdate),
    CaroGameMove(CaroGameUpdate),
    CaroGameEnded(CaroGameUpdate),
    FarmCropReady(CropReady),
    FarmAnimalReady(AnimalReady),
    Notification(NotificationPayload),
}

impl RealtimeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RealtimeEvent::WalletUpdated(_) => EventKind::WalletUpdated,
            RealtimeEvent::WalletTransaction(_) => EventKind::WalletTransaction,
            RealtimeEvent::ChatNewMessage(_) => EventKind::ChatNewMessage,
            RealtimeEvent::ChatPrivateMessage(_) => EventKind::ChatPrivateMessage,
            RealtimeEvent::ChatUserStatus(_) => EventKind::ChatUserStatus,
            RealtimeEvent::ChatRoomUpdated(_) => EventKind::ChatRoomUpdated,
            RealtimeEvent::CaroRoomCreated(_) => EventKind::CaroRoomCreated,
            RealtimeEvent::CaroRoomUpdated(_) => EventKind::CaroRoomUpdated,
            RealtimeEvent::CaroRoomDeleted(_) => EventKind::CaroRoomDeleted,
            RealtimeEvent::CaroGameStarted(_) => EventKind::CaroGameStarted,
            RealtimeEvent::CaroGameMove(_) => EventKind::CaroGameMove,
            RealtimeEvent::CaroGameEnded(_) => EventKind::CaroGameEnded,
            RealtimeEvent::FarmCropReady(_) => EventKind::FarmCropReady,
            RealtimeEvent::FarmAnimalReady(_) => EventKind::FarmAnimalReady,
            RealtimeEvent::Notification(_) => EventKind::NotificationNew,
        }
    }

    /// Decode the `data` field of an envelope whose `type` is `kind`.
    ///
    /// A `null` payload is treated as an empty object so that kinds whose
    /// fields are all optional still decode.
    pub fn from_payload(kind: EventKind, data: Value) -> Result<Self, EnvelopeError> {
        let data = match data {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let invalid = |source| EnvelopeError::InvalidPayload { kind, source };

        let event = match kind {
            EventKind::WalletUpdated => {
                RealtimeEvent::WalletUpdated(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::WalletTransaction => {
                RealtimeEvent::WalletTransaction(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::ChatNewMessage => {
                RealtimeEvent::ChatNewMessage(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::ChatPrivateMessage => {
                RealtimeEvent::ChatPrivateMessage(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::ChatUserStatus => {
                RealtimeEvent::ChatUserStatus(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::ChatRoomUpdated => {
                RealtimeEvent::ChatRoomUpdated(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::CaroRoomCreated => {
                RealtimeEvent::CaroRoomCreated(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::CaroRoomUpdated => {
                RealtimeEvent::CaroRoomUpdated(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::CaroRoomDeleted => {
                RealtimeEvent::CaroRoomDeleted(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::CaroGameStarted => {
                RealtimeEvent::CaroGameStarted(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::CaroGameMove => {
                RealtimeEvent::CaroGameMove(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::CaroGameEnded => {
                RealtimeEvent::CaroGameEnded(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::FarmCropReady => {
                RealtimeEvent::FarmCropReady(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::FarmAnimalReady => {
                RealtimeEvent::FarmAnimalReady(serde_json::from_value(data).map_err(invalid)?)
            }
            EventKind::NotificationNew => {
                RealtimeEvent::Notification(serde_json::from_value(data).map_err(invalid)?)
            }
        };
        Ok(event)
    }
}
