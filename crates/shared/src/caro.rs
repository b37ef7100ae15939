//! Message types of the Caro WebSocket channels.
//!
//! The room-list (`/ws/caro/rooms/`) and game-room (`/ws/caro/game/<room>/`)
//! channels do not use the realtime envelope: each frame is a flat object
//! tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::events::CaroRoomSummary;
use crate::serde_helpers::coins;

// =============================================================================
// Room list
// =============================================================================

/// Snapshot of the open rooms, pushed whenever any room changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaroRoomListData {
    #[serde(default)]
    pub waiting: Vec<CaroRoomSummary>,
    #[serde(default)]
    pub playing: Vec<CaroRoomSummary>,
}

/// Frames received on the room-list channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaroRoomListServerMessage {
    RoomsUpdate { data: CaroRoomListData },
    /// Any other frame type; ignored by the client.
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Game room
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaroSymbol {
    X,
    O,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaroGameStatus {
    Waiting,
    Playing,
    Finished,
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaroPlayer {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaroMove {
    pub row: u32,
    pub col: u32,
    pub symbol: CaroSymbol,
    pub move_number: u32,
    #[serde(default)]
    pub player_username: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Full game snapshot pushed by the game-room channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaroGameData {
    pub id: i64,
    pub game_id: String,
    pub room_name: String,
    pub player1: CaroPlayer,
    #[serde(default)]
    pub player2: Option<CaroPlayer>,
    pub current_turn: CaroSymbol,
    pub status: CaroGameStatus,
    #[serde(default)]
    pub winner: Option<CaroPlayer>,
    #[serde(default)]
    pub total_moves: u32,
    #[serde(default)]
    pub moves: Vec<CaroMove>,
    #[serde(default, deserialize_with = "coins::deserialize")]
    pub bet_amount: i64,
    #[serde(default, deserialize_with = "coins::deserialize")]
    pub total_pot: i64,
    #[serde(default, deserialize_with = "coins::deserialize")]
    pub winner_prize: i64,
    #[serde(default, deserialize_with = "coins::deserialize")]
    pub house_fee: i64,
}

/// Frames received on a game-room channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaroGameServerMessage {
    GameState { data: Box<CaroGameData> },
    /// The server rejected the last action (not your turn, cell taken, ...).
    Error { message: String },
    #[serde(other)]
    Unknown,
}

/// Frames sent on either Caro channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaroClientMessage {
    /// Ask the room-list channel to push a fresh snapshot.
    RefreshRooms,
    /// Place the caller's symbol at `(row, col)`.
    MakeMove { row: u32, col: u32 },
    /// Ask the game-room channel to push a fresh game snapshot.
    RefreshGame,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn room_list_update_decodes() {
        let message: CaroRoomListServerMessage = serde_json::from_value(json!({
            "type": "rooms_update",
            "data": {
                "waiting": [{
                    "id": 1, "game_id": "g-1", "room_name": "alpha", "player1": "lan",
                    "player2": null, "status": "waiting", "bet_amount": "100.00",
                    "created_at": "2024-05-01T10:00:00Z"
                }],
                "playing": []
            }
        }))
        .expect("valid room list");

        let CaroRoomListServerMessage::RoomsUpdate { data } = message else {
            panic!("expected rooms_update");
        };
        assert_eq!(data.waiting.len(), 1);
        assert_eq!(data.waiting[0].room_name.as_deref(), Some("alpha"));
        assert_eq!(data.waiting[0].bet_amount, Some(100));
        assert!(data.playing.is_empty());
    }

    #[test]
    fn unknown_room_list_frames_are_tolerated() {
        let message: CaroRoomListServerMessage =
            serde_json::from_value(json!({"type": "pong"})).expect("unknown type");
        assert_eq!(message, CaroRoomListServerMessage::Unknown);
    }

    #[test]
    fn game_error_decodes() {
        let message: CaroGameServerMessage =
            serde_json::from_value(json!({"type": "error", "message": "Not your turn"}))
                .expect("valid error");
        assert_eq!(
            message,
            CaroGameServerMessage::Error {
                message: "Not your turn".to_string()
            }
        );
    }

    #[test]
    fn client_messages_use_flat_shape() {
        let make_move =
            serde_json::to_value(CaroClientMessage::MakeMove { row: 3, col: 4 }).expect("json");
        assert_eq!(make_move, json!({"type": "make_move", "row": 3, "col": 4}));

        let refresh = serde_json::to_value(CaroClientMessage::RefreshRooms).expect("json");
        assert_eq!(refresh, json!({"type": "refresh_rooms"}));
    }
}
