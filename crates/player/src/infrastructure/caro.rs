//! Caro sockets: the lobby's room list and a single game room.
//!
//! Both run on their own [`ReconnectingChannel`] with the same backoff as the
//! shared realtime channel. Callbacks live in [`HandlerSlot`]s so the UI can
//! swap them without reconnecting.

use std::sync::Arc;

use playhub_shared::{
    CaroClientMessage, CaroGameData, CaroGameServerMessage, CaroRoomListData,
    CaroRoomListServerMessage,
};

use crate::infrastructure::messaging::{ConnectionState, ConnectionStateObserver, HandlerSlot};
use crate::infrastructure::websocket::{
    Connector, Endpoints, FrameHandler, ReconnectPolicy, ReconnectingChannel, SendError,
};

fn send_message(channel: &ReconnectingChannel, message: &CaroClientMessage) -> Result<(), SendError> {
    let text = serde_json::to_string(message)?;
    channel.send_text(text)
}

// =============================================================================
// Room list
// =============================================================================

struct RoomListFrames {
    on_rooms_update: HandlerSlot<CaroRoomListData>,
}

impl FrameHandler for RoomListFrames {
    fn on_frame(&self, text: &str) {
        match serde_json::from_str::<CaroRoomListServerMessage>(text) {
            Ok(CaroRoomListServerMessage::RoomsUpdate { data }) => {
                tracing::debug!(
                    waiting = data.waiting.len(),
                    playing = data.playing.len(),
                    "Caro rooms update"
                );
                self.on_rooms_update.call(&data);
            }
            Ok(CaroRoomListServerMessage::Unknown) => {
                tracing::debug!("Ignoring unknown Caro room list frame");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse Caro room list frame");
            }
        }
    }
}

/// Live list of waiting and playing Caro rooms (`/ws/caro/rooms/`).
pub struct CaroRoomListSocket {
    endpoints: Endpoints,
    channel: ReconnectingChannel,
    on_rooms_update: HandlerSlot<CaroRoomListData>,
}

impl CaroRoomListSocket {
    pub fn new(endpoints: &Endpoints, connector: Arc<dyn Connector>, policy: ReconnectPolicy) -> Self {
        let on_rooms_update = HandlerSlot::new();
        let channel = ReconnectingChannel::new(
            "caro_rooms",
            connector,
            policy,
            Arc::new(RoomListFrames {
                on_rooms_update: on_rooms_update.clone(),
            }),
            None,
        );
        Self {
            endpoints: endpoints.clone(),
            channel,
            on_rooms_update,
        }
    }

    /// Called with every room snapshot pushed by the server.
    pub fn on_rooms_update(&self) -> &HandlerSlot<CaroRoomListData> {
        &self.on_rooms_update
    }

    /// Returns whether a connection was started.
    pub fn connect(&self) -> bool {
        self.channel.open(self.endpoints.caro_rooms())
    }

    pub fn disconnect(&self) {
        self.channel.close();
    }

    pub async fn shutdown(&self) {
        self.channel.shutdown().await;
    }

    /// Ask the server for a fresh snapshot.
    pub fn refresh_rooms(&self) -> Result<(), SendError> {
        send_message(&self.channel, &CaroClientMessage::RefreshRooms)
    }

    pub fn state(&self) -> ConnectionState {
        self.channel.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn observer(&self) -> ConnectionStateObserver {
        self.channel.observer()
    }
}

// =============================================================================
// Game room
// =============================================================================

struct GameFrames {
    on_game_state: HandlerSlot<CaroGameData>,
    on_error: HandlerSlot<str>,
}

impl FrameHandler for GameFrames {
    fn on_frame(&self, text: &str) {
        match serde_json::from_str::<CaroGameServerMessage>(text) {
            Ok(CaroGameServerMessage::GameState { data }) => {
                tracing::debug!(
                    game_id = %data.game_id,
                    total_moves = data.total_moves,
                    "Caro game state"
                );
                self.on_game_state.call(&data);
            }
            Ok(CaroGameServerMessage::Error { message }) => {
                tracing::warn!(%message, "Caro game error");
                self.on_error.call(message.as_str());
            }
            Ok(CaroGameServerMessage::Unknown) => {
                tracing::debug!("Ignoring unknown Caro game frame");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse Caro game frame");
            }
        }
    }
}

/// One Caro game room (`/ws/caro/game/<room>/`).
pub struct CaroGameSocket {
    endpoints: Endpoints,
    channel: ReconnectingChannel,
    on_game_state: HandlerSlot<CaroGameData>,
    on_error: HandlerSlot<str>,
}

impl CaroGameSocket {
    pub fn new(endpoints: &Endpoints, connector: Arc<dyn Connector>, policy: ReconnectPolicy) -> Self {
        let on_game_state = HandlerSlot::new();
        let on_error = HandlerSlot::new();
        let channel = ReconnectingChannel::new(
            "caro_game",
            connector,
            policy,
            Arc::new(GameFrames {
                on_game_state: on_game_state.clone(),
                on_error: on_error.clone(),
            }),
            None,
        );
        Self {
            endpoints: endpoints.clone(),
            channel,
            on_game_state,
            on_error,
        }
    }

    /// Called with every full game snapshot.
    pub fn on_game_state(&self) -> &HandlerSlot<CaroGameData> {
        &self.on_game_state
    }

    /// Called with the server's message when it rejects an action.
    pub fn on_error(&self) -> &HandlerSlot<str> {
        &self.on_error
    }

    /// Join `room_name`, leaving any room joined before.
    ///
    /// An empty room name is ignored; returns whether a connection was started.
    pub fn connect(&self, room_name: &str) -> bool {
        let room_name = room_name.trim();
        if room_name.is_empty() {
            tracing::debug!("No Caro room selected, not connecting");
            return false;
        }
        self.channel.open(self.endpoints.caro_game(room_name))
    }

    pub fn disconnect(&self) {
        self.channel.close();
    }

    pub async fn shutdown(&self) {
        self.channel.shutdown().await;
    }

    pub fn make_move(&self, row: u32, col: u32) -> Result<(), SendError> {
        send_message(&self.channel, &CaroClientMessage::MakeMove { row, col })
    }

    /// Ask the server to push the current game snapshot.
    pub fn refresh_game(&self) -> Result<(), SendError> {
        send_message(&self.channel, &CaroClientMessage::RefreshGame)
    }

    pub fn state(&self) -> ConnectionState {
        self.channel.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn observer(&self) -> ConnectionStateObserver {
        self.channel.observer()
    }
}
