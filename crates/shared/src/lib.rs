//! PlayHub Shared - wire types for the Player's WebSocket channels
//!
//! This crate contains the types exchanged with the PlayHub backend:
//! - The closed set of realtime event kinds and their typed payloads
//! - The inbound envelope / outbound message shapes of the shared realtime channel
//! - The narrower message shapes of the Caro room-list and game-room channels
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, chrono and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Lenient payloads** - optional fields default, unknown fields are kept in `extra`

pub mod caro;
pub mod envelope;
pub mod error;
pub mod events;

mod serde_helpers;

pub use caro::{
    CaroClientMessage, CaroGameData, CaroGameServerMessage, CaroGameStatus, CaroMove,
    CaroPlayer, CaroRoomListData, CaroRoomListServerMessage, CaroSymbol,
};
pub use envelope::{Envelope, OutboundMessage};
pub use error::EnvelopeError;
pub use events::{
    AnimalReady, CaroGameUpdate, CaroRoomSummary, ChatMessage, ChatRoomUpdate, ChatUserStatus,
    CropReady, EventKind, NotificationPayload, RealtimeEvent, WalletTransaction, WalletUpdated,
};
