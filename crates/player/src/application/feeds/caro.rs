//! Caro feed: room lifecycle and game progress from the shared channel.
//!
//! The lobby's full room snapshots come from the dedicated room-list socket;
//! this feed carries the lighter per-room and per-game events.

use std::sync::Arc;

use playhub_shared::{CaroGameUpdate, CaroRoomSummary, EventKind, RealtimeEvent};
use tokio::sync::watch;

use crate::infrastructure::messaging::{SubscriptionRegistry, SubscriptionSet};
use crate::ports::outbound::{Notifier, ToastRequest};

use super::{subscribe_all, unexpected};

const OWNER: &str = "caro";
const KINDS: [EventKind; 6] = [
    EventKind::CaroRoomCreated,
    EventKind::CaroRoomUpdated,
    EventKind::CaroRoomDeleted,
    EventKind::CaroGameStarted,
    EventKind::CaroGameMove,
    EventKind::CaroGameEnded,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomChangeKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomChange {
    pub kind: RoomChangeKind,
    pub room: CaroRoomSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameChangeKind {
    Started,
    Move,
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameChange {
    pub kind: GameChangeKind,
    pub game: CaroGameUpdate,
}

struct CaroState {
    room_change: watch::Sender<Option<RoomChange>>,
    game_change: watch::Sender<Option<GameChange>>,
    notifier: Arc<dyn Notifier>,
}

impl CaroState {
    fn room(&self, kind: RoomChangeKind, room: &CaroRoomSummary) {
        self.room_change.send_replace(Some(RoomChange {
            kind,
            room: room.clone(),
        }));
    }

    fn game(&self, kind: GameChangeKind, game: &CaroGameUpdate) {
        self.game_change.send_replace(Some(GameChange {
            kind,
            game: game.clone(),
        }));
    }

    fn handle(&self, event: &RealtimeEvent) -> anyhow::Result<()> {
        match event {
            RealtimeEvent::CaroRoomCreated(room) => self.room(RoomChangeKind::Created, room),
            RealtimeEvent::CaroRoomUpdated(room) => self.room(RoomChangeKind::Updated, room),
            RealtimeEvent::CaroRoomDeleted(room) => self.room(RoomChangeKind::Deleted, room),
            RealtimeEvent::CaroGameStarted(game) => {
                self.game(GameChangeKind::Started, game);
                self.notifier.notify(ToastRequest::success("Game started!"));
            }
            RealtimeEvent::CaroGameMove(game) => self.game(GameChangeKind::Move, game),
            RealtimeEvent::CaroGameEnded(game) => {
                self.game(GameChangeKind::Ended, game);
                let toast = match game.winner.as_deref().filter(|w| !w.is_empty()) {
                    Some(winner) => ToastRequest::success(format!("{winner} wins!")),
                    None => ToastRequest::info("Draw!"),
                };
                self.notifier.notify(toast);
            }
            other => return Err(unexpected(OWNER, other)),
        }
        Ok(())
    }
}

pub struct CaroFeed {
    state: Arc<CaroState>,
    subscriptions: SubscriptionSet,
}

impl CaroFeed {
    pub fn activate(registry: &SubscriptionRegistry, notifier: Arc<dyn Notifier>) -> Self {
        let state = Arc::new(CaroState {
            room_change: watch::channel(None).0,
            game_change: watch::channel(None).0,
            notifier,
        });

        let handler_state = Arc::clone(&state);
        let subscriptions = subscribe_all(registry, OWNER, &KINDS, move |event| {
            handler_state.handle(event)
        });

        Self {
            state,
            subscriptions,
        }
    }

    /// Most recent room created/updated/deleted event.
    pub fn room_change(&self) -> Option<RoomChange> {
        self.state.room_change.borrow().clone()
    }

    pub fn watch_room_change(&self) -> watch::Receiver<Option<RoomChange>> {
        self.state.room_change.subscribe()
    }

    /// Most recent game started/move/ended event.
    pub fn game_change(&self) -> Option<GameChange> {
        self.state.game_change.borrow().clone()
    }

    pub fn watch_game_change(&self) -> watch::Receiver<Option<GameChange>> {
        self.state.game_change.subscribe()
    }

    pub fn deactivate(&mut self) {
        self.subscriptions.unsubscribe_all();
    }
}
