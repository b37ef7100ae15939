//! Headless composition of the realtime layer.
//!
//! [`PlayerRuntime::start`] wires the realtime client, the auth watcher, every
//! feature feed and the Caro sockets together; [`run`] drives them until a
//! shutdown signal arrives.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;

use crate::application::feeds::{CaroFeed, ChatFeed, FarmFeed, NotificationFeed, WalletFeed};
use crate::application::RealtimeStatus;
use crate::config::RealtimeConfig;
use crate::infrastructure::caro::{CaroGameSocket, CaroRoomListSocket};
use crate::infrastructure::websocket::Connector;
use crate::infrastructure::{AuthWatcher, CredentialStore, RealtimeClient};
use crate::ports::outbound::Notifier;

pub struct RunnerDeps {
    pub config: RealtimeConfig,
    pub connector: Arc<dyn Connector>,
    pub notifier: Arc<dyn Notifier>,
}

/// Everything a logged-in player session keeps alive.
pub struct PlayerRuntime {
    pub credentials: CredentialStore,
    pub realtime: Arc<RealtimeClient>,
    pub wallet: WalletFeed,
    pub chat: ChatFeed,
    pub caro: CaroFeed,
    pub farm: FarmFeed,
    pub notifications: NotificationFeed,
    pub caro_rooms: CaroRoomListSocket,
    pub caro_game: CaroGameSocket,
    auth_watcher: JoinHandle<()>,
}

impl PlayerRuntime {
    /// Build the session. Must be called inside a tokio runtime.
    ///
    /// Nothing connects until a credential is stored in `credentials`.
    pub fn start(deps: RunnerDeps) -> Self {
        let RunnerDeps {
            config,
            connector,
            notifier,
        } = deps;

        let realtime = Arc::new(RealtimeClient::new(&config, connector.clone(), notifier.clone()));
        let registry = realtime.registry();

        let wallet = WalletFeed::activate(registry, notifier.clone());
        let chat = ChatFeed::activate(registry, None);
        let caro = CaroFeed::activate(registry, notifier.clone());
        let farm = FarmFeed::activate(registry, notifier.clone());
        let notifications = NotificationFeed::activate(registry, notifier);

        let caro_rooms = CaroRoomListSocket::new(&config.endpoints, connector.clone(), config.reconnect);
        let caro_game = CaroGameSocket::new(&config.endpoints, connector, config.reconnect);

        let credentials = CredentialStore::new();
        let auth_watcher = AuthWatcher::spawn(realtime.clone(), credentials.subscribe());

        Self {
            credentials,
            realtime,
            wallet,
            chat,
            caro,
            farm,
            notifications,
            caro_rooms,
            caro_game,
            auth_watcher,
        }
    }

    pub fn status(&self) -> RealtimeStatus {
        RealtimeStatus::derive(self.credentials.is_logged_in(), self.realtime.state())
    }

    /// Log out, close every socket and stop the auth watcher.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.credentials.logout();
        self.realtime.shutdown().await;
        self.caro_rooms.shutdown().await;
        self.caro_game.shutdown().await;

        self.auth_watcher.abort();
        match self.auth_watcher.await {
            Err(e) if e.is_panic() => Err(e).context("Auth watcher panicked"),
            _ => Ok(()),
        }
    }
}

/// Run a headless session until `shutdown` resolves.
///
/// Logs in with the configured token (if any), follows the lobby's room list
/// and, when configured, one Caro game room.
pub async fn run(deps: RunnerDeps, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
    let token = deps.config.token.clone();
    let caro_room = deps.config.caro_room.clone();
    let runtime = PlayerRuntime::start(deps);

    runtime.caro_rooms.on_rooms_update().set(|rooms| {
        tracing::info!(
            waiting = rooms.waiting.len(),
            playing = rooms.playing.len(),
            "Caro lobby updated"
        );
    });
    runtime.caro_rooms.connect();

    if let Some(room) = caro_room {
        runtime.caro_game.on_game_state().set(|game| {
            tracing::info!(
                room = %game.room_name,
                status = ?game.status,
                turn = ?game.current_turn,
                moves = game.total_moves,
                "Caro game updated"
            );
        });
        runtime.caro_game.on_error().set(|message| {
            tracing::warn!(%message, "Caro game rejected an action");
        });
        runtime.caro_game.connect(&room);
    }

    match token {
        Some(token) => runtime.credentials.login(token),
        None => tracing::warn!("PLAYHUB_TOKEN not set, realtime stays offline until login"),
    }

    let mut observer = runtime.realtime.observer();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
            changed = observer.changed() => {
                let Some(state) = changed else { break };
                let status = runtime.status();
                tracing::info!(%state, %status, detail = status.tooltip(), "Realtime status changed");
            }
        }
    }

    runtime.shutdown().await
}
