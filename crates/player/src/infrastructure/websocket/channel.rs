//! Reconnecting WebSocket channel.
//!
//! One [`ReconnectingChannel`] owns at most one live socket. `open` spawns a
//! session task that connects, pumps frames in both directions and, when the
//! link drops, waits out the backoff delay before trying again. `close` (or a
//! newer `open`) cancels the session, including any pending reconnect timer.
//!
//! Every session carries a generation number. A session only publishes state
//! while its generation is current, so a superseded task winding down can never
//! overwrite the state of its successor.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::infrastructure::messaging::{
    ConnectionState, ConnectionStateObserver, TerminationReason,
};
use crate::ports::outbound::{Notifier, ToastRequest};

use super::core::{BackoffState, ReconnectPolicy};
use super::endpoints::redacted;
use super::shared::CLOSE_TIMEOUT_MS;
use super::transport::{Connector, Frame, Link};

/// Why an outbound message was not sent.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("WebSocket is not connected")]
    NotConnected,

    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receives every text frame of a channel, in arrival order.
pub trait FrameHandler: Send + Sync {
    fn on_frame(&self, text: &str);
}

/// Toast raised once when a channel gives up reconnecting.
pub struct ExhaustionAlert {
    pub notifier: Arc<dyn Notifier>,
    pub message: String,
}

struct Slot {
    generation: u64,
    cancel: Option<CancellationToken>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    name: &'static str,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    handler: Arc<dyn FrameHandler>,
    alert: Option<ExhaustionAlert>,
    state: watch::Sender<ConnectionState>,
    slot: Mutex<Slot>,
}

impl Shared {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish `state` if `generation` is still the current session.
    fn publish(&self, generation: u64, state: ConnectionState) -> bool {
        let slot = self.lock_slot();
        if slot.generation != generation {
            return false;
        }
        self.state.send_replace(state);
        true
    }

    fn install(&self, generation: u64, outbound: mpsc::UnboundedSender<String>) -> bool {
        let mut slot = self.lock_slot();
        if slot.generation != generation {
            return false;
        }
        slot.outbound = Some(outbound);
        self.state.send_replace(ConnectionState::Connected);
        true
    }

    fn uninstall(&self, generation: u64) -> bool {
        let mut slot = self.lock_slot();
        if slot.generation != generation {
            return false;
        }
        slot.outbound = None;
        self.state.send_replace(ConnectionState::Disconnected);
        true
    }

    fn finish(&self, generation: u64, reason: TerminationReason) -> bool {
        let mut slot = self.lock_slot();
        if slot.generation != generation {
            return false;
        }
        slot.cancel = None;
        slot.outbound = None;
        self.state.send_replace(ConnectionState::Terminated(reason));
        true
    }

    fn deliver(&self, text: &str) {
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| self.handler.on_frame(text)));
        if delivered.is_err() {
            tracing::error!(channel = self.name, "Frame handler panicked");
        }
    }
}

/// A WebSocket channel that reconnects with exponential backoff.
///
/// Dropping the channel cancels its session.
pub struct ReconnectingChannel {
    shared: Arc<Shared>,
}

impl ReconnectingChannel {
    pub fn new(
        name: &'static str,
        connector: Arc<dyn Connector>,
        policy: ReconnectPolicy,
        handler: Arc<dyn FrameHandler>,
        alert: Option<ExhaustionAlert>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            shared: Arc::new(Shared {
                name,
                connector,
                policy,
                handler,
                alert,
                state,
                slot: Mutex::new(Slot {
                    generation: 0,
                    cancel: None,
                    outbound: None,
                    task: None,
                }),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    /// Start a session against `url`, superseding any session already running.
    ///
    /// The previous socket is closed before the new one is opened. Outside a
    /// tokio runtime nothing is started; returns whether a session was spawned.
    pub fn open(&self, url: Url) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(
                channel = self.shared.name,
                "No tokio runtime, cannot open the socket"
            );
            return false;
        };

        let mut slot = self.shared.lock_slot();
        if let Some(previous) = slot.cancel.take() {
            tracing::debug!(channel = self.shared.name, "Superseding previous session");
            previous.cancel();
        }
        slot.outbound = None;
        slot.generation += 1;

        let cancel = CancellationToken::new();
        slot.cancel = Some(cancel.clone());
        let previous_task = slot.task.take();
        slot.task = Some(runtime.spawn(run_session(
            Arc::clone(&self.shared),
            url,
            slot.generation,
            cancel,
            previous_task,
        )));
        true
    }

    /// Close the socket and cancel any pending reconnect.
    ///
    /// A no-op when nothing is open or the channel already gave up.
    pub fn close(&self) {
        let mut slot = self.shared.lock_slot();
        slot.generation += 1;
        slot.outbound = None;
        let Some(cancel) = slot.cancel.take() else {
            tracing::debug!(channel = self.shared.name, "Close requested while not open");
            return;
        };
        cancel.cancel();
        self.shared
            .state
            .send_replace(ConnectionState::Terminated(TerminationReason::Closed));
        drop(slot);

        tracing::info!(channel = self.shared.name, "Disconnected by request");
    }

    /// Close, then wait until the session task has finished its closing handshake.
    pub async fn shutdown(&self) {
        self.close();
        let task = self.shared.lock_slot().task.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(channel = self.shared.name, error = %e, "Session task failed");
            }
        }
    }

    /// Queue a text frame on the live socket.
    ///
    /// Fails with [`SendError::NotConnected`] unless the channel is connected;
    /// nothing is buffered for later.
    pub fn send_text(&self, text: String) -> Result<(), SendError> {
        let slot = self.shared.lock_slot();
        let sent = slot
            .outbound
            .as_ref()
            .is_some_and(|outbound| outbound.send(text).is_ok());
        drop(slot);

        if sent {
            Ok(())
        } else {
            tracing::warn!(
                channel = self.shared.name,
                "WebSocket is not connected, message dropped"
            );
            Err(SendError::NotConnected)
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn observer(&self) -> ConnectionStateObserver {
        ConnectionStateObserver::new(self.shared.state.subscribe())
    }
}

impl Drop for ReconnectingChannel {
    fn drop(&mut self) {
        let mut slot = self.shared.lock_slot();
        slot.generation += 1;
        slot.outbound = None;
        if let Some(cancel) = slot.cancel.take() {
            cancel.cancel();
        }
    }
}

enum LinkEnd {
    Lost,
    Cancelled,
}

async fn run_session(
    shared: Arc<Shared>,
    url: Url,
    generation: u64,
    cancel: CancellationToken,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous {
        // The superseded session is already cancelled; let it finish closing.
        let _ = previous.await;
    }

    let endpoint = redacted(&url);
    let mut backoff = BackoffState::new(shared.policy);

    loop {
        if !shared.publish(generation, ConnectionState::Connecting) {
            return;
        }
        tracing::debug!(channel = shared.name, %endpoint, "Connecting");

        let connected = tokio::select! {
            _ = cancel.cancelled() => return,
            result = shared.connector.connect(&url) => result,
        };

        match connected {
            Ok(link) => {
                let (outbound, rx) = mpsc::unbounded_channel();
                if !shared.install(generation, outbound) {
                    return;
                }
                backoff.reset();
                tracing::info!(channel = shared.name, %endpoint, "Connected");

                if let LinkEnd::Cancelled = pump(&shared, link, rx, &cancel).await {
                    return;
                }
                if !shared.uninstall(generation) {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(channel = shared.name, %endpoint, error = %e, "Connection failed");
                if !shared.publish(generation, ConnectionState::Disconnected) {
                    return;
                }
            }
        }

        let Some(delay) = backoff.next_delay_and_advance() else {
            tracing::error!(
                channel = shared.name,
                attempts = backoff.attempts(),
                "Max reconnection attempts reached, giving up"
            );
            if shared.finish(generation, TerminationReason::Exhausted) {
                if let Some(alert) = &shared.alert {
                    alert
                        .notifier
                        .notify(ToastRequest::warning(alert.message.clone()).persistent());
                }
            }
            return;
        };

        if !shared.publish(generation, ConnectionState::Reconnecting) {
            return;
        }
        tracing::info!(
            channel = shared.name,
            attempt = backoff.attempts(),
            max_attempts = backoff.max_attempts(),
            delay_ms = delay.as_millis() as u64,
            "Reconnecting"
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(channel = shared.name, "Pending reconnect cancelled");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

async fn pump(
    shared: &Shared,
    link: Link,
    mut outbound: mpsc::UnboundedReceiver<String>,
    cancel: &CancellationToken,
) -> LinkEnd {
    let Link {
        mut sink,
        mut stream,
    } = link;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let closing = tokio::time::timeout(
                    Duration::from_millis(CLOSE_TIMEOUT_MS),
                    sink.close(),
                )
                .await;
                match closing {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::debug!(channel = shared.name, error = %e, "Close handshake failed"),
                    Err(_) => tracing::debug!(channel = shared.name, "Close handshake timed out"),
                }
                return LinkEnd::Cancelled;
            }
            frame = stream.next() => match frame {
                Some(Ok(Frame::Text(text))) => shared.deliver(&text),
                Some(Ok(Frame::Close)) | None => {
                    tracing::info!(channel = shared.name, "Server closed connection");
                    return LinkEnd::Lost;
                }
                Some(Err(e)) => {
                    tracing::error!(channel = shared.name, error = %e, "WebSocket error");
                    return LinkEnd::Lost;
                }
            },
            Some(text) = outbound.recv() => {
                if let Err(e) = sink.send(text).await {
                    tracing::error!(channel = shared.name, error = %e, "Failed to send message");
                    return LinkEnd::Lost;
                }
            }
        }
    }
}
