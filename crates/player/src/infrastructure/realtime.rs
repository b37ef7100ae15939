//! Shared realtime connection.
//!
//! One socket at `/ws/realtime/?token=...` carries every feature's events.
//! Inbound frames are decoded into [`Envelope`]s and fanned out through the
//! [`SubscriptionRegistry`]; outbound messages are wrapped in the same
//! `{type, data, timestamp}` shape.

use std::sync::Arc;

use playhub_shared::{Envelope, EventKind, OutboundMessage};
use serde_json::Value;

use crate::config::RealtimeConfig;
use crate::infrastructure::auth::Credential;
use crate::infrastructure::messaging::{
    ConnectionState, ConnectionStateObserver, Subscription, SubscriptionRegistry,
};
use crate::infrastructure::websocket::{
    Connector, Endpoints, ExhaustionAlert, FrameHandler, ReconnectingChannel, SendError,
};
use crate::ports::outbound::{ConnectionControl, Notifier};

const CHANNEL_NAME: &str = "realtime";
const CONNECTION_LOST_MESSAGE: &str = "Realtime connection lost. Please reload the page.";

/// Decodes text frames and dispatches them to subscribers.
///
/// Malformed frames are logged and dropped; they never affect the connection.
pub struct EnvelopeRouter {
    registry: SubscriptionRegistry,
}

impl EnvelopeRouter {
    pub fn new(registry: SubscriptionRegistry) -> Self {
        Self { registry }
    }
}

impl FrameHandler for EnvelopeRouter {
    fn on_frame(&self, text: &str) {
        match Envelope::parse(text) {
            Ok(envelope) => {
                let handled = self.registry.dispatch(&envelope);
                tracing::debug!(kind = %envelope.kind(), handled, "Realtime event dispatched");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed realtime frame");
            }
        }
    }
}

/// Connection manager of the shared realtime channel.
pub struct RealtimeClient {
    endpoints: Endpoints,
    registry: SubscriptionRegistry,
    channel: ReconnectingChannel,
}

impl RealtimeClient {
    pub fn new(
        config: &RealtimeConfig,
        connector: Arc<dyn Connector>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let registry = SubscriptionRegistry::new();
        let channel = ReconnectingChannel::new(
            CHANNEL_NAME,
            connector,
            config.reconnect,
            Arc::new(EnvelopeRouter::new(registry.clone())),
            Some(ExhaustionAlert {
                notifier,
                message: CONNECTION_LOST_MESSAGE.to_string(),
            }),
        );

        Self {
            endpoints: config.endpoints.clone(),
            registry,
            channel,
        }
    }

    /// Open the realtime socket for `credential`, replacing any open one.
    ///
    /// Without a credential nothing happens; returns whether a connection was started.
    pub fn connect(&self, credential: Option<&Credential>) -> bool {
        let Some(credential) = credential else {
            tracing::info!("No credential, waiting for login before connecting");
            return false;
        };
        self.channel.open(self.endpoints.realtime(credential))
    }

    /// Close the socket and cancel any pending reconnect. Safe to call repeatedly.
    pub fn disconnect(&self) {
        self.channel.close();
    }

    /// Disconnect and wait for the socket to finish closing.
    pub async fn shutdown(&self) {
        self.channel.shutdown().await;
    }

    /// Send `{type: kind, data, timestamp: now}` if connected.
    pub fn send(&self, kind: &str, data: Value) -> Result<(), SendError> {
        let text = OutboundMessage::new(kind, data).to_json()?;
        self.channel.send_text(text)
    }

    pub fn subscribe<F>(&self, kind: EventKind, owner: &'static str, handler: F) -> Subscription
    where
        F: Fn(&Envelope) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.registry.subscribe(kind, owner, handler)
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
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

impl ConnectionControl for RealtimeClient {
    fn connect(&self, credential: &Credential) {
        RealtimeClient::connect(self, Some(credential));
    }

    fn disconnect(&self) {
        RealtimeClient::disconnect(self);
    }
}
