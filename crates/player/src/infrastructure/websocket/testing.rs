//! In-memory transport for tests.
//!
//! [`MemoryConnector`] answers each `connect` with the next scripted outcome
//! (refusing once the script is empty). Every accepted connection yields a
//! [`ServerEnd`] on the receiver returned by [`MemoryConnector::new`], through
//! which a test plays the server.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use futures_channel::mpsc as fmpsc;
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use super::transport::{Connector, Frame, Link, TransportError};

/// Scripted result of one `connect` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Accept,
    Refuse,
}

/// The server side of an accepted in-memory connection.
pub struct ServerEnd {
    pub url: Url,
    to_client: Option<fmpsc::UnboundedSender<Result<Frame, TransportError>>>,
    from_client: fmpsc::UnboundedReceiver<String>,
}

impl ServerEnd {
    /// Push a text frame to the client. Returns false once the client is gone.
    pub fn push_text(&self, text: impl Into<String>) -> bool {
        match &self.to_client {
            Some(tx) => tx.unbounded_send(Ok(Frame::Text(text.into()))).is_ok(),
            None => false,
        }
    }

    /// Close the connection from the server side.
    pub fn close(&mut self) {
        if let Some(tx) = self.to_client.take() {
            let _ = tx.unbounded_send(Ok(Frame::Close));
        }
    }

    /// Next frame written by the client, or `None` once the client dropped the link.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.from_client.next().await
    }

    /// Frame already written by the client, without waiting.
    pub fn try_next_sent(&mut self) -> Option<String> {
        self.from_client.next().now_or_never().flatten()
    }
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<ConnectOutcome>,
    attempts: Vec<(Url, Instant)>,
}

pub struct MemoryConnector {
    script: Mutex<Script>,
    accepted: mpsc::UnboundedSender<ServerEnd>,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEnd>) {
        let (accepted, rx) = mpsc::unbounded_channel();
        (
            Self {
                script: Mutex::new(Script::default()),
                accepted,
            },
            rx,
        )
    }

    pub fn push_outcomes(&self, outcomes: impl IntoIterator<Item = ConnectOutcome>) {
        self.lock().outcomes.extend(outcomes);
    }

    /// Number of `connect` calls so far.
    pub fn attempts(&self) -> usize {
        self.lock().attempts.len()
    }

    pub fn attempted_urls(&self) -> Vec<Url> {
        self.lock().attempts.iter().map(|(url, _)| url.clone()).collect()
    }

    /// Gaps between consecutive `connect` calls, in milliseconds.
    pub fn attempt_gaps_ms(&self) -> Vec<u128> {
        self.lock()
            .attempts
            .windows(2)
            .map(|pair| (pair[1].1 - pair[0].1).as_millis())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &Url) -> Result<Link, TransportError> {
        let outcome = {
            let mut script = self.lock();
            script.attempts.push((url.clone(), Instant::now()));
            script.outcomes.pop_front().unwrap_or(ConnectOutcome::Refuse)
        };

        if outcome == ConnectOutcome::Refuse {
            return Err(TransportError::Refused(url.to_string()));
        }

        let (to_client, client_rx) = fmpsc::unbounded();
        let (client_tx, from_client) = fmpsc::unbounded::<String>();

        let server = ServerEnd {
            url: url.clone(),
            to_client: Some(to_client),
            from_client,
        };
        if self.accepted.send(server).is_err() {
            return Err(TransportError::Refused("test harness dropped".to_string()));
        }

        Ok(Link {
            sink: Box::pin(client_tx.sink_map_err(|_| TransportError::Closed)),
            stream: Box::pin(client_rx),
        })
    }
}
