//! Subscription registry for realtime events.
//!
//! The registry maps each [`EventKind`] to the handlers interested in it and
//! fans every inbound envelope out to them. Subscribers hold a [`Subscription`]
//! guard; dropping or unsubscribing it removes exactly that registration.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use playhub_shared::{Envelope, EventKind};

use super::handler_slot::HandlerSlot;

/// Callback invoked for each matching envelope.
///
/// Returning an error (or panicking) is logged and does not affect other handlers.
pub type EventHandler = Arc<dyn Fn(&Envelope) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Registration {
    id: SubscriptionId,
    owner: &'static str,
    handler: EventHandler,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    by_kind: HashMap<EventKind, Vec<Registration>>,
}

/// Event-kind → handlers map shared by every feed.
///
/// Cloning is cheap; clones share the same handler map.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`.
    ///
    /// `owner` names the feature holding the subscription, for logs.
    pub fn subscribe<F>(&self, kind: EventKind, owner: &'static str, handler: F) -> Subscription
    where
        F: Fn(&Envelope) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = {
            let mut inner = self.lock();
            inner.next_id += 1;
            let id = SubscriptionId(inner.next_id);
            inner.by_kind.entry(kind).or_default().push(Registration {
                id,
                owner,
                handler: Arc::new(handler),
            });
            id
        };
        tracing::debug!(%kind, owner, "Subscribed");

        Subscription {
            kind,
            id,
            owner,
            registry: Some(Arc::downgrade(&self.inner)),
        }
    }

    /// Register a swappable handler: the subscription stays put while the
    /// slot's behavior can be replaced at any time.
    pub fn subscribe_slot(
        &self,
        kind: EventKind,
        owner: &'static str,
        slot: HandlerSlot<Envelope>,
    ) -> Subscription {
        self.subscribe(kind, owner, move |envelope| {
            slot.call(envelope);
            Ok(())
        })
    }

    /// Invoke every handler registered for the envelope's kind, in registration order.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// unsubscribe while being dispatched. Returns the number of handlers run.
    pub fn dispatch(&self, envelope: &Envelope) -> usize {
        let kind = envelope.kind();
        let snapshot: Vec<Registration> = match self.lock().by_kind.get(&kind) {
            Some(registrations) => registrations.clone(),
            None => {
                tracing::trace!(%kind, "No subscribers");
                return 0;
            }
        };

        for registration in &snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (registration.handler)(envelope)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(%kind, owner = registration.owner, error = %e, "Subscriber failed");
                }
                Err(payload) => {
                    tracing::error!(
                        %kind,
                        owner = registration.owner,
                        panic = panic_message(payload.as_ref()),
                        "Subscriber panicked"
                    );
                }
            }
        }
        snapshot.len()
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.lock().by_kind.get(&kind).map_or(0, Vec::len)
    }

    /// Number of kinds with at least one handler.
    pub fn kind_count(&self) -> usize {
        self.lock().by_kind.len()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        lock_inner(&self.inner)
    }
}

fn lock_inner(inner: &Mutex<RegistryInner>) -> MutexGuard<'_, RegistryInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Capability to remove one registration.
///
/// Unsubscribes on drop. Calling [`Subscription::unsubscribe`] more than once is a no-op.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    kind: EventKind,
    id: SubscriptionId,
    owner: &'static str,
    registry: Option<Weak<Mutex<RegistryInner>>>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.registry.is_some()
    }

    /// Remove this registration. Empty kinds are removed from the registry.
    pub fn unsubscribe(&mut self) {
        let Some(registry) = self.registry.take() else {
            return;
        };
        let Some(inner) = registry.upgrade() else {
            return;
        };

        let mut inner = lock_inner(&inner);
        if let Some(registrations) = inner.by_kind.get_mut(&self.kind) {
            registrations.retain(|r| r.id != self.id);
            if registrations.is_empty() {
                inner.by_kind.remove(&self.kind);
            }
        }
        drop(inner);
        tracing::debug!(kind = %self.kind, owner = self.owner, "Unsubscribed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// All registrations of one feature, torn down together.
///
/// Registrations are pushed one at a time during activation; if activation
/// stops partway, dropping the set still removes everything registered so far.
#[derive(Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.iter().filter(|s| s.is_active()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unsubscribe_all(&mut self) {
        for mut subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}
