//! Notification feed: latest notification plus a newest-first history.

use std::sync::Arc;
use std::time::Duration;

use playhub_shared::{EventKind, NotificationPayload, RealtimeEvent};
use tokio::sync::watch;

use crate::infrastructure::messaging::{SubscriptionRegistry, SubscriptionSet};
use crate::ports::outbound::{Notifier, ToastRequest};

use super::{subscribe_all, unexpected};

const OWNER: &str = "notifications";
const TOAST_DURATION: Duration = Duration::from_secs(3);
/// Oldest entries are dropped beyond this many.
pub const HISTORY_LIMIT: usize = 50;

struct NotificationState {
    latest: watch::Sender<Option<NotificationPayload>>,
    history: watch::Sender<Vec<NotificationPayload>>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationState {
    fn handle(&self, event: &RealtimeEvent) -> anyhow::Result<()> {
        let RealtimeEvent::Notification(notification) = event else {
            return Err(unexpected(OWNER, event));
        };

        self.latest.send_replace(Some(notification.clone()));
        self.history.send_modify(|history| {
            history.insert(0, notification.clone());
            history.truncate(HISTORY_LIMIT);
        });

        let mut toast =
            ToastRequest::info(notification.message.clone()).with_duration(TOAST_DURATION);
        if let Some(title) = &notification.title {
            toast = toast.with_title(title.clone());
        }
        self.notifier.notify(toast);
        Ok(())
    }
}

pub struct NotificationFeed {
    state: Arc<NotificationState>,
    subscriptions: SubscriptionSet,
}

impl NotificationFeed {
    pub fn activate(registry: &SubscriptionRegistry, notifier: Arc<dyn Notifier>) -> Self {
        let state = Arc::new(NotificationState {
            latest: watch::channel(None).0,
            history: watch::channel(Vec::new()).0,
            notifier,
        });

        let handler_state = Arc::clone(&state);
        let subscriptions = subscribe_all(registry, OWNER, &[EventKind::NotificationNew], move |event| {
            handler_state.handle(event)
        });

        Self {
            state,
            subscriptions,
        }
    }

    pub fn latest(&self) -> Option<NotificationPayload> {
        self.state.latest.borrow().clone()
    }

    /// Notifications received since activation (or the last `clear`), newest
    /// first, at most [`HISTORY_LIMIT`] of them.
    pub fn history(&self) -> Vec<NotificationPayload> {
        self.state.history.borrow().clone()
    }

    pub fn watch_history(&self) -> watch::Receiver<Vec<NotificationPayload>> {
        self.state.history.subscribe()
    }

    pub fn clear(&self) {
        self.state
            .history
            .send_if_modified(|history| !std::mem::take(history).is_empty());
    }

    pub fn deactivate(&mut self) {
        self.subscriptions.unsubscribe_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playhub_shared::Envelope;

    use crate::ports::outbound::{MockNotifier, ToastDuration, ToastLevel};

    fn notify(registry: &SubscriptionRegistry, message: &str) {
        let frame = serde_json::json!({
            "type": "notification.new",
            "data": {"title": "Friends", "message": message}
        });
        registry.dispatch(&Envelope::parse(&frame.to_string()).unwrap());
    }

    #[test]
    fn history_is_newest_first_and_clearable() {
        let registry = SubscriptionRegistry::new();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|toast| {
                toast.level == ToastLevel::Info
                    && toast.title.as_deref() == Some("Friends")
                    && toast.duration == ToastDuration::For(Duration::from_secs(3))
            })
            .times(2)
            .return_const(());
        let feed = NotificationFeed::activate(&registry, Arc::new(notifier));

        notify(&registry, "first");
        notify(&registry, "second");

        let messages: Vec<String> = feed.history().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["second", "first"]);
        assert_eq!(feed.latest().map(|n| n.message), Some("second".to_string()));

        feed.clear();
        assert!(feed.history().is_empty());
        assert!(feed.latest().is_some());
    }

    #[test]
    fn history_keeps_only_the_newest_entries() {
        let registry = SubscriptionRegistry::new();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().return_const(());
        let feed = NotificationFeed::activate(&registry, Arc::new(notifier));

        for n in 0..HISTORY_LIMIT + 5 {
            notify(&registry, &format!("n{n}"));
        }

        let history = feed.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].message, format!("n{}", HISTORY_LIMIT + 4));
        assert_eq!(history[HISTORY_LIMIT - 1].message, "n5");
    }

    #[test]
    fn deactivated_feed_ignores_notifications() {
        let registry = SubscriptionRegistry::new();
        let mut feed = NotificationFeed::activate(&registry, Arc::new(MockNotifier::new()));
        feed.deactivate();

        assert_eq!(
            registry.dispatch(&Envelope::parse(r#"{"type":"notification.new","data":{"message":"x"}}"#).unwrap()),
            0
        );
        assert!(feed.history().is_empty());
    }
}
