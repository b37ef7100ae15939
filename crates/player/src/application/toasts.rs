//! In-memory toast center.
//!
//! Keeps the toasts currently on screen. Each toast gets an id and is removed
//! automatically once its duration elapses (5 seconds unless the request says
//! otherwise); persistent toasts stay until dismissed.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use crate::ports::outbound::{Notifier, ToastDuration, ToastLevel, ToastRequest};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);

/// A toast on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub level: ToastLevel,
    pub title: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// `None` for persistent toasts.
    pub expires_after: Option<Duration>,
}

struct Inner {
    toasts: watch::Sender<Vec<Toast>>,
    default_duration: Duration,
}

/// [`Notifier`] that tracks active toasts for display.
#[derive(Clone)]
pub struct ToastCenter {
    inner: Arc<Inner>,
}

impl ToastCenter {
    pub fn new() -> Self {
        Self::with_default_duration(DEFAULT_TOAST_DURATION)
    }

    pub fn with_default_duration(default_duration: Duration) -> Self {
        let (toasts, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                toasts,
                default_duration,
            }),
        }
    }

    /// Show `request` and return the new toast's id.
    pub fn push(&self, request: ToastRequest) -> Uuid {
        let expires_after = match request.duration {
            ToastDuration::Default => Some(self.inner.default_duration),
            ToastDuration::For(duration) => Some(duration),
            ToastDuration::Persistent => None,
        };
        let toast = Toast {
            id: Uuid::new_v4(),
            level: request.level,
            title: request.title,
            message: request.message,
            created_at: Utc::now(),
            expires_after,
        };
        let id = toast.id;

        tracing::info!(
            level = ?toast.level,
            title = toast.title.as_deref().unwrap_or(""),
            message = %toast.message,
            "Toast"
        );
        self.inner.toasts.send_modify(|toasts| toasts.push(toast));

        if let Some(after) = expires_after {
            self.schedule_removal(id, after);
        }
        id
    }

    /// Remove a toast. Returns false when it was already gone.
    pub fn dismiss(&self, id: Uuid) -> bool {
        self.inner.toasts.send_if_modified(|toasts| {
            let before = toasts.len();
            toasts.retain(|toast| toast.id != id);
            toasts.len() != before
        })
    }

    pub fn clear(&self) {
        self.inner
            .toasts
            .send_if_modified(|toasts| !std::mem::take(toasts).is_empty());
    }

    /// Toasts currently shown, oldest first.
    pub fn active(&self) -> Vec<Toast> {
        self.inner.toasts.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.inner.toasts.subscribe()
    }

    fn schedule_removal(&self, id: Uuid, after: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(%id, "No async runtime, toast stays until dismissed");
            return;
        };
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = inner.upgrade() {
                ToastCenter { inner }.dismiss(id);
            }
        });
    }
}

impl Default for ToastCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ToastCenter {
    fn notify(&self, toast: ToastRequest) {
        self.push(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn toasts_expire_after_the_default_duration() {
        let center = ToastCenter::new();
        center.notify(ToastRequest::success("Saved"));
        assert_eq!(center.active().len(), 1);

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(center.active().len(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(center.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn custom_and_persistent_durations() {
        let center = ToastCenter::new();
        center.notify(ToastRequest::info("Short").with_duration(Duration::from_secs(3)));
        let sticky = center.push(ToastRequest::warning("Connection lost").persistent());

        tokio::time::sleep(Duration::from_secs(60)).await;

        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, sticky);
        assert_eq!(active[0].expires_after, None);

        assert!(center.dismiss(sticky));
        assert!(!center.dismiss(sticky));
        assert!(center.active().is_empty());
    }

    #[tokio::test]
    async fn keeps_title_and_order() {
        let center = ToastCenter::new();
        center.notify(ToastRequest::info("first").with_title("News"));
        center.notify(ToastRequest::info("second"));

        let active = center.active();
        assert_eq!(active[0].title.as_deref(), Some("News"));
        assert_eq!(active[0].message, "first");
        assert_eq!(active[1].message, "second");

        center.clear();
        assert!(center.active().is_empty());
    }

    #[test]
    fn works_without_a_runtime() {
        let center = ToastCenter::new();
        center.notify(ToastRequest::info("no runtime"));
        assert_eq!(center.active().len(), 1);
    }
}
