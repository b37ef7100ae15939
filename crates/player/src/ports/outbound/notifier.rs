//! Notifier Port - transient user notifications ("toasts")
//!
//! Feeds emit toasts when something noteworthy arrives (balance changed, crop
//! ready, game over). The connection layer uses the same port for the
//! persistent "realtime connection lost" warning.

use std::time::Duration;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// How long a toast stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastDuration {
    /// The display's default lifetime.
    #[default]
    Default,
    For(Duration),
    /// Stays until dismissed by the user.
    Persistent,
}

/// A toast to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastRequest {
    pub level: ToastLevel,
    pub title: Option<String>,
    pub message: String,
    pub duration: ToastDuration,
}

impl ToastRequest {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            title: None,
            message: message.into(),
            duration: ToastDuration::Default,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Warning, message)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = ToastDuration::For(duration);
        self
    }

    pub fn persistent(mut self) -> Self {
        self.duration = ToastDuration::Persistent;
        self
    }
}

/// Port for showing toasts to the user.
///
/// Implementations must not block: `notify` is called from the dispatch path.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: ToastRequest);
}
