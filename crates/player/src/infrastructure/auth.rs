//! Authentication credential and the observer that ties it to the realtime session.
//!
//! [`CredentialStore`] is the observable source of truth for "who is logged in".
//! [`AuthWatcher`] follows it and opens the realtime session when a credential
//! appears or changes, and closes it when the credential disappears.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::ports::outbound::ConnectionControl;

/// Opaque access token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Observable login state.
#[derive(Clone)]
pub struct CredentialStore {
    tx: Arc<watch::Sender<Option<Credential>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Store `credential`. Observers are only woken when it actually changed.
    pub fn login(&self, credential: Credential) {
        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&credential) {
                return false;
            }
            *current = Some(credential);
            true
        });
    }

    pub fn logout(&self) {
        self.tx.send_if_modified(|current| current.take().is_some());
    }

    pub fn current(&self) -> Option<Credential> {
        self.tx.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.tx.subscribe()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives [`ConnectionControl`] from credential changes.
pub struct AuthWatcher;

impl AuthWatcher {
    /// Follow `credentials` until the store is dropped.
    ///
    /// The current value is applied first, so a user who is already logged in
    /// gets connected immediately.
    pub async fn run(
        control: Arc<dyn ConnectionControl>,
        mut credentials: watch::Receiver<Option<Credential>>,
    ) {
        let mut connected = false;
        loop {
            let credential = credentials.borrow_and_update().clone();
            match credential {
                Some(credential) => {
                    tracing::info!("Credential available, connecting realtime session");
                    control.connect(&credential);
                    connected = true;
                }
                None if connected => {
                    tracing::info!("Credential cleared, disconnecting realtime session");
                    control.disconnect();
                    connected = false;
                }
                None => {}
            }

            if credentials.changed().await.is_err() {
                tracing::debug!("Credential store dropped, auth watcher stopping");
                return;
            }
        }
    }

    pub fn spawn(
        control: Arc<dyn ConnectionControl>,
        credentials: watch::Receiver<Option<Credential>>,
    ) -> JoinHandle<()> {
        tokio::spawn(Self::run(control, credentials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockConnectionControl;
    use mockall::Sequence;

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn debug_hides_the_token() {
        let credential = Credential::new("super-secret");
        assert_eq!(format!("{credential:?}"), "Credential(***)");
        assert_eq!(credential.expose(), "super-secret");
    }

    #[test]
    fn store_reports_login_state() {
        let store = CredentialStore::new();
        assert!(!store.is_logged_in());

        store.login(Credential::new("abc"));
        assert_eq!(store.current(), Some(Credential::new("abc")));

        store.logout();
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn repeated_login_with_same_token_does_not_notify() {
        let store = CredentialStore::new();
        let mut rx = store.subscribe();

        store.login(Credential::new("abc"));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        store.login(Credential::new("abc"));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn connects_once_on_login_and_disconnects_on_logout() {
        let mut control = MockConnectionControl::new();
        let mut seq = Sequence::new();
        control
            .expect_connect()
            .withf(|credential| credential.expose() == "abc")
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        control
            .expect_disconnect()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let store = CredentialStore::new();
        let watcher = AuthWatcher::spawn(Arc::new(control), store.subscribe());
        settle().await;

        store.login(Credential::new("abc"));
        settle().await;
        store.login(Credential::new("abc"));
        settle().await;
        store.logout();
        settle().await;

        drop(store);
        watcher.await.unwrap();
    }

    #[tokio::test]
    async fn logout_without_login_does_nothing() {
        let control = MockConnectionControl::new();
        let store = CredentialStore::new();
        let watcher = AuthWatcher::spawn(Arc::new(control), store.subscribe());

        store.logout();
        settle().await;

        drop(store);
        watcher.await.unwrap();
    }
}
