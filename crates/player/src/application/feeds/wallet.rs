//! Wallet feed: live balance and the latest ledger entry.

use std::sync::Arc;

use playhub_shared::{EventKind, RealtimeEvent, WalletTransaction};
use tokio::sync::watch;

use crate::infrastructure::messaging::{SubscriptionRegistry, SubscriptionSet};
use crate::ports::outbound::{Notifier, ToastRequest};

use super::{format_coins, subscribe_all, unexpected};

const OWNER: &str = "wallet";
const KINDS: [EventKind; 2] = [EventKind::WalletUpdated, EventKind::WalletTransaction];

struct WalletState {
    balance: watch::Sender<Option<i64>>,
    last_transaction: watch::Sender<Option<WalletTransaction>>,
    notifier: Arc<dyn Notifier>,
}

impl WalletState {
    fn handle(&self, event: &RealtimeEvent) -> anyhow::Result<()> {
        match event {
            RealtimeEvent::WalletUpdated(update) => {
                let Some(balance) = update.balance else {
                    tracing::debug!("Wallet update without balance");
                    return Ok(());
                };
                self.balance.send_replace(Some(balance));
                self.notifier.notify(ToastRequest::success(format!(
                    "Balance updated: {} coins",
                    format_coins(balance)
                )));
            }
            RealtimeEvent::WalletTransaction(transaction) => {
                let amount = transaction.amount;
                if let Some(balance) = transaction.balance_after {
                    self.balance.send_replace(Some(balance));
                }
                self.last_transaction.send_replace(Some(transaction.clone()));

                if amount > 0 {
                    self.notifier
                        .notify(ToastRequest::success(format!("+{} coins", format_coins(amount))));
                } else {
                    self.notifier
                        .notify(ToastRequest::info(format!("{} coins", format_coins(amount))));
                }
            }
            other => return Err(unexpected(OWNER, other)),
        }
        Ok(())
    }
}

/// Balance and transactions of the logged-in user.
pub struct WalletFeed {
    state: Arc<WalletState>,
    subscriptions: SubscriptionSet,
}

impl WalletFeed {
    pub fn activate(registry: &SubscriptionRegistry, notifier: Arc<dyn Notifier>) -> Self {
        let (balance, _) = watch::channel(None);
        let (last_transaction, _) = watch::channel(None);
        let state = Arc::new(WalletState {
            balance,
            last_transaction,
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

    /// Latest known balance; `None` until the first update.
    pub fn balance(&self) -> Option<i64> {
        *self.state.balance.borrow()
    }

    /// Seed the balance, e.g. from a REST response.
    pub fn set_balance(&self, balance: i64) {
        self.state.balance.send_replace(Some(balance));
    }

    pub fn watch_balance(&self) -> watch::Receiver<Option<i64>> {
        self.state.balance.subscribe()
    }

    pub fn last_transaction(&self) -> Option<WalletTransaction> {
        self.state.last_transaction.borrow().clone()
    }

    pub fn watch_last_transaction(&self) -> watch::Receiver<Option<WalletTransaction>> {
        self.state.last_transaction.subscribe()
    }

    pub fn is_active(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn deactivate(&mut self) {
        self.subscriptions.unsubscribe_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playhub_shared::Envelope;

    use crate::ports::outbound::{MockNotifier, ToastLevel};

    fn dispatch(registry: &SubscriptionRegistry, frame: &str) -> usize {
        registry.dispatch(&Envelope::parse(frame).unwrap())
    }

    fn expect_toast(level: ToastLevel, message: &'static str) -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |toast| toast.level == level && toast.message == message)
            .times(1)
            .return_const(());
        notifier
    }

    #[test]
    fn balance_update_sets_balance_and_toasts_once() {
        let registry = SubscriptionRegistry::new();
        let feed = WalletFeed::activate(
            &registry,
            Arc::new(expect_toast(ToastLevel::Success, "Balance updated: 5,000 coins")),
        );

        dispatch(&registry, r#"{"type":"wallet.updated","data":{"balance":5000}}"#);

        assert_eq!(feed.balance(), Some(5000));
    }

    #[test]
    fn update_without_balance_is_ignored() {
        let registry = SubscriptionRegistry::new();
        let feed = WalletFeed::activate(&registry, Arc::new(MockNotifier::new()));
        feed.set_balance(10);

        dispatch(&registry, r#"{"type":"wallet.updated","data":{}}"#);

        assert_eq!(feed.balance(), Some(10));
    }

    #[test]
    fn credit_transaction_is_a_success_toast() {
        let registry = SubscriptionRegistry::new();
        let feed = WalletFeed::activate(
            &registry,
            Arc::new(expect_toast(ToastLevel::Success, "+1,500 coins")),
        );

        dispatch(
            &registry,
            r#"{"type":"wallet.transaction","data":{"id":9,"amount":"1500.00","transaction_type":"deposit","balance_after":6500}}"#,
        );

        let transaction = feed.last_transaction().unwrap();
        assert_eq!(transaction.id.as_deref(), Some("9"));
        assert_eq!(transaction.amount, 1500);
        assert_eq!(feed.balance(), Some(6500));
    }

    #[test]
    fn debit_transaction_is_an_info_toast() {
        let registry = SubscriptionRegistry::new();
        let feed = WalletFeed::activate(
            &registry,
            Arc::new(expect_toast(ToastLevel::Info, "-200 coins")),
        );

        dispatch(
            &registry,
            r#"{"type":"wallet.transaction","data":{"amount":-200,"transaction_type":"bet"}}"#,
        );

        assert_eq!(feed.last_transaction().map(|t| t.amount), Some(-200));
    }

    #[test]
    fn dropping_the_feed_unsubscribes() {
        let registry = SubscriptionRegistry::new();
        let mut feed = WalletFeed::activate(&registry, Arc::new(MockNotifier::new()));
        assert!(feed.is_active());
        assert_eq!(registry.kind_count(), 2);

        feed.deactivate();
        assert!(!feed.is_active());
        assert_eq!(registry.kind_count(), 0);

        let again = WalletFeed::activate(&registry, Arc::new(MockNotifier::new()));
        assert_eq!(registry.kind_count(), 2);
        drop(again);
        assert_eq!(registry.kind_count(), 0);
    }
}
