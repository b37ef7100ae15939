//! Feature feeds over the realtime registry.
//!
//! A feed subscribes to its feature's event kinds when activated, keeps the
//! latest values in `watch` cells for the UI and raises toasts for events the
//! user should notice. Deactivating or dropping a feed removes every
//! registration it made.

pub mod caro;
pub mod chat;
pub mod farm;
pub mod notifications;
pub mod wallet;

pub use caro::{CaroFeed, GameChange, GameChangeKind, RoomChange, RoomChangeKind};
pub use chat::ChatFeed;
pub use farm::FarmFeed;
pub use notifications::NotificationFeed;
pub use wallet::WalletFeed;

use std::sync::Arc;

use playhub_shared::{EventKind, RealtimeEvent};

use crate::infrastructure::messaging::{SubscriptionRegistry, SubscriptionSet};

/// Register one handler for several kinds, collecting the subscriptions.
pub(crate) fn subscribe_all<F>(
    registry: &SubscriptionRegistry,
    owner: &'static str,
    kinds: &[EventKind],
    handler: F,
) -> SubscriptionSet
where
    F: Fn(&RealtimeEvent) -> anyhow::Result<()> + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    let mut subscriptions = SubscriptionSet::new();
    for &kind in kinds {
        let handler = Arc::clone(&handler);
        subscriptions.push(registry.subscribe(kind, owner, move |envelope| {
            handler(&envelope.event)
        }));
    }
    subscriptions
}

pub(crate) fn unexpected(owner: &str, event: &RealtimeEvent) -> anyhow::Error {
    anyhow::anyhow!("{owner} feed received unexpected {} event", event.kind())
}

/// `1234567` -> `"1,234,567"`, `-200` -> `"-200"`.
pub fn format_coins(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coins_are_grouped_by_thousands() {
        assert_eq!(format_coins(0), "0");
        assert_eq!(format_coins(999), "999");
        assert_eq!(format_coins(5000), "5,000");
        assert_eq!(format_coins(1_234_567), "1,234,567");
        assert_eq!(format_coins(-200), "-200");
        assert_eq!(format_coins(-1500), "-1,500");
        assert_eq!(format_coins(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn one_handler_many_kinds() {
        let registry = SubscriptionRegistry::new();
        let mut subscriptions = subscribe_all(
            &registry,
            "test",
            &[EventKind::FarmCropReady, EventKind::FarmAnimalReady],
            |_| Ok(()),
        );

        assert_eq!(subscriptions.len(), 2);
        assert_eq!(registry.kind_count(), 2);

        subscriptions.unsubscribe_all();
        assert_eq!(registry.kind_count(), 0);
    }
}
