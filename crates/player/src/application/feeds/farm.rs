//! Farm feed: crops and animals ready for collection.

use std::sync::Arc;

use playhub_shared::{AnimalReady, CropReady, EventKind, RealtimeEvent};
use tokio::sync::watch;

use crate::infrastructure::messaging::{SubscriptionRegistry, SubscriptionSet};
use crate::ports::outbound::{Notifier, ToastRequest};

use super::{subscribe_all, unexpected};

const OWNER: &str = "farm";
const KINDS: [EventKind; 2] = [EventKind::FarmCropReady, EventKind::FarmAnimalReady];

struct FarmState {
    crop_ready: watch::Sender<Option<CropReady>>,
    animal_ready: watch::Sender<Option<AnimalReady>>,
    notifier: Arc<dyn Notifier>,
}

impl FarmState {
    fn handle(&self, event: &RealtimeEvent) -> anyhow::Result<()> {
        match event {
            RealtimeEvent::FarmCropReady(crop) => {
                self.crop_ready.send_replace(Some(crop.clone()));
                self.notifier.notify(ToastRequest::success(format!(
                    "{} is ready to harvest!",
                    crop.crop_name
                )));
            }
            RealtimeEvent::FarmAnimalReady(animal) => {
                self.animal_ready.send_replace(Some(animal.clone()));
                self.notifier
                    .notify(ToastRequest::success(format!("{} is ready!", animal.animal_name)));
            }
            other => return Err(unexpected(OWNER, other)),
        }
        Ok(())
    }
}

pub struct FarmFeed {
    state: Arc<FarmState>,
    subscriptions: SubscriptionSet,
}

impl FarmFeed {
    pub fn activate(registry: &SubscriptionRegistry, notifier: Arc<dyn Notifier>) -> Self {
        let state = Arc::new(FarmState {
            crop_ready: watch::channel(None).0,
            animal_ready: watch::channel(None).0,
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

    pub fn crop_ready(&self) -> Option<CropReady> {
        self.state.crop_ready.borrow().clone()
    }

    pub fn watch_crop_ready(&self) -> watch::Receiver<Option<CropReady>> {
        self.state.crop_ready.subscribe()
    }

    pub fn animal_ready(&self) -> Option<AnimalReady> {
        self.state.animal_ready.borrow().clone()
    }

    pub fn watch_animal_ready(&self) -> watch::Receiver<Option<AnimalReady>> {
        self.state.animal_ready.subscribe()
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

    fn notifier_expecting(message: &'static str) -> Arc<MockNotifier> {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |toast| toast.level == ToastLevel::Success && toast.message == message)
            .times(1)
            .return_const(());
        Arc::new(notifier)
    }

    #[test]
    fn crop_ready_toasts_with_the_crop_name() {
        let registry = SubscriptionRegistry::new();
        let feed = FarmFeed::activate(&registry, notifier_expecting("Tomato is ready to harvest!"));

        registry.dispatch(
            &Envelope::parse(r#"{"type":"farm.crop_ready","data":{"crop_name":"Tomato","plot_id":4}}"#)
                .unwrap(),
        );

        let crop = feed.crop_ready().unwrap();
        assert_eq!(crop.crop_name, "Tomato");
        assert_eq!(crop.extra["plot_id"], 4);
        assert!(feed.animal_ready().is_none());
    }

    #[test]
    fn animal_ready_toasts_with_the_animal_name() {
        let registry = SubscriptionRegistry::new();
        let feed = FarmFeed::activate(&registry, notifier_expecting("Cow is ready!"));

        registry.dispatch(
            &Envelope::parse(r#"{"type":"farm.animal_ready","data":{"animal_name":"Cow"}}"#).unwrap(),
        );

        assert_eq!(feed.animal_ready().map(|a| a.animal_name), Some("Cow".to_string()));
    }
}
