//! Swappable callback cell.
//!
//! A subscription registers once and points at a [`HandlerSlot`]; the owner
//! replaces the slot's behavior whenever its state changes, so the registered
//! handler always runs the latest closure without re-subscribing.

use std::sync::{Arc, PoisonError, RwLock};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct HandlerSlot<T: ?Sized> {
    inner: Arc<RwLock<Option<Callback<T>>>>,
}

impl<T: ?Sized> HandlerSlot<T> {
    /// An empty slot: calls are ignored until a handler is set.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    pub fn set(&self, handler: impl Fn(&T) + Send + Sync + 'static) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_set(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run the current handler. Returns false when the slot is empty.
    ///
    /// The lock is released before the handler runs, so a handler may replace
    /// its own slot.
    pub fn call(&self, value: &T) -> bool {
        let current = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match current {
            Some(handler) => {
                handler(value);
                true
            }
            None => false,
        }
    }
}

impl<T: ?Sized> Clone for HandlerSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> Default for HandlerSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn empty_slot_ignores_calls() {
        let slot: HandlerSlot<u32> = HandlerSlot::new();
        assert!(!slot.is_set());
        assert!(!slot.call(&1));
    }

    #[test]
    fn clones_share_the_behavior() {
        let total = Arc::new(AtomicUsize::new(0));
        let slot: HandlerSlot<usize> = HandlerSlot::new();
        let registered = slot.clone();

        let total_clone = Arc::clone(&total);
        slot.set(move |value| {
            total_clone.fetch_add(*value, Ordering::SeqCst);
        });
        assert!(registered.call(&5));

        slot.clear();
        assert!(!registered.call(&5));
        assert_eq!(total.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn handler_can_replace_itself() {
        let slot: HandlerSlot<()> = HandlerSlot::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_slot = slot.clone();
        let hits_clone = Arc::clone(&hits);
        slot.set(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            inner_slot.clear();
        });

        assert!(slot.call(&()));
        assert!(!slot.call(&()));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
