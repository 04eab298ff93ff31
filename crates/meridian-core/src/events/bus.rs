//! Synchronous event bus with copy-on-write listener registration.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error};

use super::InventoryEvent;
use crate::error::ListenerError;

// =============================================================================
// Listener Trait
// =============================================================================

/// Receives inventory events from an [`EventBus`].
///
/// Returning an error (or panicking) only affects this listener; the bus logs
/// it and keeps delivering to the rest.
pub trait InventoryListener: Send + Sync {
    fn on_event(&self, event: &InventoryEvent) -> Result<(), ListenerError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> InventoryListener for F
where
    F: Fn(&InventoryEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_event(&self, event: &InventoryEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

// =============================================================================
// Event Bus
// =============================================================================

/// Summary of one [`EventBus::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    pub delivered: usize,
    pub failed: usize,
}

type ListenerList = Arc<Vec<Arc<dyn InventoryListener>>>;

/// Registry of inventory listeners.
///
/// ## Concurrency
/// ```text
/// register/unregister:  write lock ─► clone list ─► modify ─► swap Arc
/// publish:              read lock  ─► clone Arc (snapshot) ─► unlock ─► deliver
/// ```
/// Publishing iterates its own snapshot, so registration never waits on a
/// slow listener and a publish never sees a half-updated list. Listeners
/// registered during a publish see the next event, not the current one.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<ListenerList>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. Returns `false` if this exact listener (same `Arc`)
    /// is already registered.
    pub fn register(&self, listener: Arc<dyn InventoryListener>) -> bool {
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        if guard.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            debug!(listener = listener.name(), "Listener already registered");
            return false;
        }

        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        debug!(listener = listener.name(), "Registering listener");
        next.push(listener);
        *guard = Arc::new(next);
        true
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unregister(&self, listener: &Arc<dyn InventoryListener>) -> bool {
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.iter().any(|l| Arc::ptr_eq(l, listener)) {
            return false;
        }

        let next: Vec<_> = guard
            .iter()
            .filter(|l| !Arc::ptr_eq(l, listener))
            .cloned()
            .collect();
        debug!(listener = listener.name(), "Unregistering listener");
        *guard = Arc::new(next);
        true
    }

    pub fn listener_count(&self) -> usize {
        self.snapshot().len()
    }

    fn snapshot(&self) -> ListenerList {
        Arc::clone(&self.listeners.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Delivers `event` to every registered listener, in registration order,
    /// on the calling thread.
    pub fn publish(&self, event: &InventoryEvent) -> PublishOutcome {
        let listeners = self.snapshot();
        let mut outcome = PublishOutcome::default();

        for listener in listeners.iter() {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => outcome.delivered += 1,
                Ok(Err(err)) => {
                    outcome.failed += 1;
                    error!(
                        listener = listener.name(),
                        kind = ?event.kind,
                        event_id = %event.id(),
                        error = %err,
                        "Inventory listener failed"
                    );
                }
                Err(_) => {
                    outcome.failed += 1;
                    error!(
                        listener = listener.name(),
                        kind = ?event.kind,
                        event_id = %event.id(),
                        "Inventory listener panicked"
                    );
                }
            }
        }

        outcome
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::InventoryEventKind;
    use crate::types::ProductRef;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn event(kind: InventoryEventKind) -> InventoryEvent {
        InventoryEvent::new(kind, ProductRef::new("p-1", "MLK-1L", "Milk 1L").unwrap(), "Main")
    }

    struct Counter(AtomicUsize);

    impl InventoryListener for Counter {
        fn on_event(&self, _event: &InventoryEvent) -> Result<(), ListenerError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "counter"
        }
    }

    fn counter() -> Arc<Counter> {
        Arc::new(Counter(AtomicUsize::new(0)))
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("meridian_core=debug")
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn test_duplicate_registration_delivers_once() {
        let bus = EventBus::new();
        let c = counter();
        let listener: Arc<dyn InventoryListener> = c.clone();

        assert!(bus.register(listener.clone()));
        assert!(!bus.register(listener.clone()));
        assert_eq!(bus.listener_count(), 1);

        let outcome = bus.publish(&event(InventoryEventKind::StockLow));
        assert_eq!(outcome, PublishOutcome { delivered: 1, failed: 0 });
        assert_eq!(c.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let bus = EventBus::new();
        let c = counter();
        let listener: Arc<dyn InventoryListener> = c.clone();

        bus.register(listener.clone());
        bus.publish(&event(InventoryEventKind::StockOut));
        assert!(bus.unregister(&listener));
        assert!(!bus.unregister(&listener));
        bus.publish(&event(InventoryEventKind::StockOut));

        assert_eq!(c.0.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            bus.register(Arc::new(move |_: &InventoryEvent| -> Result<(), ListenerError> {
                seen.lock().unwrap().push(tag);
                Ok(())
            }));
        }

        bus.publish(&event(InventoryEventKind::ProductSold));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_listener_does_not_block_others() {
        init_tracing();
        let bus = EventBus::new();
        let c = counter();

        bus.register(Arc::new(|_: &InventoryEvent| -> Result<(), ListenerError> {
            Err(ListenerError::new("disk full"))
        }));
        bus.register(Arc::new(|_: &InventoryEvent| -> Result<(), ListenerError> {
            panic!("listener bug")
        }));
        bus.register(c.clone());

        let outcome = bus.publish(&event(InventoryEventKind::BatchExpired));
        assert_eq!(outcome, PublishOutcome { delivered: 1, failed: 2 });
        assert_eq!(c.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_publish_with_no_listeners() {
        let bus = EventBus::new();
        assert_eq!(
            bus.publish(&event(InventoryEventKind::PriceChanged)),
            PublishOutcome::default()
        );
    }

    #[test]
    fn test_listener_can_register_during_publish() {
        let bus = Arc::new(EventBus::new());
        let late = counter();

        let bus_ref = Arc::downgrade(&bus);
        let late_ref = late.clone();
        bus.register(Arc::new(move |_: &InventoryEvent| -> Result<(), ListenerError> {
            if let Some(bus) = bus_ref.upgrade() {
                bus.register(late_ref.clone());
            }
            Ok(())
        }));

        // The listener added mid-publish only sees later events.
        bus.publish(&event(InventoryEventKind::StockLow));
        assert_eq!(late.0.load(Ordering::SeqCst), 0);
        bus.publish(&event(InventoryEventKind::StockLow));
        assert_eq!(late.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_and_publish() {
        let bus = Arc::new(EventBus::new());
        let counters: Vec<Arc<Counter>> = (0..16).map(|_| counter()).collect();

        let mut handles = Vec::new();
        for c in counters.iter().cloned() {
            let bus = bus.clone();
            handles.push(tokio::spawn(async move {
                let listener: Arc<dyn InventoryListener> = c;
                bus.register(listener.clone());
                bus.publish(&event(InventoryEventKind::StockLow));
                bus.unregister(&listener);
                bus.register(listener);
            }));
        }
        for _ in 0..16 {
            let bus = bus.clone();
            handles.push(tokio::spawn(async move {
                bus.publish(&event(InventoryEventKind::StockOut));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(bus.listener_count(), 16);
        // Each listener saw at least the publish issued right after its own
        // registration.
        for c in &counters {
            assert!(c.0.load(Ordering::SeqCst) >= 1);
        }

        let outcome = bus.publish(&event(InventoryEventKind::StockOut));
        assert_eq!(outcome.delivered, 16);
    }
}
