//! Typed publish/subscribe channel for connector lifecycle events.
//!
//! All error handling flows through events at the connector boundary, never
//! through exceptions: emission is synchronous, in subscription order, and
//! happens exactly once in-line with the state transition it documents.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::errors::WalletError;
use crate::core::wallet::Wallet;

/// Lifecycle events emitted by a connector.
pub enum ConnectorEvent<P: ?Sized> {
    /// A connect attempt started; carries a human-readable message.
    Connecting { message: String },
    /// The attempt succeeded; carries the connected wallet.
    Connect { wallet: Wallet<P> },
    /// The connected wallet was disconnected.
    Disconnect { wallet: Wallet<P> },
    /// The attempt failed.
    Error { error: WalletError },
}

pub type EventHandler<P> = Arc<dyn Fn(&ConnectorEvent<P>) + Send + Sync>;

/// Handle returned by [`EventBus::on`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

pub struct EventBus<P: ?Sized> {
    subscribers: Mutex<Vec<(u64, EventHandler<P>)>>,
    next_id: AtomicU64,
}

impl<P: ?Sized> Default for EventBus<P> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<P: ?Sized> EventBus<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, handler: EventHandler<P>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push((id, handler));
        Subscription(id)
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers.lock().retain(|(id, _)| *id != subscription.0);
    }

    /// Invoke every handler synchronously, in subscription order. Handlers
    /// are snapshotted first so one of them may subscribe or unsubscribe
    /// without deadlocking the bus.
    pub fn emit(&self, event: &ConnectorEvent<P>) {
        let handlers: Vec<EventHandler<P>> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Provider;
    use parking_lot::Mutex as PlMutex;

    type Bus = EventBus<dyn Provider>;

    #[test]
    fn test_emit_in_subscription_order() {
        let bus = Bus::new();
        let seen = Arc::new(PlMutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            bus.on(Arc::new(move |_event| seen.lock().push(tag)));
        }

        bus.emit(&ConnectorEvent::Connecting {
            message: "Connecting".into(),
        });

        assert_eq!(*seen.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = Bus::new();
        let count = Arc::new(PlMutex::new(0u32));

        let sub = {
            let count = count.clone();
            bus.on(Arc::new(move |_event| *count.lock() += 1))
        };

        bus.emit(&ConnectorEvent::Connecting { message: "".into() });
        bus.unsubscribe(sub);
        bus.emit(&ConnectorEvent::Connecting { message: "".into() });

        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_handler_may_subscribe_during_emit() {
        let bus = Arc::new(Bus::new());
        let inner = bus.clone();

        bus.on(Arc::new(move |_event| {
            inner.on(Arc::new(|_event| {}));
        }));

        // must not deadlock
        bus.emit(&ConnectorEvent::Connecting { message: "".into() });
    }
}
