//! Notification broadcast from the engine to its subscribers
//!
//! Delivery is synchronous: `publish` calls every subscriber in
//! registration order before it returns. The subscriber list is
//! snapshotted first, so a subscriber may register or drop subscriptions
//! from inside its callback without deadlocking.

use super::notification::Notification;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Receiver of engine notifications (GUI panels, remote controls, ...)
pub trait Subscriber: Send + Sync {
    fn receive_notification(&self, notification: &Notification);

    /// Asked once at registration; write-only subscribers return false
    fn wants_notifications(&self) -> bool {
        true
    }
}

impl<F> Subscriber for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn receive_notification(&self, notification: &Notification) {
        self(notification)
    }
}

struct Entry {
    id: u64,
    subscriber: Arc<dyn Subscriber>,
    receives: bool,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    entries: RwLock<Vec<Entry>>,
}

impl Registry {
    fn remove(&self, id: u64) {
        self.entries.write().retain(|entry| entry.id != id);
    }
}

/// Broadcast point owned by the engine
#[derive(Clone, Default)]
pub struct Publisher {
    registry: Arc<Registry>,
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; it stays registered until the returned
    /// handle is dropped
    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let receives = subscriber.wants_notifications();
        self.registry.entries.write().push(Entry {
            id,
            subscriber,
            receives,
        });
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Register a closure as subscriber
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.register(Arc::new(callback))
    }

    /// Deliver `notification` to every receiving subscriber
    pub fn publish(&self, notification: &Notification) {
        let receivers: Vec<Arc<dyn Subscriber>> = self
            .registry
            .entries
            .read()
            .iter()
            .filter(|entry| entry.receives)
            .map(|entry| Arc::clone(&entry.subscriber))
            .collect();
        for subscriber in receivers {
            subscriber.receive_notification(notification);
        }
    }

    /// Number of registered subscribers, receiving or not
    pub fn subscriber_count(&self) -> usize {
        self.registry.entries.read().len()
    }
}

/// Registration handle; dropping it unregisters the subscriber
#[must_use = "the subscriber is unregistered when the subscription is dropped"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Unregister now
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}
