//! Key-value persistence shared by every browsing context of one origin.
//!
//! A [`Storage`] is a synchronous string store plus a change channel. Writers
//! publish a [`StorageEvent`] after every successful mutation; readers register
//! interest in one key through [`Storage::subscribe`] and keep the returned
//! [`Subscription`] alive for as long as they want to hear about it.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Notification published after a key changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

pub type Listener = Arc<dyn Fn(&StorageEvent) + Send + Sync>;

pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Registers `listener` for changes to `key`. Dropping the returned guard unsubscribes.
    fn subscribe(&self, key: &str, listener: Listener) -> Subscription;
}

struct Registration {
    id: u64,
    key: String,
    listener: Listener,
}

/// Fan-out of storage events to the listeners of every context sharing a backend.
#[derive(Default)]
pub struct ChangeBus {
    registrations: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl ChangeBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(self: &Arc<Self>, key: &str, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registrations.lock().push(Registration {
            id,
            key: key.to_string(),
            listener,
        });
        Subscription {
            bus: Arc::downgrade(self),
            id,
        }
    }

    /// Delivers `event` to every listener registered for its key, in registration order.
    ///
    /// Listeners run without the registry lock held, so they may read storage,
    /// write storage or drop their own subscription.
    pub fn publish(&self, event: &StorageEvent) {
        let listeners: Vec<Listener> = self
            .registrations
            .lock()
            .iter()
            .filter(|r| r.key == event.key)
            .map(|r| r.listener.clone())
            .collect();

        log::debug!(
            "storage event for '{}' delivered to {} listener(s)",
            event.key,
            listeners.len()
        );
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.lock().len()
    }

    fn unsubscribe(&self, id: u64) {
        self.registrations.lock().retain(|r| r.id != id);
    }
}

/// Guard for a listener registration.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<ChangeBus>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
