use super::{ChangeBus, Listener, Storage, StorageEvent, Subscription};
use crate::error::StorageError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// In-process storage. Clones share the same items and change bus, so each
/// clone behaves like another tab of the same origin.
#[derive(Clone)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    bus: Arc<ChangeBus>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
            bus: ChangeBus::new(),
            quota: None,
        }
    }

    /// Storage that rejects writes once keys plus values would exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::new()
        }
    }

    /// Writes `value` without publishing an event, as a process outside the
    /// bus (or a manual edit) would.
    pub fn set_item_silently(&self, key: &str, value: &str) {
        self.items.lock().insert(key.to_string(), value.to_string());
    }

    fn used_bytes(items: &HashMap<String, String>, except: &str) -> usize {
        items
            .iter()
            .filter(|(k, _)| k.as_str() != except)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let old_value = {
            let mut items = self.items.lock();
            if let Some(quota) = self.quota {
                let needed = Self::used_bytes(&items, key) + key.len() + value.len();
                if needed > quota {
                    return Err(StorageError::QuotaExceeded {
                        key: key.to_string(),
                        needed,
                        quota,
                    });
                }
            }
            items.insert(key.to_string(), value.to_string())
        };

        self.bus.publish(&StorageEvent {
            key: key.to_string(),
            old_value,
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let old_value = self.items.lock().remove(key);
        if old_value.is_some() {
            self.bus.publish(&StorageEvent {
                key: key.to_string(),
                old_value,
                new_value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self, key: &str, listener: Listener) -> Subscription {
        self.bus.subscribe(key, listener)
    }
}
