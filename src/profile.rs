//! The learner's profile, which gates access to the main portal.

use crate::storage::{Storage, StorageEvent, Subscription};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

pub const USER_PROFILE_STORAGE_KEY: &str = "valuecent-user-profile";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub title: String,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
        }
    }

    /// Whether the welcome form may submit this profile.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.title.trim().is_empty()
    }
}

#[derive(Clone)]
pub struct ProfileStore {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn Storage>,
    profile: RwLock<Option<UserProfile>>,
    _subscription: Subscription,
}

impl ProfileStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let initial = load(storage.as_ref());
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let subscription = storage.subscribe(
                USER_PROFILE_STORAGE_KEY,
                Arc::new(move |_event: &StorageEvent| {
                    if let Some(inner) = weak.upgrade() {
                        let latest = load(inner.storage.as_ref());
                        *inner.profile.write() = latest;
                    }
                }),
            );
            Inner {
                storage,
                profile: RwLock::new(initial),
                _subscription: subscription,
            }
        });
        Self { inner }
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.profile.read().clone()
    }

    pub fn is_profile_set(&self) -> bool {
        self.inner.profile.read().is_some()
    }

    /// Persists `profile`. On a storage failure the error is logged and the
    /// in-memory profile keeps its previous value.
    pub fn save_profile(&self, profile: UserProfile) {
        let json = match serde_json::to_string(&profile) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize user profile: {}", e);
                return;
            }
        };
        if let Err(e) = self.inner.storage.set_item(USER_PROFILE_STORAGE_KEY, &json) {
            log::error!("Failed to save user profile to storage: {}", e);
            return;
        }
        log::info!("saved profile for {}", profile.name);
        *self.inner.profile.write() = Some(profile);
    }
}

fn load(storage: &dyn Storage) -> Option<UserProfile> {
    let raw = match storage.get_item(USER_PROFILE_STORAGE_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            log::error!("Failed to read user profile from storage: {}", e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(profile) => Some(profile),
        Err(e) => {
            log::error!("Failed to parse user profile from storage: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_unset_until_saved() {
        let storage = MemoryStorage::new();
        let store = ProfileStore::new(Arc::new(storage.clone()));
        assert!(!store.is_profile_set());

        store.save_profile(UserProfile::new("Asha Rao", "Tax Associate"));

        assert!(store.is_profile_set());
        let raw = storage.get_item(USER_PROFILE_STORAGE_KEY).unwrap().unwrap();
        let persisted: UserProfile = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.title, "Tax Associate");
    }

    #[test]
    fn test_existing_profile_is_loaded() {
        let storage = MemoryStorage::new();
        storage.set_item_silently(USER_PROFILE_STORAGE_KEY, r#"{"name":"Lee","title":"Auditor"}"#);
        let store = ProfileStore::new(Arc::new(storage));
        assert_eq!(store.profile(), Some(UserProfile::new("Lee", "Auditor")));
    }

    #[test]
    fn test_other_context_sees_saved_profile() {
        let origin = MemoryStorage::new();
        let tab_a = ProfileStore::new(Arc::new(origin.clone()));
        let tab_b = ProfileStore::new(Arc::new(origin.clone()));

        tab_a.save_profile(UserProfile::new("Lee", "Auditor"));

        assert_eq!(tab_b.profile(), Some(UserProfile::new("Lee", "Auditor")));
    }

    #[test]
    fn test_corrupt_profile_reads_as_unset() {
        let storage = MemoryStorage::new();
        storage.set_item_silently(USER_PROFILE_STORAGE_KEY, "not json");
        let store = ProfileStore::new(Arc::new(storage));
        assert!(!store.is_profile_set());
    }

    #[test]
    fn test_failed_save_keeps_previous_profile() {
        let storage = MemoryStorage::with_quota(8);
        let store = ProfileStore::new(Arc::new(storage));
        store.save_profile(UserProfile::new("Lee", "Auditor"));
        assert_eq!(store.profile(), None);
    }

    #[test]
    fn test_completeness_ignores_whitespace() {
        assert!(UserProfile::new("Lee", "Auditor").is_complete());
        assert!(!UserProfile::new("  ", "Auditor").is_complete());
        assert!(!UserProfile::new("Lee", "").is_complete());
    }
}
