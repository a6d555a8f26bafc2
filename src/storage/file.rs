use super::{ChangeBus, Listener, Storage, StorageEvent, Subscription};
use crate::error::StorageError;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type Items = BTreeMap<String, String>;

/// Storage persisted as a single JSON object of string values.
///
/// Every read goes to disk. Writes from this process publish on the shared
/// bus directly; writes from other processes are picked up by a watcher on the
/// containing directory, diffed against the last known contents and published
/// one event per changed key.
#[derive(Clone)]
pub struct FileStorage {
    shared: Arc<Shared>,
    _watcher: Option<Arc<Mutex<RecommendedWatcher>>>,
}

struct Shared {
    path: PathBuf,
    bus: Arc<ChangeBus>,
    /// Contents as last written or observed by this process. Guarded together
    /// with every write so a diff never mixes half-applied state.
    known: Mutex<Items>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let known = match read_items(&path) {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Starting from empty storage, {} unreadable: {}", path.display(), e);
                Items::new()
            }
        };
        let shared = Arc::new(Shared {
            path,
            bus: ChangeBus::new(),
            known: Mutex::new(known),
        });

        let watcher = match watch(&shared, &dir) {
            Ok(watcher) => Some(Arc::new(Mutex::new(watcher))),
            Err(e) => {
                log::warn!(
                    "Not watching {} for external changes: {}",
                    shared.path.display(),
                    e
                );
                None
            }
        };

        log::debug!("opened file storage at {}", shared.path.display());
        Ok(Self {
            shared,
            _watcher: watcher,
        })
    }

    /// Another browsing context over the same file and change bus.
    pub fn context(&self) -> Self {
        self.clone()
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    fn mutate(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        let events = {
            let mut known = self.shared.known.lock();
            let mut items = read_items(&self.shared.path)?;
            // External writes the watcher has not reported yet.
            let mut events = diff(&known, &items);

            let old_value = match value {
                Some(v) => items.insert(key.to_string(), v.to_string()),
                None => items.remove(key),
            };
            if value.is_some() || old_value.is_some() {
                write_items(&self.shared.path, &items)?;
                events.retain(|event| event.key != key);
                events.push(StorageEvent {
                    key: key.to_string(),
                    old_value,
                    new_value: value.map(str::to_string),
                });
            }
            *known = items;
            events
        };

        for event in &events {
            self.shared.bus.publish(event);
        }
        Ok(())
    }
}

impl Shared {
    /// Re-reads the file and publishes whatever changed since it was last known.
    fn rescan(&self) {
        let events = {
            let mut known = self.known.lock();
            let items = match read_items(&self.path) {
                Ok(items) => items,
                Err(e) => {
                    log::warn!("Ignoring unreadable {}: {}", self.path.display(), e);
                    return;
                }
            };
            let events = diff(&known, &items);
            *known = items;
            events
        };

        if !events.is_empty() {
            log::debug!("{} external change(s) in {}", events.len(), self.path.display());
        }
        for event in &events {
            self.bus.publish(event);
        }
    }
}

fn watch(shared: &Arc<Shared>, dir: &Path) -> notify::Result<RecommendedWatcher> {
    let target: Option<OsString> = shared.path.file_name().map(|name| name.to_os_string());
    let shared = Arc::clone(shared);

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        match res {
            Ok(event) => {
                if event.kind.is_access() {
                    return;
                }
                let touches_file = event.paths.is_empty()
                    || event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == target);
                if touches_file {
                    shared.rescan();
                }
            }
            Err(e) => log::error!("Storage watcher error: {:?}", e),
        }
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

fn read_items(path: &Path) -> Result<Items, StorageError> {
    match fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(Items::new()),
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Items::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_items(path: &Path, items: &Items) -> Result<(), StorageError> {
    let contents = serde_json::to_string_pretty(items)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// One event per key whose value differs between `old` and `new`.
fn diff(old: &Items, new: &Items) -> Vec<StorageEvent> {
    let mut events: Vec<StorageEvent> = old
        .iter()
        .filter(|(key, value)| new.get(*key) != Some(*value))
        .map(|(key, value)| StorageEvent {
            key: key.clone(),
            old_value: Some(value.clone()),
            new_value: new.get(key).cloned(),
        })
        .collect();
    events.extend(
        new.iter()
            .filter(|(key, _)| !old.contains_key(*key))
            .map(|(key, value)| StorageEvent {
                key: key.clone(),
                old_value: None,
                new_value: Some(value.clone()),
            }),
    );
    events
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(read_items(&self.shared.path)?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.mutate(key, Some(value))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.mutate(key, None)
    }

    fn subscribe(&self, key: &str, listener: Listener) -> Subscription {
        self.shared.bus.subscribe(key, listener)
    }
}
