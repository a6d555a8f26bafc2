//! Chapter completion tracking, persisted through [`Storage`].

use crate::catalog::Course;
use crate::storage::{Storage, StorageEvent, Subscription};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Weak};

pub const PROGRESS_STORAGE_KEY: &str = "valuecent-course-progress";

/// Course id -> titles of the chapters marked complete. Persisted as
/// `{"<courseId>": ["<chapterTitle>", ...]}`.
pub type ProgressData = BTreeMap<String, BTreeSet<String>>;

/// Progress of one browsing context.
///
/// Clones share the same in-memory snapshot. Separate stores over the same
/// storage stay in sync through storage events.
#[derive(Clone)]
pub struct ProgressStore {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn Storage>,
    snapshot: RwLock<ProgressData>,
    _subscription: Subscription,
}

impl Inner {
    fn reload(&self) {
        let latest = load(self.storage.as_ref());
        *self.snapshot.write() = latest;
    }
}

impl ProgressStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let initial = load(storage.as_ref());
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let subscription = storage.subscribe(
                PROGRESS_STORAGE_KEY,
                Arc::new(move |_event: &StorageEvent| {
                    if let Some(inner) = weak.upgrade() {
                        inner.reload();
                    }
                }),
            );
            Inner {
                storage,
                snapshot: RwLock::new(initial),
                _subscription: subscription,
            }
        });
        Self { inner }
    }

    pub fn is_chapter_complete(&self, course_id: &str, chapter_title: &str) -> bool {
        self.inner
            .snapshot
            .read()
            .get(course_id)
            .is_some_and(|titles| titles.contains(chapter_title))
    }

    /// Flips the completion of one chapter.
    ///
    /// Starts from the persisted value rather than the in-memory snapshot so a
    /// change made by another context in the meantime is not lost. If the write
    /// fails the snapshot is left untouched.
    pub fn toggle_chapter_complete(&self, course_id: &str, chapter_title: &str) {
        let mut progress = load(self.inner.storage.as_ref());

        let titles = progress.entry(course_id.to_string()).or_default();
        if !titles.remove(chapter_title) {
            titles.insert(chapter_title.to_string());
        }
        if titles.is_empty() {
            progress.remove(course_id);
        }

        if self.save(&progress) {
            *self.inner.snapshot.write() = progress;
        }
    }

    /// Completion percentage of `course`, counting only chapters the course has.
    pub fn course_progress(&self, course: &Course) -> u8 {
        if course.chapters.is_empty() {
            return 0;
        }
        let completed = self.completed_count(course);
        percentage(completed, course.chapters.len())
    }

    pub fn completed_count(&self, course: &Course) -> usize {
        let snapshot = self.inner.snapshot.read();
        let Some(titles) = snapshot.get(&course.id) else {
            return 0;
        };
        course
            .chapters
            .iter()
            .filter(|chapter| titles.contains(&chapter.title))
            .count()
    }

    pub fn snapshot(&self) -> ProgressData {
        self.inner.snapshot.read().clone()
    }

    /// Returns whether `progress` is now what storage holds.
    fn save(&self, progress: &ProgressData) -> bool {
        let json = match serde_json::to_string(progress) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize progress: {}", e);
                return false;
            }
        };

        let storage = self.inner.storage.as_ref();
        match storage.get_item(PROGRESS_STORAGE_KEY) {
            Ok(Some(current)) if current == json => return true,
            Ok(_) => {}
            Err(e) => log::warn!("Failed to read progress before saving: {}", e),
        }

        match storage.set_item(PROGRESS_STORAGE_KEY, &json) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save progress to storage: {}", e);
                false
            }
        }
    }
}

fn percentage(completed: usize, total: usize) -> u8 {
    let ratio = completed.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}

/// Reads the persisted progress. Any failure yields an empty mapping.
fn load(storage: &dyn Storage) -> ProgressData {
    let raw = match storage.get_item(PROGRESS_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return ProgressData::new(),
        Err(e) => {
            log::error!("Failed to read progress from storage: {}", e);
            return ProgressData::new();
        }
    };

    match serde_json::from_str::<ProgressData>(&raw) {
        Ok(mut progress) => {
            progress.retain(|_, titles| !titles.is_empty());
            progress
        }
        Err(e) => {
            log::error!("Failed to parse progress from storage: {}", e);
            ProgressData::new()
        }
    }
}
