use serde::{Deserialize, Serialize};

/// A place in the portal. Serialized the way the page scripts post it:
/// `{"page": "courseDetail", "courseId": "accounting"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "camelCase")]
pub enum View {
    Home,
    Courses,
    /// A missing id deserializes as empty and resolves to the course list.
    #[serde(rename_all = "camelCase")]
    CourseDetail {
        #[serde(default)]
        course_id: String,
    },
    #[serde(rename_all = "camelCase")]
    ChapterVideo {
        #[serde(default)]
        course_id: String,
        #[serde(default)]
        chapter_title: String,
    },
    Community,
    Profile,
    Settings,
}

/// Tag of a [`View`] without its identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Home,
    Courses,
    CourseDetail,
    ChapterVideo,
    Community,
    Profile,
    Settings,
}

impl View {
    pub fn course_detail(course_id: impl Into<String>) -> Self {
        View::CourseDetail {
            course_id: course_id.into(),
        }
    }

    pub fn chapter_video(course_id: impl Into<String>, chapter_title: impl Into<String>) -> Self {
        View::ChapterVideo {
            course_id: course_id.into(),
            chapter_title: chapter_title.into(),
        }
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            View::Home => ViewKind::Home,
            View::Courses => ViewKind::Courses,
            View::CourseDetail { .. } => ViewKind::CourseDetail,
            View::ChapterVideo { .. } => ViewKind::ChapterVideo,
            View::Community => ViewKind::Community,
            View::Profile => ViewKind::Profile,
            View::Settings => ViewKind::Settings,
        }
    }
}

/// Back/forward history of visited views.
///
/// Never empty; `current_index` always points into `entries`.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<View>,
    current_index: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: vec![View::Home],
            current_index: 0,
        }
    }

    /// Pushes `view` after the cursor, dropping any forward entries.
    ///
    /// Returns `false` without touching the history when `view` is already current.
    pub fn navigate(&mut self, view: View) -> bool {
        if *self.current() == view {
            return false;
        }
        log::debug!("navigate {:?} -> {:?}", self.current(), view);
        self.entries.truncate(self.current_index + 1);
        self.entries.push(view);
        self.current_index = self.entries.len() - 1;
        true
    }

    pub fn can_go_back(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current_index < self.entries.len() - 1
    }

    pub fn go_back(&mut self) -> Option<&View> {
        if self.can_go_back() {
            self.current_index -= 1;
            Some(&self.entries[self.current_index])
        } else {
            None
        }
    }

    pub fn go_forward(&mut self) -> Option<&View> {
        if self.can_go_forward() {
            self.current_index += 1;
            Some(&self.entries[self.current_index])
        } else {
            None
        }
    }

    pub fn current(&self) -> &View {
        &self.entries[self.current_index]
    }

    /// Collapses the history to a single `Home` entry.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.entries.push(View::Home);
        self.current_index = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn index(&self) -> usize {
        self.current_index
    }

    pub fn entries(&self) -> &[View] {
        &self.entries
    }
}
