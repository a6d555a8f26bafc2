//! Static course catalog.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub video_embed_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Website,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_embed_url: String,
    pub notebook_url: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub resources: Vec<ResourceLink>,
}

impl Course {
    pub fn chapter(&self, title: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.title == title)
    }

    pub fn has_chapters(&self) -> bool {
        !self.chapters.is_empty()
    }
}

/// Ordered, read-only list of courses.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Vec<Course>,
}

impl Catalog {
    /// The catalog shipped with the portal.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents)?;
        log::info!(
            "loaded {} course(s) from {}",
            catalog.courses.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let courses: Vec<Course> = serde_json::from_str(json)?;
        Self::new(courses)
    }

    pub fn new(courses: Vec<Course>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for course in &courses {
            if !seen.insert(course.id.as_str()) {
                return Err(CatalogError::DuplicateCourse(course.id.clone()));
            }
        }
        Ok(Self { courses })
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn find(&self, course_id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == course_id)
    }

    pub fn find_chapter(&self, course_id: &str, chapter_title: &str) -> Option<(&Course, &Chapter)> {
        let course = self.find(course_id)?;
        let chapter = course.chapter(chapter_title)?;
        Some((course, chapter))
    }

    pub fn featured(&self) -> impl Iterator<Item = &Course> {
        self.courses.iter().filter(|c| c.featured)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 11);

        let first = &catalog.courses()[0];
        assert_eq!(first.id, "ai-course-by-vishnu-singh-rajput");
        assert!(first.featured);
        assert_eq!(first.chapters.len(), 4);

        let featured: Vec<_> = catalog.featured().map(|c| c.id.as_str()).collect();
        assert_eq!(featured, vec!["ai-course-by-vishnu-singh-rajput"]);
    }

    #[test]
    fn test_resources_parse() {
        let catalog = Catalog::builtin().unwrap();
        let course = catalog.find("what-valuecent-does").unwrap();
        assert_eq!(course.resources.len(), 2);
        assert_eq!(course.resources[1].kind, ResourceKind::Pdf);
    }

    #[test]
    fn test_find_chapter() {
        let catalog = Catalog::builtin().unwrap();
        let (course, chapter) = catalog
            .find_chapter("accounting", "7 CIT")
            .unwrap();
        assert_eq!(course.title, "Accounting");
        assert!(chapter.video_embed_url.starts_with("https://www.youtube.com/embed/"));

        assert!(catalog.find_chapter("accounting", "no such chapter").is_none());
        assert!(catalog.find_chapter("no-such-course", "7 CIT").is_none());
    }

    #[test]
    fn test_optional_fields_default() {
        let catalog = Catalog::from_json(
            r#"[{"id":"x","title":"X","description":"d","video_embed_url":"v","notebook_url":"n"}]"#,
        )
        .unwrap();
        let course = catalog.find("x").unwrap();
        assert!(!course.featured);
        assert!(!course.has_chapters());
        assert!(course.resources.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id":"x","title":"X","description":"d","video_embed_url":"v","notebook_url":"n"},
            {"id":"x","title":"Y","description":"d","video_embed_url":"v","notebook_url":"n"}
        ]"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::DuplicateCourse(id)) if id == "x"
        ));
    }
}
