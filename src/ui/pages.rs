use super::{action, action_with, escape, progress_bar, RenderContext};
use crate::browser::{View, ViewKind};
use crate::catalog::{Catalog, Chapter, Course, ResourceKind};
use crate::theme::Theme;
use serde_json::json;
use std::fmt::Write as _;

/// A [`View`] with its identifiers resolved against the catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Page<'c> {
    Home,
    Courses,
    CourseDetail(&'c Course),
    ChapterVideo(&'c Course, &'c Chapter),
    Community,
    Profile,
    Settings,
}

impl<'c> Page<'c> {
    /// Resolves `view`, showing the course list when it names a course or
    /// chapter the catalog does not have.
    pub fn resolve(view: &View, catalog: &'c Catalog) -> Self {
        match view {
            View::Home => Page::Home,
            View::Courses => Page::Courses,
            View::CourseDetail { course_id } => match catalog.find(course_id) {
                Some(course) => Page::CourseDetail(course),
                None => {
                    log::warn!("Course '{}' not found, showing course list", course_id);
                    Page::Courses
                }
            },
            View::ChapterVideo {
                course_id,
                chapter_title,
            } => match catalog.find_chapter(course_id, chapter_title) {
                Some((course, chapter)) => Page::ChapterVideo(course, chapter),
                None => {
                    log::warn!(
                        "Chapter '{}' of '{}' not found, showing course list",
                        chapter_title,
                        course_id
                    );
                    Page::Courses
                }
            },
            View::Community => Page::Community,
            View::Profile => Page::Profile,
            View::Settings => Page::Settings,
        }
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            Page::Home => ViewKind::Home,
            Page::Courses => ViewKind::Courses,
            Page::CourseDetail(_) => ViewKind::CourseDetail,
            Page::ChapterVideo(..) => ViewKind::ChapterVideo,
            Page::Community => ViewKind::Community,
            Page::Profile => ViewKind::Profile,
            Page::Settings => ViewKind::Settings,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Page::Home => "Home".to_string(),
            Page::Courses => "Courses".to_string(),
            Page::CourseDetail(course) => course.title.clone(),
            Page::ChapterVideo(_, chapter) => chapter.title.clone(),
            Page::Community => "Community".to_string(),
            Page::Profile => "Profile".to_string(),
            Page::Settings => "Settings".to_string(),
        }
    }
}

type PageHandler = for<'p, 'c> fn(&Page<'p>, &RenderContext<'c>) -> String;

fn handler_for(kind: ViewKind) -> PageHandler {
    match kind {
        ViewKind::Home => home,
        ViewKind::Courses => courses,
        ViewKind::CourseDetail => course_detail,
        ViewKind::ChapterVideo => chapter_video,
        ViewKind::Community => community,
        ViewKind::Profile => profile,
        ViewKind::Settings => settings,
    }
}

/// Renders the main content area for `page`.
pub fn render_page(page: &Page<'_>, ctx: &RenderContext<'_>) -> String {
    handler_for(page.kind())(page, ctx)
}

fn home(_page: &Page<'_>, ctx: &RenderContext<'_>) -> String {
    let mut html = String::new();
    let greeting = match &ctx.profile {
        Some(profile) => format!("Welcome back, {}", escape(&profile.name)),
        None => "Welcome".to_string(),
    };
    let _ = write!(
        html,
        r#"<section class="hero"><h1>{greeting}</h1><p>Your intelligent learning platform for professional growth.</p><button class="primary" {}>Explore Courses</button></section>"#,
        action_with("navigate", &View::Courses)
    );

    let featured: Vec<&Course> = ctx.catalog.featured().collect();
    if !featured.is_empty() {
        html.push_str(r#"<section class="featured"><h2>Featured Course</h2><div class="grid">"#);
        for course in featured {
            html.push_str(&course_card(course, ctx));
        }
        html.push_str("</div></section>");
    }

    html.push_str(r#"<section class="advisor"><h2>AI Career Advisor</h2><p>Not sure where to start? Describe your career goal, and our AI will suggest a learning path for you.</p>"#);
    let _ = write!(
        html,
        r#"<form data-form="suggest"><input type="text" name="goal" placeholder="e.g. Become a tax advisor" value="{}" required><button type="submit">Get Suggestion</button></form>"#,
        escape(ctx.career_goal)
    );
    if let Some(suggestion) = ctx.suggestion {
        let _ = write!(html, r#"<div class="suggestion">{}</div>"#, escape(suggestion));
    }
    html.push_str("</section>");
    html
}

fn courses(_page: &Page<'_>, ctx: &RenderContext<'_>) -> String {
    let mut html = String::from(r#"<section class="courses"><h1>All Courses</h1><div class="grid">"#);
    for course in ctx.catalog.courses() {
        html.push_str(&course_card(course, ctx));
    }
    html.push_str("</div></section>");
    html
}

fn course_card(course: &Course, ctx: &RenderContext<'_>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<article class="card" {}><h3>{}{}</h3><p>{}</p>"#,
        action_with("navigate", &View::course_detail(&course.id)),
        escape(&course.title),
        if course.featured {
            r#" <span class="badge">Featured</span>"#
        } else {
            ""
        },
        escape(&course.description)
    );
    if course.has_chapters() {
        let percent = ctx.progress.course_progress(course);
        let _ = write!(
            html,
            r#"{}<p class="muted">{} chapters · {}% complete</p>"#,
            progress_bar(percent),
            course.chapters.len(),
            percent
        );
    }
    html.push_str("</article>");
    html
}

fn course_detail(page: &Page<'_>, ctx: &RenderContext<'_>) -> String {
    let Page::CourseDetail(course) = page else {
        return courses(page, ctx);
    };

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<section class="course-detail"><button class="link" {}>Back to All Courses</button><h1>{}{}</h1><p class="muted">{}</p>"#,
        action_with("navigate", &View::Courses),
        escape(&course.title),
        if course.featured {
            r#" <span class="badge">Featured</span>"#
        } else {
            ""
        },
        escape(&course.description)
    );

    if course.has_chapters() {
        let percent = ctx.progress.course_progress(course);
        let _ = write!(
            html,
            r#"<div class="course-progress"><h3>Your Progress</h3>{}<p class="right">{}% Complete</p></div>"#,
            progress_bar(percent),
            percent
        );
    }

    let _ = write!(
        html,
        r#"<div class="player"><iframe src="{}" title="Course introduction" allowfullscreen></iframe></div>"#,
        escape(&course.video_embed_url)
    );

    if course.has_chapters() {
        html.push_str(r#"<div class="chapters"><h2>Chapters</h2><ol>"#);
        for chapter in &course.chapters {
            let done = ctx.progress.is_chapter_complete(&course.id, &chapter.title);
            let toggle = action_with(
                "toggleChapter",
                &json!({"courseId": course.id, "chapterTitle": chapter.title}),
            );
            let _ = write!(
                html,
                r#"<li class="chapter{}"><button class="chapter-play" {}>{}</button><button class="chapter-toggle" aria-pressed="{}" title="{}" {}>{}</button></li>"#,
                if done { " complete" } else { "" },
                action_with("navigate", &View::chapter_video(&course.id, &chapter.title)),
                escape(&chapter.title),
                done,
                if done { "Mark as incomplete" } else { "Mark as complete" },
                toggle,
                if done { "✓" } else { "○" }
            );
        }
        html.push_str("</ol></div>");
    }

    if !course.resources.is_empty() {
        html.push_str(r#"<div class="resources"><h2>Resources</h2><ul>"#);
        for resource in &course.resources {
            let label = match resource.kind {
                ResourceKind::Website => "Website",
                ResourceKind::Pdf => "PDF",
            };
            let _ = write!(
                html,
                r#"<li><a href="{}" target="_blank" rel="noopener noreferrer">{}</a> <span class="muted">{}</span></li>"#,
                escape(&resource.url),
                escape(&resource.title),
                label
            );
        }
        html.push_str("</ul></div>");
    }

    let _ = write!(
        html,
        r#"<a class="notebook" href="{}" target="_blank" rel="noopener noreferrer">Open AI Notebook</a></section>"#,
        escape(&course.notebook_url)
    );
    html
}

fn chapter_video(page: &Page<'_>, ctx: &RenderContext<'_>) -> String {
    let Page::ChapterVideo(course, chapter) = page else {
        return courses(page, ctx);
    };
    let done = ctx.progress.is_chapter_complete(&course.id, &chapter.title);

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<section class="chapter-video"><button class="link" {}>Back to Chapters</button><p class="eyebrow">{}</p><h1>{}</h1>"#,
        action_with("navigate", &View::course_detail(&course.id)),
        escape(&course.title),
        escape(&chapter.title)
    );
    let _ = write!(
        html,
        r#"<div class="player"><iframe src="{}" title="Course video player" allowfullscreen></iframe></div>"#,
        escape(&chapter.video_embed_url)
    );
    let _ = write!(
        html,
        r#"<button class="{}" {}>{}</button>"#,
        if done { "complete" } else { "primary" },
        action_with(
            "toggleChapter",
            &json!({"courseId": course.id, "chapterTitle": chapter.title}),
        ),
        if done { "Completed ✓" } else { "Mark as Complete" }
    );

    let position = course.chapters.iter().position(|c| c.title == chapter.title);
    if let Some(next) = position.and_then(|i| course.chapters.get(i + 1)) {
        let _ = write!(
            html,
            r#"<button class="next" {}>Next: {}</button>"#,
            action_with("navigate", &View::chapter_video(&course.id, &next.title)),
            escape(&next.title)
        );
    }
    html.push_str("</section>");
    html
}

fn community(_page: &Page<'_>, _ctx: &RenderContext<'_>) -> String {
    r#"<section class="community"><h1>Community Hub</h1><p>Connect, collaborate, and learn with fellow professionals. Our interactive community forums are a place to ask questions, share insights, and grow your network.</p><div class="notice"><h2>Launching Soon!</h2><p>We're putting the finishing touches on this exciting new space. Please check back later!</p></div></section>"#.to_string()
}

fn profile(_page: &Page<'_>, ctx: &RenderContext<'_>) -> String {
    let mut html = String::from(r#"<section class="profile"><h1>Profile &amp; Progress</h1><div class="profile-card">"#);
    match &ctx.profile {
        Some(profile) => {
            let _ = write!(
                html,
                r#"<h2>{}</h2><p class="muted">{}</p>"#,
                escape(&profile.name),
                escape(&profile.title)
            );
        }
        None => html.push_str(r#"<p class="muted">Loading profile...</p>"#),
    }
    html.push_str(r#"</div><div class="learning"><h2>Learning Progress</h2>"#);

    let mut in_progress: Vec<(&Course, u8)> = ctx
        .catalog
        .courses()
        .iter()
        .map(|course| (course, ctx.progress.course_progress(course)))
        .filter(|(_, percent)| *percent > 0)
        .collect();
    in_progress.sort_by(|a, b| b.1.cmp(&a.1));

    if in_progress.is_empty() {
        let _ = write!(
            html,
            r#"<p class="muted">You haven't started any courses yet.</p><button class="primary" {}>Browse Courses</button>"#,
            action_with("navigate", &View::Courses)
        );
    } else {
        html.push_str(r#"<ul class="in-progress">"#);
        for (course, percent) in in_progress {
            let _ = write!(
                html,
                r#"<li {}><h3>{}</h3>{}<span>{}%</span></li>"#,
                action_with("navigate", &View::course_detail(&course.id)),
                escape(&course.title),
                progress_bar(percent),
                percent
            );
        }
        html.push_str("</ul>");
    }
    html.push_str("</div></section>");
    html
}

fn settings(_page: &Page<'_>, ctx: &RenderContext<'_>) -> String {
    let mut html = String::from(r#"<section class="settings"><h1>Settings</h1><h2>Appearance</h2><p class="muted">Choose how the application looks. Select a theme or sync with your system.</p><div class="theme-picker">"#);
    for theme in Theme::ALL {
        let _ = write!(
            html,
            r#"<button class="{}" aria-pressed="{}" {}>{}</button>"#,
            if theme == ctx.theme { "active" } else { "" },
            theme == ctx.theme,
            action_with("setTheme", &json!({ "theme": theme })),
            theme
        );
    }
    let _ = write!(
        html,
        r#"</div><h2>More Settings</h2><p class="muted">Additional configuration options will be available here in the future.</p><button class="danger" {}>Log out</button></section>"#,
        action("logout")
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::UserProfile;
    use crate::progress::ProgressStore;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn fixture() -> (Catalog, ProgressStore) {
        let catalog = Catalog::builtin().unwrap();
        let progress = ProgressStore::new(Arc::new(MemoryStorage::new()));
        (catalog, progress)
    }

    fn ctx<'a>(catalog: &'a Catalog, progress: &'a ProgressStore) -> RenderContext<'a> {
        RenderContext {
            catalog,
            progress,
            profile: Some(UserProfile::new("Asha <Rao>", "Tax Associate")),
            theme: Theme::Dark,
            career_goal: "",
            suggestion: None,
        }
    }

    #[test]
    fn test_unknown_course_falls_back_to_course_list() {
        let (catalog, _) = fixture();
        let page = Page::resolve(&View::course_detail("missing"), &catalog);
        assert_eq!(page, Page::Courses);

        let page = Page::resolve(&View::chapter_video("accounting", "missing"), &catalog);
        assert_eq!(page, Page::Courses);
    }

    #[test]
    fn test_resolve_known_ids() {
        let (catalog, _) = fixture();
        match Page::resolve(&View::chapter_video("accounting", "7 CIT"), &catalog) {
            Page::ChapterVideo(course, chapter) => {
                assert_eq!(course.id, "accounting");
                assert_eq!(chapter.title, "7 CIT");
            }
            other => panic!("unexpected page {other:?}"),
        }
    }

    #[test]
    fn test_every_kind_has_a_handler() {
        let (catalog, progress) = fixture();
        let ctx = ctx(&catalog, &progress);
        let course = catalog.find("auditing").unwrap();
        let pages = [
            Page::Home,
            Page::Courses,
            Page::CourseDetail(course),
            Page::ChapterVideo(course, &course.chapters[0]),
            Page::Community,
            Page::Profile,
            Page::Settings,
        ];
        for page in pages {
            let html = render_page(&page, &ctx);
            assert!(html.starts_with("<section"), "{:?} rendered {html}", page.kind());
        }
    }

    #[test]
    fn test_course_detail_shows_progress_and_marks() {
        let (catalog, progress) = fixture();
        progress.toggle_chapter_complete("ai-course-by-vishnu-singh-rajput", "Chapter 1: Introduction");
        let course = catalog.find("ai-course-by-vishnu-singh-rajput").unwrap();

        let html = render_page(&Page::CourseDetail(course), &ctx(&catalog, &progress));
        assert!(html.contains("25% Complete"));
        assert_eq!(html.matches(r#"class="chapter complete""#).count(), 1);
        assert_eq!(html.matches(r#"class="chapter""#).count(), 3);
    }

    #[test]
    fn test_profile_lists_started_courses_by_progress() {
        let (catalog, progress) = fixture();
        progress.toggle_chapter_complete("what-valuecent-does", "Our Mission and Vision");
        progress.toggle_chapter_complete("accounting", "7 CIT");

        let html = render_page(&Page::Profile, &ctx(&catalog, &progress));
        let first = html.find("What Valuecent does").unwrap();
        let second = html.find("Accounting").unwrap();
        assert!(first < second);
        assert!(!html.contains("Marketing"));
        assert!(html.contains("Asha &lt;Rao&gt;"));
    }

    #[test]
    fn test_settings_marks_current_theme() {
        let (catalog, progress) = fixture();
        let html = render_page(&Page::Settings, &ctx(&catalog, &progress));
        assert!(html.contains(r#"<button class="active" aria-pressed="true" data-op="setTheme""#));
        assert_eq!(html.matches(r#"aria-pressed="true""#).count(), 1);
    }

    #[test]
    fn test_last_chapter_has_no_next_button() {
        let (catalog, progress) = fixture();
        let course = catalog.find("auditing").unwrap();
        let last = course.chapters.last().unwrap();
        let html = render_page(&Page::ChapterVideo(course, last), &ctx(&catalog, &progress));
        assert!(!html.contains("Next:"));

        let html = render_page(
            &Page::ChapterVideo(course, &course.chapters[0]),
            &ctx(&catalog, &progress),
        );
        assert!(html.contains("Next: Chapter 2: The Audit Process"));
    }
}
