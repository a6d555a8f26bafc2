use super::{action, action_with, escape};
use crate::browser::{View, ViewKind};
use crate::catalog::Catalog;
use crate::theme::EffectiveTheme;
use std::fmt::Write as _;

const BRAND: &str = "VALUECENT";

const STYLE: &str = r#"
* { box-sizing: border-box; }
:root { --bg: #F9FAFB; --fg: #111827; --muted: #6B7280; --card: #FFFFFF; --border: #E5E7EB; --primary: #2563EB; }
.dark { --bg: #121212; --fg: #E6E6E6; --muted: #A7A7A7; --card: #1E1E1E; --border: #2A2A2A; --primary: #3A83F7; }
html, body { margin: 0; min-height: 100%; font-family: -apple-system, BlinkMacSystemFont, Segoe UI, Roboto, Helvetica, Arial, sans-serif; background: var(--bg); color: var(--fg); }
.app { display: flex; min-height: 100vh; }
.sidebar { width: 260px; border-right: 1px solid var(--border); padding: 16px; }
.sidebar.collapsed { width: 72px; overflow: hidden; }
.sidebar button, .topbar button { background: none; border: 0; color: inherit; cursor: pointer; text-align: left; }
.sidebar .active { color: var(--primary); font-weight: 700; }
.content { flex: 1; min-width: 0; display: flex; flex-direction: column; }
.topbar { height: 64px; display: flex; align-items: center; gap: 8px; padding: 0 24px; }
.topbar button:disabled { opacity: 0.4; cursor: not-allowed; }
main { flex: 1; padding: 32px; overflow-y: auto; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 16px; }
.card { background: var(--card); border: 1px solid var(--border); border-radius: 12px; padding: 16px; cursor: pointer; }
.progress { height: 8px; background: var(--border); border-radius: 4px; overflow: hidden; }
.progress-fill { height: 100%; background: var(--primary); }
.muted { color: var(--muted); }
.badge { font-size: 12px; color: #CA8A04; }
.player iframe { width: 100%; aspect-ratio: 16 / 9; border: 0; border-radius: 8px; }
.chapter.complete .chapter-toggle { color: #16A34A; }
button.primary { background: var(--primary); color: white; border: 0; border-radius: 8px; padding: 10px 16px; cursor: pointer; }
.gate { min-height: 100vh; display: flex; align-items: center; justify-content: center; }
.gate form { display: flex; flex-direction: column; gap: 12px; width: min(420px, 92vw); }
.error { color: #DC2626; }
"#;

/// Posts `{"op", "payload"}` messages for clicks on `[data-op]` and submits of `form[data-form]`.
const SCRIPT: &str = r#"
(function() {
  function post(msg) {
    if (window.ipc && window.ipc.postMessage) { window.ipc.postMessage(JSON.stringify(msg)); }
    else { console.log('portal command', msg); }
  }
  document.addEventListener('click', function(e) {
    var el = e.target.closest('[data-op]');
    if (!el || el.disabled) return;
    e.preventDefault();
    var msg = { op: el.dataset.op };
    if (el.dataset.payload) msg.payload = JSON.parse(el.dataset.payload);
    post(msg);
  });
  document.addEventListener('submit', function(e) {
    var form = e.target.closest('form[data-form]');
    if (!form) return;
    e.preventDefault();
    post({ op: form.dataset.form, payload: Object.fromEntries(new FormData(form)) });
  });
})();
"#;

/// Wraps `body` in a full HTML document themed for `theme`.
pub fn document(title: &str, theme: EffectiveTheme, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en" class="{class}">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <meta name="theme-color" content="{color}" />
  <title>{title}</title>
  <style>{STYLE}</style>
</head>
<body>
{body}
<script>{SCRIPT}</script>
</body>
</html>"#,
        class = if theme.is_dark() { "dark" } else { "light" },
        color = theme.meta_color(),
        title = escape(title),
    )
}

pub fn page_title(page_title: &str) -> String {
    format!("{BRAND} · {page_title}")
}

pub struct Chrome<'a> {
    pub catalog: &'a Catalog,
    pub current: &'a View,
    pub shown: ViewKind,
    pub sidebar_open: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

/// Sidebar, top bar and the main content area.
pub fn app_shell(chrome: &Chrome<'_>, main: &str) -> String {
    format!(
        r#"<div class="app">{}<div class="content">{}<main>{main}</main></div></div>"#,
        sidebar(chrome),
        top_bar(chrome)
    )
}

fn sidebar(chrome: &Chrome<'_>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<nav class="sidebar{}"><button class="brand" {}>{BRAND}</button><ul>"#,
        if chrome.sidebar_open { "" } else { " collapsed" },
        action_with("navigate", &View::Home)
    );

    let item = |html: &mut String, label: &str, view: View, kind: ViewKind| {
        let _ = write!(
            html,
            r#"<li><button class="{}" {}>{}</button></li>"#,
            if chrome.shown == kind { "active" } else { "" },
            action_with("navigate", &view),
            label
        );
    };

    item(&mut html, "Home", View::Home, ViewKind::Home);
    item(&mut html, "Courses", View::Courses, ViewKind::Courses);

    if chrome.sidebar_open {
        html.push_str(r#"<li><ul class="course-links">"#);
        for course in chrome.catalog.courses() {
            let active = matches!(
                chrome.current,
                View::CourseDetail { course_id } | View::ChapterVideo { course_id, .. }
                    if *course_id == course.id
            );
            let _ = write!(
                html,
                r#"<li><button class="{}" {}>{}</button></li>"#,
                if active { "active" } else { "" },
                action_with("navigate", &View::course_detail(&course.id)),
                escape(&course.title)
            );
        }
        html.push_str("</ul></li>");
    }

    item(&mut html, "Community", View::Community, ViewKind::Community);
    item(&mut html, "Profile", View::Profile, ViewKind::Profile);
    item(&mut html, "Settings", View::Settings, ViewKind::Settings);

    let _ = write!(
        html,
        r#"</ul><button class="logout" {}>Logout</button></nav>"#,
        action("logout")
    );
    html
}

fn top_bar(chrome: &Chrome<'_>) -> String {
    let disabled = |enabled: bool| if enabled { "" } else { " disabled" };
    format!(
        r#"<header class="topbar"><button title="{toggle}" aria-label="{toggle}" {toggle_op}>{toggle_icon}</button><button title="Go back" aria-label="Go back"{back_disabled} {back_op}>←</button><button title="Go forward" aria-label="Go forward"{fwd_disabled} {fwd_op}>→</button></header>"#,
        toggle = if chrome.sidebar_open {
            "Collapse sidebar"
        } else {
            "Expand sidebar"
        },
        toggle_op = action("toggleSidebar"),
        toggle_icon = if chrome.sidebar_open { "«" } else { "»" },
        back_disabled = disabled(chrome.can_go_back),
        back_op = action("back"),
        fwd_disabled = disabled(chrome.can_go_forward),
        fwd_op = action("forward"),
    )
}

/// Login form shown until the endpoint accepts the credentials.
pub fn login_screen(username: &str, error: Option<&str>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div class="gate login"><form data-form="login"><h1>{BRAND}</h1><p class="muted">Intelligent Learning Platform</p><label for="username">Username</label><input id="username" name="username" type="text" autocomplete="username" value="{}" required><label for="password">Password</label><input id="password" name="password" type="password" autocomplete="current-password" required>"#,
        escape(username)
    );
    if let Some(error) = error {
        let _ = write!(html, r#"<p class="error" role="alert">{}</p>"#, escape(error));
    }
    html.push_str(r#"<button class="primary" type="submit">Sign In</button></form></div>"#);
    html
}

/// One-time profile setup shown after the first login.
pub fn welcome_screen() -> String {
    format!(
        r#"<div class="gate welcome"><form data-form="saveProfile"><h1>Welcome to {BRAND}</h1><p class="muted">Let's set up your profile to get started.</p><label for="name">Full Name</label><input id="name" name="name" type="text" required><label for="title">Job Title</label><input id="title" name="title" type="text" required><button class="primary" type="submit">Get Started</button></form></div>"#
    )
}
