//! HTML rendering of the portal.
//!
//! Pages are plain strings. Interactive elements carry `data-op` /
//! `data-payload` attributes (or `data-form` on forms); the document script
//! turns them into `{"op": ..., "payload": ...}` IPC messages that deserialize
//! into [`crate::app::Command`].

mod inspect;
pub mod layout;
pub mod pages;

pub use inspect::{PageAction, PageInspector};
pub use pages::{render_page, Page};

use crate::catalog::Catalog;
use crate::profile::UserProfile;
use crate::progress::ProgressStore;
use crate::theme::Theme;
use serde::Serialize;

/// Everything a page handler may read.
pub struct RenderContext<'a> {
    pub catalog: &'a Catalog,
    pub progress: &'a ProgressStore,
    pub profile: Option<UserProfile>,
    pub theme: Theme,
    pub career_goal: &'a str,
    pub suggestion: Option<&'a str>,
}

/// Escapes text for use in HTML content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `data-op` attributes for a clickable element.
pub fn action(op: &str) -> String {
    format!(r#"data-op="{}""#, escape(op))
}

/// `data-op` plus a JSON `data-payload`.
pub fn action_with<T: Serialize>(op: &str, payload: &T) -> String {
    match serde_json::to_string(payload) {
        Ok(json) => format!(
            r#"data-op="{}" data-payload="{}""#,
            escape(op),
            escape(&json)
        ),
        Err(e) => {
            log::error!("Failed to encode payload for '{}': {}", op, e);
            action(op)
        }
    }
}

/// Horizontal progress bar with an accessible value.
pub fn progress_bar(percent: u8) -> String {
    format!(
        r#"<div class="progress" role="progressbar" aria-valuemin="0" aria-valuemax="100" aria-valuenow="{percent}"><div class="progress-fill" style="width:{percent}%"></div></div>"#
    )
}
