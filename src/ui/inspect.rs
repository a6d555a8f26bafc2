use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

/// A clickable `data-op` element found in a rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageAction {
    pub op: String,
    pub payload: Option<serde_json::Value>,
    pub label: String,
}

/// Reads rendered portal pages back: window titles, plain text for the
/// terminal, and the actions a user could trigger.
pub struct PageInspector;

impl PageInspector {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_title(&self, html: &str) -> Result<Option<String>> {
        let document = Html::parse_document(html);
        let selector = selector("title")?;

        Ok(document
            .select(&selector)
            .next()
            .map(|title| title.text().collect::<Vec<_>>().join(" ").trim().to_string()))
    }

    /// Visible text of the body with whitespace collapsed.
    pub fn extract_text(&self, html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        let selector = selector("body")?;

        let Some(body) = document.select(&selector).next() else {
            return Ok(String::new());
        };

        let words: Vec<&str> = body
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let hidden = node
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|el| matches!(el.value().name(), "script" | "style"));
                (!hidden).then_some(&**text)
            })
            .flat_map(str::split_whitespace)
            .collect();
        Ok(words.join(" "))
    }

    pub fn extract_actions(&self, html: &str) -> Result<Vec<PageAction>> {
        let document = Html::parse_document(html);
        let selector = selector("[data-op]")?;

        let mut actions = Vec::new();
        for element in document.select(&selector) {
            let Some(op) = element.value().attr("data-op") else {
                continue;
            };
            let payload = match element.value().attr("data-payload") {
                Some(raw) => Some(serde_json::from_str(raw)?),
                None => None,
            };
            let label = element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ");
            actions.push(PageAction {
                op: op.to_string(),
                payload,
                label,
            });
        }

        Ok(actions)
    }
}

impl Default for PageInspector {
    fn default() -> Self {
        Self::new()
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector '{}': {:?}", css, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html><html><head><title> VALUECENT · Courses </title><style>.x{}</style></head>
<body><main><h1>All   Courses</h1>
<article data-op="navigate" data-payload="{&quot;page&quot;:&quot;courseDetail&quot;,&quot;courseId&quot;:&quot;hr&quot;}"><h3>Human Resources</h3></article>
<button data-op="logout">Logout</button>
<form data-form="suggest"><input name="goal"></form></main>
<script>var hidden = 'do not show';</script></body></html>"#;

    #[test]
    fn test_extract_title() {
        let inspector = PageInspector::new();
        assert_eq!(
            inspector.extract_title(PAGE).unwrap().as_deref(),
            Some("VALUECENT · Courses")
        );
        assert_eq!(inspector.extract_title("<p>none</p>").unwrap(), None);
    }

    #[test]
    fn test_extract_text_skips_scripts() {
        let text = PageInspector::new().extract_text(PAGE).unwrap();
        assert_eq!(text, "All Courses Human Resources Logout");
    }

    #[test]
    fn test_extract_actions_decodes_payload() {
        let actions = PageInspector::new().extract_actions(PAGE).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].op, "navigate");
        assert_eq!(
            actions[0].payload,
            Some(serde_json::json!({"page": "courseDetail", "courseId": "hr"}))
        );
        assert_eq!(actions[0].label, "Human Resources");
        assert_eq!(actions[1].payload, None);
    }
}
