use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::ClickEvent;

/// Marker attribute that forces tracking of an internal link.
pub const ALWAYS_TRACK_ATTRIBUTE: &str = "data-track-click";

/// One element on the path from a click target up to the document root.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl ElementNode {
    pub fn link(href: &str) -> Self {
        Self {
            tag: "a".into(),
            href: Some(href.to_string()),
            attributes: Vec::new(),
        }
    }

    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: &str) -> Self {
        self.attributes.push(name.to_string());
        self
    }

    fn is_link(&self) -> bool {
        self.tag.eq_ignore_ascii_case("a") && self.href.is_some()
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attr| attr.eq_ignore_ascii_case(name))
    }
}

/// Target-to-root element chain of a single click.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClickSample {
    pub path: Vec<ElementNode>,
}

impl ClickSample {
    pub fn new(path: Vec<ElementNode>) -> Self {
        Self { path }
    }

    fn nearest_link(&self) -> Option<&ElementNode> {
        self.path.iter().find(|node| node.is_link())
    }
}

/// Decides which clicks leave the page as telemetry. Outbound links always
/// do; internal links only when marked with [`ALWAYS_TRACK_ATTRIBUTE`].
/// Nothing is deduplicated or rate limited.
#[derive(Debug, Clone)]
pub struct ClickRelay {
    origin: String,
}

impl ClickRelay {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// `page_url` is the URL of the page the click happened on; relative
    /// hrefs resolve against it the way the browser's `link.href` does.
    pub fn classify(
        &self,
        click: &ClickSample,
        page_url: Option<&Url>,
        observed_at: DateTime<Utc>,
    ) -> Option<ClickEvent> {
        let link = click.nearest_link()?;
        let href = link.href.as_deref()?;

        let target_url = match page_url.map(|base| base.join(href)) {
            Some(Ok(resolved)) => resolved.to_string(),
            _ => href.to_string(),
        };
        let is_external = !target_url.starts_with(&self.origin);

        if !is_external && !link.has_attribute(ALWAYS_TRACK_ATTRIBUTE) {
            return None;
        }

        Some(ClickEvent {
            target_url,
            is_external,
            observed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://blog.example/posts/rust-async").unwrap()
    }

    #[test]
    fn outbound_link_is_forwarded() {
        let relay = ClickRelay::new("https://blog.example");
        let click = ClickSample::new(vec![
            ElementNode::element("span"),
            ElementNode::link("https://docs.rs/tokio"),
            ElementNode::element("article"),
        ]);

        let event = relay.classify(&click, Some(&page()), Utc::now()).unwrap();
        assert_eq!(event.target_url, "https://docs.rs/tokio");
        assert!(event.is_external);
    }

    #[test]
    fn internal_link_is_dropped_unless_marked() {
        let relay = ClickRelay::new("https://blog.example/");
        let plain = ClickSample::new(vec![ElementNode::link("/posts/other")]);
        assert!(relay.classify(&plain, Some(&page()), Utc::now()).is_none());

        let marked = ClickSample::new(vec![
            ElementNode::link("/posts/other").with_attribute(ALWAYS_TRACK_ATTRIBUTE)
        ]);
        let event = relay.classify(&marked, Some(&page()), Utc::now()).unwrap();
        assert_eq!(event.target_url, "https://blog.example/posts/other");
        assert!(!event.is_external);
    }

    #[test]
    fn click_outside_any_link_is_ignored() {
        let relay = ClickRelay::new("https://blog.example");
        let click = ClickSample::new(vec![
            ElementNode::element("p"),
            ElementNode {
                tag: "a".into(),
                href: None,
                attributes: Vec::new(),
            },
            ElementNode::element("body"),
        ]);
        assert!(relay.classify(&click, Some(&page()), Utc::now()).is_none());
    }

    #[test]
    fn repeated_clicks_each_produce_an_event() {
        let relay = ClickRelay::new("https://blog.example");
        let click = ClickSample::new(vec![ElementNode::link("https://github.com/")]);

        let events: Vec<_> = (0..2)
            .filter_map(|_| relay.classify(&click, None, Utc::now()))
            .collect();
        assert_eq!(events.len(), 2);
    }
}
