//! Internal links appended to generated articles.

use crate::heuristics::{LinkEntry, LinkSettings};
use serde::Serialize;
use std::fmt::Write as _;

/// Links chosen for one article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelatedLinks {
    /// Service pages
    pub services: Vec<LinkEntry>,
    /// Case studies
    pub cases: Vec<LinkEntry>,
}

impl RelatedLinks {
    /// Returns true if nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.cases.is_empty()
    }
}

/// Selects internal links for tags and renders them as Markdown.
#[derive(Debug, Clone)]
pub struct LinkInjector {
    settings: LinkSettings,
}

impl LinkInjector {
    /// Creates an injector over the given link tables.
    #[must_use]
    pub const fn new(settings: LinkSettings) -> Self {
        Self { settings }
    }

    /// Picks links for `tags`, in tag order, first match wins.
    #[must_use]
    pub fn select(&self, tags: &[String]) -> RelatedLinks {
        RelatedLinks {
            services: pick(&self.settings.services, tags, self.settings.max_services),
            cases: pick(&self.settings.cases, tags, self.settings.max_cases),
        }
    }

    /// Renders the related-links blocks, or an empty string.
    #[must_use]
    pub fn render(&self, links: &RelatedLinks) -> String {
        let mut out = String::new();
        push_block(&mut out, &self.settings.services_heading, &links.services);
        push_block(&mut out, &self.settings.cases_heading, &links.cases);
        out
    }

    /// Appends the related-links blocks for `tags` to `body`.
    #[must_use]
    pub fn inject(&self, body: &str, tags: &[String]) -> (String, RelatedLinks) {
        let links = self.select(tags);
        let blocks = self.render(&links);
        if blocks.is_empty() {
            return (body.to_string(), links);
        }

        let mut out = body.trim_end().to_string();
        out.push_str(&blocks);
        out.push('\n');
        (out, links)
    }
}

fn pick(table: &[LinkEntry], tags: &[String], cap: usize) -> Vec<LinkEntry> {
    let mut chosen: Vec<LinkEntry> = Vec::new();
    for tag in tags {
        if chosen.len() >= cap {
            break;
        }
        let candidate = table
            .iter()
            .find(|entry| &entry.tag == tag && !chosen.iter().any(|c| c.url == entry.url));
        if let Some(entry) = candidate {
            chosen.push(entry.clone());
        }
    }
    chosen
}

fn push_block(out: &mut String, heading: &str, links: &[LinkEntry]) {
    if links.is_empty() {
        return;
    }
    let _ = write!(out, "\n\n## {heading}\n");
    for link in links {
        let _ = write!(out, "\n- [{}]({})", link.title, link.url);
    }
}
