// src/ingest/providers/html.rs
//! Headline fallback: pull heading/anchor text straight from a site's home page.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::feed::resolve_url;
use crate::ingest::normalize_text;

/// Only the first elements in document order are examined.
pub const MAX_SCANNED_ELEMENTS: usize = 40;
pub const MIN_HEADLINE_CHARS: usize = 20;
pub const MAX_HEADLINE_CHARS: usize = 220;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub text: String,
    pub link: String,
}

/// Extract candidate headlines (length-filtered, distinct text) from raw markup.
///
/// A heading without its own `href` takes the first link inside it, so
/// `<h2><a href="/a/1">...</a></h2>` yields one headline pointing at `/a/1`.
pub fn extract_headlines(html: &str, site: &str) -> Vec<Headline> {
    static HEADINGS: Lazy<Selector> =
        Lazy::new(|| Selector::parse("h1, h2, h3, a").expect("headline selector"));
    static INNER_LINK: Lazy<Selector> =
        Lazy::new(|| Selector::parse("a[href]").expect("inner link selector"));

    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for el in doc.select(&HEADINGS).take(MAX_SCANNED_ELEMENTS) {
        let raw = el.text().collect::<Vec<_>>().join(" ");
        let text = normalize_text(&raw);
        let len = text.chars().count();
        if !(MIN_HEADLINE_CHARS..=MAX_HEADLINE_CHARS).contains(&len) {
            continue;
        }
        if !seen.insert(text.clone()) {
            continue;
        }

        let href = el
            .value()
            .attr("href")
            .or_else(|| el.select(&INNER_LINK).find_map(|a| a.value().attr("href")));
        let link = href
            .map(str::trim)
            .filter(|h| !h.is_empty() && !h.starts_with('#'))
            .and_then(|h| resolve_url(site, h))
            .unwrap_or_else(|| site.to_string());

        out.push(Headline { text, link });
    }
    out
}
