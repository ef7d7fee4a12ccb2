// src/ingest/providers/feed.rs
//! Feed discovery (autodiscovery `<link>`, then conventional paths) and
//! RSS 2.0 / Atom parsing into plain entries.

use std::time::Duration;

use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::FetchError;
use crate::ingest::normalize_text;
use crate::ingest::types::HttpFetch;

/// Probed in this order when the home page has no autodiscovery link.
pub const FEED_PROBE_PATHS: &[&str] = &[
    "/rss",
    "/feed",
    "/feeds/posts/default",
    "/rss.xml",
    "/feed.xml",
];

const FEED_LINK_TYPES: &[&str] = &["application/rss+xml", "application/atom+xml"];

/// A feed entry before relevance filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub summary: String,
    pub published: Option<String>,
    pub link: Option<String>,
}

// ---- RSS 2.0 ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "date")]
    dc_date: Option<String>,
    description: Option<String>,
}

// ---- RSS 1.0 (RDF): items are siblings of the channel ----

#[derive(Debug, Deserialize)]
struct RdfFeed {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Outcome of feed discovery for one site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub feed: Option<String>,
    /// Home page body when it was fetched with a 2xx status, for the HTML fallback.
    pub home_page: Option<String>,
}

/// Locate a syndication feed for `site`. Never fails: every error means "not found".
pub async fn discover_feed(fetcher: &dyn HttpFetch, site: &str, timeout: Duration) -> Option<String> {
    discover(fetcher, site, timeout).await.feed
}

/// Like [`discover_feed`], but also hands back the home page it fetched.
pub async fn discover(fetcher: &dyn HttpFetch, site: &str, timeout: Duration) -> Discovery {
    let mut out = Discovery::default();

    match fetcher.get(site, timeout).await {
        Ok(resp) if (200..300).contains(&resp.status) => {
            out.feed = find_feed_link(&resp.body, site);
            out.home_page = Some(resp.body);
            if let Some(url) = &out.feed {
                tracing::debug!(target: "ingest", site, feed = %url, "feed autodiscovered");
                return out;
            }
        }
        Ok(resp) => {
            tracing::debug!(target: "ingest", site, status = resp.status, "home page not usable");
        }
        Err(e) => {
            tracing::debug!(target: "ingest", site, error = %e, "home page fetch failed");
        }
    }

    let root = site.trim_end_matches('/');
    for path in FEED_PROBE_PATHS {
        let candidate = format!("{root}{path}");
        match fetcher.get(&candidate, timeout).await {
            Ok(resp) if resp.is_ok() && resp.looks_like_xml() => {
                tracing::debug!(target: "ingest", site, feed = %candidate, "feed found by probing");
                out.feed = Some(candidate);
                return out;
            }
            Ok(_) | Err(_) => continue,
        }
    }
    out
}

/// Scan markup for `<link type="application/rss+xml" href=...>` (RSS preferred over Atom).
pub fn find_feed_link(html: &str, base: &str) -> Option<String> {
    static FEED_LINKS: Lazy<Selector> =
        Lazy::new(|| Selector::parse("link[type][href]").expect("feed link selector"));

    let doc = Html::parse_document(html);
    for wanted in FEED_LINK_TYPES {
        let href = doc
            .select(&FEED_LINKS)
            .filter(|el| {
                el.value()
                    .attr("type")
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case(wanted))
            })
            .find_map(|el| el.value().attr("href"))
            .map(str::trim)
            .filter(|h| !h.is_empty());
        if let Some(h) = href {
            return resolve_url(base, h);
        }
    }
    None
}

/// Resolve `href` against `base`; absolute hrefs pass through.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    if let Ok(abs) = Url::parse(href) {
        return Some(abs.to_string());
    }
    Url::parse(base)
        .and_then(|b| b.join(href))
        .ok()
        .map(|u| u.to_string())
}

/// Download and parse a feed, keeping at most `max_entries` entries.
pub async fn fetch_feed(
    fetcher: &dyn HttpFetch,
    feed_url: &str,
    timeout: Duration,
    max_entries: usize,
) -> Result<Vec<FeedEntry>, FetchError> {
    let resp = fetcher.get(feed_url, timeout).await?;
    if !(200..300).contains(&resp.status) {
        return Err(FetchError::Status {
            url: feed_url.to_string(),
            status: resp.status,
        });
    }
    let mut entries = parse_feed(&resp.body)?;
    entries.truncate(max_entries);
    Ok(entries)
}

/// Parse by root element: `<rss>` (2.0), `<rdf:RDF>` (1.0) or Atom `<feed>`.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, FetchError> {
    let clean = scrub_html_entities_for_xml(xml);
    let parse_err = |e: quick_xml::DeError| FetchError::Parse(e.to_string());

    match root_element(&clean).as_deref() {
        Some("rss") => {
            let rss: Rss = from_str(&clean).map_err(parse_err)?;
            Ok(rss.channel.item.into_iter().map(from_rss).collect())
        }
        Some("RDF") => {
            let rdf: RdfFeed = from_str(&clean).map_err(parse_err)?;
            Ok(rdf.item.into_iter().map(from_rss).collect())
        }
        Some("feed") => {
            let atom: AtomFeed = from_str(&clean).map_err(parse_err)?;
            Ok(atom.entry.into_iter().map(from_atom).collect())
        }
        Some(other) => Err(FetchError::Parse(format!("unsupported feed root <{other}>"))),
        None => Err(FetchError::Parse("no root element".to_string())),
    }
}

/// Local name of the document element, ignoring prolog, comments and doctype.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

fn from_rss(it: RssItem) -> FeedEntry {
    FeedEntry {
        title: normalize_text(it.title.as_deref().unwrap_or_default()),
        summary: normalize_text(it.description.as_deref().unwrap_or_default()),
        published: non_empty(it.pub_date.or(it.dc_date)),
        link: non_empty(it.link),
    }
}

fn from_atom(e: AtomEntry) -> FeedEntry {
    let summary = e
        .summary
        .or(e.content)
        .map(|t| t.value)
        .unwrap_or_default();
    let link = e
        .link
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|r| r == "alternate"))
        .or(e.link.first())
        .and_then(|l| l.href.clone());
    FeedEntry {
        title: normalize_text(&e.title.map(|t| t.value).unwrap_or_default()),
        summary: normalize_text(&summary),
        published: non_empty(e.published.or(e.updated)),
        link: non_empty(link),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// HTML named entities are not valid XML; decode everything except the five XML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    static RE_ENTITY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("entity regex"));

    RE_ENTITY
        .replace_all(s, |caps: &regex::Captures| {
            let name = &caps[1];
            match name {
                "amp" | "lt" | "gt" | "quot" | "apos" => caps[0].to_string(),
                _ => {
                    let decoded = html_escape::decode_html_entities(&caps[0]);
                    if decoded == caps[0] {
                        // Unknown entity: neutralize the ampersand.
                        format!("&amp;{name};")
                    } else {
                        decoded.into_owned()
                    }
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>Site</title>
  <link>https://example.sn</link>
  <item>
    <title>Grève&nbsp;à Thiès</title>
    <link>https://example.sn/a</link>
    <pubDate>Mon, 06 Oct 2025 10:00:00 +0000</pubDate>
    <description><![CDATA[<p>Les enseignants <b>marchent</b></p>]]></description>
  </item>
  <item>
    <title>Deuxième</title>
  </item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Blog</title>
  <entry>
    <title type="text">Tension à Pikine</title>
    <published>2025-10-06T10:00:00Z</published>
    <summary type="html">Des jeunes bloquent la route</summary>
    <link rel="replies" href="https://blog.sn/a#comments"/>
    <link rel="alternate" href="https://blog.sn/a"/>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items_with_entities_and_cdata() {
        let v = parse_feed(RSS).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].title, "Grève à Thiès");
        assert_eq!(v[0].summary, "Les enseignants marchent");
        assert_eq!(v[0].link.as_deref(), Some("https://example.sn/a"));
        assert!(v[0].published.is_some());
        assert!(v[1].link.is_none());
    }

    #[test]
    fn parses_atom_entries_and_prefers_alternate_link() {
        let v = parse_feed(ATOM).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].title, "Tension à Pikine");
        assert_eq!(v[0].link.as_deref(), Some("https://blog.sn/a"));
        assert_eq!(v[0].published.as_deref(), Some("2025-10-06T10:00:00Z"));
    }

    const RDF: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns="http://purl.org/rss/1.0/"
         xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel rdf:about="https://agence.sn/">
    <title>Agence</title>
    <link>https://agence.sn/</link>
    <items><rdf:Seq><rdf:li rdf:resource="https://agence.sn/1"/></rdf:Seq></items>
  </channel>
  <item rdf:about="https://agence.sn/1">
    <title>Dakar : arrestation de manifestants au Plateau</title>
    <link>https://agence.sn/1</link>
    <description>Plusieurs interpellations.</description>
    <dc:date>2025-10-06T08:30:00Z</dc:date>
  </item>
</rdf:RDF>"#;

    #[test]
    fn parses_rss_1_0_items_outside_the_channel() {
        let v = parse_feed(RDF).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].title, "Dakar : arrestation de manifestants au Plateau");
        assert_eq!(v[0].link.as_deref(), Some("https://agence.sn/1"));
        assert_eq!(v[0].published.as_deref(), Some("2025-10-06T08:30:00Z"));
    }

    #[test]
    fn unknown_root_is_a_parse_error() {
        let html = "<html><body><h1>Pas un flux</h1></body></html>";
        match parse_feed(html) {
            Err(FetchError::Parse(msg)) => assert!(msg.contains("html"), "{msg}"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(parse_feed("not xml at all"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn autodiscovery_resolves_relative_href() {
        let html = r#"<html><head>
            <link rel="stylesheet" type="text/css" href="/s.css">
            <link rel="alternate" type="application/rss+xml" href="/rss/une.xml">
        </head></html>"#;
        assert_eq!(
            find_feed_link(html, "https://www.example.sn").as_deref(),
            Some("https://www.example.sn/rss/une.xml")
        );
    }

    #[test]
    fn autodiscovery_prefers_rss_over_atom() {
        let html = r#"<head>
            <link type="application/atom+xml" href="https://x.sn/atom">
            <link type="application/rss+xml" href="https://x.sn/rss">
        </head>"#;
        assert_eq!(find_feed_link(html, "https://x.sn").as_deref(), Some("https://x.sn/rss"));
        assert!(find_feed_link("<html></html>", "https://x.sn").is_none());
    }
}
