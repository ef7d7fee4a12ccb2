// src/ingest/mod.rs
pub mod fetch;
pub mod providers;
pub mod types;

use crate::config::RadarConfig;
use crate::error::FetchError;
use crate::geo::GeoClassifier;
use crate::ingest::providers::{feed, html};
use crate::ingest::types::{HttpFetch, NewsItem};
use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

/// Incident vocabulary; an item must mention at least one of these.
pub const INCIDENT_KEYWORDS: &[&str] = &[
    "manifestation",
    "tension",
    "affrontement",
    "mort",
    "blessé",
    "décès",
    "police",
    "grève",
    "ucad",
    "étudiant",
    "blocage",
    "violence",
    "marche",
    "protestation",
    "émeute",
    "gendarmerie",
    "confrontation",
    "crime",
    "vol",
    "braquage",
    "agression",
    "vandalisme",
    "incendie",
    "accident grave",
    "fermé",
    "perturbation",
    "trouble",
    "sécurité",
    "arrestation",
    "interpellation",
    "bavure",
    "répression",
    "chaos",
];

pub const SUMMARY_MAX_CHARS: usize = 200;
pub const UNDATED: &str = "Récent";

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "radar_news_items_total",
            "News items kept after relevance + incident filtering."
        );
        describe_counter!(
            "radar_site_errors_total",
            "Per-site feed/HTML fetch or parse errors."
        );
        describe_gauge!(
            "radar_ingest_last_run_ts",
            "Unix ts when aggregation last ran."
        );
    });
}

/// Normalize text: decode entities, strip tags, straighten quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Char-boundary-safe prefix.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

pub fn has_incident_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    INCIDENT_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Both gates: about the country AND about an incident.
pub fn passes_filters(text: &str, classifier: &GeoClassifier) -> bool {
    classifier.is_related(text) && has_incident_keyword(text)
}

/// Below this many feed items a site also gets the HTML fallback.
pub fn fallback_threshold(per_site_limit: usize) -> usize {
    (per_site_limit / 2).max(3).min(per_site_limit)
}

/// Aggregate incident news across `cfg.sites`, in order, bounded by the caps.
///
/// Per-site failures are logged and skipped; partial results are normal.
/// A title already kept earlier in the run (case-insensitive) never counts
/// against a site's cap.
pub async fn aggregate(
    fetcher: &dyn HttpFetch,
    cfg: &RadarConfig,
    classifier: &GeoClassifier,
) -> Vec<NewsItem> {
    ensure_metrics_described();

    let mut all: Vec<NewsItem> = Vec::new();
    let mut seen_titles: HashSet<String> = HashSet::new();

    for (idx, site) in cfg.sites.iter().enumerate() {
        let discovery = feed::discover(fetcher, site, cfg.feed_timeout()).await;
        let mut site_items: Vec<NewsItem> = Vec::new();

        // 1) Feed.
        if let Some(feed_url) = discovery.feed.as_deref() {
            match collect_from_feed(fetcher, site, feed_url, cfg, classifier, &mut seen_titles).await {
                Ok(v) => site_items.extend(v),
                Err(e) => {
                    tracing::warn!(target: "ingest", site = %site, error = %e, "feed error");
                    counter!("radar_site_errors_total").increment(1);
                }
            }
        } else {
            tracing::debug!(target: "ingest", site = %site, "no feed found");
        }

        // 2) HTML fallback when the feed was thin; reuses the home page fetched by discovery.
        if site_items.len() < fallback_threshold(cfg.per_site_limit) {
            let remaining = cfg.per_site_limit.saturating_sub(site_items.len());
            match collect_from_html(
                fetcher,
                site,
                discovery.home_page.as_deref(),
                cfg,
                classifier,
                remaining,
                &mut seen_titles,
            )
            .await
            {
                Ok(v) => site_items.extend(v),
                Err(e) => {
                    tracing::warn!(target: "ingest", site = %site, error = %e, "html fallback error");
                    counter!("radar_site_errors_total").increment(1);
                }
            }
        }

        tracing::debug!(target: "ingest", site = %site, kept = site_items.len(), "site done");
        all.extend(site_items);

        // 3) Politeness delay.
        if idx + 1 < cfg.sites.len() && !cfg.site_delay().is_zero() {
            tokio::time::sleep(cfg.site_delay()).await;
        }

        // 4) Global cap.
        if all.len() >= cfg.global_limit {
            break;
        }
    }

    all.truncate(cfg.global_limit);

    counter!("radar_news_items_total").increment(all.len() as u64);
    metrics::gauge!("radar_ingest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    tracing::info!(target: "ingest", kept = all.len(), sites = cfg.sites.len(), "aggregation finished");

    all
}

async fn collect_from_feed(
    fetcher: &dyn HttpFetch,
    site: &str,
    feed_url: &str,
    cfg: &RadarConfig,
    classifier: &GeoClassifier,
    seen_titles: &mut HashSet<String>,
) -> Result<Vec<NewsItem>, FetchError> {
    let entries = feed::fetch_feed(fetcher, feed_url, cfg.feed_timeout(), cfg.feed_entry_scan).await?;

    let mut out = Vec::new();
    for e in entries {
        if out.len() >= cfg.per_site_limit {
            break;
        }
        let full_text = format!("{} {}", e.title, e.summary);
        if e.title.is_empty() || !passes_filters(&full_text, classifier) {
            continue;
        }
        if !seen_titles.insert(e.title.to_lowercase()) {
            continue;
        }
        out.push(NewsItem {
            title: e.title,
            summary: truncate_chars(&e.summary, SUMMARY_MAX_CHARS),
            date: e.published.unwrap_or_else(|| UNDATED.to_string()),
            link: e.link.unwrap_or_else(|| site.to_string()),
            source: site.to_string(),
        });
    }
    Ok(out)
}

async fn collect_from_html(
    fetcher: &dyn HttpFetch,
    site: &str,
    home_page: Option<&str>,
    cfg: &RadarConfig,
    classifier: &GeoClassifier,
    remaining: usize,
    seen_titles: &mut HashSet<String>,
) -> Result<Vec<NewsItem>, FetchError> {
    if remaining == 0 {
        return Ok(Vec::new());
    }

    let fetched;
    let body = match home_page {
        Some(b) => b,
        None => {
            let resp = fetcher.get(site, cfg.html_timeout()).await?;
            if !(200..300).contains(&resp.status) {
                return Err(FetchError::Status {
                    url: site.to_string(),
                    status: resp.status,
                });
            }
            fetched = resp.body;
            fetched.as_str()
        }
    };

    let out = html::extract_headlines(body, site)
        .into_iter()
        .filter(|h| passes_filters(&h.text, classifier))
        .filter(|h| seen_titles.insert(h.text.to_lowercase()))
        .take(remaining)
        .map(|h| NewsItem {
            title: h.text,
            summary: String::new(),
            date: UNDATED.to_string(),
            link: h.link,
            source: site.to_string(),
        })
        .collect();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_collapses_ws_and_strips_tags() {
        let s = "  Grève&nbsp;&nbsp; à <b>Thiès</b>  ";
        assert_eq!(normalize_text(s), "Grève à Thiès");
        assert_eq!(normalize_text("« Dakar » l’UCAD"), "\" Dakar \" l'UCAD");
    }

    #[test]
    fn incident_keywords_are_case_insensitive() {
        assert!(has_incident_keyword("MANIFESTATION devant la mairie"));
        assert!(!has_incident_keyword("Inauguration d'un stade"));
    }

    #[test]
    fn both_filters_are_required() {
        let c = GeoClassifier::default_country();
        assert!(passes_filters("Affrontement à Pikine", c));
        assert!(!passes_filters("Inauguration d'un stade à Pikine", c));
        assert!(!passes_filters("Affrontement en Ukraine", c));
    }

    #[test]
    fn fallback_threshold_is_half_with_floor() {
        assert_eq!(fallback_threshold(10), 5);
        assert_eq!(fallback_threshold(4), 3);
        assert_eq!(fallback_threshold(2), 2);
        assert_eq!(fallback_threshold(30), 15);
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate_chars("éééé", 2), "éé");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
