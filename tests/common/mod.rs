// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use country_radar::ingest::types::{FetchResponse, HttpFetch};
use country_radar::{FetchError, RadarConfig};

pub const SENEGAL_RSS: &str = include_str!("../fixtures/senegal_rss.xml");

/// In-memory web: unknown URLs answer 404, `fail` URLs error out.
#[derive(Default)]
pub struct StubWeb {
    pages: HashMap<String, FetchResponse>,
    fail: Vec<String>,
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl StubWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, content_type: &str, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchResponse {
                status: 200,
                content_type: Some(content_type.to_string()),
                body: body.to_string(),
            },
        );
        self
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.page(url, "text/html; charset=utf-8", body)
    }

    pub fn rss(self, url: &str, body: &str) -> Self {
        self.page(url, "application/rss+xml", body)
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.fail.push(url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpFetch for StubWeb {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(url.to_string());
        if self.fail.iter().any(|f| f == url) {
            return Err(FetchError::Parse(format!("simulated network failure for {url}")));
        }
        Ok(self.pages.get(url).cloned().unwrap_or(FetchResponse {
            status: 404,
            content_type: Some("text/html".into()),
            body: "not found".into(),
        }))
    }
}

/// Config without politeness delay, for the given sites.
pub fn test_config(sites: &[&str]) -> RadarConfig {
    RadarConfig {
        sites: sites.iter().map(|s| s.to_string()).collect(),
        site_delay_ms: 0,
        ..RadarConfig::default()
    }
}

pub fn home_with_feed_link(feed_href: &str) -> String {
    format!(
        r#"<html><head><link rel="alternate" type="application/rss+xml" href="{feed_href}"></head><body><p>Accueil</p></body></html>"#
    )
}
