// src/ingest/types.rs
use std::time::Duration;

use crate::error::FetchError;

/// One aggregated headline. Lives for a single pipeline run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub summary: String, // <= 200 chars
    pub date: String,    // as published by the source, or "Récent"
    pub link: String,
    pub source: String, // site root the item came from
}

/// Raw HTTP answer handed to the feed/HTML parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// XML-ish payload: declared by content type or by the prolog.
    pub fn looks_like_xml(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("xml"))
            || self.body.trim_start().starts_with("<?xml")
    }
}

/// HTTP GET capability with a per-call timeout.
#[async_trait::async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError>;
}
