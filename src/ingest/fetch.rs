// src/ingest/fetch.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};

use crate::error::FetchError;
use crate::ingest::types::{FetchResponse, HttpFetch};

/// Browser-like UA; several outlets reject unknown agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// `HttpFetch` backed by a shared reqwest client.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_user_agent(BROWSER_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError> {
        let http_err = |e| FetchError::Http {
            url: url.to_string(),
            source: e,
        };

        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(http_err)?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await.map_err(http_err)?;

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_builds() {
        assert!(ReqwestFetcher::new().is_ok());
    }

    #[test]
    fn bad_user_agent_is_a_client_error_without_url() {
        let err = match ReqwestFetcher::with_user_agent("radar\nbroken") {
            Err(e) => e,
            Ok(_) => panic!("header with a newline must be rejected"),
        };
        assert!(matches!(err, FetchError::Client(_)));
        let msg = err.to_string();
        assert!(msg.starts_with("http client setup failed"), "{msg}");
        assert!(!msg.contains("request to"));
    }
}
