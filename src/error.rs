// src/error.rs
//! Error taxonomy for the radar pipeline.
//!
//! Only [`RadarError`] ever leaves [`crate::radar::Radar::run`]. Fetch and oracle
//! failures are downgraded to partial or empty results by the layer that owns them.

use thiserror::Error;

/// Network or parse failure while talking to one news site.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("http client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("invalid url {0}")]
    Url(String),

    #[error("feed parse error: {0}")]
    Parse(String),
}

/// Failure of the language-model oracle or of its output.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("oracle returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("oracle returned an empty response")]
    EmptyResponse,

    #[error("oracle response is not valid alert JSON: {reason}")]
    Parse { reason: String, raw_prefix: String },
}

/// Errors surfaced to callers of the pipeline.
#[derive(Debug, Error)]
pub enum RadarError {
    /// Missing credential or unusable oracle settings. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),
}
