//! Oracle adapter: the language-model collaborator behind alert extraction.
//!
//! The pipeline only needs `invoke(system, user) -> text`. The production
//! provider talks to an OpenAI-compatible chat-completions endpoint (Groq);
//! tests and dry runs use [`StaticOracle`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OracleConfig;
use crate::error::{OracleError, RadarError};

/// Stateless text-in/text-out model call.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn invoke(&self, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError>;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynOracle = Arc<dyn Oracle>;

/// Chat-completions client. Requires the API key named in [`OracleConfig::api_key_env`].
pub struct GroqOracle {
    http: reqwest::Client,
    api_key: String,
    cfg: OracleConfig,
}

impl GroqOracle {
    /// Build from config; the credential is read from the environment here.
    pub fn from_config(cfg: &OracleConfig) -> Result<Self, RadarError> {
        let api_key = cfg.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .user_agent("country-radar/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|e| RadarError::Configuration(format!("building oracle http client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            cfg: cfg.clone(),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Oracle for GroqOracle {
    async fn invoke(&self, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError> {
        let req = ChatReq {
            model: &self.cfg.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system_prompt,
                },
                Msg {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.cfg.temperature,
            max_tokens: self.cfg.max_tokens,
        };

        let resp = self
            .http
            .post(&self.cfg.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: body.chars().take(400).collect(),
            });
        }

        let body: ChatResp = resp.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(OracleError::EmptyResponse)
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

/// Returns a fixed reply and counts invocations.
#[derive(Debug, Default)]
pub struct StaticOracle {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl StaticOracle {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with [`OracleError::EmptyResponse`].
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for StaticOracle {
    async fn invoke(&self, _system: &str, _user: &str) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().ok_or(OracleError::EmptyResponse)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Where the pipeline gets its oracle from on a cache miss.
#[derive(Clone)]
pub enum OracleSource {
    /// Build a [`GroqOracle`] per run, resolving the credential from the environment.
    FromEnv(OracleConfig),
    /// Use an already constructed oracle.
    Fixed(DynOracle),
}

impl OracleSource {
    pub fn resolve(&self) -> Result<DynOracle, RadarError> {
        match self {
            OracleSource::FromEnv(cfg) => Ok(Arc::new(GroqOracle::from_config(cfg)?)),
            OracleSource::Fixed(o) => Ok(Arc::clone(o)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_oracle_counts_calls() {
        let o = StaticOracle::replying("{}");
        assert_eq!(o.invoke("s", "u").await.unwrap(), "{}");
        assert_eq!(o.invoke("s", "u").await.unwrap(), "{}");
        assert_eq!(o.calls(), 2);
    }

    #[tokio::test]
    async fn failing_oracle_errors() {
        let o = StaticOracle::failing();
        assert!(matches!(o.invoke("s", "u").await, Err(OracleError::EmptyResponse)));
        assert_eq!(o.calls(), 1);
    }

    #[serial_test::serial]
    #[test]
    fn from_env_without_key_is_configuration_error() {
        let cfg = OracleConfig {
            api_key_env: "RADAR_TEST_ORACLE_KEY".into(),
            ..OracleConfig::default()
        };
        std::env::remove_var("RADAR_TEST_ORACLE_KEY");
        let src = OracleSource::FromEnv(cfg);
        assert!(matches!(src.resolve(), Err(RadarError::Configuration(_))));
    }

    #[test]
    fn fixed_source_shares_the_instance() {
        let o: DynOracle = Arc::new(StaticOracle::replying("x"));
        let src = OracleSource::Fixed(Arc::clone(&o));
        let got = src.resolve().unwrap();
        assert!(Arc::ptr_eq(&o, &got));
    }
}
