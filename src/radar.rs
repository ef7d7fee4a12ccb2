//! # Radar pipeline
//!
//! Orchestrates aggregation → extraction behind a single-slot TTL cache.
//!
//! - `run(false)` serves the cached result while it is younger than the TTL.
//! - `run(true)` always re-executes and overwrites the slot.
//! - Runs are single-flight: a caller racing an in-progress run waits for it and
//!   then sees the fresh slot instead of repeating the network and oracle calls.
//!
//! Only [`RadarError::Configuration`] escapes; fetch and oracle failures shrink
//! the result instead.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::analyze::ai_adapter::OracleSource;
use crate::analyze::alert::Alert;
use crate::analyze::extract::AlertExtractor;
use crate::config::RadarConfig;
use crate::error::RadarError;
use crate::geo::GeoClassifier;
use crate::ingest::fetch::ReqwestFetcher;
use crate::ingest::types::{HttpFetch, NewsItem};
use crate::ingest;
use crate::locations::LocationRegistry;
use crate::map::{render_placeholder_html, MapRenderer};

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarResult {
    pub generated_at: DateTime<Utc>,
    pub news_count: usize,
    pub alerts: Vec<Alert>,
    /// Distinct contributing sites, sorted.
    pub sources: Vec<String>,
}

impl RadarResult {
    pub fn assemble(news: &[NewsItem], alerts: Vec<Alert>) -> Self {
        let sources: BTreeSet<&str> = news
            .iter()
            .map(|n| n.source.as_str())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            generated_at: Utc::now(),
            news_count: news.len(),
            alerts,
            sources: sources.into_iter().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Empty,
    Fresh,
    Stale,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    populated_at: Instant,
    result: RadarResult,
}

/// The single cache slot. Overwritten in place, never appended.
#[derive(Debug, Clone, Default)]
pub struct CacheSlot {
    entry: Option<CacheEntry>,
}

impl CacheSlot {
    /// Staleness is computed, not stored: `now - populated_at >= ttl`.
    pub fn status_at(&self, now: Instant, ttl: Duration) -> CacheStatus {
        match &self.entry {
            None => CacheStatus::Empty,
            Some(e) if now.saturating_duration_since(e.populated_at) >= ttl => CacheStatus::Stale,
            Some(_) => CacheStatus::Fresh,
        }
    }

    pub fn store(&mut self, populated_at: Instant, result: RadarResult) {
        self.entry = Some(CacheEntry {
            populated_at,
            result,
        });
    }

    pub fn result(&self) -> Option<&RadarResult> {
        self.entry.as_ref().map(|e| &e.result)
    }

    pub fn is_populated(&self) -> bool {
        self.entry.is_some()
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("radar_runs_total", "Full pipeline executions (cache misses).");
        describe_counter!("radar_cache_hits_total", "Runs served from the cache slot.");
    });
}

pub struct Radar {
    config: RadarConfig,
    fetcher: Arc<dyn HttpFetch>,
    oracle: OracleSource,
    classifier: GeoClassifier,
    registry: LocationRegistry,
    renderer: MapRenderer,
    slot: RwLock<CacheSlot>,
    flight: tokio::sync::Mutex<()>,
}

impl Radar {
    pub fn new(config: RadarConfig, fetcher: Arc<dyn HttpFetch>, oracle: OracleSource) -> Self {
        Self {
            config,
            fetcher,
            oracle,
            classifier: GeoClassifier::default_country().clone(),
            registry: LocationRegistry::builtin(),
            renderer: MapRenderer::default(),
            slot: RwLock::new(CacheSlot::default()),
            flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Production wiring: reqwest fetcher, Groq oracle built from the environment per run.
    pub fn from_config(config: RadarConfig) -> Result<Self, RadarError> {
        let fetcher = ReqwestFetcher::new()
            .map_err(|e| RadarError::Configuration(format!("building http client: {e}")))?;
        let oracle = OracleSource::FromEnv(config.oracle.clone());
        Ok(Self::new(config, Arc::new(fetcher), oracle))
    }

    pub fn with_classifier(mut self, classifier: GeoClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_renderer(mut self, renderer: MapRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    /// Run with the configured TTL.
    pub async fn run(&self, refresh: bool) -> Result<RadarResult, RadarError> {
        self.run_with_ttl(refresh, self.config.cache_ttl()).await
    }

    pub async fn run_with_ttl(&self, refresh: bool, ttl: Duration) -> Result<RadarResult, RadarError> {
        ensure_metrics_described();

        if !refresh {
            if let Some(hit) = self.fresh_result(ttl) {
                counter!("radar_cache_hits_total").increment(1);
                return Ok(hit);
            }
        }

        let _flight = self.flight.lock().await;

        // Another caller may have populated the slot while we waited.
        if !refresh {
            if let Some(hit) = self.fresh_result(ttl) {
                counter!("radar_cache_hits_total").increment(1);
                tracing::debug!(target: "radar", "served result produced by a concurrent run");
                return Ok(hit);
            }
        }

        let started = Instant::now();
        let oracle = self.oracle.resolve()?;

        let news = ingest::aggregate(self.fetcher.as_ref(), &self.config, &self.classifier).await;
        let alerts = AlertExtractor::new(&self.classifier, &self.registry)
            .extract(oracle.as_ref(), &news)
            .await;
        let result = RadarResult::assemble(&news, alerts);

        self.write_slot().store(started, result.clone());
        counter!("radar_runs_total").increment(1);
        tracing::info!(
            target: "radar",
            refresh,
            news = result.news_count,
            alerts = result.alerts.len(),
            sources = result.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "radar run finished"
        );
        Ok(result)
    }

    /// Is the slot populated (fresh or stale)?
    pub fn has_cached_result(&self) -> bool {
        self.read_slot().is_populated()
    }

    pub fn get_cached_result(&self) -> Option<RadarResult> {
        self.read_slot().result().cloned()
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.read_slot()
            .status_at(Instant::now(), self.config.cache_ttl())
    }

    /// Map page: placeholder when nothing was ever computed and no refresh is asked.
    pub async fn map_html(&self, refresh: bool) -> Result<String, RadarError> {
        if !refresh && !self.has_cached_result() {
            return Ok(render_placeholder_html());
        }
        let result = self.run(refresh).await?;
        Ok(self.render_map_html(&result.alerts))
    }

    pub fn render_map_html(&self, alerts: &[Alert]) -> String {
        self.renderer.render(alerts, &mut rand::rng())
    }

    fn fresh_result(&self, ttl: Duration) -> Option<RadarResult> {
        let slot = self.read_slot();
        match slot.status_at(Instant::now(), ttl) {
            CacheStatus::Fresh => slot.result().cloned(),
            CacheStatus::Empty | CacheStatus::Stale => None,
        }
    }

    fn read_slot(&self) -> std::sync::RwLockReadGuard<'_, CacheSlot> {
        self.slot.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_slot(&self) -> std::sync::RwLockWriteGuard<'_, CacheSlot> {
        self.slot.write().unwrap_or_else(|p| p.into_inner())
    }
}
