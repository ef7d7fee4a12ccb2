// src/lib.rs
// Public library surface for the binary, integration tests and embedding services.

pub mod analyze;
pub mod config;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod ingest;
pub mod locations;
pub mod map;
pub mod radar;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{Alert, AlertType, Severity};
pub use crate::config::RadarConfig;
pub use crate::error::{FetchError, OracleError, RadarError};
pub use crate::ingest::types::NewsItem;
pub use crate::map::render_map_html;
pub use crate::radar::{CacheStatus, Radar, RadarResult};
