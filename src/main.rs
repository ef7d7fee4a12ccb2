//! Radar — Binary Entrypoint
//! Runs the pipeline once, prints the result as JSON and writes the map page.
//!
//! Usage: `country-radar [MAP_OUTPUT_PATH]` (default `radar_map.html`).

use anyhow::Context;
use country_radar::{Radar, RadarConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_MAP_PATH: &str = "radar_map.html";

/// Compact logs to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("country_radar=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let map_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_MAP_PATH.to_string());

    let config = RadarConfig::load_default().context("loading radar config")?;
    tracing::info!(
        sites = config.sites.len(),
        model = %config.oracle.model,
        "radar config loaded"
    );

    let radar = Radar::from_config(config)?;
    let result = radar.run(true).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("serializing radar result")?
    );

    let html = radar.render_map_html(&result.alerts);
    std::fs::write(&map_path, html).with_context(|| format!("writing map to {map_path}"))?;
    tracing::info!(path = %map_path, alerts = result.alerts.len(), "map written");

    Ok(())
}
