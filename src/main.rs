mod config;
mod engine;
mod error;
mod fetcher;
mod report;
mod scorer;
mod types;

use chrono::Utc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::engine::SignalEngine;
use crate::error::Result;
use crate::fetcher::fetch_pair;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let engine = SignalEngine::new(cfg.variant, cfg.engine)?;
    let lookback = engine.config().lookback;
    let thresholds = engine.config().thresholds;
    info!(
        variant = %engine.variant(),
        symbol_a = %cfg.symbol_a,
        symbol_b = %cfg.symbol_b,
        "windows: momentum {}/{} trend {}/{} spread {} | thresholds: up>={} down<={}",
        lookback.momentum_short,
        lookback.momentum_long,
        lookback.trend_short,
        lookback.trend_long,
        lookback.spread_window,
        thresholds.upper_prob,
        thresholds.lower_prob,
    );

    let (series_a, series_b) = fetch_pair(&cfg).await?;

    // Any failure above or here aborts before the report file is touched.
    let result = engine.run(&series_a, &series_b)?;
    debug!(result = %serde_json::to_string(&result)?, "score result");

    let text = report::render(&result, Utc::now());
    report::write_report(&cfg.output_path, &text).await?;

    Ok(())
}
