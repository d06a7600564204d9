use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::types::Variant;

pub const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// First calendar date requested from the chart endpoint.
pub const START_DATE: &str = "2015-01-01";

/// Brent crude front-month future.
pub const SYMBOL_A: &str = "BZ=F";
/// WTI crude front-month future.
pub const SYMBOL_B: &str = "CL=F";

pub const SPREAD_OUTPUT_PATH: &str = "oil_forecast_output.txt";
pub const MOMENTUM_OUTPUT_PATH: &str = "oil_forecast_momentum_output.txt";

/// HTTP timeout for a single chart download (seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// The chart endpoint rejects requests without a browser-like agent.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) oil-forecast/0.1";

/// Longest lookback window accepted from configuration (rows).
pub const MAX_LOOKBACK: usize = 10_000;

/// Probability every policy starts from before adjustments.
pub const BASE_PROBABILITY: f64 = 0.50;

/// Spread variant adjustments.
pub mod spread_weights {
    pub const TREND_AGREEMENT: f64 = 0.07;
    pub const SPREAD_Z: f64 = 0.03;
    /// |z| must exceed this before the spread moves the probability.
    pub const SPREAD_Z_TRIGGER: f64 = 0.5;
}

/// Momentum variant adjustments (each condition adds the same weight).
pub mod momentum_weights {
    pub const CONDITION: f64 = 0.05;
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindows {
    pub momentum_short: usize,
    pub momentum_long: usize,
    pub trend_short: usize,
    pub trend_long: usize,
    pub spread_window: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// `UP` / `LONG` when probability-up reaches this (inclusive).
    /// The momentum variant also emits `SHORT` when probability-down reaches it.
    pub upper_prob: f64,
    /// `DOWN` when probability-up falls to this (inclusive).
    pub lower_prob: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub lookback: LookbackWindows,
    pub thresholds: Thresholds,
}

impl EngineConfig {
    pub fn for_variant(variant: Variant) -> Self {
        let thresholds = Thresholds {
            upper_prob: 0.57,
            lower_prob: 0.43,
        };
        let lookback = match variant {
            Variant::Spread => LookbackWindows {
                momentum_short: 5,
                momentum_long: 20,
                trend_short: 20,
                trend_long: 200,
                spread_window: 60,
            },
            Variant::Momentum => LookbackWindows {
                momentum_short: 5,
                momentum_long: 20,
                trend_short: 50,
                trend_long: 200,
                spread_window: 60,
            },
        };
        Self { lookback, thresholds }
    }

    pub fn validate(&self) -> Result<()> {
        let l = &self.lookback;
        for (name, value) in [
            ("MOMENTUM_SHORT", l.momentum_short),
            ("MOMENTUM_LONG", l.momentum_long),
            ("TREND_SHORT", l.trend_short),
            ("TREND_LONG", l.trend_long),
        ] {
            if value == 0 {
                return Err(AppError::Config(format!("{name} must be at least 1")));
            }
            if value > MAX_LOOKBACK {
                return Err(AppError::Config(format!(
                    "{name} must not exceed {MAX_LOOKBACK}, got {value}"
                )));
            }
        }
        // Sample std needs two observations.
        if l.spread_window < 2 {
            return Err(AppError::Config("SPREAD_WINDOW must be at least 2".to_string()));
        }
        if l.spread_window > MAX_LOOKBACK {
            return Err(AppError::Config(format!(
                "SPREAD_WINDOW must not exceed {MAX_LOOKBACK}, got {}",
                l.spread_window
            )));
        }

        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.upper_prob) || !(0.0..=1.0).contains(&t.lower_prob) {
            return Err(AppError::Config(
                "UPPER_PROB and LOWER_PROB must lie in [0, 1]".to_string(),
            ));
        }
        if t.lower_prob > t.upper_prob {
            return Err(AppError::Config(format!(
                "LOWER_PROB ({}) must not exceed UPPER_PROB ({})",
                t.lower_prob, t.upper_prob
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Process configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub chart_api_url: String,
    pub log_level: String,
    pub start_date: NaiveDate,
    /// Series A symbol (SYMBOL_A), Brent by default.
    pub symbol_a: String,
    /// Series B symbol (SYMBOL_B), WTI by default.
    pub symbol_b: String,
    /// Scoring policy (SIGNAL_VARIANT): "spread" or "momentum".
    pub variant: Variant,
    /// Report file, overwritten each run (OUTPUT_PATH).
    pub output_path: String,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let variant = match std::env::var("SIGNAL_VARIANT") {
            Ok(v) => Variant::parse(&v).ok_or_else(|| {
                AppError::Config(format!(
                    "SIGNAL_VARIANT must be \"spread\" or \"momentum\", got {v:?}"
                ))
            })?,
            Err(_) => Variant::Spread,
        };

        let start_raw = std::env::var("START_DATE").unwrap_or_else(|_| START_DATE.to_string());
        let start_date = NaiveDate::parse_from_str(&start_raw, "%Y-%m-%d")
            .map_err(|_| AppError::Config(format!("START_DATE must be YYYY-MM-DD, got {start_raw:?}")))?;

        let default_output = match variant {
            Variant::Spread => SPREAD_OUTPUT_PATH,
            Variant::Momentum => MOMENTUM_OUTPUT_PATH,
        };

        let defaults = EngineConfig::for_variant(variant);
        let engine = EngineConfig {
            lookback: LookbackWindows {
                momentum_short: env_or("MOMENTUM_SHORT", defaults.lookback.momentum_short)?,
                momentum_long: env_or("MOMENTUM_LONG", defaults.lookback.momentum_long)?,
                trend_short: env_or("TREND_SHORT", defaults.lookback.trend_short)?,
                trend_long: env_or("TREND_LONG", defaults.lookback.trend_long)?,
                spread_window: env_or("SPREAD_WINDOW", defaults.lookback.spread_window)?,
            },
            thresholds: Thresholds {
                upper_prob: env_or("UPPER_PROB", defaults.thresholds.upper_prob)?,
                lower_prob: env_or("LOWER_PROB", defaults.thresholds.lower_prob)?,
            },
        };
        engine.validate()?;

        Ok(Self {
            chart_api_url: std::env::var("CHART_API_URL")
                .unwrap_or_else(|_| CHART_API_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            start_date,
            symbol_a: std::env::var("SYMBOL_A").unwrap_or_else(|_| SYMBOL_A.to_string()),
            symbol_b: std::env::var("SYMBOL_B").unwrap_or_else(|_| SYMBOL_B.to_string()),
            variant,
            output_path: std::env::var("OUTPUT_PATH")
                .unwrap_or_else(|_| default_output.to_string()),
            engine,
        })
    }
}

/// Reads `key` from the environment, falling back to `default` when unset.
/// A set but unparseable value is an error rather than a silent fallback.
fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw:?}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_defaults_match_observed_windows() {
        let spread = EngineConfig::for_variant(Variant::Spread);
        assert_eq!(spread.lookback.trend_short, 20);
        assert_eq!(spread.lookback.spread_window, 60);

        let momentum = EngineConfig::for_variant(Variant::Momentum);
        assert_eq!(momentum.lookback.momentum_short, 5);
        assert_eq!(momentum.lookback.momentum_long, 20);
        assert_eq!(momentum.lookback.trend_short, 50);
        assert_eq!(momentum.lookback.trend_long, 200);
        assert!(spread.validate().is_ok());
        assert!(momentum.validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let mut cfg = EngineConfig::for_variant(Variant::Momentum);
        cfg.lookback.trend_long = 0;
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn oversized_windows_are_rejected() {
        let mut cfg = EngineConfig::for_variant(Variant::Momentum);
        cfg.lookback.momentum_short = usize::MAX;
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));

        let mut cfg = EngineConfig::for_variant(Variant::Momentum);
        cfg.lookback.trend_long = MAX_LOOKBACK + 1;
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));

        let mut cfg = EngineConfig::for_variant(Variant::Spread);
        cfg.lookback.spread_window = MAX_LOOKBACK + 1;
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));

        let mut cfg = EngineConfig::for_variant(Variant::Spread);
        cfg.lookback.trend_short = MAX_LOOKBACK;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn spread_window_of_one_is_rejected() {
        let mut cfg = EngineConfig::for_variant(Variant::Spread);
        cfg.lookback.spread_window = 1;
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut cfg = EngineConfig::for_variant(Variant::Spread);
        cfg.thresholds.lower_prob = 0.60;
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));

        cfg.thresholds = Thresholds {
            upper_prob: 1.2,
            lower_prob: 0.4,
        };
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
    }
}
