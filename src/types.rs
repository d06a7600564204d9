use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw date → close mapping for a single symbol, as delivered by the fetcher.
/// Keyed by calendar date, so duplicates collapse and iteration is ascending.
pub type RawSeries = BTreeMap<NaiveDate, f64>;

// ---------------------------------------------------------------------------
// Aligned prices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close_a: f64,
    pub close_b: f64,
}

/// Inner-joined pair of close series. Dates strictly increasing, every value finite.
/// Only constructed through `SignalEngine::align_series`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub(crate) fn from_sorted(points: Vec<PricePoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// Which scoring policy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Two-series trend agreement plus Brent-WTI spread z-score.
    Spread,
    /// Single-series momentum and long/short trend filters.
    Momentum,
}

impl Variant {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "spread" | "a" | "code_a" => Some(Variant::Spread),
            "momentum" | "b" | "code_b" => Some(Variant::Momentum),
            _ => None,
        }
    }

    /// Heading used in the text report.
    pub fn report_label(&self) -> &'static str {
        match self {
            Variant::Spread => "CODE A",
            Variant::Momentum => "CODE B",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Variant::Spread => "spread",
            Variant::Momentum => "momentum",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// Which rolling features a scoring policy reads. Derivation computes exactly
/// these and drops rows where any of them is still warming up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSpec {
    pub momentum: BTreeSet<usize>,
    pub trend: BTreeSet<usize>,
    pub spread_z: Option<usize>,
}

impl FeatureSpec {
    /// Number of aligned rows needed before the first fully populated row.
    pub fn required_rows(&self) -> usize {
        let momentum = self.momentum.iter().max().map(|n| n + 1).unwrap_or(0);
        let trend = self.trend.iter().max().copied().unwrap_or(0);
        let spread = self.spread_z.unwrap_or(0);
        // The percent return always needs a previous row.
        momentum.max(trend).max(spread).max(2)
    }
}

/// Per-series derived values for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFeatures {
    pub close: f64,
    /// `close[t] / close[t-1] - 1`.
    pub ret: f64,
    /// window → `close[t] / close[t-window] - 1`.
    pub momentum: BTreeMap<usize, f64>,
    /// window → `close[t] > SMA(close, window)[t]`.
    pub trend: BTreeMap<usize, bool>,
}

impl SeriesFeatures {
    pub fn momentum(&self, window: usize) -> Option<f64> {
        self.momentum.get(&window).copied()
    }

    pub fn trend(&self, window: usize) -> Option<bool> {
        self.trend.get(&window).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub a: SeriesFeatures,
    pub b: SeriesFeatures,
    /// `close_a - close_b`.
    pub spread: f64,
    /// Present when the active policy requests it.
    pub spread_z: Option<f64>,
    /// Whether series A closes higher on the next row. `None` on the last row.
    /// Diagnostic only; never read by scoring.
    pub target: Option<bool>,
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Up,
    Down,
    Long,
    Short,
    NoTrade,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Signal::Up => "UP",
            Signal::Down => "DOWN",
            Signal::Long => "LONG",
            Signal::Short => "SHORT",
            Signal::NoTrade => "NO_TRADE",
        };
        write!(f, "{s}")
    }
}

/// Final record for the most recent date. Handed to the report writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub variant: Variant,
    pub date: NaiveDate,
    pub close_a: f64,
    pub close_b: f64,
    /// Spread variant only.
    pub spread: Option<f64>,
    pub probability_up: f64,
    pub probability_down: f64,
    pub signal: Signal,
    /// Momentum variant only.
    pub trend_ok: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_parse_accepts_aliases() {
        assert_eq!(Variant::parse("Spread"), Some(Variant::Spread));
        assert_eq!(Variant::parse(" code_b "), Some(Variant::Momentum));
        assert_eq!(Variant::parse("macd"), None);
    }

    #[test]
    fn required_rows_covers_longest_lookback() {
        let spec = FeatureSpec {
            momentum: [5, 20].into_iter().collect(),
            trend: [50, 200].into_iter().collect(),
            spread_z: None,
        };
        assert_eq!(spec.required_rows(), 200);

        let spec = FeatureSpec {
            momentum: [5].into_iter().collect(),
            trend: BTreeSet::new(),
            spread_z: None,
        };
        assert_eq!(spec.required_rows(), 6);
    }

    #[test]
    fn signal_serializes_as_label() {
        let json = serde_json::to_string(&Signal::NoTrade).unwrap();
        assert_eq!(json, "\"NO_TRADE\"");
        assert_eq!(Signal::NoTrade.to_string(), "NO_TRADE");
    }
}
