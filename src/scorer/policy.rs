use crate::config::{
    momentum_weights, spread_weights, EngineConfig, Thresholds, BASE_PROBABILITY,
};
use crate::scorer::classifier::{classify_directional, classify_trend_filtered};
use crate::types::{FeatureRow, FeatureSpec, ScoreResult, Signal, Variant};

/// Signal label plus any policy-specific flag reported alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub signal: Signal,
    pub trend_ok: Option<bool>,
}

/// A pure scoring rule over a single feature row.
///
/// Implementations must be deterministic: the same row always produces the
/// same probability and decision.
pub trait ScoringPolicy: Send + Sync {
    fn variant(&self) -> Variant;

    /// Rolling features this policy reads from each row.
    fn feature_spec(&self) -> FeatureSpec;

    /// Probability of an up move, already clamped to [0, 1].
    fn probability_up(&self, row: &FeatureRow) -> f64;

    fn decide(&self, probability_up: f64, row: &FeatureRow) -> Decision;

    /// Whether the spread is part of this policy's output record.
    fn reports_spread(&self) -> bool {
        false
    }

    fn score(&self, row: &FeatureRow) -> ScoreResult {
        let probability_up = self.probability_up(row);
        let probability_down = 1.0 - probability_up;
        let decision = self.decide(probability_up, row);

        ScoreResult {
            variant: self.variant(),
            date: row.date,
            close_a: row.a.close,
            close_b: row.b.close,
            spread: self.reports_spread().then_some(row.spread),
            probability_up,
            probability_down,
            signal: decision.signal,
            trend_ok: decision.trend_ok,
        }
    }
}

/// Build the policy selected by `variant`, reading its windows and
/// thresholds from `cfg`.
pub fn policy_for(variant: Variant, cfg: &EngineConfig) -> Box<dyn ScoringPolicy> {
    match variant {
        Variant::Spread => Box::new(SpreadPolicy::new(cfg)),
        Variant::Momentum => Box::new(MomentumPolicy::new(cfg)),
    }
}

// ---------------------------------------------------------------------------
// Spread policy
// ---------------------------------------------------------------------------

/// Both series above their short SMA, nudged by how stretched the spread is.
#[derive(Debug, Clone)]
pub struct SpreadPolicy {
    trend_window: usize,
    spread_window: usize,
    thresholds: Thresholds,
}

impl SpreadPolicy {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            trend_window: cfg.lookback.trend_short,
            spread_window: cfg.lookback.spread_window,
            thresholds: cfg.thresholds,
        }
    }
}

impl ScoringPolicy for SpreadPolicy {
    fn variant(&self) -> Variant {
        Variant::Spread
    }

    fn feature_spec(&self) -> FeatureSpec {
        FeatureSpec {
            trend: [self.trend_window].into_iter().collect(),
            spread_z: Some(self.spread_window),
            ..FeatureSpec::default()
        }
    }

    fn probability_up(&self, row: &FeatureRow) -> f64 {
        use spread_weights::*;

        let mut p = BASE_PROBABILITY;
        let both_trending = row.a.trend(self.trend_window) == Some(true)
            && row.b.trend(self.trend_window) == Some(true);
        if both_trending {
            p += TREND_AGREEMENT;
        }

        match row.spread_z {
            Some(z) if z > SPREAD_Z_TRIGGER => p += SPREAD_Z,
            Some(z) if z < -SPREAD_Z_TRIGGER => p -= SPREAD_Z,
            _ => {}
        }
        p.clamp(0.0, 1.0)
    }

    fn decide(&self, probability_up: f64, _row: &FeatureRow) -> Decision {
        Decision {
            signal: classify_directional(probability_up, &self.thresholds),
            trend_ok: None,
        }
    }

    fn reports_spread(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Momentum policy
// ---------------------------------------------------------------------------

/// Momentum and trend votes on series A, gated by a long-term trend filter.
#[derive(Debug, Clone)]
pub struct MomentumPolicy {
    momentum_short: usize,
    momentum_long: usize,
    trend_short: usize,
    trend_long: usize,
    thresholds: Thresholds,
}

impl MomentumPolicy {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            momentum_short: cfg.lookback.momentum_short,
            momentum_long: cfg.lookback.momentum_long,
            trend_short: cfg.lookback.trend_short,
            trend_long: cfg.lookback.trend_long,
            thresholds: cfg.thresholds,
        }
    }

    fn trend_ok(&self, row: &FeatureRow) -> bool {
        row.a.trend(self.trend_short) == Some(true) && row.a.trend(self.trend_long) == Some(true)
    }
}

impl ScoringPolicy for MomentumPolicy {
    fn variant(&self) -> Variant {
        Variant::Momentum
    }

    fn feature_spec(&self) -> FeatureSpec {
        FeatureSpec {
            momentum: [self.momentum_short, self.momentum_long].into_iter().collect(),
            trend: [self.trend_short, self.trend_long].into_iter().collect(),
            spread_z: None,
        }
    }

    fn probability_up(&self, row: &FeatureRow) -> f64 {
        let votes = [
            row.a.momentum(self.momentum_short).is_some_and(|m| m > 0.0),
            row.a.momentum(self.momentum_long).is_some_and(|m| m > 0.0),
            row.a.trend(self.trend_short) == Some(true),
            row.a.trend(self.trend_long) == Some(true),
        ];

        let p = votes
            .iter()
            .filter(|&&v| v)
            .fold(BASE_PROBABILITY, |p, _| p + momentum_weights::CONDITION);
        p.clamp(0.0, 1.0)
    }

    fn decide(&self, probability_up: f64, row: &FeatureRow) -> Decision {
        let trend_ok = self.trend_ok(row);
        Decision {
            signal: classify_trend_filtered(
                probability_up,
                1.0 - probability_up,
                trend_ok,
                &self.thresholds,
            ),
            trend_ok: Some(trend_ok),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeriesFeatures;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn side(close: f64, momentum: &[(usize, f64)], trend: &[(usize, bool)]) -> SeriesFeatures {
        SeriesFeatures {
            close,
            ret: 0.0,
            momentum: momentum.iter().copied().collect::<BTreeMap<_, _>>(),
            trend: trend.iter().copied().collect::<BTreeMap<_, _>>(),
        }
    }

    fn row(a: SeriesFeatures, b: SeriesFeatures, spread_z: Option<f64>) -> FeatureRow {
        FeatureRow {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            spread: a.close - b.close,
            a,
            b,
            spread_z,
            target: None,
        }
    }

    fn spread_policy() -> SpreadPolicy {
        SpreadPolicy::new(&EngineConfig::for_variant(Variant::Spread))
    }

    fn momentum_policy() -> MomentumPolicy {
        MomentumPolicy::new(&EngineConfig::for_variant(Variant::Momentum))
    }

    #[test]
    fn spread_trend_agreement_and_wide_spread_is_up() {
        let r = row(
            side(82.0, &[], &[(20, true)]),
            side(78.0, &[], &[(20, true)]),
            Some(0.8),
        );
        let result = spread_policy().score(&r);
        assert!((result.probability_up - 0.60).abs() < 1e-9);
        assert_eq!(result.signal, Signal::Up);
        assert_eq!(result.spread, Some(4.0));
        assert_eq!(result.trend_ok, None);
    }

    #[test]
    fn spread_trend_only_reaches_upper_threshold() {
        let r = row(
            side(82.0, &[], &[(20, true)]),
            side(78.0, &[], &[(20, true)]),
            Some(0.1),
        );
        let result = spread_policy().score(&r);
        assert!((result.probability_up - 0.57).abs() < 1e-9);
        assert_eq!(result.signal, Signal::Up);
    }

    #[test]
    fn spread_disagreeing_trends_and_narrow_spread_is_no_trade() {
        let r = row(
            side(82.0, &[], &[(20, true)]),
            side(78.0, &[], &[(20, false)]),
            Some(-0.9),
        );
        let result = spread_policy().score(&r);
        assert!((result.probability_up - 0.47).abs() < 1e-9);
        assert_eq!(result.signal, Signal::NoTrade);
    }

    #[test]
    fn spread_z_at_trigger_does_not_move_probability() {
        let r = row(
            side(82.0, &[], &[(20, false)]),
            side(78.0, &[], &[(20, false)]),
            Some(0.5),
        );
        assert_eq!(spread_policy().probability_up(&r), 0.50);
    }

    #[test]
    fn probability_down_is_complement() {
        let r = row(
            side(82.0, &[], &[(20, true)]),
            side(78.0, &[], &[(20, true)]),
            Some(-2.0),
        );
        let result = spread_policy().score(&r);
        assert_eq!(result.probability_down, 1.0 - result.probability_up);
        assert!((0.0..=1.0).contains(&result.probability_up));
    }

    #[test]
    fn momentum_mixed_votes_without_trend_ok_is_no_trade() {
        let r = row(
            side(80.0, &[(5, -0.01), (20, 0.02)], &[(50, false), (200, true)]),
            side(76.0, &[], &[]),
            None,
        );
        let result = momentum_policy().score(&r);
        assert!((result.probability_up - 0.60).abs() < 1e-9);
        assert!((result.probability_down - 0.40).abs() < 1e-9);
        assert_eq!(result.trend_ok, Some(false));
        assert_eq!(result.signal, Signal::NoTrade);
        assert_eq!(result.spread, None);
    }

    #[test]
    fn momentum_all_votes_with_trend_ok_is_long() {
        let r = row(
            side(80.0, &[(5, 0.01), (20, 0.03)], &[(50, true), (200, true)]),
            side(76.0, &[], &[]),
            None,
        );
        let result = momentum_policy().score(&r);
        assert!((result.probability_up - 0.70).abs() < 1e-9);
        assert_eq!(result.trend_ok, Some(true));
        assert_eq!(result.signal, Signal::Long);
    }

    #[test]
    fn momentum_no_votes_is_base_and_flat() {
        let r = row(
            side(80.0, &[(5, -0.01), (20, -0.03)], &[(50, false), (200, false)]),
            side(76.0, &[], &[]),
            None,
        );
        let result = momentum_policy().score(&r);
        assert_eq!(result.probability_up, 0.50);
        assert_eq!(result.signal, Signal::NoTrade);
    }

    #[test]
    fn short_fires_when_probability_down_reaches_threshold() {
        let mut cfg = EngineConfig::for_variant(Variant::Momentum);
        cfg.thresholds.upper_prob = 0.50;
        let policy = MomentumPolicy::new(&cfg);
        let r = row(
            side(80.0, &[(5, -0.01), (20, -0.03)], &[(50, false), (200, false)]),
            side(76.0, &[], &[]),
            None,
        );
        assert_eq!(policy.score(&r).signal, Signal::Short);
    }

    #[test]
    fn feature_specs_follow_config() {
        let spread = spread_policy().feature_spec();
        assert_eq!(spread.spread_z, Some(60));
        assert!(spread.trend.contains(&20));
        assert!(spread.momentum.is_empty());

        let momentum = momentum_policy().feature_spec();
        assert_eq!(momentum.required_rows(), 200);
        assert_eq!(momentum.spread_z, None);
    }

    #[test]
    fn policy_for_selects_variant() {
        let cfg = EngineConfig::for_variant(Variant::Momentum);
        assert_eq!(policy_for(Variant::Momentum, &cfg).variant(), Variant::Momentum);
        assert_eq!(policy_for(Variant::Spread, &cfg).variant(), Variant::Spread);
    }
}
