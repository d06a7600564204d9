use crate::config::Thresholds;
use crate::types::Signal;

/// Two-sided classification on probability-up alone. Both bounds are closed.
pub fn classify_directional(probability_up: f64, t: &Thresholds) -> Signal {
    if probability_up >= t.upper_prob {
        Signal::Up
    } else if probability_up <= t.lower_prob {
        Signal::Down
    } else {
        Signal::NoTrade
    }
}

/// Trend-gated classification: a long needs the trend filter to agree, a
/// short needs it to disagree. Anything else stays flat.
pub fn classify_trend_filtered(
    probability_up: f64,
    probability_down: f64,
    trend_ok: bool,
    t: &Thresholds,
) -> Signal {
    if probability_up >= t.upper_prob && trend_ok {
        Signal::Long
    } else if probability_down >= t.upper_prob && !trend_ok {
        Signal::Short
    } else {
        Signal::NoTrade
    }
}
