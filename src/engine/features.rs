use std::collections::BTreeMap;

use tracing::debug;

use crate::engine::rolling::RollingWindow;
use crate::error::{AppError, Result};
use crate::types::{FeatureRow, FeatureSpec, PriceSeries, SeriesFeatures};

/// Standard deviations at or below this are treated as zero; the z-score for
/// that row is undefined and the row is dropped.
const MIN_SPREAD_STD: f64 = 1e-12;

/// Rolling state for one close series, fed one observation per row.
struct SeriesState {
    prev: Option<f64>,
    /// window → last `window + 1` closes; the oldest is `close[t - window]`.
    lags: BTreeMap<usize, RollingWindow>,
    /// window → trailing `window` closes for the SMA.
    smas: BTreeMap<usize, RollingWindow>,
}

impl SeriesState {
    fn new(spec: &FeatureSpec) -> Self {
        Self {
            prev: None,
            lags: spec
                .momentum
                .iter()
                .map(|&n| (n, RollingWindow::new(n + 1)))
                .collect(),
            smas: spec
                .trend
                .iter()
                .map(|&n| (n, RollingWindow::new(n)))
                .collect(),
        }
    }

    /// Advance by one close. Returns `None` while any feature is warming up.
    fn next(&mut self, close: f64) -> Option<SeriesFeatures> {
        let ret = self.prev.and_then(|p| finite(close / p - 1.0));
        self.prev = Some(close);

        let mut momentum = BTreeMap::new();
        let mut complete = ret.is_some();
        for (&n, window) in self.lags.iter_mut() {
            window.push(close);
            let base = if window.is_full() { window.oldest() } else { None };
            match base.and_then(|base| finite(close / base - 1.0)) {
                Some(m) => {
                    momentum.insert(n, m);
                }
                None => complete = false,
            }
        }

        let mut trend = BTreeMap::new();
        for (&n, window) in self.smas.iter_mut() {
            window.push(close);
            match window.mean() {
                Some(mean) => {
                    trend.insert(n, close > mean);
                }
                None => complete = false,
            }
        }

        if !complete {
            return None;
        }
        Some(SeriesFeatures {
            close,
            ret: ret?,
            momentum,
            trend,
        })
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Derive one feature row per aligned date, keeping only rows where every
/// feature in `spec` is defined.
///
/// Each rolling statistic is maintained incrementally in a ring buffer, so
/// the whole pass is linear in the series length.
pub fn derive_features(series: &PriceSeries, spec: &FeatureSpec) -> Result<Vec<FeatureRow>> {
    let points = series.points();
    let mut state_a = SeriesState::new(spec);
    let mut state_b = SeriesState::new(spec);
    let mut spread_window = spec.spread_z.map(RollingWindow::new);

    let mut rows = Vec::with_capacity(points.len().saturating_sub(spec.required_rows()) + 1);
    let mut zero_std_rows = 0usize;

    for (i, point) in points.iter().enumerate() {
        // Every buffer must see every observation, so advance all of them
        // before deciding whether the row survives.
        let a = state_a.next(point.close_a);
        let b = state_b.next(point.close_b);
        let spread = point.close_a - point.close_b;

        // Outer None: z-score still undefined for this row. Some(None): not requested.
        let spread_z = match spread_window.as_mut() {
            Some(window) => {
                window.push(spread);
                match (window.mean(), window.sample_std()) {
                    (Some(mean), Some(std)) if std > MIN_SPREAD_STD => {
                        finite((spread - mean) / std).map(Some)
                    }
                    (Some(_), Some(_)) => {
                        zero_std_rows += 1;
                        None
                    }
                    _ => None,
                }
            }
            None => Some(None),
        };

        let (Some(a), Some(b), Some(spread_z)) = (a, b, spread_z) else {
            continue;
        };

        let target = points.get(i + 1).map(|next| next.close_a > point.close_a);
        rows.push(FeatureRow {
            date: point.date,
            a,
            b,
            spread,
            spread_z,
            target,
        });
    }

    debug!(
        aligned = points.len(),
        rows = rows.len(),
        zero_std_rows,
        "derived feature rows"
    );

    if rows.is_empty() {
        return Err(AppError::InsufficientHistory {
            required: spec.required_rows(),
            available: points.len(),
        });
    }
    Ok(rows)
}
