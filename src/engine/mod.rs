pub mod align;
pub mod features;
pub mod rolling;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{AppError, Result};
use crate::scorer::{policy_for, ScoringPolicy};
use crate::types::{FeatureRow, PriceSeries, RawSeries, ScoreResult, Variant};

/// Stateless transform from two raw close series to a single scored record.
///
/// Holds only its configuration and scoring policy, so one engine can be
/// run any number of times over different snapshots.
pub struct SignalEngine {
    config: EngineConfig,
    policy: Box<dyn ScoringPolicy>,
}

impl SignalEngine {
    pub fn new(variant: Variant, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            policy: policy_for(variant, &config),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn variant(&self) -> Variant {
        self.policy.variant()
    }

    pub fn align_series(series_a: &RawSeries, series_b: &RawSeries) -> Result<PriceSeries> {
        align::align_series(series_a, series_b)
    }

    pub fn derive_features(&self, series: &PriceSeries) -> Result<Vec<FeatureRow>> {
        features::derive_features(series, &self.policy.feature_spec())
    }

    pub fn score(&self, last_row: &FeatureRow) -> ScoreResult {
        self.policy.score(last_row)
    }

    /// Align, derive and score the most recent row.
    pub fn run(&self, series_a: &RawSeries, series_b: &RawSeries) -> Result<ScoreResult> {
        let series = Self::align_series(series_a, series_b)?;
        let rows = self.derive_features(&series)?;
        let last = rows.last().ok_or(AppError::InsufficientHistory {
            required: self.policy.feature_spec().required_rows(),
            available: series.len(),
        })?;
        debug!(
            aligned_from = ?series.first_date(),
            aligned_to = ?series.last_date(),
            first_row = %rows[0].date,
            last_row = %last.date,
            target = ?last.target,
            "scoring last feature row"
        );

        let result = self.score(last);
        info!(
            variant = %result.variant,
            date = %result.date,
            aligned_rows = series.len(),
            feature_rows = rows.len(),
            probability_up = result.probability_up,
            signal = %result.signal,
            "scored last feature row"
        );
        Ok(result)
    }
}
