use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{Config, FETCH_TIMEOUT_SECS, USER_AGENT};
use crate::error::{AppError, Result};
use crate::types::RawSeries;

pub fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Download daily closes for both configured symbols concurrently.
/// Either download failing, or returning no closes, aborts the run.
pub async fn fetch_pair(cfg: &Config) -> Result<(RawSeries, RawSeries)> {
    let client = build_client()?;
    tokio::try_join!(
        fetch_closes(&client, cfg, &cfg.symbol_a),
        fetch_closes(&client, cfg, &cfg.symbol_b),
    )
}

/// Fetch daily closes for `symbol` from `cfg.start_date` up to now.
pub async fn fetch_closes(client: &reqwest::Client, cfg: &Config, symbol: &str) -> Result<RawSeries> {
    let period1 = cfg.start_date.and_time(NaiveTime::MIN).and_utc().timestamp();
    let period2 = Utc::now().timestamp();
    let url = format!(
        "{}/{}?period1={}&period2={}&interval=1d&events=history",
        cfg.chart_api_url.trim_end_matches('/'),
        symbol,
        period1,
        period2
    );

    info!(symbol, start = %cfg.start_date, "downloading daily closes");
    let resp: serde_json::Value = client.get(&url).send().await?.json().await?;

    let closes = parse_chart_closes(&resp, symbol)?;
    if closes.is_empty() {
        return Err(AppError::EmptyData(format!("{symbol}: data download failed (no closes)")));
    }

    info!(
        symbol,
        rows = closes.len(),
        first = ?closes.keys().next(),
        last = ?closes.keys().next_back(),
        "downloaded {} daily closes for {symbol}",
        closes.len(),
    );
    Ok(closes)
}

/// Extract `(exchange date → close)` from a chart endpoint payload.
///
/// Timestamps are shifted by `meta.gmtoffset` so a session that opens late
/// in UTC still lands on its exchange calendar date. Null closes (halted or
/// not-yet-settled sessions) are skipped.
pub fn parse_chart_closes(v: &serde_json::Value, symbol: &str) -> Result<RawSeries> {
    let chart = v
        .get("chart")
        .ok_or_else(|| AppError::Fetch(format!("{symbol}: response has no \"chart\" object")))?;

    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        let description = err
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown error");
        return Err(AppError::Fetch(format!("{symbol}: {description}")));
    }

    let Some(result) = chart
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|a| a.first())
    else {
        return Err(AppError::Fetch(format!("{symbol}: response has no chart result")));
    };

    let gmt_offset = result
        .get("meta")
        .and_then(|m| m.get("gmtoffset"))
        .and_then(|o| o.as_i64())
        .unwrap_or(0);

    // A symbol with no trading history comes back without a timestamp array.
    let timestamps = match result.get("timestamp").and_then(|t| t.as_array()) {
        Some(ts) => ts,
        None => return Ok(RawSeries::new()),
    };

    let closes = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.as_array())
        .and_then(|a| a.first())
        .and_then(|q| q.get("close"))
        .and_then(|c| c.as_array())
        .ok_or_else(|| AppError::Fetch(format!("{symbol}: response has no close prices")))?;

    if timestamps.len() != closes.len() {
        warn!(
            symbol,
            timestamps = timestamps.len(),
            closes = closes.len(),
            "timestamp/close length mismatch, pairing the common prefix"
        );
    }

    let mut series = RawSeries::new();
    let mut skipped = 0usize;
    for (ts, close) in timestamps.iter().zip(closes) {
        let date = ts
            .as_i64()
            .and_then(|t| DateTime::from_timestamp(t + gmt_offset, 0))
            .map(|dt| dt.date_naive());
        match (date, close.as_f64()) {
            (Some(date), Some(close)) if close.is_finite() => {
                series.insert(date, close);
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(symbol, skipped, "skipped rows without a usable close");
    }
    Ok(series)
}
