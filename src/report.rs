use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;
use crate::types::ScoreResult;

const RULE: &str = "===================================";

/// Render the fixed-width plain-text report for one scored run.
pub fn render(result: &ScoreResult, run_time: DateTime<Utc>) -> String {
    let mut lines = vec![
        RULE.to_string(),
        format!("   OIL FORECAST – {}", result.variant.report_label()),
        RULE.to_string(),
        format!("Run time (UTC): {}", run_time.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Data date     : {}", result.date.format("%Y-%m-%d")),
        String::new(),
        format!("Brent Close   : {:.2}", result.close_a),
        format!("WTI Close     : {:.2}", result.close_b),
    ];
    if let Some(spread) = result.spread {
        lines.push(format!("Brent-WTI Spr.: {spread:.2}"));
    }
    lines.push(String::new());
    lines.push(format!("Prob UP       : {:.2}%", result.probability_up * 100.0));
    lines.push(format!("Prob DOWN     : {:.2}%", result.probability_down * 100.0));
    if let Some(trend_ok) = result.trend_ok {
        lines.push(format!("Trend OK      : {}", if trend_ok { "yes" } else { "no" }));
    }
    lines.push(format!("Signal        : {}", result.signal));
    lines.push(RULE.to_string());

    lines.join("\n")
}

/// Overwrite `path` with the rendered report.
pub async fn write_report(path: &str, text: &str) -> Result<()> {
    tokio::fs::write(path, text).await?;
    info!(path, bytes = text.len(), "[OK] report written");
    Ok(())
}
