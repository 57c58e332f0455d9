use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, Utc};

use crate::model::{BallKind, PredictionResult, Strategy};
use crate::view::{ball_label, model_info_lines};

pub fn prediction_report_text(
    result: &PredictionResult,
    strategy: Strategy,
    generated_at: &str,
) -> String {
    let rule = "=".repeat(50);
    let mut lines = vec![
        rule.clone(),
        "Lottery prediction lab - prediction report".to_string(),
        rule.clone(),
        format!("Generated: {generated_at}"),
        format!("Strategy: {}", strategy.label()),
    ];
    if let Some(source) = &result.data_source {
        lines.push(format!("Data source: {source}"));
    }
    lines.push(String::new());
    for line in model_info_lines(result, None) {
        lines.push(line);
    }
    lines.push(String::new());

    for (kind, title) in [(BallKind::Red, "Red balls:"), (BallKind::Blue, "Blue balls:")] {
        lines.push(title.to_string());
        for (i, &number) in result.balls(kind).iter().enumerate() {
            let mut line = format!("  {}. {}", i + 1, ball_label(number));
            if let Some(detail) = result.detail_for(kind, number) {
                if let Some(reason) = &detail.reason {
                    line.push_str(&format!(" - {reason}"));
                }
                if let Some(p) = detail.probability {
                    line.push_str(&format!(" ({:.2}%)", p * 100.0));
                }
            }
            lines.push(line);
        }
        lines.push(String::new());
    }

    lines.push(rule.clone());
    lines.push("Disclaimer".to_string());
    lines.push(rule);
    lines.push("Based on historical statistics only; it cannot improve your odds.".to_string());
    lines.push("Draws are random events. Play responsibly.".to_string());
    lines.push(String::new());
    lines.join("\n")
}

/// Writes the report to `dir/prediction_<millis>.txt`.
pub fn export_prediction(dir: &Path, result: &PredictionResult, strategy: Strategy) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create export dir {}", dir.display()))?;
    let path = dir.join(format!("prediction_{}.txt", Utc::now().timestamp_millis()));
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let text = prediction_report_text(result, strategy, &generated_at);
    fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
