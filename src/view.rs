//! Pure projections from fetched data to what the panels display.
//!
//! Nothing here touches the terminal; `ui.rs` in the binary turns these view
//! models into ratatui widgets.

use crate::model::{BallDetail, BallKind, HistoryEntry, PredictionLogEntry, PredictionResult, Strategy};

pub const NO_DATA: &str = "No data";
pub const MAX_HISTORY_ROWS: usize = 10;
pub const HISTORY_COLUMNS: [&str; 3] = ["Period", "Date", "Numbers"];

pub fn ball_label(number: u32) -> String {
    format!("{number:02}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallView {
    pub number: u32,
    pub label: String,
    pub kind: BallKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BallRow {
    Balls(Vec<BallView>),
    Empty,
}

impl BallRow {
    pub fn len(&self) -> usize {
        match self {
            BallRow::Balls(balls) => balls.len(),
            BallRow::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn labels(&self) -> Vec<&str> {
        match self {
            BallRow::Balls(balls) => balls.iter().map(|b| b.label.as_str()).collect(),
            BallRow::Empty => Vec::new(),
        }
    }
}

pub fn ball_views(balls: &[u32], kind: BallKind) -> BallRow {
    if balls.is_empty() {
        return BallRow::Empty;
    }
    BallRow::Balls(
        balls
            .iter()
            .map(|&number| BallView {
                number,
                label: ball_label(number),
                kind,
            })
            .collect(),
    )
}

/// Body of the ball detail popup.
pub fn ball_detail_text(
    kind: BallKind,
    number: u32,
    detail: Option<&BallDetail>,
    sample_size: Option<u32>,
) -> String {
    let mut lines = vec![format!("{} {}", kind.label(), ball_label(number)), String::new()];
    let reason = detail.and_then(|d| d.reason.as_deref()).unwrap_or("unclassified");
    lines.push(format!("Class: {reason}"));
    match detail.and_then(|d| d.probability) {
        Some(p) => lines.push(format!("Observed frequency: {:.2}%", p * 100.0)),
        None => lines.push("Observed frequency: n/a".to_string()),
    }
    lines.push(String::new());
    match sample_size {
        Some(n) => lines.push(format!("Frequency is measured over the last {n} draws.")),
        None => lines.push("Frequency is measured over recent draws.".to_string()),
    }
    lines.push("Note: historical frequency does not predict future draws.".to_string());
    lines.join("\n")
}

/// Model-info panel lines; each appears only when its field is present.
pub fn model_info_lines(result: &PredictionResult, updated_at: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(confidence) = result.confidence.filter(|c| c.is_finite()) {
        lines.push(format!("Confidence: {:.1}%", confidence * 100.0));
    }
    if let Some(model) = result.model_label() {
        lines.push(format!("Model: {model}"));
    }
    if let Some(count) = result.sample_size() {
        lines.push(format!("Sample size: last {count} draws"));
    }
    if let Some(ts) = updated_at.filter(|s| !s.is_empty()) {
        lines.push(format!("Updated: {ts}"));
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub period: String,
    pub date: String,
    pub red: Vec<String>,
    pub blue: Vec<String>,
}

impl HistoryRow {
    pub fn numbers_text(&self) -> String {
        format!("{} + {}", self.red.join(" "), self.blue.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryTable {
    Rows(Vec<HistoryRow>),
    /// A single row spanning every column.
    Placeholder(String),
}

impl HistoryTable {
    pub fn row_count(&self) -> usize {
        match self {
            HistoryTable::Rows(rows) => rows.len(),
            HistoryTable::Placeholder(_) => 1,
        }
    }
}

pub fn history_rows(entries: &[HistoryEntry]) -> HistoryTable {
    if entries.is_empty() {
        return HistoryTable::Placeholder(NO_DATA.to_string());
    }
    HistoryTable::Rows(
        entries
            .iter()
            .take(MAX_HISTORY_ROWS)
            .map(|entry| HistoryRow {
                period: entry.period.clone(),
                date: entry.date.clone(),
                red: entry.red_balls.iter().map(|&n| ball_label(n)).collect(),
                blue: entry.blue_balls.iter().map(|&n| ball_label(n)).collect(),
            })
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyOption {
    pub strategy: Strategy,
    pub key: char,
    pub active: bool,
}

pub fn strategy_selector(current: Strategy) -> Vec<StrategyOption> {
    Strategy::ALL
        .into_iter()
        .zip(['1', '2', '3', '4'])
        .map(|(strategy, key)| StrategyOption {
            strategy,
            key,
            active: strategy == current,
        })
        .collect()
}

pub fn prediction_log_lines(log: &[PredictionLogEntry]) -> Vec<String> {
    if log.is_empty() {
        return vec!["No predictions recorded yet".to_string()];
    }
    log.iter()
        .enumerate()
        .map(|(idx, entry)| {
            let red: Vec<String> = entry.data.red_balls.iter().map(|&n| ball_label(n)).collect();
            let blue: Vec<String> = entry.data.blue_balls.iter().map(|&n| ball_label(n)).collect();
            let confidence = entry
                .data
                .confidence
                .map(|c| format!(" ({:.1}%)", c * 100.0))
                .unwrap_or_default();
            format!(
                "#{} {} [{}] {} + {}{confidence}",
                idx + 1,
                entry.timestamp,
                entry.strategy.label(),
                red.join(" "),
                blue.join(" ")
            )
        })
        .collect()
}
