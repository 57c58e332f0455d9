use std::collections::VecDeque;
use std::time::Instant;

use crate::error::FetchError;
use crate::model::{BallKind, HistoryResult, PredictionLogEntry, PredictionResult, Strategy};

pub const MAX_PREDICTION_LOG: usize = 10;
pub const NOTICE_SECS: u64 = 3;
pub const NEW_RESULT_NOTICE: &str = "New result generated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    About,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    PredictionLog,
    ConfirmClear,
    BallDetail,
    Help,
}

/// Lifecycle of one independently loaded panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState<T> {
    Loading,
    Shown(T),
    Errored { message: String },
}

impl<T> PanelState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading)
    }

    pub fn shown(&self) -> Option<&T> {
        match self {
            PanelState::Shown(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PanelState::Errored { message } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub shown_at: Instant,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub overlay: Option<Overlay>,
    pub strategy: Strategy,
    pub prediction: PanelState<PredictionResult>,
    pub history: PanelState<HistoryResult>,
    pub prediction_log: Vec<PredictionLogEntry>,
    pub selector_visible: bool,
    pub updated_at: Option<String>,
    pub notice: Option<Notice>,
    pub selected_ball: usize,
    /// Generation of the most recently issued prediction request.
    pub prediction_generation: u64,
    pub logs: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Main,
            overlay: None,
            strategy: Strategy::default(),
            prediction: PanelState::Loading,
            history: PanelState::Loading,
            prediction_log: Vec::new(),
            selector_visible: false,
            updated_at: None,
            notice: None,
            selected_ball: 0,
            prediction_generation: 0,
            logs: VecDeque::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn show_notice(&mut self, text: impl Into<String>, now: Instant) {
        self.notice = Some(Notice {
            text: text.into(),
            shown_at: now,
        });
    }

    pub fn clear_expired_notice(&mut self, now: Instant) {
        let expired = self
            .notice
            .as_ref()
            .is_some_and(|n| now.saturating_duration_since(n.shown_at).as_secs() >= NOTICE_SECS);
        if expired {
            self.notice = None;
        }
    }

    /// Appends to the prediction log. Once the cap is reached further entries
    /// are dropped and `false` is returned.
    pub fn record_prediction(&mut self, entry: PredictionLogEntry) -> bool {
        if self.prediction_log.len() >= MAX_PREDICTION_LOG {
            return false;
        }
        self.prediction_log.push(entry);
        true
    }

    pub fn ball_count(&self) -> usize {
        self.prediction
            .shown()
            .map(|p| p.red_balls.len() + p.blue_balls.len())
            .unwrap_or(0)
    }

    /// The ball under the cursor, red balls first.
    pub fn selected_ball(&self) -> Option<(BallKind, u32)> {
        let prediction = self.prediction.shown()?;
        let idx = self.selected_ball;
        if let Some(&n) = prediction.red_balls.get(idx) {
            return Some((BallKind::Red, n));
        }
        prediction
            .blue_balls
            .get(idx - prediction.red_balls.len())
            .map(|&n| (BallKind::Blue, n))
    }

    pub fn select_next_ball(&mut self) {
        let total = self.ball_count();
        if total == 0 {
            self.selected_ball = 0;
            return;
        }
        self.selected_ball = (self.selected_ball + 1) % total;
    }

    pub fn select_prev_ball(&mut self) {
        let total = self.ball_count();
        if total == 0 {
            self.selected_ball = 0;
            return;
        }
        self.selected_ball = if self.selected_ball == 0 {
            total - 1
        } else {
            self.selected_ball - 1
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    SetPrediction {
        generation: u64,
        strategy: Strategy,
        force_new: bool,
        received_at: String,
        result: PredictionResult,
    },
    PredictionFailed {
        generation: u64,
        error: FetchError,
    },
    SetHistory(HistoryResult),
    HistoryFailed(FetchError),
    SetUpdatedAt {
        value: String,
        from_local_clock: bool,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchPrediction {
        generation: u64,
        strategy: Strategy,
        force_new: bool,
    },
    FetchHistory {
        limit: Option<u32>,
    },
    FetchUpdatedAt,
}

pub fn apply_delta(state: &mut AppState, delta: Delta, now: Instant) {
    match delta {
        Delta::SetPrediction {
            generation,
            strategy,
            force_new,
            received_at,
            result,
        } => {
            if generation < state.prediction_generation {
                state.push_log(format!(
                    "[INFO] Dropped stale prediction ({strategy}, request #{generation})"
                ));
                return;
            }
            state.push_log(format!(
                "[INFO] Prediction loaded ({strategy}): {} red + {} blue",
                result.red_balls.len(),
                result.blue_balls.len()
            ));
            if force_new {
                let entry = PredictionLogEntry {
                    timestamp: received_at,
                    strategy,
                    data: result.clone(),
                };
                if !state.record_prediction(entry) {
                    tracing::debug!("prediction log full, entry dropped");
                }
                state.show_notice(NEW_RESULT_NOTICE, now);
            }
            state.selected_ball = 0;
            state.prediction = PanelState::Shown(result);
        }
        Delta::PredictionFailed { generation, error } => {
            if generation < state.prediction_generation {
                state.push_log(format!(
                    "[INFO] Dropped stale prediction error (request #{generation})"
                ));
                return;
            }
            state.push_log(format!("[WARN] Prediction error: {error}"));
            state.prediction = PanelState::Errored {
                message: error.user_message(),
            };
            if state.overlay == Some(Overlay::BallDetail) {
                state.overlay = None;
            }
        }
        Delta::SetHistory(history) => {
            state.push_log(format!(
                "[INFO] History loaded: {} draws",
                history.history.len()
            ));
            if history.skipped > 0 {
                state.push_log(format!(
                    "[WARN] History: skipped {} malformed entries",
                    history.skipped
                ));
            }
            state.history = PanelState::Shown(history);
        }
        Delta::HistoryFailed(error) => {
            state.push_log(format!("[WARN] History error: {error}"));
            state.history = PanelState::Errored {
                message: error.user_message(),
            };
        }
        Delta::SetUpdatedAt {
            value,
            from_local_clock,
        } => {
            if from_local_clock {
                tracing::info!(updated_at = %value, "using local clock for updated_at");
            }
            state.updated_at = Some(value);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn loaded(generation: u64, force_new: bool) -> Delta {
        Delta::SetPrediction {
            generation,
            strategy: Strategy::Balanced,
            force_new,
            received_at: "2025-10-31 21:30:00".to_string(),
            result: PredictionResult::new(vec![1, 2, 3, 4, 5], vec![6, 7]),
        }
    }

    #[test]
    fn notice_expires_after_three_seconds() {
        let mut state = AppState::new();
        let t0 = Instant::now();
        apply_delta(&mut state, loaded(0, true), t0);
        assert!(state.notice.is_some());
        state.clear_expired_notice(t0 + Duration::from_millis(2900));
        assert!(state.notice.is_some());
        state.clear_expired_notice(t0 + Duration::from_secs(3));
        assert!(state.notice.is_none());
    }

    #[test]
    fn unforced_load_does_not_touch_log() {
        let mut state = AppState::new();
        apply_delta(&mut state, loaded(0, false), Instant::now());
        assert!(state.prediction_log.is_empty());
        assert!(state.notice.is_none());
        assert!(state.prediction.shown().is_some());
    }

    #[test]
    fn ball_selection_wraps_across_red_and_blue() {
        let mut state = AppState::new();
        apply_delta(&mut state, loaded(0, false), Instant::now());
        assert_eq!(state.selected_ball(), Some((BallKind::Red, 1)));
        state.select_prev_ball();
        assert_eq!(state.selected_ball(), Some((BallKind::Blue, 7)));
        state.select_next_ball();
        assert_eq!(state.selected_ball(), Some((BallKind::Red, 1)));
        for _ in 0..5 {
            state.select_next_ball();
        }
        assert_eq!(state.selected_ball(), Some((BallKind::Blue, 6)));
    }

    #[test]
    fn selection_is_empty_without_prediction() {
        let mut state = AppState::new();
        state.select_next_ball();
        assert_eq!(state.selected_ball, 0);
        assert!(state.selected_ball().is_none());
    }
}
