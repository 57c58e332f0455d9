//! Event handlers for the prediction view. Every user action goes through a
//! `Controller` method; network work is handed to the provider as commands.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Instant;

use crate::export;
use crate::model::Strategy;
use crate::state::{AppState, Delta, Overlay, PanelState, ProviderCommand, Screen, apply_delta};

pub struct Controller {
    pub state: AppState,
    cmd_tx: Option<Sender<ProviderCommand>>,
    history_limit: Option<u32>,
}

impl Controller {
    pub fn new(cmd_tx: Option<Sender<ProviderCommand>>, history_limit: Option<u32>) -> Self {
        Self {
            state: AppState::new(),
            cmd_tx,
            history_limit,
        }
    }

    /// Initial load: both panels start loading independently.
    pub fn start(&mut self) {
        self.state.push_log("[INFO] Prediction lab started");
        self.load_prediction(false);
        self.load_history();
        self.refresh_updated_at();
    }

    pub fn load_prediction(&mut self, force_new: bool) {
        self.state.prediction = PanelState::Loading;
        self.state.prediction_generation += 1;
        let cmd = ProviderCommand::FetchPrediction {
            generation: self.state.prediction_generation,
            strategy: self.state.strategy,
            force_new,
        };
        if let Err(reason) = self.send(cmd) {
            self.state.push_log(format!("[WARN] Prediction request failed: {reason}"));
            self.state.prediction = PanelState::Errored {
                message: format!("Prediction request failed: {reason}"),
            };
        }
    }

    pub fn load_history(&mut self) {
        self.state.history = PanelState::Loading;
        let cmd = ProviderCommand::FetchHistory {
            limit: self.history_limit,
        };
        if let Err(reason) = self.send(cmd) {
            self.state.push_log(format!("[WARN] History request failed: {reason}"));
            self.state.history = PanelState::Errored {
                message: format!("History request failed: {reason}"),
            };
        }
    }

    pub fn refresh_updated_at(&mut self) {
        if let Err(reason) = self.send(ProviderCommand::FetchUpdatedAt) {
            self.state.push_log(format!("[INFO] Timestamp refresh skipped: {reason}"));
        }
    }

    /// New analysis: reveals the strategy selector and forces a fresh
    /// prediction that is recorded in the log.
    pub fn reanalyze(&mut self) {
        self.state.selector_visible = true;
        self.state.screen = Screen::Main;
        self.load_prediction(true);
        self.refresh_updated_at();
    }

    pub fn change_strategy(&mut self, strategy: Strategy) {
        self.state.strategy = strategy;
        self.state
            .push_log(format!("[INFO] Strategy set to {}", strategy.label()));
        self.reanalyze();
    }

    pub fn retry_prediction(&mut self) {
        self.load_prediction(false);
    }

    pub fn retry_history(&mut self) {
        self.load_history();
    }

    pub fn show_about(&mut self) {
        self.state.overlay = None;
        self.state.screen = Screen::About;
    }

    pub fn hide_about(&mut self) {
        self.state.screen = Screen::Main;
    }

    pub fn toggle_about(&mut self) {
        match self.state.screen {
            Screen::Main => self.show_about(),
            Screen::About => self.hide_about(),
        }
    }

    pub fn show_prediction_history(&mut self) {
        self.state.overlay = Some(Overlay::PredictionLog);
    }

    pub fn close_history_modal(&mut self) {
        if matches!(
            self.state.overlay,
            Some(Overlay::PredictionLog | Overlay::ConfirmClear)
        ) {
            self.state.overlay = None;
        }
    }

    /// Asks for confirmation; nothing is removed until `confirm_clear`.
    pub fn clear_prediction_history(&mut self) {
        if self.state.prediction_log.is_empty() {
            self.state
                .show_notice("Prediction log is already empty", Instant::now());
            return;
        }
        self.state.overlay = Some(Overlay::ConfirmClear);
    }

    pub fn confirm_clear(&mut self) {
        if self.state.overlay != Some(Overlay::ConfirmClear) {
            return;
        }
        let removed = self.state.prediction_log.len();
        self.state.prediction_log.clear();
        self.state.overlay = Some(Overlay::PredictionLog);
        self.state
            .push_log(format!("[INFO] Cleared {removed} logged predictions"));
    }

    pub fn cancel_clear(&mut self) {
        if self.state.overlay == Some(Overlay::ConfirmClear) {
            self.state.overlay = Some(Overlay::PredictionLog);
        }
    }

    pub fn select_next_ball(&mut self) {
        self.state.select_next_ball();
    }

    pub fn select_prev_ball(&mut self) {
        self.state.select_prev_ball();
    }

    pub fn show_ball_detail(&mut self) {
        if self.state.selected_ball().is_some() {
            self.state.overlay = Some(Overlay::BallDetail);
        } else {
            self.state.push_log("[INFO] No prediction to inspect");
        }
    }

    pub fn close_ball_detail(&mut self) {
        if self.state.overlay == Some(Overlay::BallDetail) {
            self.state.overlay = None;
        }
    }

    pub fn toggle_help(&mut self) {
        self.state.overlay = match self.state.overlay {
            Some(Overlay::Help) => None,
            _ => Some(Overlay::Help),
        };
    }

    /// Esc: closes the top overlay, otherwise leaves the about screen.
    pub fn back(&mut self) {
        match self.state.overlay {
            Some(Overlay::ConfirmClear) => self.cancel_clear(),
            Some(_) => self.state.overlay = None,
            None => self.hide_about(),
        }
    }

    pub fn export_prediction(&mut self, dir: &Path) -> Option<PathBuf> {
        let Some(result) = self.state.prediction.shown() else {
            self.state.push_log("[INFO] No prediction to export");
            return None;
        };
        match export::export_prediction(dir, result, self.state.strategy) {
            Ok(path) => {
                self.state
                    .push_log(format!("[INFO] Prediction exported to {}", path.display()));
                self.state.show_notice("Prediction exported", Instant::now());
                Some(path)
            }
            Err(err) => {
                tracing::warn!(error = %err, "prediction export failed");
                self.state.push_log(format!("[WARN] Export failed: {err:#}"));
                None
            }
        }
    }

    pub fn apply(&mut self, delta: Delta) {
        apply_delta(&mut self.state, delta, Instant::now());
    }

    pub fn tick(&mut self, now: Instant) {
        self.state.clear_expired_notice(now);
    }

    fn send(&self, cmd: ProviderCommand) -> Result<(), &'static str> {
        let Some(tx) = &self.cmd_tx else {
            return Err("fetch unavailable");
        };
        tx.send(cmd).map_err(|_| "provider stopped")
    }
}
