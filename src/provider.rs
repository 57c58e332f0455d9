use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use tracing::{info, warn};

use crate::api::{self, EndpointChain};
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::http_client::Transport;
use crate::state::{Delta, ProviderCommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub prediction: EndpointChain,
    pub history: EndpointChain,
    pub latest: String,
}

impl Endpoints {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            prediction: EndpointChain::new(config.predict_urls()),
            history: EndpointChain::new(config.history_urls()),
            latest: config.latest_url(),
        }
    }
}

/// Receives commands on a dedicated thread and runs each one on its own
/// worker, so prediction and history loads never wait on each other.
/// Results arrive on `tx` in completion order.
pub fn spawn_provider(
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
) {
    let endpoints = Arc::new(endpoints);
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let tx = tx.clone();
            let transport = Arc::clone(&transport);
            let endpoints = Arc::clone(&endpoints);
            thread::spawn(move || run_command(cmd, transport.as_ref(), &endpoints, &tx));
        }
    });
}

pub fn run_command(
    cmd: ProviderCommand,
    transport: &dyn Transport,
    endpoints: &Endpoints,
    tx: &Sender<Delta>,
) {
    match cmd {
        ProviderCommand::FetchPrediction {
            generation,
            strategy,
            force_new,
        } => {
            let seed = api::new_seed();
            info!(generation, %strategy, force_new, "fetching prediction");
            let mut failures = Vec::new();
            let outcome =
                api::fetch_prediction(transport, &endpoints.prediction, strategy, &seed, &mut failures);
            report_attempts("Prediction", &failures, outcome.is_err(), tx);
            let delta = match outcome {
                Ok(result) => Delta::SetPrediction {
                    generation,
                    strategy,
                    force_new,
                    received_at: api::local_timestamp(),
                    result,
                },
                Err(error) => {
                    warn!(
                        endpoint = error.endpoint().unwrap_or("<none>"),
                        %error,
                        "prediction load failed"
                    );
                    Delta::PredictionFailed { generation, error }
                }
            };
            let _ = tx.send(delta);
        }
        ProviderCommand::FetchHistory { limit } => {
            let mut failures = Vec::new();
            let outcome = api::fetch_history(transport, &endpoints.history, limit, &mut failures);
            report_attempts("History", &failures, outcome.is_err(), tx);
            let delta = match outcome {
                Ok(history) => Delta::SetHistory(history),
                Err(error) => {
                    warn!(
                        endpoint = error.endpoint().unwrap_or("<none>"),
                        %error,
                        "history load failed"
                    );
                    Delta::HistoryFailed(error)
                }
            };
            let _ = tx.send(delta);
        }
        ProviderCommand::FetchUpdatedAt => {
            let delta = match api::fetch_latest_timestamp(transport, &endpoints.latest) {
                Ok(value) => Delta::SetUpdatedAt {
                    value,
                    from_local_clock: false,
                },
                Err(error) => {
                    info!(endpoint = %endpoints.latest, %error, "falling back to local clock");
                    Delta::SetUpdatedAt {
                        value: api::local_timestamp(),
                        from_local_clock: true,
                    }
                }
            };
            let _ = tx.send(delta);
        }
    }
}

/// One console line per failed endpoint attempt. When the whole chain failed
/// the last attempt is left out; the failure delta reports it.
fn report_attempts(label: &str, failures: &[FetchError], chain_failed: bool, tx: &Sender<Delta>) {
    let shown = if chain_failed {
        failures.len().saturating_sub(1)
    } else {
        failures.len()
    };
    for error in &failures[..shown] {
        let _ = tx.send(Delta::Log(format!("[WARN] {label} attempt failed: {error}")));
    }
}
