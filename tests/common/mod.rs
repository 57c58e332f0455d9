#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver};

use lotto_terminal::api::EndpointChain;
use lotto_terminal::controller::Controller;
use lotto_terminal::error::FetchError;
use lotto_terminal::http_client::{HttpResponse, Transport};
use lotto_terminal::provider::{self, Endpoints};
use lotto_terminal::state::{Delta, ProviderCommand};

pub const PREDICT: &str = "http://lab.test/api/predict";
pub const PREDICT_RT: &str = "http://lab.test/api/predict-realtime";
pub const HISTORY: &str = "http://lab.test/api/history";
pub const HISTORY_RT: &str = "http://lab.test/api/history-realtime";
pub const LATEST: &str = "http://lab.test/api/latest-results";

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn param_keys(&self) -> Vec<&str> {
        self.query.iter().map(|(k, _)| k.as_str()).collect()
    }
}

/// Canned responses per URL; unknown URLs fail like a refused connection.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<String, HttpResponse>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.responses.lock().expect("responses lock").insert(
            url.to_string(),
            HttpResponse {
                status,
                body: body.to_string(),
            },
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_to(&self, url: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.url == url).collect()
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, FetchError> {
        self.calls.lock().expect("calls lock").push(Call {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        self.responses
            .lock()
            .expect("responses lock")
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Transport {
                endpoint: url.to_string(),
                message: "connection refused".to_string(),
            })
    }
}

pub fn endpoints() -> Endpoints {
    Endpoints {
        prediction: EndpointChain::new(vec![PREDICT.to_string(), PREDICT_RT.to_string()]),
        history: EndpointChain::new(vec![HISTORY.to_string(), HISTORY_RT.to_string()]),
        latest: LATEST.to_string(),
    }
}

/// A controller wired to a channel instead of a live provider thread, so
/// tests can run each queued command synchronously.
pub struct Harness {
    pub controller: Controller,
    pub transport: FakeTransport,
    pub endpoints: Endpoints,
    cmd_rx: Receiver<ProviderCommand>,
}

impl Harness {
    pub fn new(transport: FakeTransport) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        Self {
            controller: Controller::new(Some(cmd_tx), Some(10)),
            transport,
            endpoints: endpoints(),
            cmd_rx,
        }
    }

    pub fn pending_commands(&self) -> Vec<ProviderCommand> {
        self.cmd_rx.try_iter().collect()
    }

    /// Runs every queued command and applies the results in order.
    pub fn run_pending(&mut self) -> Vec<ProviderCommand> {
        let cmds = self.pending_commands();
        let deltas = self.execute(&cmds);
        for delta in deltas {
            self.controller.apply(delta);
        }
        cmds
    }

    pub fn execute(&self, cmds: &[ProviderCommand]) -> Vec<Delta> {
        let (tx, rx) = mpsc::channel();
        for cmd in cmds {
            provider::run_command(cmd.clone(), &self.transport, &self.endpoints, &tx);
        }
        drop(tx);
        rx.into_iter().collect()
    }
}

pub fn prediction_fetches(cmds: &[ProviderCommand]) -> usize {
    cmds.iter()
        .filter(|c| matches!(c, ProviderCommand::FetchPrediction { .. }))
        .count()
}
