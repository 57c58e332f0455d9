mod common;

use lotto_terminal::api::{self, EndpointChain};
use lotto_terminal::error::FetchError;
use lotto_terminal::model::Strategy;

use common::{FakeTransport, HISTORY, HISTORY_RT, PREDICT, PREDICT_RT, endpoints, read_fixture};

#[test]
fn prediction_falls_back_to_realtime_without_params() {
    let transport = FakeTransport::new();
    transport.respond(PREDICT, 502, "bad gateway");
    transport.respond(PREDICT_RT, 200, &read_fixture("prediction_realtime.json"));

    let mut failures = Vec::new();
    let result = api::fetch_prediction(
        &transport,
        &endpoints().prediction,
        Strategy::Random,
        "42",
        &mut failures,
    )
    .expect("fallback should succeed");
    assert_eq!(result.red_balls.len(), 5);
    assert_eq!(
        failures,
        vec![FetchError::Http {
            endpoint: PREDICT.to_string(),
            status: 502
        }]
    );

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].url, PREDICT);
    assert_eq!(calls[0].param("seed"), Some("42"));
    assert_eq!(calls[0].param("strategy"), Some("random"));
    assert_eq!(calls[1].url, PREDICT_RT);
    assert!(calls[1].query.is_empty());
}

#[test]
fn primary_success_skips_fallback() {
    let transport = FakeTransport::new();
    transport.respond(PREDICT, 200, &read_fixture("prediction.json"));
    transport.respond(PREDICT_RT, 200, &read_fixture("prediction_realtime.json"));

    let mut failures = Vec::new();
    api::fetch_prediction(&transport, &endpoints().prediction, Strategy::Balanced, "1", &mut failures)
        .expect("primary ok");
    assert!(failures.is_empty());
    assert!(transport.calls_to(PREDICT_RT).is_empty());
}

#[test]
fn exhausted_chain_surfaces_last_error() {
    let transport = FakeTransport::new();
    transport.respond(HISTORY, 500, "boom");

    let mut failures = Vec::new();
    let err = api::fetch_history(&transport, &endpoints().history, Some(10), &mut failures)
        .expect_err("both endpoints fail");
    assert!(matches!(err, FetchError::Transport { ref endpoint, .. } if endpoint == HISTORY_RT));
    assert_eq!(failures.len(), 2);
    assert_eq!(
        failures[0],
        FetchError::Http {
            endpoint: HISTORY.to_string(),
            status: 500
        }
    );
    assert_eq!(failures[1], err);

    for call in transport.calls() {
        assert_eq!(call.param("limit"), Some("10"));
    }
}

#[test]
fn empty_chain_is_an_error() {
    let transport = FakeTransport::new();
    let mut failures = vec![FetchError::Timestamp("earlier".to_string())];
    let err = api::fetch_history(&transport, &EndpointChain::new(Vec::new()), None, &mut failures)
        .expect_err("no endpoints");
    assert_eq!(failures.len(), 1);
    assert!(matches!(err, FetchError::Transport { .. }));
    assert!(transport.calls().is_empty());
}

#[test]
fn shape_error_on_primary_also_falls_back() {
    let transport = FakeTransport::new();
    transport.respond(HISTORY, 200, r#"{"items":[]}"#);
    transport.respond(HISTORY_RT, 200, &read_fixture("history.json"));

    let mut failures = Vec::new();
    let result =
        api::fetch_history(&transport, &endpoints().history, None, &mut failures).expect("fallback");
    assert_eq!(result.history.len(), 12);
    assert!(matches!(failures.as_slice(), [FetchError::Shape { .. }]));
    assert!(transport.calls().iter().all(|c| c.query.is_empty()));
}

#[test]
fn latest_timestamp_errors_are_timestamp_errors() {
    let transport = FakeTransport::new();
    let err = api::fetch_latest_timestamp(&transport, common::LATEST).expect_err("unreachable");
    assert!(matches!(err, FetchError::Timestamp(_)));

    transport.respond(common::LATEST, 404, "");
    let err = api::fetch_latest_timestamp(&transport, common::LATEST).expect_err("404");
    assert_eq!(err, FetchError::Timestamp("http 404".to_string()));
}
