use chrono::{Local, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::http_client::Transport;
use crate::model::{BallDetail, HistoryEntry, HistoryResult, ModelInfo, PredictionResult, Strategy};

// The realtime endpoint sends ranked candidate lists; only the pick size is shown.
const RED_PICK: usize = 5;
const BLUE_PICK: usize = 2;

/// Ordered candidate endpoints. Tried in sequence until one succeeds; when all
/// fail, the last error is surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointChain {
    urls: Vec<String>,
}

impl EndpointChain {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn primary(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }

    /// Failed attempts are appended to `failures` in the order they happen,
    /// including ones a later endpoint recovered from.
    pub fn try_each<T>(
        &self,
        failures: &mut Vec<FetchError>,
        mut attempt: impl FnMut(usize, &str) -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        let mut last_err = None;
        for (idx, url) in self.urls.iter().enumerate() {
            match attempt(idx, url) {
                Ok(value) => {
                    if idx > 0 {
                        debug!(endpoint = %url, "fallback endpoint succeeded");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    warn!(endpoint = %url, error = %err, "endpoint attempt failed");
                    failures.push(err.clone());
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| FetchError::Transport {
            endpoint: "<none>".to_string(),
            message: "no endpoints configured".to_string(),
        }))
    }
}

/// Cache-busting value: epoch millis followed by four random digits.
pub fn new_seed() -> String {
    let jitter: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{}{jitter:04}", Utc::now().timestamp_millis())
}

/// Local clock formatted the way the backend formats `updated_at`.
pub fn local_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn fetch_prediction(
    transport: &dyn Transport,
    chain: &EndpointChain,
    strategy: Strategy,
    seed: &str,
    failures: &mut Vec<FetchError>,
) -> Result<PredictionResult, FetchError> {
    chain.try_each(failures, |idx, url| {
        // Fallback endpoints take no parameters.
        let query = if idx == 0 {
            vec![("seed", seed.to_string()), ("strategy", strategy.as_str().to_string())]
        } else {
            Vec::new()
        };
        let resp = transport.get(url, &query)?;
        if !resp.is_success() {
            return Err(FetchError::Http {
                endpoint: url.to_string(),
                status: resp.status,
            });
        }
        parse_prediction_json(url, &resp.body)
    })
}

pub fn fetch_history(
    transport: &dyn Transport,
    chain: &EndpointChain,
    limit: Option<u32>,
    failures: &mut Vec<FetchError>,
) -> Result<HistoryResult, FetchError> {
    let query: Vec<(&str, String)> = limit
        .map(|limit| vec![("limit", limit.to_string())])
        .unwrap_or_default();
    chain.try_each(failures, |_, url| {
        let resp = transport.get(url, &query)?;
        if !resp.is_success() {
            return Err(FetchError::Http {
                endpoint: url.to_string(),
                status: resp.status,
            });
        }
        parse_history_json(url, &resp.body)
    })
}

pub fn fetch_latest_timestamp(transport: &dyn Transport, url: &str) -> Result<String, FetchError> {
    let resp = transport
        .get(url, &[])
        .map_err(|err| FetchError::Timestamp(err.to_string()))?;
    if !resp.is_success() {
        return Err(FetchError::Timestamp(format!("http {}", resp.status)));
    }
    parse_timestamp_json(&resp.body)
}

pub fn parse_prediction_json(endpoint: &str, raw: &str) -> Result<PredictionResult, FetchError> {
    let root: Value = serde_json::from_str(raw.trim())
        .map_err(|err| FetchError::shape(endpoint, format!("invalid json: {err}")))?;
    let payload = unwrap_envelope(endpoint, &root)?;
    if !payload.is_object() {
        return Err(FetchError::shape(endpoint, "body is not an object"));
    }

    let (red_balls, red_details) =
        parse_ball_field(endpoint, payload, &["redBalls", "red_balls", "red"], "redBalls", RED_PICK)?;
    let (blue_balls, blue_details) = parse_ball_field(
        endpoint,
        payload,
        &["blueBalls", "blue_balls", "blue"],
        "blueBalls",
        BLUE_PICK,
    )?;

    let model_info = payload.get("model_info").filter(|v| v.is_object()).map(|info| ModelInfo {
        window_size: pick_u32(info, &["window_size", "windowSize"]),
        trained_at: pick_string(info, &["trained_at", "trainedAt"]),
        method: pick_string(info, &["method"]),
    });

    Ok(PredictionResult {
        red_balls,
        blue_balls,
        confidence: payload.get("confidence").and_then(Value::as_f64),
        model: pick_string(payload, &["model"]),
        based_on_count: pick_u32(payload, &["basedOnCount", "based_on_count"]),
        strategy: pick_string(payload, &["strategy"]),
        data_source: pick_string(payload, &["dataSource", "data_source"]),
        timestamp: pick_string(payload, &["timestamp"]),
        red_details,
        blue_details,
        model_info,
    })
}

pub fn parse_history_json(endpoint: &str, raw: &str) -> Result<HistoryResult, FetchError> {
    let root: Value = serde_json::from_str(raw.trim())
        .map_err(|err| FetchError::shape(endpoint, format!("invalid json: {err}")))?;
    let payload = unwrap_envelope(endpoint, &root)?;
    let Some(history) = payload.get("history") else {
        return Err(FetchError::shape(endpoint, "missing history"));
    };
    let Some(items) = history.as_array() else {
        return Err(FetchError::shape(endpoint, "history is not an array"));
    };

    let history: Vec<HistoryEntry> = items
        .iter()
        .filter(|v| v.is_object())
        .map(parse_history_entry)
        .collect();
    let skipped = items.len() - history.len();
    if skipped > 0 {
        debug!(endpoint, skipped, "skipped non-object history entries");
    }
    Ok(HistoryResult {
        history,
        total: pick_u32(payload, &["total"]),
        skipped,
    })
}

#[derive(Debug, Deserialize)]
struct LatestResults {
    status: Option<String>,
    updated_at: Option<String>,
}

pub fn parse_timestamp_json(raw: &str) -> Result<String, FetchError> {
    let latest: LatestResults = serde_json::from_str(raw.trim())
        .map_err(|err| FetchError::Timestamp(format!("invalid json: {err}")))?;
    let status = latest.status.unwrap_or_default();
    if status != "success" {
        return Err(FetchError::Timestamp(format!("status={status:?}")));
    }
    latest
        .updated_at
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FetchError::Timestamp("missing updated_at".to_string()))
}

fn unwrap_envelope<'a>(endpoint: &str, root: &'a Value) -> Result<&'a Value, FetchError> {
    match root.get("success").and_then(Value::as_bool) {
        Some(false) => {
            let reason = pick_string(root, &["error", "message"])
                .unwrap_or_else(|| "server reported failure".to_string());
            Err(FetchError::shape(endpoint, reason))
        }
        Some(true) => Ok(root.get("data").filter(|v| v.is_object()).unwrap_or(root)),
        None => Ok(root),
    }
}

fn parse_ball_field(
    endpoint: &str,
    payload: &Value,
    keys: &[&str],
    name: &str,
    pick: usize,
) -> Result<(Vec<u32>, Vec<BallDetail>), FetchError> {
    let Some((key, value)) = keys
        .iter()
        .find_map(|key| payload.get(*key).map(|v| (*key, v)))
    else {
        return Err(FetchError::shape(endpoint, format!("missing {name}")));
    };
    let Some(items) = value.as_array() else {
        return Err(FetchError::shape(endpoint, format!("{name} is not an array")));
    };

    let mut numbers = Vec::with_capacity(items.len());
    let mut details = Vec::new();
    for item in items {
        if let Some(number) = as_ball_number(item) {
            numbers.push(number);
            continue;
        }
        let Some(number) = item.get("number").and_then(as_ball_number) else {
            return Err(FetchError::shape(
                endpoint,
                format!("{name} contains a non-integer entry"),
            ));
        };
        numbers.push(number);
        details.push(BallDetail {
            number,
            probability: item.get("probability").and_then(Value::as_f64),
            reason: pick_string(item, &["reason"]),
        });
    }

    // Candidate lists (`red: [{number, ...}]`) are ranked; keep the pick size.
    if !details.is_empty() && !key.ends_with("Balls") && !key.ends_with("_balls") {
        numbers.truncate(pick);
    }
    Ok((numbers, details))
}

fn parse_history_entry(item: &Value) -> HistoryEntry {
    HistoryEntry {
        period: pick_string(item, &["period", "expect"]).unwrap_or_default(),
        date: pick_string(item, &["date", "openTime"]).unwrap_or_default(),
        red_balls: lenient_balls(item, &["redBalls", "red_balls"]),
        blue_balls: lenient_balls(item, &["blueBalls", "blue_balls"]),
    }
}

fn lenient_balls(item: &Value, keys: &[&str]) -> Vec<u32> {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(Value::as_array))
        .map(|items| items.iter().filter_map(as_ball_number).collect())
        .unwrap_or_default()
}

fn as_ball_number(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn pick_u32(value: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|key| {
        let v = value.get(*key)?;
        v.as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EP: &str = "http://test/api/predict";

    #[test]
    fn prediction_accepts_camel_and_snake_case() {
        let camel = parse_prediction_json(EP, r#"{"redBalls":[1,2],"blueBalls":[3]}"#)
            .expect("camel case");
        let snake = parse_prediction_json(EP, r#"{"red_balls":[1,2],"blue_balls":[3]}"#)
            .expect("snake case");
        assert_eq!(camel.red_balls, snake.red_balls);
        assert_eq!(camel.blue_balls, vec![3]);
    }

    #[test]
    fn prediction_optional_fields_are_optional() {
        let out = parse_prediction_json(EP, r#"{"redBalls":[7],"blueBalls":[]}"#).expect("ok");
        assert!(out.confidence.is_none());
        assert!(out.model.is_none());
        assert!(out.based_on_count.is_none());
    }

    #[test]
    fn prediction_rejects_non_array_balls() {
        let err = parse_prediction_json(EP, r#"{"redBalls":"1,2","blueBalls":[3]}"#)
            .expect_err("string is not an array");
        assert_eq!(err, FetchError::shape(EP, "redBalls is not an array"));
    }

    #[test]
    fn prediction_rejects_missing_blue() {
        let err = parse_prediction_json(EP, r#"{"redBalls":[1]}"#).expect_err("missing blue");
        assert!(matches!(err, FetchError::Shape { ref reason, .. } if reason == "missing blueBalls"));
    }

    #[test]
    fn prediction_rejects_non_integer_ball() {
        let err = parse_prediction_json(EP, r#"{"redBalls":[1,"x"],"blueBalls":[3]}"#)
            .expect_err("non-integer");
        assert!(matches!(err, FetchError::Shape { .. }));
    }

    #[test]
    fn prediction_unwraps_realtime_envelope_and_keeps_pick_size() {
        let raw = r#"{
            "success": true,
            "data": {
                "red": [
                    {"number": 7, "probability": 0.031, "reason": "hot"},
                    {"number": 9, "probability": 0.030, "reason": "hot"},
                    {"number": 12, "probability": 0.025, "reason": "warm"},
                    {"number": 16, "probability": 0.022, "reason": "warm"},
                    {"number": 18, "probability": 0.021, "reason": "warm"},
                    {"number": 23, "probability": 0.019, "reason": "cold"}
                ],
                "blue": [
                    {"number": 3, "probability": 0.12, "reason": "hot"},
                    {"number": 5, "probability": 0.09, "reason": "warm"},
                    {"number": 9, "probability": 0.07, "reason": "cold"}
                ],
                "model_info": {"window_size": 50, "trained_at": "2025-10-31T21:30:00", "method": "realtime frequency"}
            }
        }"#;
        let out = parse_prediction_json(EP, raw).expect("envelope");
        assert_eq!(out.red_balls, vec![7, 9, 12, 16, 18]);
        assert_eq!(out.blue_balls, vec![3, 5]);
        assert_eq!(out.sample_size(), Some(50));
        assert_eq!(out.model_label(), Some("realtime frequency"));
        let detail = out.detail_for(crate::model::BallKind::Red, 12).expect("detail");
        assert_eq!(detail.reason.as_deref(), Some("warm"));
    }

    #[test]
    fn prediction_failed_envelope_is_shape_error() {
        let err = parse_prediction_json(EP, r#"{"success":false,"error":"data fetch failed"}"#)
            .expect_err("failure envelope");
        assert_eq!(err, FetchError::shape(EP, "data fetch failed"));
    }

    #[test]
    fn history_requires_array() {
        assert!(parse_history_json(EP, r#"{"total":3}"#).is_err());
        assert!(parse_history_json(EP, r#"{"history":{}}"#).is_err());
        let ok = parse_history_json(EP, r#"{"history":[]}"#).expect("empty is fine");
        assert!(ok.history.is_empty());
    }

    #[test]
    fn history_entry_accepts_numeric_period() {
        let raw = r#"{"history":[{"period":25126,"date":"2025-10-29","red_balls":[1,5],"blue_balls":[2]}]}"#;
        let out = parse_history_json(EP, raw).expect("ok");
        assert_eq!(out.history[0].period, "25126");
        assert_eq!(out.history[0].red_balls, vec![1, 5]);
    }

    #[test]
    fn timestamp_requires_success_and_value() {
        assert_eq!(
            parse_timestamp_json(r#"{"status":"success","updated_at":"2025-10-31 21:30:00"}"#),
            Ok("2025-10-31 21:30:00".to_string())
        );
        assert!(parse_timestamp_json(r#"{"status":"error","updated_at":"x"}"#).is_err());
        assert!(parse_timestamp_json(r#"{"status":"success"}"#).is_err());
        assert!(parse_timestamp_json("not json").is_err());
    }

    #[test]
    fn seed_is_numeric() {
        let a = new_seed();
        assert!(a.chars().all(|c| c.is_ascii_digit()));
        assert!(a.len() > 4);
    }

    #[test]
    fn local_timestamp_has_fixed_layout() {
        let ts = local_timestamp();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }
}
