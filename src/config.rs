use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::normalize_level;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// Runtime settings, read from the environment (after `.env.local` / `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub base_url: String,
    pub predict_paths: Vec<String>,
    pub history_paths: Vec<String>,
    pub latest_path: String,
    pub history_limit: u32,
    pub request_timeout: Duration,
    pub tick_rate: Duration,
    pub export_dir: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            predict_paths: vec![
                "/api/predict".to_string(),
                "/api/predict-realtime".to_string(),
            ],
            history_paths: vec![
                "/api/history".to_string(),
                "/api/history-realtime".to_string(),
            ],
            latest_path: "/api/latest-results".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            request_timeout: Duration::from_secs(10),
            tick_rate: Duration::from_millis(250),
            export_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = env::var("LOTTO_API_BASE")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.base_url);
        let predict_paths =
            paths_env("LOTTO_PREDICT_PATHS").unwrap_or(defaults.predict_paths);
        let history_paths =
            paths_env("LOTTO_HISTORY_PATHS").unwrap_or(defaults.history_paths);
        let latest_path = env::var("LOTTO_LATEST_PATH")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.latest_path);
        let history_limit = env::var("LOTTO_HISTORY_LIMIT")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, 50);
        let request_timeout = Duration::from_secs(
            env::var("LOTTO_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(10)
                .max(1),
        );
        let tick_rate = Duration::from_millis(
            env::var("LOTTO_TICK_MS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(250)
                .clamp(50, 2000),
        );
        let export_dir = env::var("LOTTO_EXPORT_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.export_dir);
        let log_level = env::var("LOTTO_LOG")
            .map(|v| normalize_level(&v).to_string())
            .unwrap_or(defaults.log_level);
        let log_file = env::var("LOTTO_LOG_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            base_url,
            predict_paths,
            history_paths,
            latest_path,
            history_limit,
            request_timeout,
            tick_rate,
            export_dir,
            log_level,
            log_file,
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    pub fn predict_urls(&self) -> Vec<String> {
        self.predict_paths.iter().map(|p| self.url_for(p)).collect()
    }

    pub fn history_urls(&self) -> Vec<String> {
        self.history_paths.iter().map(|p| self.url_for(p)).collect()
    }

    pub fn latest_url(&self) -> String {
        self.url_for(&self.latest_path)
    }
}

fn paths_env(key: &str) -> Option<Vec<String>> {
    let raw = env::var(key).ok()?;
    parse_paths(&raw)
}

fn parse_paths(raw: &str) -> Option<Vec<String>> {
    let paths: Vec<String> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    if paths.is_empty() { None } else { Some(paths) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_relative_and_keeps_absolute() {
        let cfg = AppConfig {
            base_url: "http://host:8000".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(cfg.url_for("/api/predict"), "http://host:8000/api/predict");
        assert_eq!(cfg.url_for("api/history"), "http://host:8000/api/history");
        assert_eq!(
            cfg.url_for("https://other.example/api/x"),
            "https://other.example/api/x"
        );
    }

    #[test]
    fn default_chains_list_primary_before_realtime() {
        let cfg = AppConfig::default();
        let urls = cfg.predict_urls();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].ends_with("/api/predict"));
        assert!(urls[1].ends_with("/api/predict-realtime"));
    }

    #[test]
    fn parse_paths_skips_blanks() {
        assert_eq!(
            parse_paths(" /a , ,/b "),
            Some(vec!["/a".to_string(), "/b".to_string()])
        );
        assert_eq!(parse_paths(" , "), None);
    }
}
