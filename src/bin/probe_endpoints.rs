use anyhow::{Context, Result};

use lotto_terminal::api::{self, EndpointChain};
use lotto_terminal::config::AppConfig;
use lotto_terminal::error::FetchError;
use lotto_terminal::http_client::ReqwestTransport;
use lotto_terminal::logging;
use lotto_terminal::model::{BallKind, Strategy};
use lotto_terminal::view::{ball_views, history_rows, model_info_lines};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    logging::init_logging(&config.log_level, config.log_file.as_deref())?;
    let strategy = std::env::var("PROBE_STRATEGY")
        .ok()
        .map(|raw| raw.parse::<Strategy>())
        .transpose()
        .context("PROBE_STRATEGY")?
        .unwrap_or_default();
    let transport = ReqwestTransport::new(config.request_timeout)?;

    println!("Base URL: {}", config.base_url);

    // Probe every candidate on its own so a healthy fallback does not hide a broken primary.
    for url in config.predict_urls() {
        let chain = EndpointChain::new(vec![url.clone()]);
        let mut failures = Vec::new();
        match api::fetch_prediction(&transport, &chain, strategy, &api::new_seed(), &mut failures) {
            Ok(result) => {
                let red = ball_views(&result.red_balls, BallKind::Red);
                let blue = ball_views(&result.blue_balls, BallKind::Blue);
                println!(
                    "OK  {url}: {} + {}",
                    red.labels().join(" "),
                    blue.labels().join(" ")
                );
                for line in model_info_lines(&result, None) {
                    println!("      {line}");
                }
            }
            Err(err) => print_failure(&url, &err, &failures),
        }
    }

    for url in config.history_urls() {
        let chain = EndpointChain::new(vec![url.clone()]);
        let mut failures = Vec::new();
        match api::fetch_history(&transport, &chain, Some(config.history_limit), &mut failures) {
            Ok(history) => println!(
                "OK  {url}: {} draws ({} rows shown)",
                history.history.len(),
                history_rows(&history.history).row_count()
            ),
            Err(err) => print_failure(&url, &err, &failures),
        }
    }

    let latest = config.latest_url();
    match api::fetch_latest_timestamp(&transport, &latest) {
        Ok(ts) => println!("OK  {latest}: updated_at={ts}"),
        Err(err) => {
            eprintln!("[WARN] {latest}: {err}");
            println!("    local clock fallback: {}", api::local_timestamp());
        }
    }

    Ok(())
}

fn print_failure(url: &str, err: &FetchError, failures: &[FetchError]) {
    println!("ERR {url}: {err}");
    if let FetchError::Shape { reason, .. } = err {
        println!("      shape check: {reason}");
    }
    tracing::warn!(endpoint = url, attempts = failures.len(), error = %err, "endpoint check failed");
}
