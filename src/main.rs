//! Contact-center analytics extract
//!
//! Fetches a conversation aggregates query from the analytics API and exports it as CSV.

mod api;
mod auth;
mod config;
mod error;
mod export;
mod flatten;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::api::{AnalyticsClient, QueryBody};
use crate::auth::OAuth2Client;
use crate::config::Config;
use crate::export::{write_csv, DEFAULT_OUTPUT};
use crate::flatten::{flatten, QueryResult};

const DEFAULT_INTERVAL: &str = "2025-05-18T14:00:00.000Z/2025-05-23T14:00:00.000Z";
const DEFAULT_METRIC: &str = "nConnected";

#[derive(Parser, Debug)]
#[command(name = "contact-center-analytics-extract")]
#[command(author, version, about = "Export conversation aggregate metrics to CSV", long_about = None)]
struct Args {
    /// Path to credentials file
    #[arg(short, long, default_value = "credentials.json")]
    credentials: PathBuf,

    /// Path of the CSV file to write
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Query interval as an ISO 8601 <start>/<end> range
    #[arg(short, long, default_value = DEFAULT_INTERVAL)]
    interval: String,

    /// Metric to query (repeatable)
    #[arg(short, long = "metric", default_value = DEFAULT_METRIC)]
    metrics: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Every failure ends the run here; the exit status stays 0.
    if let Err(e) = run(args).await {
        println!("Error: {:#}", e);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load(&args.credentials).with_context(|| {
        format!("Failed to load credentials from {}", args.credentials.display())
    })?;
    init_logging(args.debug || config.debug);
    tracing::debug!(
        credentials = %args.credentials.display(),
        token_url = %config.token_url(),
        query_url = %config.aggregates_url(),
        "Configuration loaded"
    );

    let body = QueryBody::new(args.interval, args.metrics)?;

    let auth_client = OAuth2Client::new(config.clone(), config.token_url())?;
    let analytics_client = AnalyticsClient::new(config.api_base_url(), config.timeout())?;

    let result = extract(&auth_client, &analytics_client, &body).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    match export_table(result, &args.output)? {
        Some(rows) => println!("Wrote {} rows to {}", rows, args.output.display()),
        None => println!("No results returned"),
    }

    Ok(())
}

/// Fetch a token, then run the aggregates query with it.
async fn extract(
    auth_client: &OAuth2Client,
    analytics_client: &AnalyticsClient,
    body: &QueryBody,
) -> anyhow::Result<Value> {
    let token = auth_client.get_access_token().await?;
    let result = analytics_client.query_aggregates(&token, body).await?;
    Ok(result)
}

/// Flatten the raw result and write it to `output`.
///
/// Returns the number of rows written, or `None` when the result has no groups, in which case
/// no file is touched.
fn export_table(result: Value, output: &Path) -> anyhow::Result<Option<usize>> {
    let result = QueryResult::from_value(result)?;
    let Some(table) = flatten(&result) else {
        return Ok(None);
    };

    write_csv(&table, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(Some(table.rows.len()))
}

fn init_logging(debug: bool) {
    let default_directive = if debug {
        "contact_center_analytics_extract=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Logs go to stderr; stdout carries the JSON result.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::AGGREGATES_PATH;

    fn test_config() -> Config {
        Config::from_json(
            r#"{"client_id": "id", "client_secret": "secret", "region": "mypurecloud.com"}"#,
        )
        .unwrap()
    }

    fn clients(server: &MockServer) -> (OAuth2Client, AnalyticsClient) {
        let auth = OAuth2Client::new(test_config(), format!("{}/oauth/token", server.uri())).unwrap();
        let analytics = AnalyticsClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        (auth, analytics)
    }

    fn body() -> QueryBody {
        QueryBody::new(DEFAULT_INTERVAL, vec![DEFAULT_METRIC.to_string()]).unwrap()
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["contact-center-analytics-extract"]);
        assert_eq!(args.credentials, PathBuf::from("credentials.json"));
        assert_eq!(args.output, PathBuf::from("analytics_results.csv"));
        assert_eq!(args.interval, DEFAULT_INTERVAL);
        assert_eq!(args.metrics, vec!["nConnected".to_string()]);
        assert!(!args.debug);
    }

    #[test]
    fn test_args_repeated_metrics() {
        let args = Args::parse_from([
            "contact-center-analytics-extract",
            "--metric",
            "nOffered",
            "--metric",
            "tHandle",
        ]);
        assert_eq!(args.metrics, vec!["nOffered".to_string(), "tHandle".to_string()]);
    }

    #[tokio::test]
    async fn test_token_failure_skips_query() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(AGGREGATES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(0)
            .mount(&server)
            .await;

        let (auth, analytics) = clients(&server);
        let err = extract(&auth, &analytics, &body()).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_extract_and_export() {
        let server = MockServer::start().await;
        let result = json!({"results": [{
            "group": {"mediaType": "voice"},
            "data": [{
                "interval": "2025-05-18T14:00:00.000Z/2025-05-19T14:00:00.000Z",
                "metrics": [{"metric": "nConnected", "stats": {"count": 42}}]
            }]
        }]});

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(AGGREGATES_PATH))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(result))
            .expect(1)
            .mount(&server)
            .await;

        let (auth, analytics) = clients(&server);
        let value = extract(&auth, &analytics, &body()).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join(DEFAULT_OUTPUT);
        assert_eq!(export_table(value, &output).unwrap(), Some(1));

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.ends_with("voice,2025-05-18T14:00:00.000Z/2025-05-19T14:00:00.000Z,nConnected,42\n"));
    }

    #[test]
    fn test_no_results_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join(DEFAULT_OUTPUT);

        assert_eq!(export_table(json!({"results": []}), &output).unwrap(), None);
        assert_eq!(export_table(json!({}), &output).unwrap(), None);
        assert!(!output.exists());
    }

    #[test]
    fn test_malformed_result_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join(DEFAULT_OUTPUT);

        let err = export_table(json!({"results": [{"data": [{"metrics": [{"stats": {}}]}]}]}), &output)
            .unwrap_err();
        assert!(err.to_string().contains("Malformed query result"));
        assert!(!output.exists());
    }
}
