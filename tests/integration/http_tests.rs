use crate::common::{read_rows, write_input};
use final_hop::config::{Config, FetcherConfig};
use final_hop::{PageFetcher, RecordError, ReqwestFetcher, FinalHopError};
use std::time::Duration;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_config(timeout_secs: u64) -> FetcherConfig {
    FetcherConfig {
        timeout_secs,
        ..FetcherConfig::default()
    }
}

async fn mount_redirect(server: &MockServer, from: &str, to: &str) {
    let location = format!("{}{}", server.uri(), to);
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", location.as_str()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetcher_follows_redirects() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_redirect(&mock_server, "/start", "/middle").await;
    mount_redirect(&mock_server, "/middle", "/home").await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let fetcher = ReqwestFetcher::new(&fetcher_config(10)).expect("Failed to build fetcher");
    let final_url = fetcher
        .resolve(&format!("{}/start", base_url))
        .await
        .expect("Resolve failed");

    assert_eq!(final_url, format!("{}/home", base_url));
}

#[tokio::test]
async fn test_http_error_status_still_resolves() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = ReqwestFetcher::new(&fetcher_config(10)).unwrap();
    let final_url = fetcher.resolve(&format!("{}/gone", base_url)).await;

    assert_eq!(final_url, Ok(format!("{}/gone", base_url)));
}

#[tokio::test]
async fn test_redirect_loop_is_a_record_error() {
    let mock_server = MockServer::start().await;
    mount_redirect(&mock_server, "/loop", "/loop").await;

    let fetcher = ReqwestFetcher::new(&fetcher_config(10)).unwrap();
    let result = fetcher
        .resolve(&format!("{}/loop", mock_server.uri()))
        .await;

    assert_eq!(result, Err(RecordError::RedirectLimit));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let fetcher = ReqwestFetcher::new(&fetcher_config(1)).unwrap();
    let result = fetcher
        .resolve(&format!("{}/slow", mock_server.uri()))
        .await;

    assert_eq!(result, Err(RecordError::Timeout));
}

#[tokio::test]
async fn test_full_run_against_mock_server() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_redirect(&mock_server, "/old", "/new").await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let input = write_input(&[
        "link".to_string(),
        format!("{}/old", base_url),
        "not a url".to_string(),
        format!("{}/plain", base_url),
        // Nothing listens on port 1
        "http://127.0.0.1:1/".to_string(),
    ]);
    let dir = tempdir().unwrap();
    let output = dir.path().join("results.csv");

    let mut config = Config::default();
    config.input.path = input.path().to_path_buf();
    config.input.has_header = true;
    config.output.path = output.clone();
    config.pool.batch_size = 2;
    config.pool.politeness_delay_ms = 10;

    let summary = final_hop::engine::run(&config, CancellationToken::new())
        .await
        .expect("Run failed");

    assert_eq!(summary.urls_read, 4);
    assert_eq!(summary.batches.len(), 2);
    assert_eq!(summary.stats.resolved, 2);
    assert_eq!(summary.stats.redirected, 1);
    assert_eq!(summary.stats.failed, 2);

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].0, "link");

    let find = |link: &str| rows.iter().find(|r| r.0 == link).cloned().unwrap();

    let redirected = find(&format!("{}/old", base_url));
    assert_eq!(redirected.1, format!("{}/new", base_url));
    assert!(redirected.2.is_empty());

    let plain = find(&format!("{}/plain", base_url));
    assert_eq!(plain.1, format!("{}/plain", base_url));

    let malformed = find("not a url");
    assert!(malformed.1.is_empty());
    assert!(malformed.2.starts_with("invalid URL"));

    let unreachable = find("http://127.0.0.1:1/");
    assert!(unreachable.1.is_empty());
    assert!(!unreachable.2.is_empty());
}

#[tokio::test]
async fn test_empty_input_file_is_rejected_before_output() {
    let input = write_input(&[]);
    let dir = tempdir().unwrap();
    let output = dir.path().join("results.csv");

    let mut config = Config::default();
    config.input.path = input.path().to_path_buf();
    config.output.path = output.clone();

    let result = final_hop::engine::run(&config, CancellationToken::new()).await;

    assert!(matches!(result, Err(FinalHopError::EmptyInput { .. })));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_input_file_names_the_path() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.csv");

    let mut config = Config::default();
    config.input.path = missing.clone();
    config.output.path = dir.path().join("results.csv");

    let err = final_hop::engine::run(&config, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FinalHopError::InputOpen { .. }));
    assert!(err.to_string().contains("missing.csv"));
}
