//! End-to-end runs of the session against mock directory and Crowd servers

use chrono::{Duration, TimeZone, Utc};
use clap::Parser;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stash_users::app::{run_session, InactivityBucket};
use stash_users::auth::{BasicAuthToken, CredentialSet};
use stash_users::cli::Cli;
use stash_users::config::{AppConfig, RunConfig};
use stash_users::constants::directory::MEMBERS_PATH;
use stash_users::constants::management::USER_PATH;
use stash_users::errors::{AppError, FetchError};

fn run_config(server: &MockServer, log_dir: &TempDir, extra: &[&str]) -> RunConfig {
    let uri = server.uri();
    let log = log_dir.path().to_string_lossy().to_string();
    let mut args = vec!["stash_users", "-a", uri.as_str(), "-l", log.as_str(), "--no-progress"];
    args.extend_from_slice(extra);

    let cli = Cli::try_parse_from(args).unwrap();
    RunConfig::from_sources(&cli, AppConfig::default()).unwrap()
}

fn credentials() -> CredentialSet {
    CredentialSet::separate(
        BasicAuthToken::encode("bitbucket", "pw"),
        BasicAuthToken::encode("crowd", "pw"),
    )
}

#[tokio::test]
async fn test_two_user_scenario_in_simulation() {
    let server = MockServer::start().await;
    let log_dir = TempDir::new().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let long_ago = (now - Duration::days(200)).timestamp_millis();

    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "size": 2,
            "limit": 100,
            "isLastPage": true,
            "start": 0,
            "values": [
                {"name": "user1", "emailAddress": "user1@example.com", "id": 1,
                 "active": true, "type": "NORMAL", "lastAuthenticationTimestamp": 0},
                {"name": "user2", "emailAddress": "user2@example.com", "id": 2,
                 "active": true, "type": "NORMAL", "lastAuthenticationTimestamp": long_ago}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = run_config(&server, &log_dir, &[]);
    assert!(config.simulation);

    let summary = run_session(&config, &credentials(), now).await.unwrap();

    assert_eq!(summary.fetch.users, 2);
    assert_eq!(summary.buckets.get(InactivityBucket::NeverAuthenticated), ["user1"]);
    assert_eq!(summary.buckets.get(InactivityBucket::Inactive90), ["user2"]);
    assert_eq!(summary.buckets.get(InactivityBucket::Inactive180), ["user2"]);

    assert_eq!(summary.report.processed(), 1);
    assert_eq!(summary.report.succeeded(), 1);
    assert!(summary.report.outcomes[0].simulated);
    assert_eq!(summary.progress_position, 1);
}

#[tokio::test]
async fn test_live_run_deactivates_never_authenticated() {
    let server = MockServer::start().await;
    let log_dir = TempDir::new().unwrap();
    let now = Utc::now();

    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "size": 3,
            "limit": 100,
            "isLastPage": true,
            "start": 0,
            "values": [
                {"name": "ghost", "lastAuthenticationTimestamp": 0},
                {"name": "regular", "lastAuthenticationTimestamp": now.timestamp_millis()},
                {"name": "phantom"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(USER_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let config = run_config(&server, &log_dir, &["--simulation", "false"]);
    let summary = run_session(&config, &credentials(), now).await.unwrap();

    assert_eq!(
        summary.buckets.get(InactivityBucket::NeverAuthenticated),
        ["ghost", "phantom"]
    );
    assert!(summary.buckets.get(InactivityBucket::Inactive90).is_empty());
    assert_eq!(summary.report.succeeded(), 2);
    assert!(summary.report.outcomes.iter().all(|o| !o.simulated));
}

#[tokio::test]
async fn test_fetch_failure_aborts_before_deactivation() {
    let server = MockServer::start().await;
    let log_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = run_config(&server, &log_dir, &["--simulation", "false"]);
    let err = run_session(&config, &credentials(), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Fetch(FetchError::TooManyErrors { .. })
    ));
    assert_eq!(err.category(), "fetch");
}
