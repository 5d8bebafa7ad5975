//! Integration tests for paging through the group membership listing

use std::time::Duration;

use futures::TryStreamExt;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stash_users::app::{ApiClient, ClientConfig, PageFetcher};
use stash_users::auth::BasicAuthToken;
use stash_users::constants::directory::MEMBERS_PATH;
use stash_users::errors::FetchError;

fn client(server: &MockServer) -> ApiClient {
    let http = ClientConfig::default().build_http_client().unwrap();
    ApiClient::new(http, &server.uri(), BasicAuthToken::encode("admin", "secret"))
}

fn page(start: u32, names: &[&str], is_last_page: bool) -> Value {
    let values: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let id = start as usize + i;
            json!({
                "name": name,
                "emailAddress": format!("{}@example.com", name),
                "id": id,
                "active": true,
                "type": "NORMAL",
                "lastAuthenticationTimestamp": 0
            })
        })
        .collect();

    json!({
        "size": names.len(),
        "limit": 2,
        "isLastPage": is_last_page,
        "start": start,
        "values": values,
        "nextPageStart": start + 2
    })
}

async fn mount_page(server: &MockServer, start: &str, body: Value, expected: u64) {
    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .and(query_param("context", "stash-users"))
        .and(query_param("limit", "2"))
        .and(query_param("start", start))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_stops_after_last_page() {
    let server = MockServer::start().await;
    mount_page(&server, "0", page(0, &["alice", "bob"], false), 1).await;
    mount_page(&server, "2", page(2, &["carol"], true), 1).await;
    // Never requested: the previous page is flagged as the last one
    mount_page(&server, "4", page(4, &["mallory"], true), 0).await;

    let mut fetcher = PageFetcher::new(client(&server), 2);
    let first = fetcher.next_page().await.unwrap().unwrap();
    let second = fetcher.next_page().await.unwrap().unwrap();
    assert!(fetcher.next_page().await.unwrap().is_none());

    assert_eq!(first.values.len(), 2);
    assert_eq!(second.values[0].name, "carol");
    assert!(fetcher.is_finished());

    let stats = fetcher.stats();
    assert_eq!(stats.pages, 2);
    assert_eq!(stats.users, 3);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn test_sends_basic_auth() {
    let server = MockServer::start().await;
    let token = BasicAuthToken::encode("admin", "secret");

    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .and(header("authorization", format!("Basic {}", token.as_str()).as_str()))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, &["alice"], true)))
        .expect(1)
        .mount(&server)
        .await;

    let pages: Vec<_> = PageFetcher::new(client(&server), 2)
        .into_stream()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(pages.len(), 1);
}

#[tokio::test]
async fn test_failed_request_retries_same_offset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "0", page(0, &["alice"], true), 1).await;

    let mut fetcher = PageFetcher::new(client(&server), 2);
    let first = fetcher.next_page().await.unwrap().unwrap();

    assert_eq!(first.values[0].name, "alice");
    assert_eq!(fetcher.stats().errors, 2);
    assert_eq!(fetcher.next_start(), 2);
}

#[tokio::test]
async fn test_timeout_retries_same_offset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .and(query_param("start", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(2))
                .set_body_json(page(0, &["late"], true)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "0", page(0, &["alice"], true), 1).await;

    let config = ClientConfig {
        request_timeout: Duration::from_millis(200),
        ..Default::default()
    };
    let http = config.build_http_client().unwrap();
    let client = ApiClient::new(http, &server.uri(), BasicAuthToken::encode("admin", "secret"));

    let mut fetcher = PageFetcher::new(client, 2);
    let first = fetcher.next_page().await.unwrap().unwrap();

    assert_eq!(first.values[0].name, "alice");
    assert_eq!(fetcher.stats().errors, 1);
    assert_eq!(fetcher.next_start(), 2);
}

#[tokio::test]
async fn test_unreachable_host_hits_error_ceiling() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let http = ClientConfig::default().build_http_client().unwrap();
    let client = ApiClient::new(http, &uri, BasicAuthToken::encode("admin", "secret"));

    let mut fetcher = PageFetcher::new(client.clone(), 2);
    let err = fetcher.next_page().await.unwrap_err();

    assert!(matches!(err, FetchError::TooManyErrors { errors: 6, .. }));
    let stats = fetcher.stats();
    assert_eq!(stats.errors, 6);
    assert_eq!(stats.pages, 0);
    assert!(fetcher.is_finished());
    assert!(fetcher.next_page().await.unwrap().is_none());

    let mut fetcher = PageFetcher::new(client, 2).with_max_errors(2);
    let err = fetcher.next_page().await.unwrap_err();
    assert!(matches!(err, FetchError::TooManyErrors { errors: 3, .. }));
}

#[tokio::test]
async fn test_too_many_errors_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;

    let mut fetcher = PageFetcher::new(client(&server), 2);
    let err = fetcher.next_page().await.unwrap_err();

    match err {
        FetchError::TooManyErrors {
            errors,
            last_status,
        } => {
            assert_eq!(errors, 6);
            assert!(last_status.contains("500"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(fetcher.is_finished());
}

#[tokio::test]
async fn test_errors_accumulate_across_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "0", page(0, &["alice", "bob"], false), 1).await;
    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut fetcher = PageFetcher::new(client(&server), 2).with_max_errors(3);
    assert!(fetcher.next_page().await.unwrap().is_some());

    let err = fetcher.next_page().await.unwrap_err();
    assert!(matches!(err, FetchError::TooManyErrors { errors: 4, .. }));
}

#[tokio::test]
async fn test_malformed_page_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = PageFetcher::new(client(&server), 2);
    let err = fetcher.next_page().await.unwrap_err();

    assert!(matches!(err, FetchError::Decode { start: 0, .. }));
    assert!(fetcher.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_stream_ends_on_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result: Result<Vec<_>, _> = PageFetcher::new(client(&server), 2)
        .with_max_errors(0)
        .into_stream()
        .try_collect()
        .await;

    assert!(matches!(
        result,
        Err(FetchError::TooManyErrors { errors: 1, .. })
    ));
}
