// Integration tests for `AnalyticsClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ga4deck_api::{AnalyticsClient, Error};

const REPORT_PATH: &str = "/v1beta/properties/123456:runRealtimeReport";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AnalyticsClient) {
    let server = MockServer::start().await;
    let client =
        AnalyticsClient::with_client(reqwest::Client::new(), Url::parse(&server.uri()).unwrap());
    (server, client)
}

fn token() -> SecretString {
    SecretString::from("tok".to_owned())
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_active_users_reads_first_value() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(REPORT_PATH))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({ "metrics": [{ "name": "activeUsers" }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metricHeaders": [{ "name": "activeUsers", "type": "TYPE_INTEGER" }],
            "rows": [{ "metricValues": [{ "value": "42" }] }],
            "rowCount": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let value = client.active_users("123456", &token()).await.unwrap();
    assert_eq!(value, "42");
}

#[tokio::test]
async fn test_active_users_without_rows_is_zero() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(REPORT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metricHeaders": [{ "name": "activeUsers", "type": "TYPE_INTEGER" }],
            "kind": "analyticsData#runRealtimeReport"
        })))
        .mount(&server)
        .await;

    let value = client.active_users("123456", &token()).await.unwrap();
    assert_eq!(value, "0");
}

// ── Status classification ───────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(REPORT_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.active_users("123456", &token()).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(err.to_string(), "Unauthorized: 401");
}

#[tokio::test]
async fn test_rate_limited_reads_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(REPORT_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let err = client.active_users("123456", &token()).await.unwrap_err();
    match &err {
        Error::RateLimited { retry_after_secs } => assert_eq!(*retry_after_secs, Some(30)),
        other => panic!("expected RateLimited, got: {other:?}"),
    }
    assert_eq!(err.to_string(), "Rate limit exceeded: 429");
}

#[tokio::test]
async fn test_other_status_is_generic_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(REPORT_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let err = client.active_users("123456", &token()).await.unwrap_err();
    match &err {
        Error::Http { status, body } => {
            assert_eq!(*status, 403);
            assert_eq!(body, "PERMISSION_DENIED");
        }
        other => panic!("expected Http, got: {other:?}"),
    }
    assert_eq!(err.to_string(), "HTTP error! status: 403");
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(REPORT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client.active_users("123456", &token()).await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}
