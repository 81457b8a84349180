// Integration tests for `OAuthClient` using wiremock.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ga4deck_api::{Error, OAuthClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, OAuthClient) {
    let server = MockServer::start().await;
    let url = Url::parse(&format!("{}/token", server.uri())).unwrap();
    let client = OAuthClient::with_client(reqwest::Client::new(), url);
    (server, client)
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_sends_refresh_token_grant() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("client_id=cid.apps"))
        .and(body_string_contains("client_secret=shh"))
        .and(body_string_contains("refresh_token=1%2F%2Frt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "expires_in": 3599,
            "token_type": "Bearer",
            "scope": "https://www.googleapis.com/auth/analytics.readonly"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client
        .refresh_access_token("cid.apps", &secret("shh"), &secret("1//rt"))
        .await
        .unwrap();

    assert_eq!(token.access_token, "ya29.fresh");
    assert_eq!(token.expires_in, Some(3599));
}

#[tokio::test]
async fn test_refresh_without_expiry() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
        .mount(&server)
        .await;

    let token = client
        .refresh_access_token("cid", &secret("s"), &secret("r"))
        .await
        .unwrap();
    assert_eq!(token.access_token, "tok");
    assert!(token.expires_in.is_none());
}

// ── Error paths ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_rejected_carries_status_and_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .mount(&server)
        .await;

    let err = client
        .refresh_access_token("cid", &secret("s"), &secret("revoked"))
        .await
        .unwrap_err();

    match &err {
        Error::TokenRefresh { status, body } => {
            assert_eq!(*status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("expected TokenRefresh, got: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        r#"Token refresh failed: 400 - {"error":"invalid_grant"}"#
    );
}

#[tokio::test]
async fn test_refresh_malformed_body_hides_content() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json ya29.leak"))
        .mount(&server)
        .await;

    let err = client
        .refresh_access_token("cid", &secret("s"), &secret("r"))
        .await
        .unwrap_err();

    match err {
        Error::Deserialization { message, body } => {
            assert!(body.is_empty());
            assert!(!message.contains("ya29.leak"));
        }
        other => panic!("expected Deserialization, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_refresh_connection_refused_is_transport() {
    let client = OAuthClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9/token").unwrap(),
    );
    let refresh = secret("r");

    let err = client
        .refresh_access_token("cid", &secret("s"), &refresh)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(refresh.expose_secret(), "r");
}
