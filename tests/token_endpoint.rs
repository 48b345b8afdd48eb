//! Token endpoint and refresh behaviour against a mocked OAuth server.

#![allow(clippy::expect_used, clippy::panic)]

use std::time::Duration;

use adsctl::auth::{
    Authenticator, CredentialStore, FileCredentialStore, HttpTokenEndpoint, OAuthClient,
    OAuthError, TokenEndpoint,
};
use adsctl::domain::{Credentials, Secret};
use adsctl::error::AdsError;
use chrono::Utc;
use httpmock::prelude::*;
use serde_json::json;

fn client() -> OAuthClient {
    OAuthClient {
        client_id: "client-1".to_string(),
        client_secret: Secret::new("secret-1"),
    }
}

fn endpoint(server: &MockServer) -> HttpTokenEndpoint {
    HttpTokenEndpoint::new(server.url("/token"), Duration::from_secs(5)).expect("client builds")
}

fn expired_credentials() -> Credentials {
    Credentials {
        client_id: "client-1".to_string(),
        client_secret: Secret::new("secret-1"),
        developer_token: Secret::new("dev-token"),
        refresh_token: Secret::new("refresh-1"),
        access_token: Secret::new("stale"),
        access_token_expiry: Utc::now() - chrono::Duration::minutes(5),
        login_customer_id: None,
    }
}

#[tokio::test]
async fn refresh_posts_form_and_parses_grant() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token")
                .body_contains("grant_type=refresh_token")
                .body_contains("refresh_token=refresh-1")
                .body_contains("client_id=client-1");
            then.status(200).json_body(json!({
                "access_token": "fresh",
                "expires_in": 3599,
                "token_type": "Bearer"
            }));
        })
        .await;

    let grant = endpoint(&server)
        .refresh(&client(), &Secret::new("refresh-1"))
        .await
        .expect("refresh succeeds");

    mock.assert_async().await;
    assert_eq!(grant.access_token.expose(), "fresh");
    assert_eq!(grant.expires_in, 3599);
    assert!(grant.refresh_token.is_none());
}

#[tokio::test]
async fn invalid_grant_is_a_rejection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(400).json_body(json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            }));
        })
        .await;

    let err = endpoint(&server)
        .refresh(&client(), &Secret::new("revoked"))
        .await
        .expect_err("revoked token is rejected");

    let OAuthError::Rejected { error, description } = err else {
        panic!("rejection expected");
    };
    assert_eq!(error, "invalid_grant");
    assert!(description.contains("revoked"));
}

#[tokio::test]
async fn server_error_is_a_transport_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(503).body("backend unavailable");
        })
        .await;

    let err = endpoint(&server)
        .refresh(&client(), &Secret::new("refresh-1"))
        .await
        .expect_err("server error");

    assert!(matches!(err, OAuthError::Transport(_)));
}

#[tokio::test]
async fn throttled_refresh_is_transient_not_expired() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(429).json_body(json!({
                "error": "rate_limit_exceeded",
                "error_description": "Too many requests"
            }));
        })
        .await;

    let err = endpoint(&server)
        .refresh(&client(), &Secret::new("refresh-1"))
        .await
        .expect_err("throttled");
    assert!(matches!(err, OAuthError::Transport(_)));

    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileCredentialStore::new(dir.path().join("google_ads_token.json"));
    let original = expired_credentials();
    store.save(&original).expect("initial save");
    let authenticator = Authenticator::new(endpoint(&server), store.clone());

    let err = authenticator
        .ensure_valid(original.clone())
        .await
        .expect_err("throttled");

    assert!(matches!(err, AdsError::Transient { .. }));
    assert_eq!(err.exit_code(), 21);
    let stored = store.load().expect("readable").expect("still there");
    assert_eq!(stored, original);
}

#[tokio::test]
async fn request_timeout_status_is_a_transport_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(408).body("request timeout");
        })
        .await;

    let err = endpoint(&server)
        .refresh(&client(), &Secret::new("refresh-1"))
        .await
        .expect_err("timed out");

    assert!(matches!(err, OAuthError::Transport(_)));
}

#[tokio::test]
async fn expired_access_token_is_refreshed_and_saved() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token")
                .body_contains("grant_type=refresh_token");
            then.status(200).json_body(json!({
                "access_token": "fresh",
                "expires_in": 3600,
                "refresh_token": "refresh-2"
            }));
        })
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileCredentialStore::new(dir.path().join("google_ads_token.json"));
    let authenticator = Authenticator::new(endpoint(&server), store.clone());

    let refreshed = authenticator
        .ensure_valid(expired_credentials())
        .await
        .expect("refresh succeeds");

    mock.assert_async().await;
    assert_eq!(refreshed.access_token.expose(), "fresh");
    assert_eq!(refreshed.refresh_token.expose(), "refresh-2");
    assert!(refreshed.access_token_expiry > Utc::now());

    let stored = store.load().expect("readable").expect("saved");
    assert_eq!(stored, refreshed);
}

#[tokio::test]
async fn revoked_refresh_token_leaves_store_untouched() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(400).json_body(json!({ "error": "invalid_grant" }));
        })
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileCredentialStore::new(dir.path().join("google_ads_token.json"));
    let original = expired_credentials();
    store.save(&original).expect("initial save");
    let authenticator = Authenticator::new(endpoint(&server), store.clone());

    let err = authenticator
        .ensure_valid(original.clone())
        .await
        .expect_err("revoked");

    assert!(matches!(err, AdsError::TokenExpired(_)));
    assert_eq!(err.exit_code(), 11);
    let stored = store.load().expect("readable").expect("still there");
    assert_eq!(stored, original);
}
