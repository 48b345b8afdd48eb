//! HTTP transport and query client behaviour against a mocked Ads API.

#![allow(clippy::expect_used)]

use std::time::Duration;

use adsctl::auth::{Authenticator, CredentialStore, FileCredentialStore, HttpTokenEndpoint};
use adsctl::client::{
    AdsTransport, AuthOverrides, HttpTransport, QueryClient, QueryRequest, RequestAuth, RetryPolicy,
    TransportErrorKind,
};
use adsctl::domain::{Credentials, CustomerId, Secret};
use adsctl::error::AdsError;
use chrono::Utc;
use httpmock::prelude::*;
use serde_json::json;

fn customer(raw: &str) -> CustomerId {
    CustomerId::parse(raw).expect("valid customer id")
}

fn auth(login: Option<&str>) -> RequestAuth {
    RequestAuth {
        access_token: Secret::new("access-1"),
        developer_token: Secret::new("dev-token"),
        login_customer_id: login.map(customer),
    }
}

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::new(server.url("/v19"), Duration::from_secs(5)).expect("client builds")
}

#[tokio::test]
async fn search_sends_auth_headers_and_follows_pages() {
    let server = MockServer::start_async().await;
    let query = "SELECT campaign.id FROM campaign";

    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v19/customers/1234567890/googleAds:search")
                .header("authorization", "Bearer access-1")
                .header("developer-token", "dev-token")
                .header("login-customer-id", "9998887777")
                .json_body(json!({ "query": query }));
            then.status(200).json_body(json!({
                "results": [{ "campaign": { "id": "1" } }],
                "fieldMask": "campaign.id",
                "nextPageToken": "page-2"
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v19/customers/1234567890/googleAds:search")
                .json_body(json!({ "query": query, "pageToken": "page-2" }));
            then.status(200).json_body(json!({
                "results": [{ "campaign": { "id": "2" } }]
            }));
        })
        .await;

    let results = transport(&server)
        .search(&auth(Some("999-888-7777")), &customer("123-456-7890"), query)
        .await
        .expect("search succeeds");

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(results.pages, 2);
    assert_eq!(results.results.len(), 2);
    assert_eq!(results.field_mask.as_deref(), Some("campaign.id"));
}

#[tokio::test]
async fn error_envelope_message_is_surfaced() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v19/customers/1234567890/googleAds:search");
            then.status(400).json_body(json!({
                "error": {
                    "code": 400,
                    "message": "Unrecognized field in the query: 'campaign.nme'.",
                    "status": "INVALID_ARGUMENT"
                }
            }));
        })
        .await;

    let err = transport(&server)
        .search(&auth(None), &customer("1234567890"), "SELECT campaign.nme FROM campaign")
        .await
        .expect_err("bad query is rejected");

    assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
    assert_eq!(err.status, Some(400));
    assert!(err.message.contains("campaign.nme"));
}

#[tokio::test]
async fn accessible_customers_are_listed() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v19/customers:listAccessibleCustomers")
                .header("developer-token", "dev-token");
            then.status(200).json_body(json!({
                "resourceNames": ["customers/1234567890", "customers/5556667777"]
            }));
        })
        .await;

    let names = transport(&server)
        .list_accessible_customers(&auth(None))
        .await
        .expect("listing succeeds");

    mock.assert_async().await;
    assert_eq!(names, ["customers/1234567890", "customers/5556667777"]);
}

fn fresh_credentials() -> Credentials {
    Credentials {
        client_id: "client-1".to_string(),
        client_secret: Secret::new("secret-1"),
        developer_token: Secret::new("dev-token"),
        refresh_token: Secret::new("refresh-1"),
        access_token: Secret::new("access-1"),
        access_token_expiry: Utc::now() + chrono::Duration::hours(1),
        login_customer_id: None,
    }
}

#[tokio::test]
async fn rate_limited_search_exhausts_retry_budget() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v19/customers/1234567890/googleAds:search");
            then.status(429).json_body(json!({
                "error": { "code": 429, "message": "Too many requests", "status": "RESOURCE_EXHAUSTED" }
            }));
        })
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let endpoint =
        HttpTokenEndpoint::new(server.url("/token"), Duration::from_secs(5)).expect("client builds");
    let authenticator =
        Authenticator::new(endpoint, FileCredentialStore::new(dir.path().join("token.json")));
    let client = QueryClient::new(transport(&server), authenticator)
        .with_retry_policy(RetryPolicy::default().without_delay());
    let request = QueryRequest::new(customer("1234567890"), "SELECT campaign.id FROM campaign")
        .expect("valid request");

    let err = client
        .run_query(&request, fresh_credentials())
        .await
        .expect_err("throttled until the budget is gone");

    assert!(matches!(err, AdsError::Transient { attempts: 4, .. }));
    mock.assert_hits_async(4).await;
}

#[tokio::test]
async fn unauthorized_search_is_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v19/customers/1234567890/googleAds:search");
            then.status(403).json_body(json!({
                "error": { "code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED" }
            }));
        })
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let endpoint =
        HttpTokenEndpoint::new(server.url("/token"), Duration::from_secs(5)).expect("client builds");
    let authenticator =
        Authenticator::new(endpoint, FileCredentialStore::new(dir.path().join("token.json")));
    let client = QueryClient::new(transport(&server), authenticator)
        .with_retry_policy(RetryPolicy::default().without_delay());
    let request = QueryRequest::new(customer("1234567890"), "SELECT campaign.id FROM campaign")
        .expect("valid request");

    let err = client
        .run_query(&request, fresh_credentials())
        .await
        .expect_err("forbidden");

    assert!(matches!(err, AdsError::Query { status: 403, .. }));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn search_timeout_is_retried_once_then_transient() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v19/customers/1234567890/googleAds:search");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!({ "results": [] }));
        })
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let endpoint =
        HttpTokenEndpoint::new(server.url("/token"), Duration::from_secs(5)).expect("client builds");
    let authenticator =
        Authenticator::new(endpoint, FileCredentialStore::new(dir.path().join("token.json")));
    let slow = HttpTransport::new(server.url("/v19"), Duration::from_secs(1)).expect("client builds");
    let client = QueryClient::new(slow, authenticator)
        .with_retry_policy(RetryPolicy::default().without_delay());
    let request = QueryRequest::new(customer("1234567890"), "SELECT campaign.id FROM campaign")
        .expect("valid request");

    let err = client
        .run_query(&request, fresh_credentials())
        .await
        .expect_err("every attempt times out");

    assert!(matches!(err, AdsError::Transient { attempts: 2, .. }));
    assert_eq!(err.exit_code(), 21);
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn header_overrides_are_sent_but_not_stored_on_refresh() {
    let server = MockServer::start_async().await;
    let token = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token")
                .body_contains("grant_type=refresh_token");
            then.status(200).json_body(json!({
                "access_token": "fresh",
                "expires_in": 3600
            }));
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v19/customers/1234567890/googleAds:search")
                .header("authorization", "Bearer fresh")
                .header("developer-token", "env-dev-token")
                .header("login-customer-id", "1112223333");
            then.status(200).json_body(json!({
                "results": [{ "campaign": { "id": "1" } }]
            }));
        })
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileCredentialStore::new(dir.path().join("google_ads_token.json"));
    let stored = Credentials {
        developer_token: Secret::new("stored-dev-token"),
        access_token: Secret::new("stale"),
        access_token_expiry: Utc::now() - chrono::Duration::minutes(5),
        ..fresh_credentials()
    };
    store.save(&stored).expect("initial save");

    let endpoint =
        HttpTokenEndpoint::new(server.url("/token"), Duration::from_secs(5)).expect("client builds");
    let client = QueryClient::new(transport(&server), Authenticator::new(endpoint, store.clone()))
        .with_retry_policy(RetryPolicy::default().without_delay())
        .with_overrides(AuthOverrides {
            developer_token: Some(Secret::new("env-dev-token")),
            login_customer_id: Some(customer("111-222-3333")),
        });
    let request = QueryRequest::new(customer("1234567890"), "SELECT campaign.id FROM campaign")
        .expect("valid request");

    let (response, refreshed) = client
        .run_query(&request, store.load().expect("readable").expect("stored"))
        .await
        .expect("query succeeds");

    token.assert_async().await;
    search.assert_async().await;
    assert_eq!(response.rows.len(), 1);
    assert_eq!(refreshed.developer_token.expose(), "stored-dev-token");

    let on_disk = store.load().expect("readable").expect("still stored");
    assert_eq!(on_disk.access_token.expose(), "fresh");
    assert_eq!(on_disk.developer_token.expose(), "stored-dev-token");
    assert!(on_disk.login_customer_id.is_none());
}
