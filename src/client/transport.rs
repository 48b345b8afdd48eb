//! Wire access to the Ads REST API.
//!
//! [`AdsTransport`] is the narrow interface the query client needs: one
//! search call and one account listing. [`HttpTransport`] implements it with
//! `reqwest`, following `nextPageToken` until the result set is complete.
//! Failures are classified into [`TransportErrorKind`] so the retry policy
//! can decide what to do without looking at HTTP details.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::domain::{Credentials, CustomerId, Secret};

/// Per-request authentication headers, taken from the credentials.
#[derive(Debug, Clone)]
pub struct RequestAuth {
    /// Bearer token for `Authorization`.
    pub access_token: Secret,
    /// Value of the `developer-token` header.
    pub developer_token: Secret,
    /// Value of the `login-customer-id` header, when acting via a manager.
    pub login_customer_id: Option<CustomerId>,
}

impl From<&Credentials> for RequestAuth {
    fn from(credentials: &Credentials) -> Self {
        Self {
            access_token: credentials.access_token.clone(),
            developer_token: credentials.developer_token.clone(),
            login_customer_id: credentials.login_customer_id.clone(),
        }
    }
}

/// Header values that take precedence over the stored credentials for one
/// invocation. They never reach the credential store.
#[derive(Debug, Clone, Default)]
pub struct AuthOverrides {
    /// Replaces the stored developer token.
    pub developer_token: Option<Secret>,
    /// Replaces the stored login customer id.
    pub login_customer_id: Option<CustomerId>,
}

impl RequestAuth {
    /// Builds the headers from `credentials`, letting `overrides` win.
    #[must_use]
    pub fn with_overrides(credentials: &Credentials, overrides: &AuthOverrides) -> Self {
        let mut auth = Self::from(credentials);
        if let Some(token) = &overrides.developer_token {
            auth.developer_token = token.clone();
        }
        if let Some(login) = &overrides.login_customer_id {
            auth.login_customer_id = Some(login.clone());
        }
        auth
    }
}

/// Complete result set of one search, all pages concatenated.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    /// Result objects in endpoint order.
    pub results: Vec<Value>,
    /// Field mask reported by the endpoint (comma-separated field paths).
    pub field_mask: Option<String>,
    /// Number of pages fetched.
    pub pages: u32,
}

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// HTTP 429 / `RESOURCE_EXHAUSTED`.
    RateLimited,
    /// HTTP 401 or 403.
    Unauthorized,
    /// Any other 4xx.
    InvalidRequest,
    /// 5xx.
    Server,
    /// Connection failure, timeout or unreadable response.
    Network,
}

impl TransportErrorKind {
    /// Classifies an HTTP status.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            s if s.is_server_error() => Self::Server,
            _ => Self::InvalidRequest,
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RateLimited => "rate limited",
            Self::Unauthorized => "unauthorized",
            Self::InvalidRequest => "invalid request",
            Self::Server => "server error",
            Self::Network => "network error",
        })
    }
}

/// A failed request with the endpoint's own message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    /// Failure class.
    pub kind: TransportErrorKind,
    /// HTTP status, absent for network failures.
    pub status: Option<u16>,
    /// Message extracted from the error envelope, or the raw body.
    pub message: String,
}

impl TransportError {
    /// Builds an error of `kind` without an HTTP status.
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// Builds an error from an HTTP status and response body.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let mut kind = TransportErrorKind::from_status(status);
        let envelope: Option<Value> = serde_json::from_str(body).ok();
        let error = envelope.as_ref().and_then(|v| v.get("error"));
        if error
            .and_then(|e| e.get("status"))
            .and_then(Value::as_str)
            .is_some_and(|s| s == "RESOURCE_EXHAUSTED")
        {
            kind = TransportErrorKind::RateLimited;
        }
        let message = error
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .map_or_else(|| body.trim().to_string(), str::to_string);
        Self {
            kind,
            status: Some(status.as_u16()),
            message,
        }
    }
}

/// The two Ads API calls the query client issues.
pub trait AdsTransport {
    /// Runs `query` against `customer_id`, returning every result.
    fn search(
        &self,
        auth: &RequestAuth,
        customer_id: &CustomerId,
        query: &str,
    ) -> impl Future<Output = Result<SearchResults, TransportError>> + Send;

    /// Resource names (`customers/<id>`) of the accounts the caller can
    /// access directly.
    fn list_accessible_customers(
        &self,
        auth: &RequestAuth,
    ) -> impl Future<Output = Result<Vec<String>, TransportError>> + Send;
}

/// Production transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for `base_url` (e.g.
    /// `https://googleads.googleapis.com/v19`).
    ///
    /// # Errors
    ///
    /// Returns a [`TransportErrorKind::Network`] error if the HTTP client
    /// cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::new(TransportErrorKind::Network, e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn with_auth(&self, request: reqwest::RequestBuilder, auth: &RequestAuth) -> reqwest::RequestBuilder {
        let request = request
            .bearer_auth(auth.access_token.expose())
            .header("developer-token", auth.developer_token.expose());
        match &auth.login_customer_id {
            Some(login) => request.header("login-customer-id", login.as_str()),
            None => request,
        }
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, TransportError> {
        let response = request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                format!("request timed out: {e}")
            } else {
                e.to_string()
            };
            TransportError::new(TransportErrorKind::Network, message)
        })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(TransportErrorKind::Network, e.to_string()))?;
        if !status.is_success() {
            return Err(TransportError::from_response(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&body).map_err(|e| {
            TransportError::new(
                TransportErrorKind::Network,
                format!("malformed response body: {e}"),
            )
        })
    }
}

impl AdsTransport for HttpTransport {
    async fn search(
        &self,
        auth: &RequestAuth,
        customer_id: &CustomerId,
        query: &str,
    ) -> Result<SearchResults, TransportError> {
        let url = format!("{}/customers/{customer_id}/googleAds:search", self.base_url);
        let mut out = SearchResults::default();
        let mut page_token: Option<String> = None;

        loop {
            let mut body = json!({ "query": query });
            if let (Some(token), Some(obj)) = (&page_token, body.as_object_mut()) {
                obj.insert("pageToken".to_string(), Value::String(token.clone()));
            }
            let page = self
                .send_json(self.with_auth(self.http.post(&url), auth).json(&body))
                .await?;
            out.pages += 1;

            if let Some(results) = page.get("results").and_then(Value::as_array) {
                out.results.extend(results.iter().cloned());
            }
            if out.field_mask.is_none() {
                out.field_mask = page
                    .get("fieldMask")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }

            page_token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            tracing::debug!(
                customer_id = %customer_id,
                page = out.pages,
                rows = out.results.len(),
                more = page_token.is_some(),
                "search page received"
            );
            if page_token.is_none() {
                return Ok(out);
            }
        }
    }

    async fn list_accessible_customers(
        &self,
        auth: &RequestAuth,
    ) -> Result<Vec<String>, TransportError> {
        let url = format!("{}/customers:listAccessibleCustomers", self.base_url);
        let body = self.send_json(self.with_auth(self.http.get(&url), auth)).await?;
        Ok(body
            .get("resourceNames")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(
            TransportErrorKind::from_status(StatusCode::TOO_MANY_REQUESTS),
            TransportErrorKind::RateLimited
        );
        assert_eq!(
            TransportErrorKind::from_status(StatusCode::FORBIDDEN),
            TransportErrorKind::Unauthorized
        );
        assert_eq!(
            TransportErrorKind::from_status(StatusCode::BAD_REQUEST),
            TransportErrorKind::InvalidRequest
        );
        assert_eq!(
            TransportErrorKind::from_status(StatusCode::SERVICE_UNAVAILABLE),
            TransportErrorKind::Server
        );
    }

    #[test]
    fn message_comes_from_error_envelope() {
        let body = r#"{"error":{"code":400,"message":"Unrecognized field in the query: 'campaign.nme'.","status":"INVALID_ARGUMENT"}}"#;
        let err = TransportError::from_response(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.message, "Unrecognized field in the query: 'campaign.nme'.");
    }

    #[test]
    fn resource_exhausted_is_rate_limited() {
        let body = r#"{"error":{"code":400,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = TransportError::from_response(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.kind, TransportErrorKind::RateLimited);
    }

    #[test]
    fn non_json_body_is_used_verbatim() {
        let err = TransportError::from_response(StatusCode::BAD_GATEWAY, " upstream down \n");
        assert_eq!(err.kind, TransportErrorKind::Server);
        assert_eq!(err.message, "upstream down");
    }
}
