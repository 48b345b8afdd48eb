//! OAuth2 token endpoint client.
//!
//! [`TokenEndpoint`] covers the two grants the authenticator needs:
//! exchanging an authorization code and refreshing an access token.
//! [`HttpTokenEndpoint`] talks to the real endpoint with form-encoded
//! requests.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::domain::Secret;

/// Access tokens without an `expires_in` are assumed to live this long.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3599;

/// OAuth client registration of the installed application.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: Secret,
}

/// Successful response of either grant.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// Newly issued bearer token.
    pub access_token: Secret,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Refresh token; always present for a code exchange with offline
    /// access, present on refresh only when the server rotates it.
    pub refresh_token: Option<Secret>,
}

/// Token endpoint failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OAuthError {
    /// The endpoint refused the grant (`invalid_grant`, `invalid_client`...).
    #[error("{error}: {description}")]
    Rejected {
        /// OAuth error code.
        error: String,
        /// Human-readable description, possibly empty.
        description: String,
    },

    /// The endpoint was unreachable or answered 408, 429 or 5xx.
    #[error("token endpoint unavailable: {0}")]
    Transport(String),
}

/// The two token grants used by the authenticator.
pub trait TokenEndpoint {
    /// Exchanges an authorization code for tokens.
    fn exchange_code(
        &self,
        client: &OAuthClient,
        code: &str,
        redirect_uri: &str,
    ) -> impl Future<Output = Result<TokenGrant, OAuthError>> + Send;

    /// Obtains a new access token from a refresh token.
    fn refresh(
        &self,
        client: &OAuthClient,
        refresh_token: &Secret,
    ) -> impl Future<Output = Result<TokenGrant, OAuthError>> + Send;
}

/// Token endpoint reached over HTTPS with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTokenEndpoint {
    http: reqwest::Client,
    token_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl HttpTokenEndpoint {
    /// Creates an endpoint client for `token_url`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::Transport`] if the HTTP client cannot be built.
    pub fn new(token_url: impl Into<String>, timeout: Duration) -> Result<Self, OAuthError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OAuthError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            token_url: token_url.into(),
        })
    }

    async fn post_form(&self, form: &[(&str, &str)]) -> Result<TokenGrant, OAuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| OAuthError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::Transport(e.to_string()))?;

        // 429 and 408 are transient like 5xx.
        if status.is_server_error()
            || status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
        {
            return Err(OAuthError::Transport(format!("{status}: {body}")));
        }
        if !status.is_success() {
            return Err(match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => OAuthError::Rejected {
                    error: err.error,
                    description: err.error_description.unwrap_or_default(),
                },
                Err(_) => OAuthError::Rejected {
                    error: status.to_string(),
                    description: body,
                },
            });
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| OAuthError::Transport(format!("malformed token response: {e}")))?;
        Ok(TokenGrant {
            access_token: Secret::new(token.access_token),
            expires_in: token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
            refresh_token: token.refresh_token.map(Secret::new),
        })
    }
}

impl TokenEndpoint for HttpTokenEndpoint {
    async fn exchange_code(
        &self,
        client: &OAuthClient,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, OAuthError> {
        tracing::debug!(url = %self.token_url, "exchanging authorization code");
        self.post_form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.expose()),
        ])
        .await
    }

    async fn refresh(
        &self,
        client: &OAuthClient,
        refresh_token: &Secret,
    ) -> Result<TokenGrant, OAuthError> {
        tracing::debug!(url = %self.token_url, "refreshing access token");
        self.post_form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose()),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.expose()),
        ])
        .await
    }
}
