//! OAuth2 credential lifecycle.
//!
//! [`Authenticator`] drives the two transitions of the credential state
//! machine:
//!
//! ```text
//! unauthenticated ──authorize_interactive──▶ authorized
//!        ▲                                      │ access token ages
//!        │ refresh token rejected               ▼
//!        └──────────────────────────── ensure_valid ──▶ refreshed
//! ```
//!
//! Credentials are an explicit value passed in and returned. Every
//! operation that issues a new access token saves the result through the
//! [`CredentialStore`] supplied at construction before returning it.

use chrono::{Duration, Utc};

use super::oauth::{OAuthClient, OAuthError, TokenEndpoint};
use super::receiver::CodeReceiver;
use super::store::CredentialStore;
use crate::config::ADWORDS_SCOPE;
use crate::domain::{Credentials, CustomerId, Secret};
use crate::error::AdsError;

/// Access tokens closer than this to expiry are refreshed before use.
pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 60;

/// Static inputs of the interactive grant.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// OAuth client registration.
    pub client: OAuthClient,
    /// Developer token to record alongside the tokens.
    pub developer_token: Secret,
    /// Manager account for delegated access.
    pub login_customer_id: Option<CustomerId>,
    /// Consent page URL.
    pub auth_url: String,
}

/// Authorizes once, then keeps the access token fresh.
#[derive(Debug)]
pub struct Authenticator<E, S> {
    endpoint: E,
    store: S,
    safety_margin: Duration,
}

impl<E: TokenEndpoint, S: CredentialStore> Authenticator<E, S> {
    /// Creates an authenticator with the default 60 s safety margin.
    #[must_use]
    pub fn new(endpoint: E, store: S) -> Self {
        Self {
            endpoint,
            store,
            safety_margin: Duration::seconds(DEFAULT_SAFETY_MARGIN_SECS),
        }
    }

    /// The store credentials are saved to.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Builds the consent URL for one authorization attempt.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] if the configured consent URL is not a
    /// valid URL.
    pub fn consent_url(
        settings: &AuthSettings,
        redirect_uri: &str,
        state: &str,
    ) -> Result<String, AdsError> {
        let url = reqwest::Url::parse_with_params(
            &settings.auth_url,
            &[
                ("client_id", settings.client.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", ADWORDS_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| AdsError::Config(format!("invalid consent URL {}: {e}", settings.auth_url)))?;
        Ok(url.into())
    }

    /// Runs the authorization-code grant and returns fully populated
    /// credentials, already saved to the store.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::AuthSetup`] if no code is received, the exchange
    /// is rejected, or no refresh token is issued;
    /// [`AdsError::Transient`] if the token endpoint is unreachable;
    /// [`AdsError::CredentialStore`] if the result cannot be saved.
    pub async fn authorize_interactive<R: CodeReceiver>(
        &self,
        settings: &AuthSettings,
        receiver: &mut R,
    ) -> Result<Credentials, AdsError> {
        let state = uuid::Uuid::new_v4().simple().to_string();
        let redirect_uri = receiver.redirect_uri();
        let consent_url = Self::consent_url(settings, &redirect_uri, &state)?;

        tracing::info!(client_id = %settings.client.client_id, %redirect_uri, "starting OAuth2 authorization");
        let code = receiver.receive_code(&consent_url, &state).await?;

        let grant = self
            .endpoint
            .exchange_code(&settings.client, &code, &redirect_uri)
            .await
            .map_err(|e| match e {
                OAuthError::Rejected { error, description } => {
                    AdsError::AuthSetup(format!("code exchange rejected: {error} {description}"))
                }
                OAuthError::Transport(message) => AdsError::Transient {
                    attempts: 1,
                    message,
                },
            })?;

        let refresh_token = grant.refresh_token.ok_or_else(|| {
            AdsError::AuthSetup(
                "the token endpoint did not issue a refresh token; revoke the app's access \
                 in your Google account and authorize again"
                    .to_string(),
            )
        })?;

        let credentials = Credentials {
            client_id: settings.client.client_id.clone(),
            client_secret: settings.client.client_secret.clone(),
            developer_token: settings.developer_token.clone(),
            refresh_token,
            access_token: grant.access_token,
            access_token_expiry: Utc::now() + Duration::seconds(grant.expires_in),
            login_customer_id: settings.login_customer_id.clone(),
        };
        self.store.save(&credentials)?;
        tracing::info!(expires_at = %credentials.access_token_expiry, "authorization complete");
        Ok(credentials)
    }

    /// Returns `credentials` unchanged while the access token has more than
    /// the safety margin left; otherwise refreshes, saves and returns the
    /// updated value.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::TokenExpired`] if the refresh token is rejected
    /// (nothing is saved in that case); [`AdsError::Transient`] if the
    /// token endpoint is unreachable; [`AdsError::CredentialStore`] if the
    /// refreshed record cannot be saved.
    pub async fn ensure_valid(&self, credentials: Credentials) -> Result<Credentials, AdsError> {
        let now = Utc::now();
        if credentials.is_fresh_at(now, self.safety_margin) {
            tracing::debug!(
                remaining_secs = credentials.remaining_secs(now),
                "access token still valid"
            );
            return Ok(credentials);
        }

        tracing::info!(
            remaining_secs = credentials.remaining_secs(now),
            "access token expiring; refreshing"
        );
        let client = OAuthClient {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
        };
        let grant = self
            .endpoint
            .refresh(&client, &credentials.refresh_token)
            .await
            .map_err(|e| match e {
                OAuthError::Rejected { error, description } => {
                    tracing::warn!(%error, "refresh token rejected");
                    AdsError::TokenExpired(format!("{error} {description}").trim().to_string())
                }
                OAuthError::Transport(message) => AdsError::Transient {
                    attempts: 1,
                    message,
                },
            })?;

        let refreshed = credentials.with_access_token(
            grant.access_token,
            Utc::now() + Duration::seconds(grant.expires_in),
            grant.refresh_token,
        );
        self.store.save(&refreshed)?;
        tracing::info!(expires_at = %refreshed.access_token_expiry, "access token refreshed");
        Ok(refreshed)
    }

    /// Loads the stored credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::AuthSetup`] if nothing has been authorized yet,
    /// or the store's error if the record is unreadable.
    pub fn load(&self) -> Result<Credentials, AdsError> {
        self.store.load()?.ok_or_else(|| {
            AdsError::AuthSetup("no stored credentials; run `adsctl authorize` first".to_string())
        })
    }

    /// Discards the stored credentials (explicit re-authorization path).
    ///
    /// # Errors
    ///
    /// Returns the store's error if the record cannot be removed.
    pub fn logout(&self) -> Result<bool, AdsError> {
        self.store.clear()
    }
}
