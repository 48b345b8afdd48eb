//! Client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! or a `.env` file (loaded via `dotenvy` from the config directory and
//! from the working directory). Values that still hold a `your_...`
//! placeholder from the example file are treated as unset.

use std::path::PathBuf;

use crate::domain::{CustomerId, Secret};
use crate::error::AdsError;

/// Default Ads API version segment.
pub const DEFAULT_API_VERSION: &str = "v19";
/// Ads API host.
pub const DEFAULT_API_HOST: &str = "https://googleads.googleapis.com";
/// OAuth2 consent page.
pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Scope required by the Ads API.
pub const ADWORDS_SCOPE: &str = "https://www.googleapis.com/auth/adwords";

/// Top-level client configuration.
///
/// Loaded once at startup via [`AdsConfig::from_env`].
#[derive(Debug, Clone)]
pub struct AdsConfig {
    /// OAuth client id (`GOOGLE_ADS_CLIENT_ID`).
    pub client_id: Option<String>,

    /// OAuth client secret (`GOOGLE_ADS_CLIENT_SECRET`).
    pub client_secret: Option<Secret>,

    /// Developer token (`GOOGLE_ADS_DEVELOPER_TOKEN`).
    pub developer_token: Option<Secret>,

    /// Manager account for delegated access (`GOOGLE_ADS_LOGIN_CUSTOMER_ID`).
    pub login_customer_id: Option<CustomerId>,

    /// Base URL including the version segment, e.g.
    /// `https://googleads.googleapis.com/v19`.
    pub api_base_url: String,

    /// OAuth2 consent page URL (`GOOGLE_ADS_AUTH_URL`).
    pub auth_url: String,

    /// OAuth2 token endpoint URL (`GOOGLE_ADS_TOKEN_URL`).
    pub token_url: String,

    /// Directory holding `.env` and the credential file.
    pub config_dir: PathBuf,

    /// Directory receiving result artifacts.
    pub results_dir: PathBuf,

    /// Per-request network timeout in seconds.
    pub request_timeout_secs: u64,

    /// Port for the OAuth loopback listener (0 = pick a free one).
    pub callback_port: u16,

    /// Seconds to wait for the browser redirect before giving up.
    pub callback_timeout_secs: u64,
}

impl AdsConfig {
    /// Loads configuration from the process environment, after
    /// [`load_env_files`].
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] if `GOOGLE_ADS_LOGIN_CUSTOMER_ID` is set
    /// but is not a valid customer id.
    pub fn from_env() -> Result<Self, AdsError> {
        load_env_files();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] on a malformed login customer id.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AdsError> {
        let get = |key: &str| lookup(key).and_then(non_placeholder);

        let login_customer_id = get("GOOGLE_ADS_LOGIN_CUSTOMER_ID")
            .map(|raw| {
                CustomerId::parse(&raw)
                    .map_err(|e| AdsError::Config(format!("GOOGLE_ADS_LOGIN_CUSTOMER_ID: {e}")))
            })
            .transpose()?;

        let api_version =
            get("GOOGLE_ADS_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let api_base_url = get("GOOGLE_ADS_API_BASE_URL")
            .unwrap_or_else(|| format!("{DEFAULT_API_HOST}/{api_version}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client_id: get("GOOGLE_ADS_CLIENT_ID"),
            client_secret: get("GOOGLE_ADS_CLIENT_SECRET").map(Secret::from),
            developer_token: get("GOOGLE_ADS_DEVELOPER_TOKEN").map(Secret::from),
            login_customer_id,
            api_base_url,
            auth_url: get("GOOGLE_ADS_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: get("GOOGLE_ADS_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            config_dir: get("GOOGLE_ADS_CONFIG_DIR")
                .map_or_else(|| PathBuf::from("config"), PathBuf::from),
            results_dir: get("GOOGLE_ADS_RESULTS_DIR")
                .map_or_else(|| PathBuf::from("google_ads_results"), PathBuf::from),
            request_timeout_secs: parse_value(get("GOOGLE_ADS_REQUEST_TIMEOUT_SECS"), 30),
            callback_port: parse_value(get("GOOGLE_ADS_CALLBACK_PORT"), 0),
            callback_timeout_secs: parse_value(get("GOOGLE_ADS_CALLBACK_TIMEOUT_SECS"), 300),
        })
    }

    /// Path of the persisted credential record.
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.config_dir.join("google_ads_token.json")
    }

    /// Returns the OAuth client id and secret.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] naming whichever variable is missing.
    pub fn require_client(&self) -> Result<(String, Secret), AdsError> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Ok((id.clone(), secret.clone())),
            _ => Err(AdsError::Config(
                "GOOGLE_ADS_CLIENT_ID and GOOGLE_ADS_CLIENT_SECRET must be set".to_string(),
            )),
        }
    }

    /// Returns the developer token.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] if `GOOGLE_ADS_DEVELOPER_TOKEN` is unset.
    pub fn require_developer_token(&self) -> Result<Secret, AdsError> {
        self.developer_token
            .clone()
            .ok_or_else(|| AdsError::Config("GOOGLE_ADS_DEVELOPER_TOKEN must be set".to_string()))
    }

    /// Names of required variables that are unset, for `doctor`.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.client_id.is_none() {
            missing.push("GOOGLE_ADS_CLIENT_ID");
        }
        if self.client_secret.is_none() {
            missing.push("GOOGLE_ADS_CLIENT_SECRET");
        }
        if self.developer_token.is_none() {
            missing.push("GOOGLE_ADS_DEVELOPER_TOKEN");
        }
        missing
    }
}

/// Loads `<config_dir>/.env` first, then `./.env`. Variables already set
/// in the environment win over both files, so calling this twice is
/// harmless.
pub fn load_env_files() {
    let config_dir = std::env::var("GOOGLE_ADS_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));
    let env_file = config_dir.join(".env");
    if env_file.exists() {
        if let Err(e) = dotenvy::from_path(&env_file) {
            tracing::warn!(path = %env_file.display(), error = %e, "could not load env file");
        }
    }
    dotenvy::dotenv().ok();
}

/// Drops empty values and `your_...` placeholders.
fn non_placeholder(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with("your_") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses an optional raw value as `T`, returning `default` on missing or
/// invalid values.
fn parse_value<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse().ok()).unwrap_or(default)
}
