//! Wiring shared by the command handlers.

use std::time::Duration;

use crate::auth::{Authenticator, FileCredentialStore, HttpTokenEndpoint};
use crate::client::{AuthOverrides, HttpTransport, QueryClient};
use crate::config::AdsConfig;
use crate::domain::{Credentials, ReportFormat};
use crate::error::AdsError;
use crate::report::{PersistedArtifacts, ResultPersister};

use super::GlobalArgs;

/// Authenticator backed by the real token endpoint and the credential file.
pub type LiveAuthenticator = Authenticator<HttpTokenEndpoint, FileCredentialStore>;

/// Query client over HTTPS.
pub type LiveClient = QueryClient<HttpTransport, HttpTokenEndpoint, FileCredentialStore>;

/// Resolved configuration plus output options for one invocation.
#[derive(Debug)]
pub struct Context {
    config: AdsConfig,
    format: ReportFormat,
    persister: Option<ResultPersister>,
}

impl Context {
    /// Builds the context from loaded configuration and global flags.
    #[must_use]
    pub fn new(config: AdsConfig, global: &GlobalArgs) -> Self {
        let persister = (!global.no_save).then(|| ResultPersister::new(&config.results_dir));
        Self {
            config,
            format: global.format,
            persister,
        }
    }

    /// Loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &AdsConfig {
        &self.config
    }

    /// Requested output format.
    #[must_use]
    pub const fn format(&self) -> ReportFormat {
        self.format
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    /// Credential store at the configured location.
    #[must_use]
    pub fn store(&self) -> FileCredentialStore {
        FileCredentialStore::new(self.config.token_path())
    }

    /// Authenticator over the configured token endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] if the HTTP client cannot be built.
    pub fn authenticator(&self) -> Result<LiveAuthenticator, AdsError> {
        let endpoint = HttpTokenEndpoint::new(&self.config.token_url, self.timeout())
            .map_err(|e| AdsError::Config(format!("token endpoint client: {e}")))?;
        Ok(Authenticator::new(endpoint, self.store()))
    }

    /// Query client over the configured API base URL. A developer token or
    /// login customer id set in the environment replaces the stored one in
    /// request headers only.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] if an HTTP client cannot be built.
    pub fn client(&self) -> Result<LiveClient, AdsError> {
        let transport = HttpTransport::new(&self.config.api_base_url, self.timeout())
            .map_err(|e| AdsError::Config(format!("API client: {e}")))?;
        let overrides = AuthOverrides {
            developer_token: self.config.developer_token.clone(),
            login_customer_id: self.config.login_customer_id.clone(),
        };
        Ok(QueryClient::new(transport, self.authenticator()?).with_overrides(overrides))
    }

    /// Stored credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::AuthSetup`] if nothing is stored yet.
    pub fn credentials(&self, client: &LiveClient) -> Result<Credentials, AdsError> {
        client.authenticator().load()
    }

    /// Writes artifacts unless `--no-save` was given, and reports where.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Persistence`] if writing fails.
    pub fn save(
        &self,
        label: &str,
        raw: &serde_json::Value,
        formatted: &str,
    ) -> Result<Option<PersistedArtifacts>, AdsError> {
        let Some(persister) = &self.persister else {
            return Ok(None);
        };
        let artifacts = persister.persist(label, raw, formatted, self.format)?;
        eprintln!("Saved {}", artifacts.report.display());
        eprintln!("Saved {}", artifacts.raw.display());
        Ok(Some(artifacts))
    }

    /// Writes one JSON document unless `--no-save` was given.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Persistence`] if writing fails.
    pub fn save_json(&self, label: &str, value: &serde_json::Value) -> Result<(), AdsError> {
        if let Some(persister) = &self.persister {
            let path = persister.persist_json(label, value)?;
            eprintln!("Saved {}", path.display());
        }
        Ok(())
    }
}
