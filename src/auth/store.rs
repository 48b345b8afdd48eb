//! Credential persistence.
//!
//! [`CredentialStore`] is the seam between the authenticator and durable
//! storage. [`FileCredentialStore`] keeps one JSON record on disk and
//! replaces it atomically on every save.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::Credentials;
use crate::error::AdsError;

/// Durable storage for the single credential record.
pub trait CredentialStore {
    /// Loads the stored record, `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::CredentialStore`] if the record exists but cannot
    /// be read or decoded.
    fn load(&self) -> Result<Option<Credentials>, AdsError>;

    /// Replaces the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::CredentialStore`] if the record cannot be written.
    fn save(&self, credentials: &Credentials) -> Result<(), AdsError>;

    /// Deletes the stored record. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::CredentialStore`] if the record cannot be removed.
    fn clear(&self) -> Result<bool, AdsError>;
}

/// JSON file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store backed by `path`. Nothing is read until [`load`].
    ///
    /// [`load`]: CredentialStore::load
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, AdsError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            AdsError::CredentialStore(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let credentials: Credentials = serde_json::from_str(&content).map_err(|e| {
            AdsError::CredentialStore(format!("failed to decode {}: {e}", self.path.display()))
        })?;
        tracing::debug!(path = %self.path.display(), "loaded stored credentials");
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<(), AdsError> {
        let io_err = |e: std::io::Error| {
            AdsError::CredentialStore(format!("failed to write {}: {e}", self.path.display()))
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(credentials)
            .map_err(|e| AdsError::CredentialStore(format!("failed to encode credentials: {e}")))?;

        let tmp = self.temp_path();
        {
            let mut file = open_private(&tmp).map_err(io_err)?;
            file.write_all(json.as_bytes()).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        tracing::debug!(
            path = %self.path.display(),
            expires_at = %credentials.access_token_expiry,
            "saved credentials"
        );
        Ok(())
    }

    fn clear(&self) -> Result<bool, AdsError> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| {
            AdsError::CredentialStore(format!("failed to remove {}: {e}", self.path.display()))
        })?;
        tracing::info!(path = %self.path.display(), "credentials cleared");
        Ok(true)
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
