//! Error taxonomy with exit code mapping.
//!
//! [`AdsError`] is the central error type of the crate. Each variant maps
//! to a stable process exit code and a remediation hint that the CLI prints
//! under the error message.

/// Crate-wide error enum.
///
/// # Exit Codes
///
/// | Code | Category                                  |
/// |------|-------------------------------------------|
/// | 2    | Invalid input (bad customer id, format)   |
/// | 3    | Configuration missing or invalid          |
/// | 10   | Interactive authorization failed          |
/// | 11   | Refresh token rejected                    |
/// | 12   | Credential store unreadable / unwritable  |
/// | 20   | Query rejected by the endpoint            |
/// | 21   | Transient network or server failure       |
/// | 30   | Not enough data for recommendations       |
/// | 40   | Result artifacts could not be written     |
#[derive(Debug, thiserror::Error)]
pub enum AdsError {
    /// The interactive authorization-code grant failed.
    #[error("authorization failed: {0}")]
    AuthSetup(String),

    /// The stored refresh token was rejected (revoked or invalid).
    #[error("refresh token rejected: {0}")]
    TokenExpired(String),

    /// The endpoint rejected the request as malformed or unauthorized.
    #[error("query rejected ({status}): {message}")]
    Query {
        /// HTTP status returned by the endpoint.
        status: u16,
        /// The endpoint's own error message.
        message: String,
    },

    /// Network or server failure after the retry budget was exhausted.
    #[error("transient failure after {attempts} attempt(s): {message}")]
    Transient {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },

    /// The rows do not contain the metric fields needed for analysis.
    #[error("insufficient data for analysis: {0}")]
    Analysis(String),

    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// User-supplied input could not be accepted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The credential file could not be read or written.
    #[error("credential store error: {0}")]
    CredentialStore(String),

    /// Result artifacts could not be written.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl AdsError {
    /// Returns the process exit code for this variant.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) => 2,
            Self::Config(_) => 3,
            Self::AuthSetup(_) => 10,
            Self::TokenExpired(_) => 11,
            Self::CredentialStore(_) => 12,
            Self::Query { .. } => 20,
            Self::Transient { .. } => 21,
            Self::Analysis(_) => 30,
            Self::Persistence(_) => 40,
        }
    }

    /// Returns a short hint telling the user how to recover.
    #[must_use]
    pub const fn remediation(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "Check the command arguments (see --help).",
            Self::Config(_) => {
                "Set GOOGLE_ADS_CLIENT_ID, GOOGLE_ADS_CLIENT_SECRET and \
                 GOOGLE_ADS_DEVELOPER_TOKEN in the environment or in config/.env."
            }
            Self::AuthSetup(_) => {
                "Verify the OAuth client id/secret and run `adsctl authorize` again; \
                 authorization codes are single-use and expire quickly."
            }
            Self::TokenExpired(_) => {
                "The refresh token is no longer valid. Run `adsctl authorize` to re-authorize."
            }
            Self::CredentialStore(_) => {
                "Check permissions on the config directory, or run `adsctl authorize`."
            }
            Self::Query { .. } => "Fix the query or account id; the request was not retried.",
            Self::Transient { .. } => "The API is unavailable or throttling. Retry later.",
            Self::Analysis(_) => {
                "Select metrics.clicks, metrics.impressions, metrics.cost_micros and \
                 metrics.conversions (or metrics.roas / metrics.ctr) in the query."
            }
            Self::Persistence(_) => "Check that the results directory is writable.",
        }
    }

    /// Whether the error should be reported as a warning rather than a
    /// failure of the whole run.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::Analysis(_))
    }
}
