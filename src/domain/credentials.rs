//! OAuth2 credential record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{CustomerId, Secret};

/// Everything needed to authenticate one Ads API request.
///
/// The refresh token is long-lived and only replaced by a new
/// authorization (or a rotation returned by the token endpoint). The
/// access token is disposable: [`Credentials::with_access_token`] swaps it
/// together with its expiry after every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// OAuth client id of the installed application.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: Secret,
    /// Ads API developer token, sent on every request.
    pub developer_token: Secret,
    /// Long-lived refresh token.
    pub refresh_token: Secret,
    /// Short-lived bearer token.
    pub access_token: Secret,
    /// Instant after which the access token is no longer accepted.
    pub access_token_expiry: DateTime<Utc>,
    /// Manager account used for delegated access, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_customer_id: Option<CustomerId>,
}

impl Credentials {
    /// Whether the access token stays valid for longer than `margin` after
    /// `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.access_token_expiry - now > margin
    }

    /// Seconds of remaining access-token lifetime (negative once expired).
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.access_token_expiry - now).num_seconds()
    }

    /// Returns a copy with a freshly issued access token.
    ///
    /// A rotated refresh token replaces the stored one; `None` keeps it.
    #[must_use]
    pub fn with_access_token(
        &self,
        access_token: Secret,
        expiry: DateTime<Utc>,
        rotated_refresh_token: Option<Secret>,
    ) -> Self {
        Self {
            access_token,
            access_token_expiry: expiry,
            refresh_token: rotated_refresh_token.unwrap_or_else(|| self.refresh_token.clone()),
            ..self.clone()
        }
    }
}
