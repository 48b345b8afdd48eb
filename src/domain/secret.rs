//! Redacting wrapper for tokens and client secrets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A secret string that never prints its value.
///
/// `Debug` and `Display` render a redacted form showing at most the last
/// four characters, so credentials can be logged as structured fields
/// without leaking them. Serialization is transparent because the
/// credential file must hold the real value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wraps a raw secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw value. Only call this when building a request.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn redacted(&self) -> String {
        let count = self.0.chars().count();
        if count <= 8 {
            return "***".to_string();
        }
        let tail: String = self.0.chars().skip(count - 4).collect();
        format!("***{tail}")
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", self.redacted())
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
