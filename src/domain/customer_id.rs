//! Type-safe advertising account identifier.
//!
//! [`CustomerId`] is a newtype around the 10-digit numeric string the Ads
//! API expects in URLs and headers, so that account ids cannot be confused
//! with campaign ids or other numeric strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AdsError;

/// Number of digits in a normalized customer id.
pub const CUSTOMER_ID_DIGITS: usize = 10;

/// Identifier of one advertising account.
///
/// Always holds exactly ten ASCII digits. Parsing strips dashes, quotes and
/// any other non-digit characters and left-pads with zeros, so
/// `"123-456-7890"`, `"\"1234567890\""` and `"1234567890"` all normalize to
/// the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerId(String);

impl CustomerId {
    /// Normalizes a user- or API-supplied id.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::InvalidInput`] if the input contains no digits
    /// or more than ten of them.
    pub fn parse(raw: &str) -> Result<Self, AdsError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(AdsError::InvalidInput(format!(
                "customer id {raw:?} contains no digits"
            )));
        }
        if digits.len() > CUSTOMER_ID_DIGITS {
            return Err(AdsError::InvalidInput(format!(
                "customer id {raw:?} has more than {CUSTOMER_ID_DIGITS} digits"
            )));
        }
        Ok(Self(format!("{digits:0>width$}", width = CUSTOMER_ID_DIGITS)))
    }

    /// Extracts the id from a resource name such as `customers/1234567890`.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::InvalidInput`] if the last path segment is not a
    /// valid id.
    pub fn from_resource_name(resource_name: &str) -> Result<Self, AdsError> {
        let last = resource_name.rsplit('/').next().unwrap_or(resource_name);
        Self::parse(last)
    }

    /// Returns the normalized ten-digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `customers/<id>` resource name.
    #[must_use]
    pub fn resource_name(&self) -> String {
        format!("customers/{}", self.0)
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CustomerId {
    type Err = AdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CustomerId {
    type Error = AdsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CustomerId> for String {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn strips_dashes() {
        let Ok(id) = CustomerId::parse("123-456-7890") else {
            panic!("dashed id should parse");
        };
        assert_eq!(id.as_str(), "1234567890");
    }

    #[test]
    fn strips_quotes_and_pads() {
        let Ok(id) = CustomerId::parse("\"98765\"") else {
            panic!("quoted id should parse");
        };
        assert_eq!(id.as_str(), "0000098765");
        assert_eq!(id.as_str().len(), CUSTOMER_ID_DIGITS);
    }

    #[test]
    fn rejects_empty_and_overlong() {
        assert!(CustomerId::parse("").is_err());
        assert!(CustomerId::parse("abc").is_err());
        assert!(CustomerId::parse("12345678901").is_err());
    }

    #[test]
    fn from_resource_name_takes_last_segment() {
        let Ok(id) = CustomerId::from_resource_name("customers/1112223334") else {
            panic!("resource name should parse");
        };
        assert_eq!(id.to_string(), "1112223334");
        assert_eq!(id.resource_name(), "customers/1112223334");
    }

    #[test]
    fn serde_round_trip_normalizes() {
        let Ok(id) = serde_json::from_str::<CustomerId>("\"111-222-3334\"") else {
            panic!("deserialization failed");
        };
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"1112223334\"");
    }

    #[test]
    fn serde_rejects_invalid() {
        assert!(serde_json::from_str::<CustomerId>("\"n/a\"").is_err());
    }
}
