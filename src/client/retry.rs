//! Single-request retry with exponential backoff.
//!
//! | Failure                 | Retries | Then                        |
//! |-------------------------|---------|-----------------------------|
//! | rate limited            | 3       | [`AdsError::Transient`]     |
//! | server / network        | 1       | [`AdsError::Transient`]     |
//! | unauthorized / invalid  | 0       | [`AdsError::Query`]         |

use std::future::Future;
use std::time::Duration;

use super::transport::{TransportError, TransportErrorKind};
use crate::error::AdsError;

/// Retry budget and backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
    /// Upper bound of any single delay.
    pub max_delay: Duration,
    /// Retries granted to rate-limited requests.
    pub rate_limit_retries: u32,
    /// Retries granted to server and network failures.
    pub transient_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            rate_limit_retries: 3,
            transient_retries: 1,
        }
    }
}

impl RetryPolicy {
    /// Same budget with no waiting between attempts.
    #[must_use]
    pub fn without_delay(self) -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..self
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `max_delay`.
    #[must_use]
    pub fn backoff_for_retry(&self, retry: u32) -> Duration {
        let exp = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay
            .checked_mul(exp)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `op` until it succeeds or the budget for its failure class is
    /// spent.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Query`] for a non-retryable rejection and
    /// [`AdsError::Transient`] once retries are exhausted.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, AdsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempts = 0_u32;
        let mut rate_limited = 0_u32;
        let mut transient = 0_u32;

        loop {
            attempts += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let retry = match err.kind {
                TransportErrorKind::Unauthorized | TransportErrorKind::InvalidRequest => {
                    return Err(AdsError::Query {
                        status: err.status.unwrap_or_default(),
                        message: err.message,
                    });
                }
                TransportErrorKind::RateLimited if rate_limited < self.rate_limit_retries => {
                    rate_limited += 1;
                    rate_limited
                }
                TransportErrorKind::Server | TransportErrorKind::Network
                    if transient < self.transient_retries =>
                {
                    transient += 1;
                    transient
                }
                _ => {
                    tracing::warn!(operation, attempts, kind = %err.kind, "retry budget exhausted");
                    return Err(AdsError::Transient {
                        attempts,
                        message: err.to_string(),
                    });
                }
            };

            let delay = self.backoff_for_retry(retry);
            tracing::warn!(
                operation,
                attempt = attempts,
                kind = %err.kind,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "request failed; retrying"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
