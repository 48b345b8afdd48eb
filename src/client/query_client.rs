//! Query execution: authentication, retry and row shaping.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::queries::{self, QueryRequest};
use super::retry::RetryPolicy;
use super::transport::{AdsTransport, AuthOverrides, RequestAuth};
use crate::auth::{Authenticator, CredentialStore, TokenEndpoint};
use crate::domain::{Credentials, CustomerId, FieldValue, Row};
use crate::error::AdsError;

/// Currency assumed when the account currency cannot be read.
pub const FALLBACK_CURRENCY: &str = "USD";

/// Result of one query.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    /// Account the query ran against.
    pub customer_id: CustomerId,
    /// Query text actually sent.
    pub query: String,
    /// SELECT-clause columns, in order.
    pub columns: Vec<String>,
    /// Endpoint payload plus query metadata, for the raw artifact.
    pub raw: Value,
    /// Flattened rows in endpoint order.
    pub rows: Vec<Row>,
    /// When the last page arrived.
    pub fetched_at: DateTime<Utc>,
}

/// Runs read-only queries on behalf of an authenticated user.
#[derive(Debug)]
pub struct QueryClient<T, E, S> {
    transport: T,
    authenticator: Authenticator<E, S>,
    retry: RetryPolicy,
    overrides: AuthOverrides,
}

impl<T, E, S> QueryClient<T, E, S>
where
    T: AdsTransport,
    E: TokenEndpoint,
    S: CredentialStore,
{
    /// Creates a client with the default retry policy.
    #[must_use]
    pub fn new(transport: T, authenticator: Authenticator<E, S>) -> Self {
        Self {
            transport,
            authenticator,
            retry: RetryPolicy::default(),
            overrides: AuthOverrides::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets header values that replace the stored ones on every request.
    /// The stored credentials keep their own values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: AuthOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// The authenticator used before every call.
    #[must_use]
    pub const fn authenticator(&self) -> &Authenticator<E, S> {
        &self.authenticator
    }

    /// Runs `request` and returns its rows together with the (possibly
    /// refreshed) credentials.
    ///
    /// # Errors
    ///
    /// Propagates [`Authenticator::ensure_valid`] failures; returns
    /// [`AdsError::Query`] when the endpoint rejects the query and
    /// [`AdsError::Transient`] when retries are exhausted.
    pub async fn run_query(
        &self,
        request: &QueryRequest,
        credentials: Credentials,
    ) -> Result<(QueryResponse, Credentials), AdsError> {
        let credentials = self.authenticator.ensure_valid(credentials).await?;
        let response = self.search(request, &credentials).await?;
        Ok((response, credentials))
    }

    async fn search(
        &self,
        request: &QueryRequest,
        credentials: &Credentials,
    ) -> Result<QueryResponse, AdsError> {
        let auth = RequestAuth::with_overrides(credentials, &self.overrides);
        let customer_id = request.customer_id();
        let query = request.effective_query();

        tracing::info!(customer_id = %customer_id, limit = ?request.limit(), "running query");
        tracing::debug!(%query, "query text");

        let results = self
            .retry
            .run("search", || self.transport.search(&auth, customer_id, &query))
            .await?;

        let mut rows: Vec<Row> = results.results.iter().map(Row::from_api_result).collect();
        if let Some(limit) = request.limit() {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        let fetched_at = Utc::now();
        tracing::info!(
            customer_id = %customer_id,
            rows = rows.len(),
            pages = results.pages,
            "query complete"
        );

        let raw = json!({
            "customer_id": customer_id.as_str(),
            "query": query,
            "fetched_at": fetched_at.to_rfc3339(),
            "pages": results.pages,
            "field_mask": results.field_mask,
            "total_results": rows.len(),
            "results": results.results,
        });

        Ok(QueryResponse {
            customer_id: customer_id.clone(),
            query,
            columns: request.columns(),
            raw,
            rows,
            fetched_at,
        })
    }

    /// Lists the accounts the credentials can access directly, as rows of
    /// `customer.id` and `customer.resource_name`.
    ///
    /// # Errors
    ///
    /// Same as [`QueryClient::run_query`].
    pub async fn list_accounts(
        &self,
        credentials: Credentials,
    ) -> Result<(Vec<Row>, Credentials), AdsError> {
        let credentials = self.authenticator.ensure_valid(credentials).await?;
        let auth = RequestAuth::with_overrides(&credentials, &self.overrides);
        let names = self
            .retry
            .run("list_accessible_customers", || {
                self.transport.list_accessible_customers(&auth)
            })
            .await?;

        let rows = names
            .into_iter()
            .map(|name| {
                let id = CustomerId::from_resource_name(&name)
                    .map(|id| id.as_str().to_string())
                    .unwrap_or_default();
                Row::new()
                    .with("customer.id", FieldValue::Identifier(id))
                    .with("customer.resource_name", FieldValue::Identifier(name))
            })
            .collect::<Vec<_>>();
        tracing::info!(accounts = rows.len(), "listed accessible customers");
        Ok((rows, credentials))
    }

    /// Currency code of `customer_id`, falling back to
    /// [`FALLBACK_CURRENCY`] when the query fails or returns nothing.
    ///
    /// # Errors
    ///
    /// Only authentication failures are returned; query failures degrade to
    /// the fallback.
    pub async fn account_currency(
        &self,
        customer_id: &CustomerId,
        credentials: Credentials,
    ) -> Result<(String, Credentials), AdsError> {
        let credentials = self.authenticator.ensure_valid(credentials).await?;
        let request = QueryRequest::new(customer_id.clone(), queries::ACCOUNT_CURRENCY)?;
        let currency = match self.search(&request, &credentials).await {
            Ok(response) => response
                .rows
                .first()
                .map(|row| row.render("customer.currency_code"))
                .filter(|code| !code.is_empty()),
            Err(e) => {
                tracing::warn!(customer_id = %customer_id, error = %e, "could not read account currency");
                None
            }
        };
        let currency = currency.unwrap_or_else(|| {
            tracing::warn!(customer_id = %customer_id, fallback = FALLBACK_CURRENCY, "using fallback currency");
            FALLBACK_CURRENCY.to_string()
        });
        Ok((currency, credentials))
    }
}
