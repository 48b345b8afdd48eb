//! Query client for the Ads REST API.
//!
//! - [`transport`]: HTTP calls and failure classification
//! - [`retry`]: backoff budget per failure class
//! - [`queries`]: request type and canned GAQL
//! - [`query_client`]: ties authentication, retry and row shaping together

pub mod queries;
pub mod query_client;
pub mod retry;
pub mod transport;

pub use queries::{DateRange, QueryRequest, SampleQuery};
pub use query_client::{QueryClient, QueryResponse};
pub use retry::RetryPolicy;
pub use transport::{
    AdsTransport, AuthOverrides, HttpTransport, RequestAuth, TransportError, TransportErrorKind,
};
