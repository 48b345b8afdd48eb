//! # adsctl
//!
//! Command-line reporting client for the Google Ads REST API.
//!
//! The crate owns the OAuth2 credential lifecycle (interactive consent,
//! storage, refresh before expiry), runs GAQL queries with retry and
//! backoff, shapes the results into table, CSV or JSON reports and writes
//! timestamped artifacts. Campaign mutations are simulated only.
//!
//! ## Architecture
//!
//! ```text
//! CLI (cli/)
//!     │
//!     ├── Authenticator ──── TokenEndpoint (OAuth2 token URL)
//!     │       │              CodeReceiver (loopback listener / console)
//!     │       └── CredentialStore (JSON file)
//!     │
//!     ├── QueryClient (client/) ── RetryPolicy ── AdsTransport (REST)
//!     │
//!     ├── Formatter / Summary / Persister (report/)
//!     ├── Optimizer (analysis/)
//!     └── Simulator (campaign/)
//! ```
//!
//! Every layer below the CLI takes its collaborators as trait-bounded
//! generics, so tests substitute in-memory stores and scripted transports.

pub mod analysis;
pub mod auth;
pub mod campaign;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod report;
