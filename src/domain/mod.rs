//! Domain layer: identifiers, credentials, rows, reports, recommendations.
//!
//! Plain data types shared by the auth, client, report and analysis
//! layers. Nothing in here performs I/O.

pub mod credentials;
pub mod customer_id;
pub mod recommendation;
pub mod report;
pub mod row;
pub mod secret;

pub use credentials::Credentials;
pub use customer_id::CustomerId;
pub use recommendation::{Recommendation, Verdict};
pub use report::{Report, ReportFormat};
pub use row::{FieldValue, Row};
pub use secret::Secret;
