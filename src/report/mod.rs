//! Report shaping and result artifacts.

pub mod formatter;
pub mod persister;
pub mod summary;

pub use formatter::{format, format_rows};
pub use persister::{PersistedArtifacts, ResultPersister};
pub use summary::{PerformanceSummary, format_currency};
