//! Optimization analysis over fetched performance rows. Pure; no I/O.

pub mod optimizer;

pub use optimizer::{
    AggregateMetrics, CampaignAnalysis, DEFAULT_TARGET_CTR, DEFAULT_TARGET_ROAS, analyze,
    analyze_campaigns, validate_targets,
};
