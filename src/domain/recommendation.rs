//! Optimization recommendations derived from performance metrics.

use std::fmt;

use serde::Serialize;

/// Relative tolerance band around a target inside which a metric counts as
/// on target.
pub const DEFAULT_TOLERANCE: f64 = 0.02;

/// Where an observed metric sits relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// More than the tolerance below target.
    Below,
    /// Within the tolerance band.
    At,
    /// More than the tolerance above target.
    Above,
}

impl Verdict {
    /// Classifies `observed` against `target` with a relative `tolerance`
    /// (0.02 = ±2%).
    #[must_use]
    pub fn classify(observed: f64, target: f64, tolerance: f64) -> Self {
        let band = (target * tolerance).abs();
        if observed < target - band {
            Self::Below
        } else if observed > target + band {
            Self::Above
        } else {
            Self::At
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Below => "below",
            Self::At => "at",
            Self::Above => "above",
        })
    }
}

/// One metric compared against its target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Metric name (`roas`, `ctr`, `conversion_rate`).
    pub metric_name: String,
    /// Aggregate observed across the analyzed rows.
    pub observed_value: f64,
    /// Target the metric was compared against.
    pub target_value: f64,
    /// Classification of observed vs target.
    pub verdict: Verdict,
    /// Human-readable advice keyed to the verdict.
    pub advice: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_uses_relative_band() {
        assert_eq!(Verdict::classify(2.0, 4.0, DEFAULT_TOLERANCE), Verdict::Below);
        assert_eq!(Verdict::classify(3.95, 4.0, DEFAULT_TOLERANCE), Verdict::At);
        assert_eq!(Verdict::classify(4.05, 4.0, DEFAULT_TOLERANCE), Verdict::At);
        assert_eq!(Verdict::classify(4.2, 4.0, DEFAULT_TOLERANCE), Verdict::Above);
    }

    #[test]
    fn zero_target_has_no_band() {
        assert_eq!(Verdict::classify(0.0, 0.0, DEFAULT_TOLERANCE), Verdict::At);
        assert_eq!(Verdict::classify(0.1, 0.0, DEFAULT_TOLERANCE), Verdict::Above);
    }

    #[test]
    fn verdict_serializes_snake_case() {
        let json = serde_json::to_string(&Verdict::Below).ok();
        assert_eq!(json.as_deref(), Some("\"below\""));
    }
}
