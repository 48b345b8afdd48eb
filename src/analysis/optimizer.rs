//! Threshold analysis of campaign performance rows.
//!
//! Aggregates are computed from whichever source fields the rows expose:
//!
//! | Metric            | Preferred source                         | Fallback                |
//! |-------------------|------------------------------------------|-------------------------|
//! | `roas`            | Σ conversions_value / (Σ cost_micros/1e6) | Σ conversions·1e6 / Σ cost_micros, then mean `metrics.roas` |
//! | `ctr` (%)         | Σ clicks / Σ impressions · 100           | mean `metrics.ctr` · 100 |
//! | `conversion_rate` | Σ conversions / Σ clicks · 100           | none                    |

use serde::Serialize;

use crate::domain::recommendation::DEFAULT_TOLERANCE;
use crate::domain::{Recommendation, Row, Verdict};
use crate::error::AdsError;

/// Default ROAS target of the `optimize` command.
pub const DEFAULT_TARGET_ROAS: f64 = 3.0;
/// Default CTR target (percent) of the `optimize` command.
pub const DEFAULT_TARGET_CTR: f64 = 2.0;
/// Conversion rate (percent) below which landing pages need attention.
pub const CONVERSION_RATE_BENCHMARK: f64 = 2.0;
/// A campaign whose ROAS is below this share of the target is a low
/// performer.
pub const LOW_PERFORMER_RATIO: f64 = 0.5;

const MICROS: f64 = 1_000_000.0;

/// Account-level aggregates; `None` when the source fields are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateMetrics {
    /// Return on ad spend.
    pub roas: Option<f64>,
    /// Click-through rate in percent.
    pub ctr_percent: Option<f64>,
    /// Conversions per click in percent.
    pub conversion_rate_percent: Option<f64>,
    /// Σ `metrics.cost_micros`.
    pub total_cost_micros: f64,
    /// Σ `metrics.conversions`.
    pub total_conversions: f64,
}

impl AggregateMetrics {
    /// Computes the aggregates over `rows`.
    #[must_use]
    pub fn from_rows(rows: &[Row]) -> Self {
        let cost = sum(rows, "metrics.cost_micros");
        let conversions = sum(rows, "metrics.conversions");
        let value = sum(rows, "metrics.conversions_value");
        let clicks = sum(rows, "metrics.clicks");
        let impressions = sum(rows, "metrics.impressions");

        let roas = match (value, conversions, cost) {
            (Some(value), _, Some(cost)) => Some(ratio(value, cost / MICROS)),
            (None, Some(conversions), Some(cost)) => Some(ratio(conversions * MICROS, cost)),
            _ => mean(rows, "metrics.roas"),
        };
        let ctr_percent = match (clicks, impressions) {
            (Some(clicks), Some(impressions)) => Some(ratio(clicks, impressions) * 100.0),
            _ => mean(rows, "metrics.ctr").map(|ctr| ctr * 100.0),
        };
        let conversion_rate_percent = match (conversions, clicks) {
            (Some(conversions), Some(clicks)) => Some(ratio(conversions, clicks) * 100.0),
            _ => None,
        };

        Self {
            roas,
            ctr_percent,
            conversion_rate_percent,
            total_cost_micros: cost.unwrap_or(0.0),
            total_conversions: conversions.unwrap_or(0.0),
        }
    }
}

/// Result of [`analyze_campaigns`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignAnalysis {
    /// Aggregates over every row.
    pub metrics: AggregateMetrics,
    /// One entry per metric that could be computed.
    pub recommendations: Vec<Recommendation>,
    /// Campaigns with ROAS below half the target.
    pub low_performers: Vec<String>,
    /// Campaigns with ROAS above the target.
    pub high_performers: Vec<String>,
}

/// Compares the rows' aggregates against the targets.
///
/// # Errors
///
/// Returns [`AdsError::InvalidInput`] for a non-positive or non-finite
/// target and [`AdsError::Analysis`] when no known metric can be computed
/// from the rows.
pub fn analyze(
    rows: &[Row],
    target_roas: f64,
    target_ctr: f64,
) -> Result<Vec<Recommendation>, AdsError> {
    validate_targets(target_roas, target_ctr)?;
    recommend(&AggregateMetrics::from_rows(rows), target_roas, target_ctr)
}

/// [`analyze`] plus the aggregates and per-campaign performer lists.
///
/// # Errors
///
/// Same as [`analyze`].
pub fn analyze_campaigns(
    rows: &[Row],
    target_roas: f64,
    target_ctr: f64,
) -> Result<CampaignAnalysis, AdsError> {
    validate_targets(target_roas, target_ctr)?;
    let metrics = AggregateMetrics::from_rows(rows);
    let recommendations = recommend(&metrics, target_roas, target_ctr)?;

    let mut low_performers = Vec::new();
    let mut high_performers = Vec::new();
    for row in rows {
        let Some(roas) = campaign_roas(row) else {
            continue;
        };
        let name = row
            .get("campaign.name")
            .map(|v| v.render())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        if roas < target_roas * LOW_PERFORMER_RATIO {
            low_performers.push(name);
        } else if roas > target_roas {
            high_performers.push(name);
        }
    }
    tracing::debug!(
        low = low_performers.len(),
        high = high_performers.len(),
        "classified campaigns"
    );

    Ok(CampaignAnalysis {
        metrics,
        recommendations,
        low_performers,
        high_performers,
    })
}

fn recommend(
    metrics: &AggregateMetrics,
    target_roas: f64,
    target_ctr: f64,
) -> Result<Vec<Recommendation>, AdsError> {
    let mut out = Vec::new();
    if let Some(roas) = metrics.roas {
        out.push(recommendation("roas", roas, target_roas, roas_advice));
    }
    if let Some(ctr) = metrics.ctr_percent {
        out.push(recommendation("ctr", ctr, target_ctr, ctr_advice));
    }
    if let Some(rate) = metrics.conversion_rate_percent {
        out.push(recommendation(
            "conversion_rate",
            rate,
            CONVERSION_RATE_BENCHMARK,
            conversion_rate_advice,
        ));
    }
    if out.is_empty() {
        return Err(AdsError::Analysis(
            "rows expose none of cost/conversions, clicks/impressions, metrics.roas or metrics.ctr"
                .to_string(),
        ));
    }
    Ok(out)
}

fn recommendation(
    metric: &str,
    observed: f64,
    target: f64,
    advice: fn(Verdict) -> &'static str,
) -> Recommendation {
    let verdict = Verdict::classify(observed, target, DEFAULT_TOLERANCE);
    Recommendation {
        metric_name: metric.to_string(),
        observed_value: observed,
        target_value: target,
        verdict,
        advice: advice(verdict).to_string(),
    }
}

const fn roas_advice(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Below => {
            "ROAS below target: pause low-performing campaigns, raise bids on \
             high-converting keywords and review ad copy"
        }
        Verdict::At => "ROAS on target: keep current bids and budgets",
        Verdict::Above => "ROAS above target: consider increasing budget for top performers",
    }
}

const fn ctr_advice(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Below => {
            "CTR below target: improve ad headlines and descriptions, add more relevant \
             keywords and use ad extensions"
        }
        Verdict::At => "CTR on target: keep testing ad variations",
        Verdict::Above => "CTR above target: ads are relevant; test broader keywords for reach",
    }
}

const fn conversion_rate_advice(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Below => "Low conversion rate: optimize landing pages",
        Verdict::At => "Conversion rate at benchmark: test landing page variants",
        Verdict::Above => "Conversion rate above benchmark: landing pages convert well",
    }
}

/// Checks both targets are finite and positive.
///
/// # Errors
///
/// Returns [`AdsError::InvalidInput`] naming the offending target.
pub fn validate_targets(target_roas: f64, target_ctr: f64) -> Result<(), AdsError> {
    validate_target("target ROAS", target_roas)?;
    validate_target("target CTR", target_ctr)
}

fn validate_target(name: &str, target: f64) -> Result<(), AdsError> {
    if target.is_finite() && target > 0.0 {
        Ok(())
    } else {
        Err(AdsError::InvalidInput(format!(
            "{name} must be a positive number, got {target}"
        )))
    }
}

/// ROAS of a single row with spend; `None` without spend.
fn campaign_roas(row: &Row) -> Option<f64> {
    let cost = row.get_f64("metrics.cost_micros").filter(|c| *c > 0.0)?;
    if let Some(value) = row.get_f64("metrics.conversions_value") {
        return Some(value / (cost / MICROS));
    }
    let conversions = row.get_f64("metrics.conversions").unwrap_or(0.0);
    Some(conversions * MICROS / cost)
}

/// Σ `field` over the rows that expose it; `None` if none do.
fn sum(rows: &[Row], field: &str) -> Option<f64> {
    rows.iter()
        .filter_map(|row| row.get_f64(field))
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

fn mean(rows: &[Row], field: &str) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|row| row.get_f64(field)).collect();
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    Some(values.iter().sum::<f64>() / n)
}

/// `numerator / denominator`, 0 when the denominator is not positive.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
