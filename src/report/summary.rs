//! Aggregate performance summary printed next to table output.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{CustomerId, Row};

/// Micros per currency unit.
pub const MICROS_PER_UNIT: f64 = 1_000_000.0;

/// Totals and averages over a set of performance rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    /// Number of rows aggregated.
    pub rows: usize,
    /// Σ `metrics.impressions`.
    pub impressions: i64,
    /// Σ `metrics.clicks`.
    pub clicks: i64,
    /// Σ `metrics.cost_micros`.
    pub cost_micros: i64,
    /// Σ `metrics.conversions`.
    pub conversions: f64,
}

impl PerformanceSummary {
    /// Sums the standard metrics; missing or non-numeric fields count as 0.
    #[must_use]
    pub fn from_rows(rows: &[Row]) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let int = |row: &Row, field: &str| row.get_f64(field).map_or(0, |v| v.round() as i64);
        rows.iter().fold(
            Self {
                rows: rows.len(),
                ..Self::default()
            },
            |acc, row| Self {
                impressions: acc.impressions.saturating_add(int(row, "metrics.impressions")),
                clicks: acc.clicks.saturating_add(int(row, "metrics.clicks")),
                cost_micros: acc.cost_micros.saturating_add(int(row, "metrics.cost_micros")),
                conversions: acc.conversions + row.get_f64("metrics.conversions").unwrap_or(0.0),
                ..acc
            },
        )
    }

    /// Click-through rate in percent; 0 without impressions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ctr_percent(&self) -> f64 {
        if self.impressions > 0 {
            self.clicks as f64 / self.impressions as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Average cost per click in micros; 0 without clicks.
    #[must_use]
    pub fn cpc_micros(&self) -> i64 {
        if self.clicks > 0 {
            self.cost_micros / self.clicks
        } else {
            0
        }
    }

    /// Conversions per click in percent; 0 without clicks.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn conversion_rate_percent(&self) -> f64 {
        if self.clicks > 0 {
            self.conversions / self.clicks as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Renders the human-readable summary block.
    #[must_use]
    pub fn render(
        &self,
        subject: &str,
        customer_id: &CustomerId,
        currency: &str,
        generated_at: DateTime<Utc>,
    ) -> String {
        if self.rows == 0 {
            return format!("No {subject} data found.\n");
        }
        let mut out = String::new();
        let _ = writeln!(out, "{} Performance Summary", title_case(subject));
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out, "Customer ID: {customer_id}");
        let _ = writeln!(out, "Total {subject}s: {}", self.rows);
        let _ = writeln!(out);
        let _ = writeln!(out, "Overall Metrics:");
        let _ = writeln!(out, "  Total Impressions: {}", group_thousands(self.impressions));
        let _ = writeln!(out, "  Total Clicks: {}", group_thousands(self.clicks));
        let _ = writeln!(out, "  Total Cost: {}", format_currency(self.cost_micros, currency));
        let _ = writeln!(out, "  Total Conversions: {:.2}", self.conversions);
        let _ = writeln!(out);
        let _ = writeln!(out, "Average Metrics:");
        let _ = writeln!(out, "  CTR: {:.2}%", self.ctr_percent());
        let _ = writeln!(out, "  CPC: {}", format_currency(self.cpc_micros(), currency));
        let _ = writeln!(out, "  Conversion Rate: {:.2}%", self.conversion_rate_percent());
        let _ = writeln!(out);
        let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
        out
    }
}

/// Renders a micros amount as `<units:.2> <CODE>`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_currency(micros: i64, currency: &str) -> String {
    format!("{:.2} {currency}", micros as f64 / MICROS_PER_UNIT)
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
