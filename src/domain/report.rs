//! Report value: rows plus the chosen output encoding.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Row;
use crate::error::AdsError;

/// Output encoding of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Space-aligned text table.
    #[default]
    Table,
    /// Comma-separated values with a header line.
    Csv,
    /// JSON array of field→value objects.
    Json,
}

impl ReportFormat {
    /// File extension used for persisted artifacts.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Table => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Csv => "csv",
            Self::Json => "json",
        })
    }
}

impl FromStr for ReportFormat {
    type Err = AdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(AdsError::InvalidInput(format!(
                "unknown format {other:?} (expected table, csv or json)"
            ))),
        }
    }
}

/// A formatted view over a row sequence.
///
/// Built once per formatting request and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Report {
    rows: Vec<Row>,
    columns: Vec<String>,
    format: ReportFormat,
    generated_at: DateTime<Utc>,
}

impl Report {
    /// Builds a report whose columns are the union of the rows' fields in
    /// first-appearance order.
    #[must_use]
    pub fn new(rows: Vec<Row>, format: ReportFormat) -> Self {
        Self::with_columns(rows, &[], format)
    }

    /// Builds a report that lists `preferred` columns first (typically the
    /// query's SELECT list), followed by any other fields the rows expose.
    ///
    /// Preferred columns appear even when no row has them, so an empty
    /// result still produces a header.
    #[must_use]
    pub fn with_columns(rows: Vec<Row>, preferred: &[String], format: ReportFormat) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for name in preferred {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        for row in &rows {
            for name in row.field_names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }
        Self {
            rows,
            columns,
            format,
            generated_at: Utc::now(),
        }
    }

    /// The rows, in endpoint order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Column names, in output order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Requested encoding.
    #[must_use]
    pub const fn format(&self) -> ReportFormat {
        self.format
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_insensitively() {
        assert!(matches!("CSV".parse::<ReportFormat>(), Ok(ReportFormat::Csv)));
        assert!(matches!(" json ".parse::<ReportFormat>(), Ok(ReportFormat::Json)));
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for format in [ReportFormat::Table, ReportFormat::Csv, ReportFormat::Json] {
            let Ok(parsed) = format.to_string().parse::<ReportFormat>() else {
                panic!("format should parse back");
            };
            assert_eq!(parsed, format);
        }
    }

    #[test]
    fn columns_union_in_first_appearance_order() {
        let rows = vec![
            Row::new().with("campaign.name", "A").with("metrics.clicks", 1_i64),
            Row::new().with("campaign.name", "B").with("metrics.cost_micros", 5_i64),
        ];
        let report = Report::new(rows, ReportFormat::Table);
        assert_eq!(
            report.columns(),
            ["campaign.name", "metrics.clicks", "metrics.cost_micros"]
        );
    }

    #[test]
    fn preferred_columns_come_first_and_survive_empty_results() {
        let preferred = vec!["campaign.id".to_string(), "campaign.name".to_string()];
        let report = Report::with_columns(Vec::new(), &preferred, ReportFormat::Csv);
        assert_eq!(report.columns(), preferred.as_slice());
        assert!(report.rows().is_empty());
    }
}
