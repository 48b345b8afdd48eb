//! Rows → table, CSV or JSON text.
//!
//! Formatting never fails: a value that cannot be encoded renders as an
//! empty cell (table, CSV) or `null` (JSON). Field values are never
//! truncated or rounded.

use serde_json::{Map, Value};

use crate::domain::{Report, ReportFormat, Row};

/// Column separator of the text table.
const TABLE_SEPARATOR: &str = " | ";

/// Formats `rows` with columns in first-appearance order.
#[must_use]
pub fn format_rows(rows: &[Row], kind: ReportFormat) -> String {
    format(&Report::new(rows.to_vec(), kind))
}

/// Formats a report in its own encoding.
#[must_use]
pub fn format(report: &Report) -> String {
    match report.format() {
        ReportFormat::Table => to_table(report.columns(), report.rows()),
        ReportFormat::Csv => to_csv(report.columns(), report.rows()),
        ReportFormat::Json => to_json(report.columns(), report.rows()),
    }
}

/// Space-aligned table: each column is as wide as its widest header or
/// value, columns are joined by `" | "`, with a dashed rule under the
/// header.
#[must_use]
pub fn to_table(columns: &[String], rows: &[Row]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| row.render(c)).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_table_line(&mut out, columns.iter().map(String::as_str), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for line in &cells {
        push_table_line(&mut out, line.iter().map(String::as_str), &widths);
    }
    out
}

fn push_table_line<'a>(out: &mut String, values: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = values
        .zip(widths)
        .map(|(value, width)| format!("{value:width$}"))
        .collect();
    out.push_str(padded.join(TABLE_SEPARATOR).trim_end());
    out.push('\n');
}

/// CSV with a header line; quoting per RFC 4180.
#[must_use]
pub fn to_csv(columns: &[String], rows: &[Row]) -> String {
    let mut out = String::new();
    let header: Vec<String> = columns.iter().map(|c| csv_escape(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in rows {
        let values: Vec<String> = columns.iter().map(|c| csv_escape(&row.render(c))).collect();
        out.push_str(&values.join(","));
        out.push('\n');
    }
    out
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
#[must_use]
pub fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Pretty JSON array of objects. Keys follow column order; numbers stay
/// numbers; fields a row lacks are omitted.
#[must_use]
pub fn to_json(columns: &[String], rows: &[Row]) -> String {
    let objects: Vec<Value> = rows
        .iter()
        .map(|row| {
            let mut object = Map::new();
            for column in columns {
                if let Some(value) = row.get(column) {
                    object.insert(column.clone(), value.to_json());
                }
            }
            Value::Object(object)
        })
        .collect();
    serde_json::to_string_pretty(&objects).unwrap_or_else(|_| "[]".to_string())
}
