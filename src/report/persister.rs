//! Writes result artifacts under the results directory.
//!
//! Each persisted operation yields two files sharing one stem,
//! `<label>_<YYYYmmddTHHMMSSZ>`:
//!
//! - `<stem>_raw.json`: endpoint payload plus query metadata
//! - `<stem>.<ext>`: the formatted report (`txt`, `csv` or `json`)
//!
//! A stem already taken in the directory gets a numeric suffix
//! (`_1`, `_2`...) so earlier artifacts are never overwritten.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::ReportFormat;
use crate::error::AdsError;

/// Timestamp layout of artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Paths written by one [`ResultPersister::persist`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArtifacts {
    /// Raw payload file.
    pub raw: PathBuf,
    /// Formatted report file.
    pub report: PathBuf,
}

/// Writes artifacts into one directory.
#[derive(Debug, Clone)]
pub struct ResultPersister {
    dir: PathBuf,
}

impl ResultPersister {
    /// Creates a persister for `dir`. The directory is created on first
    /// write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the raw payload and the formatted report, stamped now.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Persistence`] if the directory or a file cannot
    /// be written.
    pub fn persist(
        &self,
        label: &str,
        raw: &Value,
        formatted: &str,
        format: ReportFormat,
    ) -> Result<PersistedArtifacts, AdsError> {
        self.persist_at(label, raw, formatted, format, Utc::now())
    }

    /// [`ResultPersister::persist`] with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Persistence`] if the directory or a file cannot
    /// be written.
    pub fn persist_at(
        &self,
        label: &str,
        raw: &Value,
        formatted: &str,
        format: ReportFormat,
        at: DateTime<Utc>,
    ) -> Result<PersistedArtifacts, AdsError> {
        self.ensure_dir()?;
        let report_suffix = format!(".{}", format.extension());
        let stem = self.free_stem(label, at, &["_raw.json", report_suffix.as_str()]);

        let raw_json = serde_json::to_string_pretty(raw)
            .map_err(|e| AdsError::Persistence(format!("failed to encode raw payload: {e}")))?;
        let raw_path = self.dir.join(format!("{stem}_raw.json"));
        let report_path = self.dir.join(format!("{stem}{report_suffix}"));
        write_new(&raw_path, raw_json.as_bytes())?;
        write_new(&report_path, formatted.as_bytes())?;

        tracing::info!(
            raw = %raw_path.display(),
            report = %report_path.display(),
            "results saved"
        );
        Ok(PersistedArtifacts {
            raw: raw_path,
            report: report_path,
        })
    }

    /// Writes a single JSON document as `<label>_<timestamp>.json`.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Persistence`] if the file cannot be written.
    pub fn persist_json(&self, label: &str, value: &Value) -> Result<PathBuf, AdsError> {
        self.ensure_dir()?;
        let stem = self.free_stem(label, Utc::now(), &[".json"]);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| AdsError::Persistence(format!("failed to encode document: {e}")))?;
        let path = self.dir.join(format!("{stem}.json"));
        write_new(&path, json.as_bytes())?;
        tracing::info!(path = %path.display(), "document saved");
        Ok(path)
    }

    fn ensure_dir(&self) -> Result<(), AdsError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AdsError::Persistence(format!("cannot create {}: {e}", self.dir.display()))
        })
    }

    /// First `<label>_<ts>[_n]` stem for which none of `suffixes` exist.
    fn free_stem(&self, label: &str, at: DateTime<Utc>, suffixes: &[&str]) -> String {
        let base = format!("{}_{}", sanitize_label(label), at.format(TIMESTAMP_FORMAT));
        let taken = |stem: &str| {
            suffixes
                .iter()
                .any(|suffix| self.dir.join(format!("{stem}{suffix}")).exists())
        };
        if !taken(&base) {
            return base;
        }
        (1_u32..)
            .map(|n| format!("{base}_{n}"))
            .find(|stem| !taken(stem))
            .unwrap_or(base)
    }
}

/// Keeps `[A-Za-z0-9_-]`, replacing anything else with `_`.
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "result".to_string()
    } else {
        cleaned
    }
}

fn write_new(path: &Path, contents: &[u8]) -> Result<(), AdsError> {
    let io_err =
        |e: std::io::Error| AdsError::Persistence(format!("cannot write {}: {e}", path.display()));
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(contents).map_err(io_err)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn fixed_time() -> DateTime<Utc> {
        let Some(at) = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 5).single() else {
            panic!("valid timestamp");
        };
        at
    }

    #[test]
    fn writes_raw_and_formatted_files() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let persister = ResultPersister::new(dir.path().join("results"));
        let raw = json!({"results": [{"campaign": {"name": "A"}}]});
        let Ok(paths) = persister.persist_at("query", &raw, "a,b\n", ReportFormat::Csv, fixed_time())
        else {
            panic!("persist should succeed");
        };
        assert_eq!(paths.raw.file_name().and_then(|n| n.to_str()), Some("query_20240517T093005Z_raw.json"));
        assert_eq!(paths.report.file_name().and_then(|n| n.to_str()), Some("query_20240517T093005Z.csv"));
        let Ok(written) = fs::read_to_string(&paths.report) else {
            panic!("report readable");
        };
        assert_eq!(written, "a,b\n");
        let Ok(raw_text) = fs::read_to_string(&paths.raw) else {
            panic!("raw readable");
        };
        let Ok(parsed) = serde_json::from_str::<Value>(&raw_text) else {
            panic!("raw is json");
        };
        assert_eq!(parsed, raw);
    }

    #[test]
    fn collisions_get_a_numeric_suffix() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let persister = ResultPersister::new(dir.path());
        let raw = json!([]);
        let first = persister.persist_at("perf", &raw, "x", ReportFormat::Table, fixed_time());
        let second = persister.persist_at("perf", &raw, "y", ReportFormat::Table, fixed_time());
        let (Ok(first), Ok(second)) = (first, second) else {
            panic!("both writes should succeed");
        };
        assert_ne!(first.report, second.report);
        assert_eq!(
            second.report.file_name().and_then(|n| n.to_str()),
            Some("perf_20240517T093005Z_1.txt")
        );
        assert_eq!(fs::read_to_string(&first.report).ok().as_deref(), Some("x"));
    }

    #[test]
    fn labels_are_sanitized() {
        assert_eq!(sanitize_label("campaign performance/30d"), "campaign_performance_30d");
        assert_eq!(sanitize_label("ok-label_1"), "ok-label_1");
        assert_eq!(sanitize_label("   "), "result");
    }

    #[test]
    fn json_document_is_written() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let persister = ResultPersister::new(dir.path());
        let Ok(path) = persister.persist_json("optimization", &json!({"ok": true})) else {
            panic!("persist_json should succeed");
        };
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
        assert!(path.exists());
    }
}
