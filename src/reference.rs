//! Report references and Drive URL resolution.
//!
//! A report reference is the shareable URL a caller hands us plus descriptive metadata about the
//! person and report. Resolution is a pure string operation: the `/d/<id>` path form wins over
//! the `id=<id>` query form.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Sentinel used when no subject identifier is supplied.
pub const UNKNOWN_ID: &str = "UNKNOWN";
/// Sentinel used for any other missing metadata field.
pub const UNKNOWN: &str = "Unknown";

static PATH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([A-Za-z0-9_-]+)").expect("valid path id pattern"));
static QUERY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").expect("valid query id pattern"));

/// Raised when a URL carries no recognizable file identifier.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Could not parse file id from URL: {url}")]
pub struct InvalidReference {
    /// The URL that failed to resolve.
    pub url: String,
}

/// Opaque Drive file identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(String);

impl FileId {
    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the Drive file identifier from a shareable URL.
pub fn resolve(url: &str) -> Result<FileId, InvalidReference> {
    PATH_ID
        .captures(url)
        .or_else(|| QUERY_ID.captures(url))
        .and_then(|captures| captures.get(1))
        .map(|id| FileId(id.as_str().to_string()))
        .ok_or_else(|| InvalidReference {
            url: url.to_string(),
        })
}

/// Descriptive metadata about the report's subject, substituted into the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMetadata {
    /// Subject identifier.
    pub cascaid_id: String,
    /// Subject's full name.
    pub full_name: String,
    /// Kind of report (assessment, annual review, ...).
    pub report_type: String,
    /// Date the report was issued, as supplied by the caller.
    pub report_date: String,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            cascaid_id: UNKNOWN_ID.to_string(),
            full_name: UNKNOWN.to_string(),
            report_type: UNKNOWN.to_string(),
            report_date: UNKNOWN.to_string(),
        }
    }
}

impl ReportMetadata {
    /// Build metadata from optional fields, filling gaps with the sentinel defaults.
    pub fn from_parts(
        cascaid_id: Option<String>,
        full_name: Option<String>,
        report_type: Option<String>,
        report_date: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            cascaid_id: cascaid_id.unwrap_or(defaults.cascaid_id),
            full_name: full_name.unwrap_or(defaults.full_name),
            report_type: report_type.unwrap_or(defaults.report_type),
            report_date: report_date.unwrap_or(defaults.report_date),
        }
    }
}

/// A shareable URL plus metadata identifying one document to summarize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportReference {
    /// Shareable Drive URL.
    pub url: String,
    /// Metadata describing the report's subject.
    pub metadata: ReportMetadata,
}

impl ReportReference {
    /// Create a reference with default metadata.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            metadata: ReportMetadata::default(),
        }
    }

    /// Replace the metadata attached to this reference.
    pub fn with_metadata(mut self, metadata: ReportMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
