//! Core data types and error definitions for the report pipeline.

use crate::{
    drive::FetchError, extract::ExtractionError, reference::InvalidReference,
    reference::ReportMetadata, summarization::SummarizationClientError,
};
use thiserror::Error;

/// Closed set of failures a summarize call can end in.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A required request field was missing or blank.
    #[error("{0}")]
    ValidationFailed(String),
    /// The URL did not carry a Drive file identifier.
    #[error(transparent)]
    InvalidReference(#[from] InvalidReference),
    /// Drive metadata, download, or export failed.
    #[error("Failed to fetch report: {0}")]
    FetchFailed(String),
    /// The fetched bytes were not a readable document.
    #[error("Failed to extract report text: {0}")]
    ExtractionFailed(String),
    /// The language model call failed.
    #[error("Failed to summarize report: {0}")]
    ModelInvocationFailed(String),
}

impl ReportError {
    /// Whether the failure was caused by caller input rather than a downstream service.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::ValidationFailed(_) | Self::InvalidReference(_))
    }
}

impl From<FetchError> for ReportError {
    fn from(error: FetchError) -> Self {
        Self::FetchFailed(error.to_string())
    }
}

impl From<ExtractionError> for ReportError {
    fn from(error: ExtractionError) -> Self {
        Self::ExtractionFailed(error.to_string())
    }
}

impl From<SummarizationClientError> for ReportError {
    fn from(error: SummarizationClientError) -> Self {
        Self::ModelInvocationFailed(error.to_string())
    }
}

/// Per-call knobs for the summarize pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Model identifier passed to the provider.
    pub model: String,
    /// Character budget for extracted text.
    pub max_chars: usize,
    /// Optional cap on pages read from the PDF.
    pub max_pages: Option<usize>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            max_chars: crate::config::DEFAULT_MAX_REPORT_CHARS,
            max_pages: None,
        }
    }
}

/// Result of a completed summarize call.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    /// Model output, unmodified.
    pub summary: String,
    /// Metadata the prompt was built from.
    pub metadata: ReportMetadata,
    /// Drive display name of the report.
    pub file_name: String,
    /// Pages read from the document.
    pub page_count: usize,
    /// Zero-based indices of pages whose text could not be extracted.
    pub skipped_pages: Vec<usize>,
    /// Whether the report text was cut to fit the character budget.
    pub truncated: bool,
}
