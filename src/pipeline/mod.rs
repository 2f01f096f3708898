//! Report pipeline: URL resolution, Drive fetch, text extraction, prompt assembly, model call.

pub mod prompt;
mod service;
pub mod types;

pub use service::{ReportApi, ReportService};
pub use types::{ReportError, ReportSummary, SummaryOptions};
