//! Report service coordinating URL resolution, Drive fetch, text extraction, and the model call.

use crate::{
    config::Config,
    drive::{ContentFetcher, FetchedContent, GoogleDriveClient, auth},
    extract::{PdfTextExtractor, TextExtractor},
    pipeline::{
        prompt::{build_prompt, truncate_report_text},
        types::{ReportError, ReportSummary, SummaryOptions},
    },
    reference::{ReportReference, resolve},
    summarization::{GeminiClient, SummarizationClient, SummarizationRequest},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Runs the fetch → extract → summarize pipeline for one report at a time.
///
/// The service holds only read-only collaborators and default options, so one instance can be
/// built near process start and shared through an `Arc` by every surface.
pub struct ReportService {
    fetcher: Arc<dyn ContentFetcher>,
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn SummarizationClient>,
    options: SummaryOptions,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, form, CLI).
#[async_trait]
pub trait ReportApi: Send + Sync {
    /// Summarize the referenced report with the service's default options.
    async fn summarize(&self, reference: ReportReference) -> Result<ReportSummary, ReportError>;
}

impl ReportService {
    /// Assemble a service from explicit collaborators.
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<dyn SummarizationClient>,
        options: SummaryOptions,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            summarizer,
            options,
        }
    }

    /// Build the production service: Drive over ambient credentials, `lopdf` extraction, Gemini.
    pub fn from_config(config: &Config) -> Result<Self, auth::AuthError> {
        let credentials = auth::default_credentials(config)?;
        tracing::info!(credentials = credentials.kind(), "Drive credentials resolved");
        let fetcher = GoogleDriveClient::new(config.drive_base_url.clone(), credentials);
        let summarizer = GeminiClient::new(
            config.gemini_base_url.clone(),
            config.google_api_key.clone(),
        );
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(PdfTextExtractor),
            Arc::new(summarizer),
            SummaryOptions {
                model: config.model_name.clone(),
                max_chars: config.max_report_chars,
                max_pages: config.max_pages,
            },
        ))
    }

    /// Default options applied by [`ReportApi::summarize`].
    pub fn options(&self) -> &SummaryOptions {
        &self.options
    }

    /// Summarize a report with explicit options.
    pub async fn summarize_with(
        &self,
        reference: ReportReference,
        options: &SummaryOptions,
    ) -> Result<ReportSummary, ReportError> {
        let span = tracing::info_span!("summarize", request_id = %Uuid::new_v4());
        let result = self.run(reference, options).instrument(span.clone()).await;
        if let Err(error) = &result {
            span.in_scope(|| tracing::warn!(error = %error, "Summarize request failed"));
        }
        result
    }

    async fn run(
        &self,
        reference: ReportReference,
        options: &SummaryOptions,
    ) -> Result<ReportSummary, ReportError> {
        let ReportReference { url, metadata } = reference;
        let file_id = resolve(&url)?;
        tracing::info!(file_id = %file_id, "Fetching report");

        let FetchedContent {
            name,
            content_type,
            bytes,
            ..
        } = self.fetcher.fetch(&file_id).await?;
        tracing::debug!(file_id = %file_id, name = %name, content_type = %content_type, bytes = bytes.len(), "Report fetched");

        let extractor = Arc::clone(&self.extractor);
        let max_pages = options.max_pages;
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&bytes, max_pages))
            .await
            .map_err(|error| ReportError::ExtractionFailed(format!("extraction task failed: {error}")))??;
        if !extracted.skipped_pages.is_empty() {
            tracing::warn!(skipped = ?extracted.skipped_pages, "Some pages could not be read");
        }

        let (report_text, truncated) = truncate_report_text(&extracted.text, options.max_chars);
        tracing::debug!(
            pages = extracted.page_count,
            chars = extracted.text.chars().count(),
            truncated,
            "Report text extracted"
        );

        let prompt = build_prompt(&metadata, &report_text);
        let summary = self
            .summarizer
            .generate_summary(SummarizationRequest {
                model: options.model.clone(),
                prompt,
            })
            .await?;
        tracing::info!(file_id = %file_id, model = %options.model, "Report summarized");

        Ok(ReportSummary {
            summary,
            metadata,
            file_name: name,
            page_count: extracted.page_count,
            skipped_pages: extracted.skipped_pages,
            truncated,
        })
    }
}

#[async_trait]
impl ReportApi for ReportService {
    async fn summarize(&self, reference: ReportReference) -> Result<ReportSummary, ReportError> {
        ReportService::summarize_with(self, reference, &self.options).await
    }
}
