//! Abstractions for generating report summaries with a hosted language model.
//!
//! The Gemini-backed client issues `generateContent` requests directly over HTTP. Gemini has no
//! separate system role for these models, so callers hand over one combined user prompt.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced while asking the model for a summary.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was unreachable or rejected the endpoint.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    /// Provider answered without any candidate text (for example a blocked prompt).
    #[error("Model returned no summary: {0}")]
    EmptyResponse(String),
}

/// Request payload passed to the summarization provider.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    /// Combined system and user prompt.
    pub prompt: String,
}

/// Interface implemented by language-model providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Generate text for the prompt, returned exactly as the model produced it.
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for Google's Gemini `generateContent` API.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client against `base_url` (normally `https://generativelanguage.googleapis.com`).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = Client::builder()
            .user_agent("cascaid-agent/summary")
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl SummarizationClient for GeminiClient {
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: Some(request.prompt),
                }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint(&request.model))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach Gemini at {}: {}",
                    self.base_url,
                    error.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or(body);
            if status == StatusCode::NOT_FOUND {
                return Err(SummarizationClientError::ProviderUnavailable(format!(
                    "model {} not found at {}: {message}",
                    request.model, self.base_url
                )));
            }
            return Err(SummarizationClientError::GenerationFailed(format!(
                "Gemini returned {status}: {message}"
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode Gemini response: {}",
                error.without_url()
            ))
        })?;

        let Some(candidate) = body.candidates.into_iter().next() else {
            let reason = body
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(SummarizationClientError::EmptyResponse(reason));
        };

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "candidate had no text".to_string());
            return Err(SummarizationClientError::EmptyResponse(reason));
        }

        Ok(text)
    }
}
