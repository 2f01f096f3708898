//! Google Drive content fetching.
//!
//! PDFs are downloaded as-is, Workspace documents are exported to PDF, and anything else falls
//! back to a direct media download that the Drive API may refuse.

pub mod auth;

use crate::reference::FileId;
use async_trait::async_trait;
use auth::{AuthError, TokenProvider};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// MIME type of PDF documents and of every Workspace export.
pub const PDF_MIME: &str = "application/pdf";

const WORKSPACE_EXPORTABLE: [&str; 3] = [
    "application/vnd.google-apps.document",
    "application/vnd.google-apps.presentation",
    "application/vnd.google-apps.spreadsheet",
];

/// Errors surfaced while talking to Drive.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No usable access token could be obtained.
    #[error("Drive authentication failed: {0}")]
    Auth(#[from] AuthError),
    /// Drive could not be reached or the response could not be read.
    #[error("Drive request failed: {0}")]
    Request(String),
    /// Drive answered with an error status (not found, permission denied, export unsupported).
    #[error("Drive returned {status}: {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Message extracted from Drive's error envelope, or the raw body.
        message: String,
    },
}

/// Raw document bytes retrieved from Drive.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// Display name of the Drive file.
    pub name: String,
    /// MIME type Drive reports for the stored file.
    pub mime_type: String,
    /// MIME type of `bytes` (PDF for downloads and exports, the stored type otherwise).
    pub content_type: String,
    /// Document bytes.
    pub bytes: Vec<u8>,
}

/// Retrieves document bytes for a Drive file identifier.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the file, exporting Workspace documents to PDF.
    async fn fetch(&self, id: &FileId) -> Result<FetchedContent, FetchError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata {
    #[serde(default)]
    name: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Drive v3 REST client.
pub struct GoogleDriveClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn TokenProvider>,
}

impl GoogleDriveClient {
    /// Build a client against `base_url` (normally `https://www.googleapis.com`).
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn TokenProvider>) -> Self {
        let http = Client::builder()
            .user_agent("cascaid-agent/drive")
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.into(),
            credentials,
        }
    }

    fn file_url(&self, id: &FileId) -> String {
        format!(
            "{}/drive/v3/files/{}",
            self.base_url.trim_end_matches('/'),
            id.as_str()
        )
    }

    async fn get(&self, url: String, query: &[(&str, &str)]) -> Result<Response, FetchError> {
        let token = self.credentials.access_token(&self.http).await?;
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|error| FetchError::Request(format!("failed to reach Drive: {error}")))?;
        ensure_success(response).await
    }

    async fn metadata(&self, id: &FileId) -> Result<FileMetadata, FetchError> {
        let response = self
            .get(
                self.file_url(id),
                &[("fields", "id,name,mimeType"), ("supportsAllDrives", "true")],
            )
            .await?;
        response.json().await.map_err(|error| {
            FetchError::Request(format!("failed to decode Drive metadata: {error}"))
        })
    }

    async fn download(&self, id: &FileId) -> Result<Vec<u8>, FetchError> {
        let response = self
            .get(
                self.file_url(id),
                &[("alt", "media"), ("supportsAllDrives", "true")],
            )
            .await?;
        read_bytes(response).await
    }

    async fn export_pdf(&self, id: &FileId) -> Result<Vec<u8>, FetchError> {
        let response = self
            .get(
                format!("{}/export", self.file_url(id)),
                &[("mimeType", PDF_MIME)],
            )
            .await?;
        read_bytes(response).await
    }
}

#[async_trait]
impl ContentFetcher for GoogleDriveClient {
    async fn fetch(&self, id: &FileId) -> Result<FetchedContent, FetchError> {
        let FileMetadata { name, mime_type } = self.metadata(id).await?;
        tracing::debug!(file_id = %id, name = %name, mime_type = %mime_type, credentials = self.credentials.kind(), "Resolved Drive metadata");

        let (bytes, content_type) = if mime_type == PDF_MIME {
            (self.download(id).await?, PDF_MIME.to_string())
        } else if WORKSPACE_EXPORTABLE.contains(&mime_type.as_str()) {
            tracing::debug!(file_id = %id, "Exporting Workspace document as PDF");
            (self.export_pdf(id).await?, PDF_MIME.to_string())
        } else {
            tracing::warn!(file_id = %id, mime_type = %mime_type, "Unexpected MIME type; attempting direct download");
            (self.download(id).await?, mime_type.clone())
        };

        Ok(FetchedContent {
            name,
            mime_type,
            content_type,
            bytes,
        })
    }
}

async fn ensure_success(response: Response) -> Result<Response, FetchError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    Err(FetchError::Upstream { status, message })
}

async fn read_bytes(response: Response) -> Result<Vec<u8>, FetchError> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|error| FetchError::Request(format!("failed to read Drive content: {error}")))
}
