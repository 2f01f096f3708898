//! HTTP surface for Cascaid Agent HQ.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /review` – Summarize a Drive report. Body `{ "file_url", "cascaid_id"?, "full_name"?,
//!   "report_type"?, "report_date"? }`; answers `{ "ok": true, "summary" }`.
//! - `POST /process-report` – Same pipeline keyed on `report_url`; answers
//!   `{ "success": true, "summary", "metadata" }`.
//! - `GET /health` – Liveness probe.
//! - `GET /` and `POST /` – Interactive form, see [`crate::ui`].
//!
//! Failures answer `400` for caller mistakes and `500` for everything downstream, with the
//! envelope flag set to `false` and an `error` message.

use crate::pipeline::{ReportApi, ReportError};
use crate::reference::{ReportMetadata, ReportReference};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Service name reported by the health probe.
pub const SERVICE_NAME: &str = "cascaid-agent-hq";

/// Build the HTTP router exposing the JSON endpoints and the interactive form.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ReportApi + 'static,
{
    Router::new()
        .route("/review", post(review::<S>))
        .route("/process-report", post(process_report::<S>))
        .route("/health", get(health))
        .merge(crate::ui::routes::<S>())
        .with_state(service)
}

/// Status code for a pipeline failure: caller input errors are `400`, the rest `500`.
pub(crate) fn status_for(error: &ReportError) -> StatusCode {
    if error.is_caller_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Request body for `POST /review`.
#[derive(Deserialize)]
struct ReviewRequest {
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    cascaid_id: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    report_type: Option<String>,
    #[serde(default)]
    report_date: Option<String>,
}

/// Request body for `POST /process-report`.
#[derive(Deserialize)]
struct ProcessReportRequest {
    #[serde(default)]
    report_url: Option<String>,
    #[serde(default)]
    cascaid_id: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    report_type: Option<String>,
    #[serde(default)]
    report_date: Option<String>,
}

#[derive(Serialize)]
struct ReviewResponse {
    ok: bool,
    summary: String,
}

#[derive(Serialize)]
struct ProcessReportResponse {
    success: bool,
    summary: String,
    metadata: ReportMetadata,
}

/// Summarize a report for the Apps Script integration.
async fn review<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<ReviewResponse>, AppError>
where
    S: ReportApi,
{
    let fail = |error: ReportError| AppError::new("ok", error);
    let Json(request) = payload.map_err(|rejection| fail(json_rejection(rejection)))?;
    let url = required(request.file_url, "Missing file_url").map_err(fail)?;
    let reference = ReportReference::new(url).with_metadata(ReportMetadata::from_parts(
        request.cascaid_id,
        request.full_name,
        request.report_type,
        request.report_date,
    ));

    let outcome = service.summarize(reference).await.map_err(fail)?;
    tracing::info!(
        file = %outcome.file_name,
        pages = outcome.page_count,
        skipped = outcome.skipped_pages.len(),
        "Review request completed"
    );
    Ok(Json(ReviewResponse {
        ok: true,
        summary: outcome.summary,
    }))
}

/// Summarize a report and echo the metadata used.
async fn process_report<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<ProcessReportRequest>, JsonRejection>,
) -> Result<Json<ProcessReportResponse>, AppError>
where
    S: ReportApi,
{
    let fail = |error: ReportError| AppError::new("success", error);
    let Json(request) = payload.map_err(|rejection| fail(json_rejection(rejection)))?;
    let url = required(request.report_url, "report_url is required").map_err(fail)?;
    let reference = ReportReference::new(url).with_metadata(ReportMetadata::from_parts(
        request.cascaid_id,
        request.full_name,
        request.report_type,
        request.report_date,
    ));

    let outcome = service.summarize(reference).await.map_err(fail)?;
    tracing::info!(
        file = %outcome.file_name,
        pages = outcome.page_count,
        skipped = outcome.skipped_pages.len(),
        "Process-report request completed"
    );
    Ok(Json(ProcessReportResponse {
        success: true,
        summary: outcome.summary,
        metadata: outcome.metadata,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

fn required(value: Option<String>, message: &str) -> Result<String, ReportError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ReportError::ValidationFailed(message.to_string()))
}

fn json_rejection(rejection: JsonRejection) -> ReportError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ReportError::ValidationFailed("No JSON data provided".to_string())
        }
        other => ReportError::ValidationFailed(format!("Invalid JSON body: {}", other.body_text())),
    }
}

/// Pipeline failure rendered in one of the two response envelopes.
struct AppError {
    flag: &'static str,
    error: ReportError,
}

impl AppError {
    fn new(flag: &'static str, error: ReportError) -> Self {
        Self { flag, error }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.error);
        if status.is_server_error() {
            tracing::error!(error = %self.error, "Request failed");
        } else {
            tracing::info!(error = %self.error, "Rejected request");
        }
        let mut body = Map::new();
        body.insert(self.flag.to_string(), Value::Bool(false));
        body.insert("error".to_string(), Value::String(self.error.to_string()));
        (status, Json(Value::Object(body))).into_response()
    }
}
