//! Interactive HTML form over the report pipeline.
//!
//! `GET /` renders an empty form; `POST /` runs the pipeline and renders the same page with the
//! summary or an inline error.

use crate::api::status_for;
use crate::pipeline::{ReportApi, ReportError};
use crate::reference::{ReportMetadata, ReportReference};
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::Html,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

const EMPTY_URL_WARNING: &str = "Please enter a Google Drive URL";

/// Routes serving the interactive form.
pub fn routes<S>() -> Router<Arc<S>>
where
    S: ReportApi + 'static,
{
    Router::new().route("/", get(show_form).post(submit_form::<S>))
}

/// Fields posted by the form.
#[derive(Debug, Default, Deserialize)]
struct FormInput {
    #[serde(default)]
    report_url: String,
    #[serde(default)]
    cascaid_id: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    report_type: String,
    #[serde(default)]
    report_date: String,
}

impl FormInput {
    fn metadata(&self) -> ReportMetadata {
        let field = |value: &str| Some(value.trim().to_string()).filter(|value| !value.is_empty());
        ReportMetadata::from_parts(
            field(&self.cascaid_id),
            field(&self.full_name),
            field(&self.report_type),
            field(&self.report_date),
        )
    }
}

enum Outcome {
    Pending,
    Summary(String),
    Warning(String),
    Failure(String),
}

async fn show_form() -> Html<String> {
    Html(render(
        "",
        &ReportMetadata::default(),
        &Outcome::Pending,
    ))
}

async fn submit_form<S>(
    State(service): State<Arc<S>>,
    Form(input): Form<FormInput>,
) -> (StatusCode, Html<String>)
where
    S: ReportApi,
{
    let metadata = input.metadata();
    let url = input.report_url.trim();
    if url.is_empty() {
        let error = ReportError::ValidationFailed(EMPTY_URL_WARNING.to_string());
        return (
            status_for(&error),
            Html(render(url, &metadata, &Outcome::Warning(error.to_string()))),
        );
    }

    let reference = ReportReference::new(url).with_metadata(metadata.clone());
    match service.summarize(reference).await {
        Ok(outcome) => {
            tracing::info!(file = %outcome.file_name, "Form request completed");
            (
                StatusCode::OK,
                Html(render(url, &metadata, &Outcome::Summary(outcome.summary))),
            )
        }
        Err(error) => {
            tracing::warn!(error = %error, "Form request failed");
            (
                status_for(&error),
                Html(render(
                    url,
                    &metadata,
                    &Outcome::Failure(format!("Error processing report: {error}")),
                )),
            )
        }
    }
}

fn render(url: &str, metadata: &ReportMetadata, outcome: &Outcome) -> String {
    let result = match outcome {
        Outcome::Pending => String::new(),
        Outcome::Summary(summary) => format!(
            "<section class=\"success\"><p>Report processed successfully.</p>\
             <h2>AI Summary</h2><div class=\"summary\">{}</div></section>",
            escape(summary)
        ),
        Outcome::Warning(message) => {
            format!("<p class=\"warning\">{}</p>", escape(message))
        }
        Outcome::Failure(message) => format!("<p class=\"error\">{}</p>", escape(message)),
    };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Cascaid Agent HQ</title>
<style>
body {{ font-family: sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; }}
label {{ display: block; margin-top: 0.75rem; }}
input {{ width: 100%; padding: 0.4rem; }}
.summary {{ white-space: pre-wrap; border: 1px solid #ccc; padding: 1rem; }}
.warning {{ color: #8a6d00; }}
.error {{ color: #b00020; }}
</style>
</head>
<body>
<h1>Cascaid Agent HQ</h1>
<p><strong>PDF Report Summarization System</strong></p>
<form method="post" action="/">
<label>Google Drive URL
<input type="text" name="report_url" value="{url}" placeholder="https://drive.google.com/file/d/FILE_ID/view"></label>
<label>Cascaid ID (optional)<input type="text" name="cascaid_id" value="{cascaid_id}"></label>
<label>Full Name (optional)<input type="text" name="full_name" value="{full_name}"></label>
<label>Report Type (optional)<input type="text" name="report_type" value="{report_type}"></label>
<label>Report Date (optional)<input type="text" name="report_date" value="{report_date}"></label>
<p><button type="submit">Process Report</button></p>
</form>
{result}
</body>
</html>
"#,
        url = escape(url),
        cascaid_id = escape(&metadata.cascaid_id),
        full_name = escape(&metadata.full_name),
        report_type = escape(&metadata.report_type),
        report_date = escape(&metadata.report_date),
    )
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
