#![deny(missing_docs)]

//! Core library for Cascaid Agent HQ: Drive report fetching, PDF text extraction, and Gemini
//! summaries behind HTTP, form, and command-line surfaces.

/// JSON HTTP routing and handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Google Drive content fetching and credentials.
pub mod drive;
/// PDF text extraction.
pub mod extract;
/// Structured logging and tracing setup.
pub mod logging;
/// Summarize pipeline orchestration.
pub mod pipeline;
/// Report references and Drive URL resolution.
pub mod reference;
/// Language-model client abstraction and the Gemini adapter.
pub mod summarization;
/// Interactive HTML form.
pub mod ui;
