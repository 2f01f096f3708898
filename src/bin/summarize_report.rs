//! Command-line entrypoint: summarize a single Drive report and print the result.
//!
//! Every argument can also come from the environment (or `.env`); explicit arguments win.
use anyhow::{Context, Result};
use cascaid_agent::{
    config, logging,
    pipeline::{ReportService, SummaryOptions},
    reference::{ReportMetadata, ReportReference, UNKNOWN, UNKNOWN_ID},
};
use clap::Parser;

const USAGE: &str = "Usage: summarize-report <drive_report_url>  (or set REPORT_URL in .env)";

#[derive(Parser)]
#[command(
    name = "summarize-report",
    about = "Summarize a Google Drive report with Gemini"
)]
struct Cli {
    /// Shareable Google Drive URL of the report.
    #[arg(env = "REPORT_URL")]
    report_url: Option<String>,
    /// Subject identifier included in the prompt.
    #[arg(long, env = "CASCAID_ID", default_value = UNKNOWN_ID)]
    cascaid_id: String,
    /// Subject's full name.
    #[arg(long, env = "FULL_NAME", default_value = UNKNOWN)]
    full_name: String,
    /// Kind of report.
    #[arg(long, env = "REPORT_TYPE", default_value = UNKNOWN)]
    report_type: String,
    /// Date the report was issued.
    #[arg(long, env = "REPORT_DATE", default_value = UNKNOWN)]
    report_date: String,
    /// Override the configured Gemini model.
    #[arg(long)]
    model: Option<String>,
    /// Override the character budget for report text.
    #[arg(long)]
    max_chars: Option<usize>,
    /// Read at most this many pages.
    #[arg(long)]
    max_pages: Option<usize>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init_cli_tracing();
    let cli = Cli::parse();

    let Some(report_url) = cli.report_url.clone().filter(|url| !url.trim().is_empty()) else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    match run(cli, report_url).await {
        Ok(summary) => {
            println!("\n=== SUMMARY ===\n");
            println!("{summary}");
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli, report_url: String) -> Result<String> {
    let config = config::init_config().context("failed to load configuration")?;
    let service =
        ReportService::from_config(config).context("failed to resolve Drive credentials")?;

    let defaults = service.options().clone();
    let options = SummaryOptions {
        model: cli.model.unwrap_or(defaults.model),
        max_chars: cli.max_chars.unwrap_or(defaults.max_chars),
        max_pages: cli.max_pages.or(defaults.max_pages),
    };
    let reference = ReportReference::new(report_url).with_metadata(ReportMetadata {
        cascaid_id: cli.cascaid_id,
        full_name: cli.full_name,
        report_type: cli.report_type,
        report_date: cli.report_date,
    });

    let outcome = service
        .summarize_with(reference, &options)
        .await
        .context("failed to summarize report")?;
    if !outcome.skipped_pages.is_empty() {
        tracing::warn!(skipped = ?outcome.skipped_pages, "Summary built without some pages");
    }
    Ok(outcome.summary)
}
