//! Prompt template and report-text truncation.

use crate::reference::ReportMetadata;

/// Appended to report text that was cut to fit the character budget.
pub const TRUNCATION_MARKER: &str = "\n\n[Truncated for token limits]";

/// Persona and output contract given to the model.
pub const SYSTEM_PROMPT: &str = "You are Cascaid Pulse, an agent in the Genesis ecosystem.
Summarize clinical/performance reports for internal practitioners.
Be concise, accurate, and neutral.
Return:
- 1–2 sentence overview
- 3–5 key findings
- Any red flags (dates mismatch, missing pages, names mismatch)
";

/// Cut `text` to at most `max_chars` characters, appending [`TRUNCATION_MARKER`] when cut.
///
/// Returns the (possibly shortened) text and whether truncation happened.
pub fn truncate_report_text(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => {
            let mut truncated = String::with_capacity(byte_offset + TRUNCATION_MARKER.len());
            truncated.push_str(&text[..byte_offset]);
            truncated.push_str(TRUNCATION_MARKER);
            (truncated, true)
        }
        None => (text.to_string(), false),
    }
}

/// Render the metadata block and report text.
pub fn user_prompt(metadata: &ReportMetadata, report_text: &str) -> String {
    format!(
        "Report metadata:
- Health Seeker: {full_name} (ID: {cascaid_id})
- Report Type: {report_type}
- Report Date: {report_date}

Report text (truncated as needed):
\"\"\"{report_text}\"\"\"
",
        full_name = metadata.full_name,
        cascaid_id = metadata.cascaid_id,
        report_type = metadata.report_type,
        report_date = metadata.report_date,
    )
}

/// Combine the system instructions and user prompt into the single user-role message.
pub fn build_prompt(metadata: &ReportMetadata, report_text: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\n{}", user_prompt(metadata, report_text))
}
