use std::process::{Command, Output};

fn summarize_report(envs: &[(&str, &str)]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_summarize-report"))
        .env_clear()
        .current_dir(std::env::temp_dir())
        .envs(envs.iter().copied())
        .output()
        .expect("run summarize-report")
}

#[test]
fn missing_url_prints_usage_and_exits_one() {
    let output = summarize_report(&[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: summarize-report"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn blank_report_url_counts_as_missing() {
    let output = summarize_report(&[("REPORT_URL", " ")]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: summarize-report"), "stderr: {stderr}");
}

#[test]
fn missing_api_key_is_reported_without_summary() {
    let output = summarize_report(&[("REPORT_URL", "https://drive.google.com/file/d/ABC/view")]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GOOGLE_API_KEY"), "stderr: {stderr}");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("=== SUMMARY ==="));
}
