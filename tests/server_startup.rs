use std::fs;
use std::process::Command;

#[test]
fn dotenv_settings_apply_to_server_logging() {
    let dir = std::env::temp_dir().join(format!("cascaid-startup-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let log_file = dir.join("server.log");
    let _ = fs::remove_file(&log_file);
    fs::write(
        dir.join(".env"),
        format!("CASCAID_LOG_FILE={}\n", log_file.display()),
    )
    .expect("write .env");

    // No GOOGLE_API_KEY: the server exits after logging is configured.
    let output = Command::new(env!("CARGO_BIN_EXE_cascaid-agent"))
        .env_clear()
        .current_dir(&dir)
        .output()
        .expect("run cascaid-agent");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GOOGLE_API_KEY"), "stderr: {stderr}");
    assert!(log_file.exists(), "log file from .env was not opened");
    assert!(!dir.join("logs").exists());

    let _ = fs::remove_dir_all(&dir);
}
