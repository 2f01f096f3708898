use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Character budget applied to extracted report text before prompting.
pub const DEFAULT_MAX_REPORT_CHARS: usize = 120_000;
/// Port bound by the HTTP server when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 8080;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com";
const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration shared by the HTTP server and the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the Gemini model service.
    pub google_api_key: String,
    /// Gemini model identifier used for summaries.
    pub model_name: String,
    /// Base URL of the Gemini REST API.
    pub gemini_base_url: String,
    /// Base URL of the Google Drive REST API.
    pub drive_base_url: String,
    /// Hard cutoff applied to extracted text before it is placed in the prompt.
    pub max_report_chars: usize,
    /// Optional cap on the number of PDF pages read.
    pub max_pages: Option<usize>,
    /// Port for the HTTP server.
    pub server_port: u16,
    /// Pre-issued OAuth access token for Drive, bypassing credential discovery.
    pub drive_access_token: Option<String>,
    /// Path to a service-account or authorized-user JSON key.
    pub credentials_path: Option<PathBuf>,
    /// Host of the compute metadata server used as the last credential fallback.
    pub metadata_host: String,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            google_api_key: load_env("GOOGLE_API_KEY")?,
            model_name: load_env_optional("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: load_env_optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            drive_base_url: load_env_optional("DRIVE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_DRIVE_BASE_URL.to_string()),
            max_report_chars: parse_optional("MAX_REPORT_CHARS")?
                .unwrap_or(DEFAULT_MAX_REPORT_CHARS),
            max_pages: parse_optional("MAX_PAGES")?,
            server_port: parse_optional("PORT")?.unwrap_or(DEFAULT_PORT),
            drive_access_token: load_env_optional("GOOGLE_DRIVE_ACCESS_TOKEN"),
            credentials_path: load_env_optional("GOOGLE_APPLICATION_CREDENTIALS")
                .map(PathBuf::from),
            metadata_host: load_env_optional("GCE_METADATA_HOST")
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from `.env` and the environment, then install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        model = %config.model_name,
        drive_base_url = %config.drive_base_url,
        max_report_chars = config.max_report_chars,
        max_pages = ?config.max_pages,
        server_port = config.server_port,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_optional_rejects_garbage() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("CASCAID_TEST_BAD_NUMBER", "twelve") };
        let result: Result<Option<usize>, _> = parse_optional("CASCAID_TEST_BAD_NUMBER");
        assert!(matches!(result, Err(ConfigError::InvalidValue(key)) if key == "CASCAID_TEST_BAD_NUMBER"));
    }

    #[test]
    fn blank_values_count_as_absent() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("CASCAID_TEST_BLANK", "   ") };
        assert_eq!(load_env_optional("CASCAID_TEST_BLANK"), None);
        assert!(matches!(
            load_env("CASCAID_TEST_BLANK"),
            Err(ConfigError::MissingVariable(_))
        ));
    }

    #[test]
    fn parse_optional_trims_numbers() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("CASCAID_TEST_PORT", " 9090 ") };
        let port: Option<u16> = parse_optional("CASCAID_TEST_PORT").expect("valid port");
        assert_eq!(port, Some(9090));
    }
}
