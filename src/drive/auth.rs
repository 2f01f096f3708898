//! OAuth2 access tokens for Drive, discovered the way Google's Application Default Credentials
//! are: an explicit token, a key file named by `GOOGLE_APPLICATION_CREDENTIALS`, the gcloud
//! well-known file, and finally the compute metadata server.
//!
//! Tokens are requested per fetch and never cached.

use crate::config::Config;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;

/// Read-only Drive scope requested for every token.
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const JWT_LIFETIME_SECS: i64 = 3600;

/// Errors raised while discovering credentials or exchanging them for an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential file could not be read.
    #[error("failed to read credentials file {path}: {source}")]
    Io {
        /// Path we attempted to read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Credential file contents were not a supported key format.
    #[error("malformed credentials: {0}")]
    Malformed(String),
    /// Service-account private key could not be used for signing.
    #[error("invalid service account key: {0}")]
    InvalidKey(String),
    /// Token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Request(String),
    /// Token endpoint answered with an error status.
    #[error("token exchange failed ({status}): {body}")]
    TokenExchange {
        /// HTTP status returned by the token endpoint.
        status: u16,
        /// Response body, usually an OAuth error description.
        body: String,
    },
}

/// Source of bearer tokens for Drive requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain an access token valid for the Drive read-only scope.
    async fn access_token(&self, http: &Client) -> Result<String, AuthError>;

    /// Short label used in logs.
    fn kind(&self) -> &'static str;
}

/// Pre-issued token supplied through configuration.
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap an existing bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self, _http: &Client) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }

    fn kind(&self) -> &'static str {
        "static"
    }
}

/// Key file formats understood by the credential loader.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialsFile {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUserKey),
}

#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AuthorizedUserKey {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Service-account key exchanged for tokens through the RS256 JWT bearer grant.
pub struct ServiceAccount {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
}

impl ServiceAccount {
    fn new(key: ServiceAccountKey) -> Result<Self, AuthError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|error| AuthError::InvalidKey(error.to_string()))?;
        Ok(Self { key, signing_key })
    }

    fn assertion(&self) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = JwtClaims {
            iss: &self.key.client_email,
            scope: DRIVE_READONLY_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + JWT_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|error| AuthError::InvalidKey(error.to_string()))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccount {
    async fn access_token(&self, http: &Client) -> Result<String, AuthError> {
        let assertion = self.assertion()?;
        let request = http.post(&self.key.token_uri).form(&[
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ]);
        exchange(request).await
    }

    fn kind(&self) -> &'static str {
        "service_account"
    }
}

/// End-user credentials produced by `gcloud auth application-default login`.
pub struct AuthorizedUser {
    key: AuthorizedUserKey,
}

#[async_trait]
impl TokenProvider for AuthorizedUser {
    async fn access_token(&self, http: &Client) -> Result<String, AuthError> {
        let request = http.post(&self.key.token_uri).form(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.key.client_id.as_str()),
            ("client_secret", self.key.client_secret.as_str()),
            ("refresh_token", self.key.refresh_token.as_str()),
        ]);
        exchange(request).await
    }

    fn kind(&self) -> &'static str {
        "authorized_user"
    }
}

/// Attached service account of the hosting Cloud Run / Cloud Functions / GCE instance.
pub struct MetadataServer {
    host: String,
}

impl MetadataServer {
    /// Target the metadata server at `host` (optionally with a port).
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    fn endpoint(&self) -> String {
        format!(
            "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.host
        )
    }
}

#[async_trait]
impl TokenProvider for MetadataServer {
    async fn access_token(&self, http: &Client) -> Result<String, AuthError> {
        let request = http
            .get(self.endpoint())
            .query(&[("scopes", DRIVE_READONLY_SCOPE)])
            .header("Metadata-Flavor", "Google");
        exchange(request).await
    }

    fn kind(&self) -> &'static str {
        "metadata_server"
    }
}

async fn exchange(request: reqwest::RequestBuilder) -> Result<String, AuthError> {
    let response = request
        .send()
        .await
        .map_err(|error| AuthError::Request(error.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::TokenExchange { status, body });
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|error| AuthError::Request(format!("failed to decode token response: {error}")))?;
    Ok(token.access_token)
}

/// Parse a JSON key (service account or authorized user) into a token provider.
pub fn from_json(json: &str) -> Result<Arc<dyn TokenProvider>, AuthError> {
    let parsed: CredentialsFile =
        serde_json::from_str(json).map_err(|error| AuthError::Malformed(error.to_string()))?;
    Ok(match parsed {
        CredentialsFile::ServiceAccount(key) => Arc::new(ServiceAccount::new(key)?),
        CredentialsFile::AuthorizedUser(key) => Arc::new(AuthorizedUser { key }),
    })
}

/// Load a JSON key file from disk.
pub fn from_file(path: &Path) -> Result<Arc<dyn TokenProvider>, AuthError> {
    let content = std::fs::read_to_string(path).map_err(|source| AuthError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_json(&content)
}

fn well_known_file() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    let path = PathBuf::from(home)
        .join(".config")
        .join("gcloud")
        .join("application_default_credentials.json");
    path.is_file().then_some(path)
}

/// Discover Drive credentials from configuration and the ambient environment.
pub fn default_credentials(config: &Config) -> Result<Arc<dyn TokenProvider>, AuthError> {
    if let Some(token) = &config.drive_access_token {
        return Ok(Arc::new(StaticToken::new(token.clone())));
    }
    if let Some(path) = &config.credentials_path {
        return from_file(path);
    }
    if let Some(path) = well_known_file() {
        tracing::debug!(path = %path.display(), "Using gcloud application default credentials");
        return from_file(&path);
    }
    Ok(Arc::new(MetadataServer::new(config.metadata_host.clone())))
}
