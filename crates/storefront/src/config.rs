//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MAISON_API_URL` - Base URL of the storefront backend (e.g., `http://127.0.0.1:5000`)
//!
//! ## Optional
//! - `MAISON_OWNER_ID` - Owner identity for the cart and wishlist (default: `guest-user`)
//! - `MAISON_SESSION_COOKIE` - Session cookie sent with every request
//! - `MAISON_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none, transport default)
//! - `MAISON_CATALOG_CACHE_TTL_SECS` - Catalog response cache TTL (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use maison_core::OwnerId;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact the session cookie.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Backend base URL; API paths are resolved against it
    pub api_url: Url,
    /// Owner identity scoping the cart and wishlist
    pub owner_id: OwnerId,
    /// Session cookie forwarded on every request
    pub session_cookie: Option<SecretString>,
    /// Per-request timeout; `None` waits on the transport default
    pub request_timeout: Option<Duration>,
    /// How long catalog responses stay cached
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_url", &self.api_url.as_str())
            .field("owner_id", &self.owner_id)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Build a configuration for a backend URL with defaults everywhere else.
    #[must_use]
    pub fn new(api_url: Url, owner_id: OwnerId) -> Self {
        Self {
            api_url,
            owner_id,
            session_cookie: None,
            request_timeout: None,
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_required_env("MAISON_API_URL")?)?;
        let owner_id = get_env_or_default("MAISON_OWNER_ID", OwnerId::GUEST)
            .parse::<OwnerId>()
            .map_err(|e| ConfigError::InvalidEnvVar("MAISON_OWNER_ID".to_string(), e.to_string()))?;
        let session_cookie = get_optional_env("MAISON_SESSION_COOKIE").map(SecretString::from);
        let request_timeout = get_optional_env("MAISON_REQUEST_TIMEOUT_SECS")
            .map(|v| parse_secs("MAISON_REQUEST_TIMEOUT_SECS", &v))
            .transpose()?;
        let catalog_cache_ttl = parse_secs(
            "MAISON_CATALOG_CACHE_TTL_SECS",
            &get_env_or_default(
                "MAISON_CATALOG_CACHE_TTL_SECS",
                &DEFAULT_CATALOG_CACHE_TTL_SECS.to_string(),
            ),
        )?;

        Ok(Self {
            api_url,
            owner_id,
            session_cookie,
            request_timeout,
            catalog_cache_ttl,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse the backend URL, requiring http(s) and a trailing slash so relative
/// API paths join under it instead of replacing its last segment.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("MAISON_API_URL".to_string(), msg);

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
