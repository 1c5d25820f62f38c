//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `TETRANOMA_API_URL` - Marketplace API base URL
//!   (default: `https://tetranoma-express-api.vercel.app/api`)
//! - `TETRANOMA_REQUEST_TIMEOUT_SECS` - Gateway request timeout (default: 30)
//! - `TETRANOMA_SESSION_FILE` - File backing the persisted session
//!   (default: `.tetranoma/session.json`)
//! - `TETRANOMA_PAYMENT_PUBLISHABLE_KEY` - Public key for the hosted payment SDK
//! - `TETRANOMA_PAYMENT_INTENT_TTL_SECS` - Lifetime of a payment intent (default: 900)
//! - `TETRANOMA_ITEMS_PER_PAGE` - Catalog page size (default: 12)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "https://tetranoma-express-api.vercel.app/api";
const DEFAULT_SESSION_FILE: &str = ".tetranoma/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Marketplace API settings
    pub api: ApiConfig,
    /// Path of the persisted session cache
    pub session_file: PathBuf,
    /// Hosted payment settings
    pub payment: PaymentConfig,
    /// Catalog page size sent as `limit`
    pub items_per_page: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Marketplace API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every gateway path is appended to
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Hosted payment configuration.
///
/// Implements `Debug` manually to keep the key out of logs.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Publishable key handed to the hosted payment SDK
    pub publishable_key: Option<String>,
    /// How long a created payment intent may be confirmed
    pub intent_ttl: Duration,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field(
                "publishable_key",
                &self.publishable_key.as_deref().map(redact),
            )
            .field("intent_ttl", &self.intent_ttl)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            publishable_key: None,
            intent_ttl: Duration::from_secs(900),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            payment: PaymentConfig::default(),
            items_per_page: 12,
            sentry_dsn: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(
            "TETRANOMA_API_URL",
            &get_env_or_default("TETRANOMA_API_URL", DEFAULT_API_URL),
        )?;
        let timeout = Duration::from_secs(get_parsed_or_default(
            "TETRANOMA_REQUEST_TIMEOUT_SECS",
            30,
        )?);
        let session_file = PathBuf::from(get_env_or_default(
            "TETRANOMA_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));
        let payment = PaymentConfig {
            publishable_key: get_optional_env("TETRANOMA_PAYMENT_PUBLISHABLE_KEY"),
            intent_ttl: Duration::from_secs(get_parsed_or_default(
                "TETRANOMA_PAYMENT_INTENT_TTL_SECS",
                900,
            )?),
        };
        let items_per_page = get_parsed_or_default("TETRANOMA_ITEMS_PER_PAGE", 12)?;
        if items_per_page == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "TETRANOMA_ITEMS_PER_PAGE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api: ApiConfig { base_url, timeout },
            session_file,
            payment,
            items_per_page,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get and parse an environment variable, falling back to `default` if unset.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse the API base URL. Only absolute http(s) URLs are accepted.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Keep only a short prefix of a key for display.
fn redact(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{prefix}[REDACTED]")
}
