//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `MERCADO_API_URL` - Backend base URL (default: `http://localhost:9003`)
//! - `MERCADO_CART_SERVICE_URL` - Base URL for cart quantity updates and
//!   checkout (default: `http://localhost:9002`)
//! - `MERCADO_SESSION_FILE` - Session file path (default:
//!   `$HOME/.mercado/session.json`)
//!
//! The backend serves cart reads, adds and removals from the API URL but
//! quantity updates and checkout from a second service. Both URLs are kept
//! separate on purpose; point them at the same host if your deployment
//! serves everything from one place.

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:9003";

/// Default base URL for cart quantity updates and checkout.
pub const DEFAULT_CART_SERVICE_URL: &str = "http://localhost:9002";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL for auth, user, product and most cart endpoints
    pub api_url: String,
    /// Base URL for cart quantity updates and checkout
    pub cart_service_url: String,
    /// Where the session (token and email) is persisted
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Build a configuration with both base URLs pointing at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn single_host(
        api_url: &str,
        session_file: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let api_url = normalize_base_url("api_url", api_url)?;
        Ok(Self {
            cart_service_url: api_url.clone(),
            api_url,
            session_file: session_file.into(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a URL variable is not an absolute http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = normalize_base_url(
            "MERCADO_API_URL",
            &get_env_or_default("MERCADO_API_URL", DEFAULT_API_URL),
        )?;
        let cart_service_url = normalize_base_url(
            "MERCADO_CART_SERVICE_URL",
            &get_env_or_default("MERCADO_CART_SERVICE_URL", DEFAULT_CART_SERVICE_URL),
        )?;
        let session_file = get_optional_env("MERCADO_SESSION_FILE")
            .map_or_else(default_session_file, PathBuf::from);

        Ok(Self {
            api_url,
            cart_service_url,
            session_file,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Session file under the user's home directory, or the working directory
/// when no home is known.
fn default_session_file() -> PathBuf {
    get_optional_env("HOME").map_or_else(
        || PathBuf::from(".mercado").join("session.json"),
        |home| PathBuf::from(home).join(".mercado").join("session.json"),
    )
}

/// Validate a base URL and strip its trailing slash so paths can be appended.
fn normalize_base_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }

    Ok(value.trim().trim_end_matches('/').to_string())
}
