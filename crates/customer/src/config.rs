//! Customer service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ACCOUNTS_SERVICE_URL` - Base URL of the accounts/identity service
//! - `PAYMENT_API_KEY` - Payment processor secret API key
//!
//! ## Optional
//! - `PAYMENT_BASE_URL` - Payment processor API base (default: <https://api.stripe.com/v1>)
//! - `SERVICE_AUTH_EMAIL` - Service identity email for accounts-service login
//! - `SERVICE_AUTH_PASSWORD` - Service identity password
//!
//! The service identity pair is loaded permissively: missing or blank values
//! are surfaced as an authentication failure at first use, not at startup,
//! so read-only deployments without service credentials can still boot.

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Customer service configuration.
#[derive(Debug, Clone)]
pub struct CustomerServiceConfig {
    /// Base URL of the remote accounts/identity service.
    pub accounts_base_url: Url,
    /// Payment processor configuration.
    pub payment: PaymentConfig,
    /// Service identity used to obtain the shared bearer credential.
    pub service_identity: ServiceIdentityConfig,
}

/// Payment processor configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Processor API base URL.
    pub base_url: Url,
    /// Processor secret API key.
    pub api_key: SecretString,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Service identity credentials for accounts-service login.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct ServiceIdentityConfig {
    pub email: String,
    pub password: SecretString,
}

impl std::fmt::Debug for ServiceIdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceIdentityConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl CustomerServiceConfig {
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

        let accounts_base_url = get_required_url("ACCOUNTS_SERVICE_URL")?;
        let payment = PaymentConfig::from_env()?;
        let service_identity = ServiceIdentityConfig::from_env();

        Ok(Self {
            accounts_base_url,
            payment,
            service_identity,
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_url_or_default("PAYMENT_BASE_URL", "https://api.stripe.com/v1")?;
        let api_key = SecretString::from(get_required_env("PAYMENT_API_KEY")?);
        Ok(Self { base_url, api_key })
    }
}

impl ServiceIdentityConfig {
    fn from_env() -> Self {
        // Blank values are rejected by the credential cache at login time.
        Self {
            email: get_env_or_default("SERVICE_AUTH_EMAIL", ""),
            password: SecretString::from(get_env_or_default("SERVICE_AUTH_PASSWORD", "")),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required environment variable parsed as a URL.
fn get_required_url(key: &str) -> Result<Url, ConfigError> {
    let raw = get_required_env(key)?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a URL environment variable with a default value.
fn get_url_or_default(key: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = get_env_or_default(key, default);
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
