//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (checkout return URLs)
//! - `CATALOG_SECRET_KEY` - Payment provider secret API key
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_PRERENDER_PRODUCTS` - Comma-separated product IDs generated
//!   at startup (default: `prod_PclE2yieTKx1Xd`)
//! - `STOREFRONT_REVALIDATE_SECS` - Page revalidation interval (default: 3600)
//! - `STOREFRONT_STATIC_DIR` - Static asset directory (default: `crates/storefront/static`)
//! - `CATALOG_API_URL` - Provider API base (default: <https://api.stripe.com>)
//! - `CATALOG_API_VERSION` - Provider API version (default: 2023-10-16)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;
use vitrine_core::ProductId;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Product generated at startup when `STOREFRONT_PRERENDER_PRODUCTS` is unset.
pub const DEFAULT_PRERENDERED_PRODUCT: &str = "prod_PclE2yieTKx1Xd";

/// Default revalidation interval: one hour.
pub const DEFAULT_REVALIDATE_SECS: u64 = 60 * 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Payment provider API configuration
    pub catalog: CatalogConfig,
    /// Page generation configuration
    pub pages: PagesConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Payment provider API configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct CatalogConfig {
    /// API base URL (e.g., <https://api.stripe.com>)
    pub api_url: String,
    /// Secret API key (server-side only)
    pub secret_key: SecretString,
    /// Pinned API version sent with every request
    pub api_version: String,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("api_url", &self.api_url)
            .field("secret_key", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Page generation configuration.
#[derive(Debug, Clone)]
pub struct PagesConfig {
    /// Product pages generated at startup
    pub prerendered: Vec<ProductId>,
    /// Age after which a generated page is regenerated in the background
    pub revalidate: Duration,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            prerendered: vec![ProductId::new(DEFAULT_PRERENDERED_PRODUCT)],
            revalidate: Duration::from_secs(DEFAULT_REVALIDATE_SECS),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = Url::parse(&get_required_env("STOREFRONT_BASE_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let catalog = CatalogConfig::from_env()?;
        let pages = PagesConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            static_dir: PathBuf::from(get_env_or_default(
                "STOREFRONT_STATIC_DIR",
                "crates/storefront/static",
            )),
            catalog,
            pages,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Where the provider sends the buyer after a successful payment.
    ///
    /// The `{CHECKOUT_SESSION_ID}` placeholder is filled in by the provider.
    #[must_use]
    pub fn checkout_success_url(&self) -> String {
        format!(
            "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    /// Where the provider sends the buyer after abandoning checkout.
    #[must_use]
    pub fn checkout_cancel_url(&self) -> String {
        format!("{}/", self.base_url.as_str().trim_end_matches('/'))
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_env_or_default("CATALOG_API_URL", "https://api.stripe.com"),
            secret_key: get_validated_secret("CATALOG_SECRET_KEY")?,
            api_version: get_env_or_default("CATALOG_API_VERSION", "2023-10-16"),
        })
    }
}

impl PagesConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let prerendered = parse_product_list(&get_env_or_default(
            "STOREFRONT_PRERENDER_PRODUCTS",
            DEFAULT_PRERENDERED_PRODUCT,
        ));
        let revalidate_secs: u64 =
            parse_env("STOREFRONT_REVALIDATE_SECS", &DEFAULT_REVALIDATE_SECS.to_string())?;

        Ok(Self {
            prerendered,
            revalidate: Duration::from_secs(revalidate_secs),
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
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated list of product IDs, skipping blanks.
fn parse_product_list(value: &str) -> Vec<ProductId> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ProductId::from)
        .collect()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are long random strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
