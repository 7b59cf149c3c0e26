//! Payment provider catalog and checkout API.
//!
//! # Architecture
//!
//! - The provider is the source of truth for products and prices - no local
//!   sync, direct API calls
//! - [`Catalog`] is the seam the rest of the storefront depends on; the
//!   production implementation is [`CatalogClient`] (REST over `reqwest`)
//! - The client is constructed explicitly from [`CatalogConfig`] and
//!   injected into the application state, so tests substitute fakes
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrine_storefront::catalog::{Catalog, CatalogClient};
//!
//! let client = CatalogClient::new(&config.catalog)?;
//! let product = client.retrieve_product(&ProductId::new("prod_123")).await?;
//! ```
//!
//! [`CatalogConfig`]: crate::config::CatalogConfig

mod client;
pub mod types;

pub use client::CatalogClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;
use vitrine_core::{CheckoutSessionId, ProductId};

/// Errors that can occur when talking to the catalog provider.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Requested object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider rejected the request.
    #[error("Catalog API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the provider.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response parsed but lacks data the storefront relies on.
    #[error("Malformed catalog response: {0}")]
    MalformedResponse(String),

    /// Configured API URL cannot be used to build request URLs.
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
}

impl CatalogError {
    /// Whether the error means the requested object does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Read access to products plus checkout session management.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Retrieve a product with its default price expanded inline.
    async fn retrieve_product(&self, id: &ProductId) -> Result<CatalogProduct, CatalogError>;

    /// Create a hosted checkout session.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, CatalogError>;

    /// Retrieve a checkout session with its line items and products expanded.
    async fn retrieve_checkout_session(
        &self,
        id: &CheckoutSessionId,
    ) -> Result<CheckoutSession, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::NotFound("prod_123".to_string());
        assert_eq!(err.to_string(), "Not found: prod_123");
        assert!(err.is_not_found());

        let err = CatalogError::MalformedResponse("default_price is not expanded".to_string());
        assert_eq!(
            err.to_string(),
            "Malformed catalog response: default_price is not expanded"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_api_error_display() {
        let err = CatalogError::Api {
            status: 400,
            message: "Invalid price".to_string(),
        };
        assert_eq!(err.to_string(), "Catalog API error (400): Invalid price");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = CatalogError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
