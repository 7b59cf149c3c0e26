//! REST client for the payment provider.
//!
//! Uses `reqwest` with bearer authentication and a pinned API version
//! header. Responses are read as text first so failures can be logged with
//! the offending body.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;
use vitrine_core::{CheckoutSessionId, ProductId};

use super::types::{CatalogProduct, CheckoutSession, CheckoutSessionRequest, ProviderErrorEnvelope};
use super::{Catalog, CatalogError};
use crate::config::CatalogConfig;

/// Header carrying the pinned provider API version.
const API_VERSION_HEADER: &str = "Stripe-Version";

/// Body excerpt length kept in logs and error messages.
const BODY_EXCERPT_CHARS: usize = 200;

/// Client for the provider's catalog and checkout APIs.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    api_url: Url,
    secret_key: SecretString,
    api_version: String,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidUrl` if the configured API URL is not
    /// an absolute `http(s)` URL.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let api_url =
            Url::parse(&config.api_url).map_err(|e| CatalogError::InvalidUrl(e.to_string()))?;
        if api_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(config.api_url.clone()));
        }

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                api_url,
                secret_key: config.secret_key.clone(),
                api_version: config.api_version.clone(),
            }),
        })
    }

    /// Build an API URL from path segments (each segment is escaped).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.inner.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidUrl(self.inner.api_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send an authenticated request and decode the JSON response.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CatalogError> {
        let response = request
            .bearer_auth(self.inner.secret_key.expose_secret())
            .header(API_VERSION_HEADER, &self.inner.api_version)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_response(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }
}

#[async_trait]
impl Catalog for CatalogClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn retrieve_product(&self, id: &ProductId) -> Result<CatalogProduct, CatalogError> {
        let mut url = self.endpoint(&["v1", "products", id.as_str()])?;
        url.query_pairs_mut()
            .append_pair("expand[]", "default_price");

        self.send(self.inner.client.get(url)).await
    }

    #[instrument(skip(self, request), fields(price_id = %request.price_id))]
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, CatalogError> {
        let url = self.endpoint(&["v1", "checkout", "sessions"])?;

        self.send(self.inner.client.post(url).form(&request.to_form()))
            .await
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn retrieve_checkout_session(
        &self,
        id: &CheckoutSessionId,
    ) -> Result<CheckoutSession, CatalogError> {
        let mut url = self.endpoint(&["v1", "checkout", "sessions", id.as_str()])?;
        url.query_pairs_mut()
            .append_pair("expand[]", "line_items")
            .append_pair("expand[]", "line_items.data.price.product");

        self.send(self.inner.client.get(url)).await
    }
}

/// Map a non-success response to a `CatalogError`.
fn error_from_response(status: StatusCode, body: &str) -> CatalogError {
    let provider_error = serde_json::from_str::<ProviderErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);

    let message = provider_error
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| format!("HTTP {status}: {}", excerpt(body)));

    let missing = status == StatusCode::NOT_FOUND
        || provider_error
            .as_ref()
            .is_some_and(super::types::ProviderError::is_resource_missing);

    if missing {
        tracing::debug!(status = %status, message = %message, "Catalog object not found");
        return CatalogError::NotFound(message);
    }

    tracing::error!(
        status = %status,
        body = %excerpt(body),
        "Catalog API returned non-success status"
    );
    CatalogError::Api {
        status: status.as_u16(),
        message,
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(api_url: &str) -> CatalogConfig {
        CatalogConfig {
            api_url: api_url.to_string(),
            secret_key: SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc"),
            api_version: "2023-10-16".to_string(),
        }
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = CatalogClient::new(&config("https://api.example.com")).unwrap();
        let url = client.endpoint(&["v1", "products", "prod 1/x"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/products/prod%201%2Fx");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = CatalogClient::new(&config("http://127.0.0.1:9000/provider/")).unwrap();
        let url = client.endpoint(&["v1", "products", "prod_1"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/provider/v1/products/prod_1");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(matches!(
            CatalogClient::new(&config("not a url")),
            Err(CatalogError::InvalidUrl(_))
        ));
        assert!(matches!(
            CatalogClient::new(&config("mailto:ops@example.com")),
            Err(CatalogError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_error_from_response_not_found_status() {
        let body = r#"{"error": {"type": "invalid_request_error", "message": "No such product: 'prod_x'"}}"#;
        let err = error_from_response(StatusCode::NOT_FOUND, body);
        assert!(matches!(err, CatalogError::NotFound(ref m) if m == "No such product: 'prod_x'"));
    }

    #[test]
    fn test_error_from_response_resource_missing_code() {
        let body = r#"{"error": {"code": "resource_missing", "message": "No such price: 'price_x'"}}"#;
        let err = error_from_response(StatusCode::BAD_REQUEST, body);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_from_response_api_error() {
        let err = error_from_response(StatusCode::UNAUTHORIZED, "not json");
        match err {
            CatalogError::Api { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("not json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
