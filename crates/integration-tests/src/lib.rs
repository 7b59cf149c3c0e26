//! Integration tests for Vitrine.
//!
//! Everything runs in-process: a fake payment provider and the storefront
//! are both served by real axum listeners on `127.0.0.1:0`, and the tests
//! talk to them over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vitrine-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog_client` - `CatalogClient` against the fake provider
//! - `product_page` - page generation and rendering through the storefront
//! - `checkout_flow` - purchase control -> `/api/checkout` -> provider

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use vitrine_core::ProductId;
use vitrine_storefront::{
    catalog::CatalogClient,
    config::{CatalogConfig, PagesConfig, StorefrontConfig},
    state::AppState,
};

/// Secret key the fake provider expects.
pub const TEST_SECRET_KEY: &str = "sk_test_4eC39HqLyjWDarjtT1zdp7dc";

/// API version sent by the storefront and checked by the fake provider.
pub const TEST_API_VERSION: &str = "2023-10-16";

/// Checkout URL returned by the fake provider.
pub const SESSION_URL: &str = "https://pay.example/session/1";

/// A request recorded by the fake provider.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub api_version: Option<String>,
    /// Decoded query string or form body pairs.
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    /// All values for `key`, in order.
    #[must_use]
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// In-process stand-in for the payment provider's REST API.
#[derive(Clone, Default)]
pub struct FakeProvider {
    inner: Arc<ProviderState>,
}

#[derive(Default)]
struct ProviderState {
    products: Mutex<HashMap<String, Value>>,
    sessions: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    product_requests: AtomicUsize,
    failing: Mutex<Option<StatusCode>>,
}

impl FakeProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a BRL product whose default price is `price_{id}`.
    #[must_use]
    pub fn with_product(self, id: &str, name: &str, unit_amount: i64) -> Self {
        self.insert_product(product_json(id, name, unit_amount));
        self
    }

    /// Add or replace a product object.
    pub fn insert_product(&self, product: Value) {
        let id = product["id"].as_str().unwrap().to_string();
        self.inner.products.lock().unwrap().insert(id, product);
    }

    /// Add a completed checkout session object.
    pub fn insert_session(&self, session: Value) {
        let id = session["id"].as_str().unwrap().to_string();
        self.inner.sessions.lock().unwrap().insert(id, session);
    }

    /// Answer every request with `status` until cleared with `None`.
    pub fn set_failing(&self, status: Option<StatusCode>) {
        *self.inner.failing.lock().unwrap() = status;
    }

    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.inner.product_requests.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    /// Checkout session creation requests received so far.
    #[must_use]
    pub fn session_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == "/v1/checkout/sessions")
            .collect()
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/v1/products/{id}", get(retrieve_product))
            .route("/v1/checkout/sessions", post(create_session))
            .route("/v1/checkout/sessions/{id}", get(retrieve_session))
            .with_state(self.clone())
    }

    /// Serve the fake API and return its base URL.
    pub async fn serve(&self) -> Url {
        let addr = serve(self.router()).await;
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn record(&self, path: String, headers: &HeaderMap, params: Vec<(String, String)>) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };

        self.inner.requests.lock().unwrap().push(RecordedRequest {
            path,
            authorization: header("authorization"),
            api_version: header("stripe-version"),
            params,
        });
    }

    fn failure(&self) -> Option<Response> {
        let status = (*self.inner.failing.lock().unwrap())?;
        Some(
            (
                status,
                Json(json!({ "error": { "type": "api_error", "message": "Something went wrong" } })),
            )
                .into_response(),
        )
    }

    fn knows_price(&self, price_id: &str) -> bool {
        self.inner
            .products
            .lock()
            .unwrap()
            .values()
            .any(|p| p["default_price"]["id"] == price_id)
    }
}

/// Provider-shaped product with its default price object.
#[must_use]
pub fn product_json(id: &str, name: &str, unit_amount: i64) -> Value {
    json!({
        "id": id,
        "object": "product",
        "active": true,
        "name": name,
        "description": format!("{name} de algodão orgânico"),
        "images": [format!("https://files.example/{id}.png")],
        "default_price": {
            "id": format!("price_{id}"),
            "object": "price",
            "unit_amount": unit_amount,
            "currency": "brl",
            "product": id,
        },
    })
}

fn provider_error(status: StatusCode, code: &str, message: String) -> Response {
    (
        status,
        Json(json!({
            "error": { "type": "invalid_request_error", "code": code, "message": message }
        })),
    )
        .into_response()
}

fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
        .into_owned()
        .collect()
}

async fn retrieve_product(
    State(provider): State<FakeProvider>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let params = query_pairs(query.as_deref());
    let expand_price = params
        .iter()
        .any(|(k, v)| k == "expand[]" && v == "default_price");
    provider.record(format!("/v1/products/{id}"), &headers, params);
    provider.inner.product_requests.fetch_add(1, Ordering::SeqCst);

    if let Some(failure) = provider.failure() {
        return failure;
    }

    let product = provider.inner.products.lock().unwrap().get(&id).cloned();
    match product {
        Some(mut product) => {
            if !expand_price {
                product["default_price"] = product["default_price"]["id"].clone();
            }
            Json(product).into_response()
        }
        None => provider_error(
            StatusCode::NOT_FOUND,
            "resource_missing",
            format!("No such product: '{id}'"),
        ),
    }
}

async fn create_session(
    State(provider): State<FakeProvider>,
    headers: HeaderMap,
    Form(form): Form<Vec<(String, String)>>,
) -> Response {
    let price = form
        .iter()
        .find(|(k, _)| k == "line_items[0][price]")
        .map(|(_, v)| v.clone());
    provider.record("/v1/checkout/sessions".to_string(), &headers, form);

    if let Some(failure) = provider.failure() {
        return failure;
    }

    match price {
        Some(price) if provider.knows_price(&price) => Json(json!({
            "id": "cs_test_1",
            "object": "checkout.session",
            "mode": "payment",
            "url": SESSION_URL,
        }))
        .into_response(),
        Some(price) => provider_error(
            StatusCode::BAD_REQUEST,
            "resource_missing",
            format!("No such price: '{price}'"),
        ),
        None => provider_error(
            StatusCode::BAD_REQUEST,
            "parameter_missing",
            "Missing required param: line_items[0][price].".to_string(),
        ),
    }
}

async fn retrieve_session(
    State(provider): State<FakeProvider>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    provider.record(
        format!("/v1/checkout/sessions/{id}"),
        &headers,
        query_pairs(query.as_deref()),
    );

    let session = provider.inner.sessions.lock().unwrap().get(&id).cloned();
    match session {
        Some(session) => Json(session).into_response(),
        None => provider_error(
            StatusCode::NOT_FOUND,
            "resource_missing",
            format!("No such checkout.session: '{id}'"),
        ),
    }
}

/// Serve a router on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}

/// Storefront configuration pointing at a fake provider.
#[must_use]
pub fn storefront_config(
    provider_url: &Url,
    base_url: &Url,
    prerendered: &[&str],
    revalidate: Duration,
) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: base_url.port().unwrap_or(0),
        base_url: base_url.clone(),
        static_dir: "../storefront/static".into(),
        catalog: CatalogConfig {
            api_url: provider_url.to_string(),
            secret_key: SecretString::from(TEST_SECRET_KEY),
            api_version: TEST_API_VERSION.to_string(),
        },
        pages: PagesConfig {
            prerendered: prerendered.iter().copied().map(ProductId::from).collect(),
            revalidate,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A running storefront backed by a fake provider.
pub struct TestContext {
    pub provider: FakeProvider,
    pub state: AppState,
    pub base_url: Url,
    pub client: reqwest::Client,
}

impl TestContext {
    /// Start a storefront with one-hour revalidation.
    pub async fn start(provider: FakeProvider, prerendered: &[&str]) -> Self {
        Self::start_with_revalidate(provider, prerendered, Duration::from_secs(3600)).await
    }

    /// Start a storefront, pre-rendering `prerendered` first like the binary.
    pub async fn start_with_revalidate(
        provider: FakeProvider,
        prerendered: &[&str],
        revalidate: Duration,
    ) -> Self {
        let provider_url = provider.serve().await;

        // The storefront must know its own URL for checkout return URLs
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();

        let config = storefront_config(&provider_url, &base_url, prerendered, revalidate);
        let catalog = Arc::new(CatalogClient::new(&config.catalog).unwrap());
        let state = AppState::new(config, catalog);
        state.pages().prerender().await.unwrap();

        let app = vitrine_storefront::app(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            provider,
            state,
            base_url,
            client,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).unwrap()
    }

    /// GET a storefront path.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// GET a product page until it is no longer the loading indicator.
    pub async fn get_product_page(&self, id: &str) -> reqwest::Response {
        let path = format!("/product/{id}");
        for _ in 0..200 {
            let response = self.get(&path).await;
            let loading = response
                .headers()
                .get("cache-control")
                .is_some_and(|v| v == "no-store");
            if !loading {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("product page {id} never finished loading");
    }
}
