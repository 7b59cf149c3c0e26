//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to the first pre-rendered product
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /product/{id}           - Product page (loading indicator while generating)
//!
//! # Checkout
//! POST /api/checkout           - Create a checkout session, returns its URL
//! GET  /success                - Post-payment confirmation page
//! ```

pub mod api;
pub mod checkout;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/checkout", post(api::checkout::create))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/product/{id}", get(products::show))
        .route("/success", get(checkout::success))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the catalog.
async fn health() -> &'static str {
    "ok"
}
