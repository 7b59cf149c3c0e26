//! Vitrine storefront library.
//!
//! Product pages generated from the payment provider's catalog and a
//! checkout flow that hands the buyer to the provider's hosted checkout.
//! The binary in `main.rs` wires this library to the real catalog; tests
//! use it with in-memory fakes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod pages;
pub mod purchase;
pub mod routes;
pub mod state;

#[cfg(test)]
mod testing;

use std::path::Path;

use axum::{
    Router,
    http::{HeaderValue, Response, header},
    middleware::from_fn,
};
use tower_http::{
    services::{ServeDir, fs::ServeFileSystemResponseBody},
    set_header::SetResponseHeader,
    trace::TraceLayer,
};

use state::AppState;

/// Build the storefront router with its middleware stack.
///
/// Sentry layers are added by the binary around this router.
pub fn app(state: AppState) -> Router {
    let assets = static_files(&state.config().static_dir);

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", assets)
        .with_state(state)
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::extract::Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            },
        ))
}

/// Static assets under `dir`.
///
/// Files in `css/derived/` carry a content hash in their name and are
/// cached for a year.
fn static_files(dir: &Path) -> Router {
    let fingerprinted = SetResponseHeader::overriding(
        ServeDir::new(dir.join("css/derived")),
        header::CACHE_CONTROL,
        |response: &Response<ServeFileSystemResponseBody>| {
            response
                .status()
                .is_success()
                .then(|| HeaderValue::from_static("public, max-age=31536000, immutable"))
        },
    );

    Router::new()
        .nest_service("/css/derived", fingerprinted)
        .fallback_service(ServeDir::new(dir))
}
