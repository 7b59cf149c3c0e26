//! Unified error handling with Sentry integration.
//!
//! HTML route handlers return [`AppError`]; JSON endpoints return
//! [`ApiError`], which renders `{ "error": message }`. Both capture server
//! errors to Sentry before responding to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Application-level error type for the storefront pages.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog API operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Page generation failed.
    #[error("Page generation failed: {0}")]
    Generation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(err) => catalog_status(err),
            Self::Generation(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            capture(&self);
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Generation(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Catalog(err) if err.is_not_found() => "Not found".to_string(),
            Self::Catalog(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Error returned by JSON endpoints.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
    cause: Option<CatalogError>,
}

#[derive(Serialize)]
struct ApiErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    /// A client error with a message shown as-is.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            cause: None,
        }
    }

    /// The upstream service answered without something we need.
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
            cause: None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let status = catalog_status(&err);
        let message = if err.is_not_found() {
            "Price not found."
        } else {
            "Checkout session could not be created."
        };

        Self {
            status,
            message: message.to_string(),
            cause: Some(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.cause {
                Some(cause) => capture(cause),
                None => capture(&self),
            }
        }

        let body = Json(ApiErrorBody {
            error: &self.message,
        });
        (self.status, body).into_response()
    }
}

fn catalog_status(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn capture(err: &(dyn std::error::Error + 'static)) {
    let event_id = sentry::capture_error(err);
    tracing::error!(
        error = %err,
        sentry_event_id = %event_id,
        "Request error"
    );
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
