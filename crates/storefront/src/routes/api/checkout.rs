//! Checkout initiation endpoint.
//!
//! `POST /api/checkout` with `{ "priceId": "price_…" }` creates a hosted
//! checkout session for one unit of that price and answers
//! `201 { "checkoutUrl": "…" }`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use vitrine_core::PriceId;

use crate::catalog::CheckoutSessionRequest;
use crate::error::{ApiError, add_breadcrumb};
use crate::state::AppState;

/// Message returned when the request names no price.
pub const PRICE_NOT_FOUND: &str = "Price not found.";

/// Request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub price_id: Option<String>,
}

/// Response body for a created session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCreated {
    pub checkout_url: String,
}

/// Create a checkout session for the requested price.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CheckoutCreated>), ApiError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected checkout request body");
            CheckoutRequest::default()
        }
    };

    let price_id = request
        .price_id
        .filter(|id| !id.trim().is_empty())
        .map(PriceId::new)
        .ok_or_else(|| ApiError::bad_request(PRICE_NOT_FOUND))?;

    add_breadcrumb("checkout", "Checkout requested", &[("price_id", price_id.as_str())]);

    let config = state.config();
    let session_request = CheckoutSessionRequest {
        price_id,
        quantity: 1,
        success_url: config.checkout_success_url(),
        cancel_url: config.checkout_cancel_url(),
    };

    let session = state
        .catalog()
        .create_checkout_session(&session_request)
        .await?;

    let checkout_url = session.url.ok_or_else(|| {
        tracing::error!(session_id = %session.id, "Checkout session has no URL");
        ApiError::bad_gateway("Checkout session has no URL.")
    })?;

    tracing::info!(session_id = %session.id, "Checkout session created");

    Ok((StatusCode::CREATED, Json(CheckoutCreated { checkout_url })))
}
