//! Checkout return pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;
use vitrine_core::CheckoutSessionId;

use crate::catalog::{CatalogProduct, CheckoutSession};
use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Query string the provider appends on successful payment.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: Option<String>,
}

/// Payment confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub customer_name: Option<String>,
    pub product_name: Option<String>,
    pub image_url: Option<String>,
}

/// Confirm a completed checkout.
///
/// Without a session id there is nothing to confirm and the buyer is sent
/// back to the store.
#[instrument(skip(state, query))]
pub async fn success(
    State(state): State<AppState>,
    Query(query): Query<SuccessQuery>,
) -> Result<Response> {
    let Some(session_id) = query.session_id.filter(|id| !id.trim().is_empty()) else {
        return Ok(Redirect::to("/").into_response());
    };

    let session = state
        .catalog()
        .retrieve_checkout_session(&CheckoutSessionId::new(session_id))
        .await?;

    let product = purchased_product(&session);

    Ok(CheckoutSuccessTemplate {
        customer_name: session
            .customer_details
            .as_ref()
            .and_then(|customer| customer.name.clone()),
        product_name: product.map(|p| p.name.clone()),
        image_url: product.and_then(|p| p.images.first().cloned()),
    }
    .into_response())
}

/// The product of the session's first line item, when expanded.
fn purchased_product(session: &CheckoutSession) -> Option<&CatalogProduct> {
    session
        .line_items
        .as_ref()?
        .data
        .first()?
        .price
        .as_ref()?
        .product
        .as_ref()?
        .as_object()
}
