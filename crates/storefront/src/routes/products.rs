//! Product route handlers.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::header::CACHE_CONTROL,
    response::{IntoResponse, Response},
};
use tracing::instrument;
use vitrine_core::{ProductDisplay, ProductId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;
use crate::pages::PageState;
use crate::state::AppState;

/// Seconds before the loading page reloads itself.
const LOADING_REFRESH_SECS: u32 = 1;

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Arc<ProductDisplay>,
    /// Page props as JSON, safe to embed in a `<script>` block.
    pub props_json: String,
    pub nonce: String,
}

/// Shown while a page is generated on demand.
#[derive(Template, WebTemplate)]
#[template(path = "products/loading.html")]
pub struct ProductLoadingTemplate {
    pub refresh_secs: u32,
}

/// Display product detail page.
#[instrument(skip(state, nonce), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    nonce: CspNonce,
) -> Result<Response> {
    match state.pages().lookup(&id).await {
        PageState::Ready(product) => {
            let props_json = page_props(&product)?;
            let cache_control = format!(
                "s-maxage={}, stale-while-revalidate",
                state.pages().revalidate().as_secs()
            );
            let page = ProductShowTemplate {
                product,
                props_json,
                nonce: nonce.0,
            };

            Ok(([(CACHE_CONTROL, cache_control)], page).into_response())
        }
        PageState::Loading => {
            let page = ProductLoadingTemplate {
                refresh_secs: LOADING_REFRESH_SECS,
            };
            Ok(([(CACHE_CONTROL, "no-store")], page).into_response())
        }
        PageState::NotFound => Err(AppError::NotFound(format!("product {id}"))),
        PageState::Failed(message) => Err(AppError::Generation(message.to_string())),
    }
}

/// Serialize page props for an inline JSON block.
///
/// `<` is escaped so the payload cannot close the surrounding script element.
fn page_props(product: &ProductDisplay) -> Result<String> {
    let json = serde_json::to_string(product)
        .map_err(|e| AppError::Internal(format!("failed to serialize page props: {e}")))?;
    Ok(json.replace('<', "\\u003c"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vitrine_core::PriceId;

    #[test]
    fn test_page_props_escape_script_end() {
        let product = ProductDisplay {
            id: ProductId::new("prod_1"),
            name: "</script><b>".to_string(),
            image_url: None,
            price: "R$ 1,00".to_string(),
            description: "Sem descrição".to_string(),
            default_price_id: PriceId::new("price_1"),
        };

        let json = page_props(&product).unwrap();
        assert!(!json.contains("</script>"));

        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["name"], "</script><b>");
        assert_eq!(back["defaultPriceId"], "price_1");
    }
}
