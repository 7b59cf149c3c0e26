//! Loads product page data from the catalog and shapes it for display.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;
use vitrine_core::{CurrencyCode, CurrencyFormat, ProductDisplay, ProductId};

use crate::catalog::{Catalog, CatalogError, CatalogProduct, Expandable};

/// Display data plus how long it stays fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProduct {
    pub product: ProductDisplay,
    /// Age after which the page may be regenerated in the background.
    pub revalidate: Duration,
}

/// Fetches one product (with its default price expanded) per call.
#[derive(Clone)]
pub struct ProductLoader {
    catalog: Arc<dyn Catalog>,
    revalidate: Duration,
    format: CurrencyFormat,
}

impl ProductLoader {
    /// Create a loader that formats prices in pt-BR / BRL.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>, revalidate: Duration) -> Self {
        Self {
            catalog,
            revalidate,
            format: CurrencyFormat::pt_br_brl(),
        }
    }

    /// How long loaded pages stay fresh.
    #[must_use]
    pub const fn revalidate(&self) -> Duration {
        self.revalidate
    }

    /// Load and shape a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown identifiers,
    /// `CatalogError::MalformedResponse` when the price data is unusable, and
    /// any transport or API error from the catalog.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn load(&self, id: &ProductId) -> Result<LoadedProduct, CatalogError> {
        let product = self.catalog.retrieve_product(id).await?;
        let product = shape_product(product, &self.format)?;

        Ok(LoadedProduct {
            product,
            revalidate: self.revalidate,
        })
    }
}

/// Validate a catalog product and turn it into display data.
///
/// The default price must be expanded and carry a unit amount. A missing
/// description becomes the placeholder; only the first image is kept.
///
/// # Errors
///
/// Returns `CatalogError::MalformedResponse` if the price is missing, not
/// expanded, or has no unit amount.
pub fn shape_product(
    product: CatalogProduct,
    format: &CurrencyFormat,
) -> Result<ProductDisplay, CatalogError> {
    let price = match product.default_price {
        Some(Expandable::Object(price)) => *price,
        Some(Expandable::Id(price_id)) => {
            return Err(CatalogError::MalformedResponse(format!(
                "default price {price_id} of product {} was not expanded",
                product.id
            )));
        }
        None => {
            return Err(CatalogError::MalformedResponse(format!(
                "product {} has no default price",
                product.id
            )));
        }
    };

    let unit_amount = price.unit_amount.ok_or_else(|| {
        CatalogError::MalformedResponse(format!("price {} has no unit amount", price.id))
    })?;

    match price.currency.parse::<CurrencyCode>() {
        Ok(CurrencyCode::BRL) => {}
        Ok(currency) => tracing::warn!(
            price_id = %price.id,
            currency = %currency.code(),
            "Price is not in BRL; displaying it as BRL"
        ),
        Err(e) => tracing::warn!(
            price_id = %price.id,
            error = %e,
            "Price has an unknown currency; displaying it as BRL"
        ),
    }

    Ok(ProductDisplay {
        id: product.id,
        name: product.name,
        image_url: product.images.into_iter().next(),
        price: format.format_minor_units(unit_amount),
        description: ProductDisplay::description_or_placeholder(product.description),
        default_price_id: price.id,
    })
}
