//! The product record rendered by the product page.

use serde::{Deserialize, Serialize};

use crate::types::id::{PriceId, ProductId};

/// Description shown when the catalog has none.
pub const DESCRIPTION_PLACEHOLDER: &str = "Sem descrição";

/// Display-ready product data, shaped once when the page is generated.
///
/// Every field is final: the price is already formatted and the
/// description already defaulted. Pages share it behind an `Arc` and never
/// mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDisplay {
    /// Catalog identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// First image of the product, if the catalog lists any.
    pub image_url: Option<String>,
    /// Formatted price, e.g. `R$ 100,00`.
    pub price: String,
    /// Product description or [`DESCRIPTION_PLACEHOLDER`].
    pub description: String,
    /// Price to purchase when the buyer starts checkout.
    pub default_price_id: PriceId,
}

impl ProductDisplay {
    /// Pick the description to display, falling back to the placeholder
    /// for a missing or blank description.
    #[must_use]
    pub fn description_or_placeholder(description: Option<String>) -> String {
        description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_description_placeholder_when_missing() {
        assert_eq!(
            ProductDisplay::description_or_placeholder(None),
            DESCRIPTION_PLACEHOLDER
        );
        assert_eq!(
            ProductDisplay::description_or_placeholder(Some(String::new())),
            DESCRIPTION_PLACEHOLDER
        );
        assert_eq!(
            ProductDisplay::description_or_placeholder(Some("  ".to_string())),
            DESCRIPTION_PLACEHOLDER
        );
    }

    #[test]
    fn test_description_kept_when_present() {
        assert_eq!(
            ProductDisplay::description_or_placeholder(Some("Camiseta 100% algodão".to_string())),
            "Camiseta 100% algodão"
        );
    }

    #[test]
    fn test_props_use_camel_case_keys() {
        let product = ProductDisplay {
            id: ProductId::new("prod_1"),
            name: "Camiseta".to_string(),
            image_url: Some("https://files.example/1.png".to_string()),
            price: "R$ 79,90".to_string(),
            description: DESCRIPTION_PLACEHOLDER.to_string(),
            default_price_id: PriceId::new("price_1"),
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["imageUrl"], "https://files.example/1.png");
        assert_eq!(json["defaultPriceId"], "price_1");
        assert_eq!(json["price"], "R$ 79,90");
    }
}
