//! Wire types for the payment provider's catalog and checkout APIs.
//!
//! These mirror the provider's JSON objects closely and keep every field
//! that may be absent as an `Option`. Shaping into display types happens in
//! [`crate::pages::loader`], which decides what "absent" means.

use serde::{Deserialize, Serialize};
use vitrine_core::{CheckoutSessionId, PriceId, ProductId};

// =============================================================================
// Expandable References
// =============================================================================

/// A related object that is either a bare ID or, when requested with
/// `expand[]`, the full object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    /// Not expanded: only the identifier was returned.
    Id(String),
    /// Expanded inline.
    Object(Box<T>),
}

impl<T> Expandable<T> {
    /// The expanded object, if the provider returned one.
    #[must_use]
    pub fn as_object(&self) -> Option<&T> {
        match self {
            Self::Object(object) => Some(object),
            Self::Id(_) => None,
        }
    }

    /// Consume the reference and return the expanded object, if any.
    #[must_use]
    pub fn into_object(self) -> Option<T> {
        match self {
            Self::Object(object) => Some(*object),
            Self::Id(_) => None,
        }
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// A product as returned by `GET /v1/products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Present as an object when requested with `expand[]=default_price`.
    #[serde(default)]
    pub default_price: Option<Expandable<CatalogPrice>>,
}

/// A price object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPrice {
    pub id: PriceId,
    /// Amount in minor currency units. Absent for custom-amount prices.
    #[serde(default)]
    pub unit_amount: Option<i64>,
    /// Lower-case ISO currency code, e.g. `"brl"`.
    pub currency: String,
    #[serde(default)]
    pub product: Option<Expandable<CatalogProduct>>,
}

// =============================================================================
// Checkout Types
// =============================================================================

/// Parameters for creating a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub price_id: PriceId,
    pub quantity: u32,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutSessionRequest {
    /// Form fields for `POST /v1/checkout/sessions`.
    #[must_use]
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "payment".to_string()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
            ("line_items[0][price]", self.price_id.to_string()),
            ("line_items[0][quantity]", self.quantity.to_string()),
        ]
    }
}

/// A checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: CheckoutSessionId,
    /// Hosted payment page. Absent once the session is complete or expired.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    /// Present when requested with `expand[]=line_items`.
    #[serde(default)]
    pub line_items: Option<LineItemList>,
}

/// Buyer details collected by the hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A list of checkout line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemList {
    #[serde(default)]
    pub data: Vec<LineItem>,
}

/// A checkout line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub price: Option<CatalogPrice>,
}

// =============================================================================
// Error Envelope
// =============================================================================

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderErrorEnvelope {
    pub error: ProviderError,
}

/// Details of a provider error.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderError {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProviderError {
    /// Whether the provider reports the requested object as missing.
    #[must_use]
    pub fn is_resource_missing(&self) -> bool {
        self.code.as_deref() == Some("resource_missing")
    }
}
