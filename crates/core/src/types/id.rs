//! Newtype IDs for type-safe catalog references.
//!
//! Catalog identifiers are opaque strings issued by the payment provider
//! (`prod_...`, `price_...`, `cs_...`). Use the `define_string_id!` macro to
//! create wrappers that prevent accidentally passing a product ID where a
//! price ID is expected.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// No validation is performed: the provider is the authority on which
/// identifiers exist.
///
/// # Example
///
/// ```rust
/// # use vitrine_core::define_string_id;
/// define_string_id!(CouponId);
/// define_string_id!(InvoiceId);
///
/// let coupon = CouponId::new("co_123");
/// assert_eq!(coupon.as_str(), "co_123");
///
/// // These are different types, so this won't compile:
/// // let _: InvoiceId = coupon;
/// ```
#[macro_export]
macro_rules! define_string_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the identifier.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(ProductId);
define_string_id!(PriceId);
define_string_id!(CheckoutSessionId);
