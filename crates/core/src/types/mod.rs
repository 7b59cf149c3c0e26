//! Core types for Vitrine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;

pub use id::*;
pub use price::{CurrencyCode, CurrencyFormat, Locale, Price, UnknownCurrency};
pub use product::{DESCRIPTION_PLACEHOLDER, ProductDisplay};
