//! Vitrine Core - Shared types library.
//!
//! This crate provides the types shared by the storefront binary and its
//! integration tests.
//!
//! # Architecture
//!
//! The core crate contains only types and formatting - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices and the product display record

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
