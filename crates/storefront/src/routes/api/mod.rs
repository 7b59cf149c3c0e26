//! JSON API endpoints.

pub mod checkout;
