//! In-memory catalog used by unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use vitrine_core::{CheckoutSessionId, PriceId, ProductId};

use crate::catalog::{
    Catalog, CatalogError, CatalogPrice, CatalogProduct, CheckoutSession, CheckoutSessionRequest,
    Expandable,
};

/// A BRL product with an expanded default price `price_{id}`.
pub fn catalog_product(id: &str, name: &str, unit_amount: i64) -> CatalogProduct {
    CatalogProduct {
        id: ProductId::new(id),
        name: name.to_string(),
        description: Some(format!("Descrição de {name}")),
        images: vec![format!("https://files.example/{id}.png")],
        default_price: Some(Expandable::Object(Box::new(CatalogPrice {
            id: PriceId::new(format!("price_{id}")),
            unit_amount: Some(unit_amount),
            currency: "brl".to_string(),
            product: Some(Expandable::Id(id.to_string())),
        }))),
    }
}

/// Fake catalog with call counting, failure injection and an optional gate
/// that holds product lookups until permits are released.
#[derive(Default)]
pub struct FakeCatalog {
    products: Mutex<HashMap<ProductId, CatalogProduct>>,
    failing: AtomicBool,
    gate: Option<Semaphore>,
    product_calls: AtomicUsize,
    session_requests: Mutex<Vec<CheckoutSessionRequest>>,
    session_url: Mutex<Option<String>>,
    completed_sessions: Mutex<HashMap<CheckoutSessionId, CheckoutSession>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            session_url: Mutex::new(Some("https://pay.example/session/1".to_string())),
            ..Self::default()
        }
    }

    /// Product lookups wait for [`FakeCatalog::release`].
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn insert(&self, product: CatalogProduct) {
        self.products
            .lock()
            .unwrap()
            .insert(product.id.clone(), product);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_session_url(&self, url: Option<&str>) {
        *self.session_url.lock().unwrap() = url.map(String::from);
    }

    pub fn insert_session(&self, session: CheckoutSession) {
        self.completed_sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    /// Let `n` gated product lookups complete.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    pub fn session_requests(&self) -> Vec<CheckoutSessionRequest> {
        self.session_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn retrieve_product(&self, id: &ProductId) -> Result<CatalogProduct, CatalogError> {
        self.product_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Api {
                status: 500,
                message: "catalog unavailable".to_string(),
            });
        }

        self.products
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("No such product: '{id}'")))
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, CatalogError> {
        self.session_requests.lock().unwrap().push(request.clone());

        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Api {
                status: 500,
                message: "catalog unavailable".to_string(),
            });
        }

        Ok(CheckoutSession {
            id: CheckoutSessionId::new("cs_test_1"),
            url: self.session_url.lock().unwrap().clone(),
            customer_details: None,
            line_items: None,
        })
    }

    async fn retrieve_checkout_session(
        &self,
        id: &CheckoutSessionId,
    ) -> Result<CheckoutSession, CatalogError> {
        self.completed_sessions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("No such checkout session: '{id}'")))
    }
}
