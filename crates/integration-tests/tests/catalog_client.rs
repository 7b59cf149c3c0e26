//! `CatalogClient` against the fake provider over HTTP.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;
use url::Url;
use vitrine_core::{CheckoutSessionId, PriceId, ProductId};
use vitrine_integration_tests::{
    FakeProvider, SESSION_URL, TEST_API_VERSION, TEST_SECRET_KEY, storefront_config,
};
use vitrine_storefront::catalog::{
    Catalog, CatalogClient, CatalogError, CheckoutSessionRequest, Expandable,
};

async fn client_for(provider: &FakeProvider) -> CatalogClient {
    let provider_url = provider.serve().await;
    let base_url = Url::parse("https://loja.example").unwrap();
    let config = storefront_config(&provider_url, &base_url, &[], Duration::from_secs(3600));
    CatalogClient::new(&config.catalog).unwrap()
}

#[tokio::test]
async fn test_retrieve_product_expands_default_price() {
    let provider = FakeProvider::new().with_product("prod_PclE2yieTKx1Xd", "Camiseta", 10_000);
    let client = client_for(&provider).await;

    let product = client
        .retrieve_product(&ProductId::new("prod_PclE2yieTKx1Xd"))
        .await
        .unwrap();

    assert_eq!(product.name, "Camiseta");
    let price = product.default_price.and_then(Expandable::into_object).unwrap();
    assert_eq!(price.id, PriceId::new("price_prod_PclE2yieTKx1Xd"));
    assert_eq!(price.unit_amount, Some(10_000));
    assert_eq!(price.currency, "brl");
}

#[tokio::test]
async fn test_requests_are_authenticated_and_versioned() {
    let provider = FakeProvider::new().with_product("prod_a", "Camiseta", 10_000);
    let client = client_for(&provider).await;

    client.retrieve_product(&ProductId::new("prod_a")).await.unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some(format!("Bearer {TEST_SECRET_KEY}").as_str())
    );
    assert_eq!(requests[0].api_version.as_deref(), Some(TEST_API_VERSION));
    assert_eq!(requests[0].values("expand[]"), vec!["default_price"]);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let client = client_for(&FakeProvider::new()).await;

    let err = client
        .retrieve_product(&ProductId::new("prod_missing"))
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_product_id_is_path_escaped() {
    let provider = FakeProvider::new();
    let client = client_for(&provider).await;

    let err = client
        .retrieve_product(&ProductId::new("../v1/checkout/sessions"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(provider.product_requests(), 1);
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let provider = FakeProvider::new().with_product("prod_a", "Camiseta", 10_000);
    provider.set_failing(Some(StatusCode::INTERNAL_SERVER_ERROR));
    let client = client_for(&provider).await;

    let err = client.retrieve_product(&ProductId::new("prod_a")).await.unwrap_err();

    assert!(
        matches!(err, CatalogError::Api { status: 500, ref message } if message == "Something went wrong"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_rate_limit_maps_to_rate_limited() {
    let provider = FakeProvider::new().with_product("prod_a", "Camiseta", 10_000);
    provider.set_failing(Some(StatusCode::TOO_MANY_REQUESTS));
    let client = client_for(&provider).await;

    let err = client.retrieve_product(&ProductId::new("prod_a")).await.unwrap_err();

    assert!(matches!(err, CatalogError::RateLimited(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_create_checkout_session_sends_form() {
    let provider = FakeProvider::new().with_product("prod_a", "Camiseta", 10_000);
    let client = client_for(&provider).await;

    let session = client
        .create_checkout_session(&CheckoutSessionRequest {
            price_id: PriceId::new("price_prod_a"),
            quantity: 1,
            success_url: "https://loja.example/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "https://loja.example/".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(session.id, CheckoutSessionId::new("cs_test_1"));
    assert_eq!(session.url.as_deref(), Some(SESSION_URL));

    let requests = provider.session_requests();
    assert_eq!(requests.len(), 1);
    let form = &requests[0];
    assert_eq!(form.values("mode"), vec!["payment"]);
    assert_eq!(form.values("line_items[0][price]"), vec!["price_prod_a"]);
    assert_eq!(form.values("line_items[0][quantity]"), vec!["1"]);
    assert_eq!(
        form.values("success_url"),
        vec!["https://loja.example/success?session_id={CHECKOUT_SESSION_ID}"]
    );
    assert_eq!(form.values("cancel_url"), vec!["https://loja.example/"]);
}

#[tokio::test]
async fn test_unknown_price_is_not_found() {
    let client = client_for(&FakeProvider::new()).await;

    let err = client
        .create_checkout_session(&CheckoutSessionRequest {
            price_id: PriceId::new("price_missing"),
            quantity: 1,
            success_url: "https://loja.example/success".to_string(),
            cancel_url: "https://loja.example/".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_retrieve_checkout_session_expands_line_items() {
    let provider = FakeProvider::new();
    provider.insert_session(json!({
        "id": "cs_test_paid",
        "object": "checkout.session",
        "url": null,
        "customer_details": { "name": "Maria Silva", "email": "maria@example.com" },
        "line_items": {
            "object": "list",
            "data": [{
                "quantity": 1,
                "price": {
                    "id": "price_prod_a",
                    "unit_amount": 10000,
                    "currency": "brl",
                    "product": {
                        "id": "prod_a",
                        "name": "Camiseta",
                        "description": null,
                        "images": ["https://files.example/prod_a.png"],
                        "default_price": "price_prod_a"
                    }
                }
            }]
        }
    }));
    let client = client_for(&provider).await;

    let session = client
        .retrieve_checkout_session(&CheckoutSessionId::new("cs_test_paid"))
        .await
        .unwrap();

    assert_eq!(
        session.customer_details.unwrap().name.as_deref(),
        Some("Maria Silva")
    );
    let item = &session.line_items.unwrap().data[0];
    let product = item
        .price
        .as_ref()
        .and_then(|p| p.product.as_ref())
        .and_then(Expandable::as_object)
        .unwrap();
    assert_eq!(product.name, "Camiseta");

    let request = &provider.requests()[0];
    assert_eq!(
        request.values("expand[]"),
        vec!["line_items", "line_items.data.price.product"]
    );
}
