//! Purchase control for the product page.
//!
//! Models the "Comprar agora" button: one click starts a checkout session
//! through the local checkout endpoint and sends the browser to the hosted
//! checkout page. While the request is in flight the control is disabled and
//! further clicks are ignored. On failure the control is re-enabled and the
//! buyer sees a single alert; there is no automatic retry.
//!
//! `static/js/product.js` implements the same flow in the browser.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;
use url::Url;
use vitrine_core::PriceId;

use crate::routes::api::checkout::{CheckoutCreated, CheckoutRequest};

/// Alert shown when the checkout request fails.
pub const CHECKOUT_FAILURE_MESSAGE: &str = "Falha ao redirecionar ao checkout!";

/// Errors from the checkout request.
#[derive(Debug, Error)]
pub enum CheckoutRequestError {
    /// Request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Checkout endpoint answered with a non-success status.
    #[error("Checkout endpoint returned status {0}")]
    Status(u16),

    /// Body did not contain a usable checkout URL.
    #[error("Malformed checkout response: {0}")]
    MalformedResponse(String),
}

/// Starts checkout sessions on behalf of the purchase control.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Request a checkout session for a price and return its URL.
    async fn create_checkout(&self, price_id: &PriceId) -> Result<Url, CheckoutRequestError>;
}

/// The page's window: full-page navigation and blocking alerts.
pub trait Browser: Send + Sync {
    fn navigate(&self, url: &Url);
    fn alert(&self, message: &str);
}

/// Whether the control accepts clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseState {
    Idle,
    InFlight,
}

/// Result of one click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Browser sent to the checkout URL. The control stays disabled.
    Redirected(Url),
    /// Request failed; the control is enabled again and one alert was shown.
    Failed,
    /// A request was already in flight; nothing was sent.
    Ignored,
}

/// The purchase button of one product page.
#[derive(Debug)]
pub struct PurchaseControl {
    price_id: PriceId,
    in_flight: AtomicBool,
}

impl PurchaseControl {
    #[must_use]
    pub const fn new(price_id: PriceId) -> Self {
        Self {
            price_id,
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn state(&self) -> PurchaseState {
        if self.in_flight.load(Ordering::Acquire) {
            PurchaseState::InFlight
        } else {
            PurchaseState::Idle
        }
    }

    /// Whether the button is rendered disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.state() == PurchaseState::InFlight
    }

    /// Handle a click on "Comprar agora".
    ///
    /// The control is disabled before the request is issued. On success the
    /// browser navigates to the returned URL and the control stays disabled.
    /// On any failure the control is re-enabled and
    /// [`CHECKOUT_FAILURE_MESSAGE`] is shown once.
    #[instrument(skip_all, fields(price_id = %self.price_id))]
    pub async fn handle_buy_product(
        &self,
        gateway: &dyn CheckoutGateway,
        browser: &dyn Browser,
    ) -> PurchaseOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Checkout already in flight, ignoring click");
            return PurchaseOutcome::Ignored;
        }

        match gateway.create_checkout(&self.price_id).await {
            Ok(url) => {
                tracing::info!(checkout_url = %url, "Redirecting to checkout");
                browser.navigate(&url);
                PurchaseOutcome::Redirected(url)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Checkout request failed");
                self.in_flight.store(false, Ordering::Release);
                browser.alert(CHECKOUT_FAILURE_MESSAGE);
                PurchaseOutcome::Failed
            }
        }
    }
}

/// Gateway that posts to the storefront's own `/api/checkout` endpoint.
#[derive(Debug, Clone)]
pub struct HttpCheckoutGateway {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpCheckoutGateway {
    /// Create a gateway for the storefront at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` cannot be joined with the endpoint path.
    pub fn new(base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: base_url.join("/api/checkout")?,
        })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CheckoutGateway for HttpCheckoutGateway {
    async fn create_checkout(&self, price_id: &PriceId) -> Result<Url, CheckoutRequestError> {
        let payload = CheckoutRequest {
            price_id: Some(price_id.to_string()),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckoutRequestError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let created: CheckoutCreated = serde_json::from_str(&body)
            .map_err(|e| CheckoutRequestError::MalformedResponse(e.to_string()))?;

        Url::parse(&created.checkout_url).map_err(|e| {
            CheckoutRequestError::MalformedResponse(format!(
                "invalid checkout URL {:?}: {e}",
                created.checkout_url
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::Semaphore;

    use super::*;

    struct FakeGateway {
        response: Result<&'static str, u16>,
        calls: AtomicUsize,
        gate: Option<Semaphore>,
    }

    impl FakeGateway {
        fn new(response: Result<&'static str, u16>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated(response: Result<&'static str, u16>) -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::new(response)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.add_permits(1);
            }
        }
    }

    #[async_trait]
    impl CheckoutGateway for FakeGateway {
        async fn create_checkout(&self, _price_id: &PriceId) -> Result<Url, CheckoutRequestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            match self.response {
                Ok(url) => Ok(Url::parse(url).unwrap()),
                Err(status) => Err(CheckoutRequestError::Status(status)),
            }
        }
    }

    #[derive(Default)]
    struct RecordingBrowser {
        navigations: Mutex<Vec<Url>>,
        alerts: Mutex<Vec<String>>,
    }

    impl Browser for RecordingBrowser {
        fn navigate(&self, url: &Url) {
            self.navigations.lock().unwrap().push(url.clone());
        }

        fn alert(&self, message: &str) {
            self.alerts.lock().unwrap().push(message.to_string());
        }
    }

    const SESSION_URL: &str = "https://pay.example/session/1";

    #[tokio::test]
    async fn test_click_disables_control_until_response() {
        let control = PurchaseControl::new(PriceId::new("price_1"));
        let gateway = FakeGateway::gated(Ok(SESSION_URL));
        let browser = RecordingBrowser::default();
        assert_eq!(control.state(), PurchaseState::Idle);

        let (outcome, ()) = tokio::join!(control.handle_buy_product(&gateway, &browser), async {
            while gateway.calls() == 0 {
                tokio::task::yield_now().await;
            }
            assert!(control.is_disabled());
            gateway.release();
        });

        assert!(matches!(outcome, PurchaseOutcome::Redirected(_)));
        assert!(control.is_disabled());
    }

    #[tokio::test]
    async fn test_success_navigates_to_exact_checkout_url() {
        let control = PurchaseControl::new(PriceId::new("price_1"));
        let gateway = FakeGateway::new(Ok(SESSION_URL));
        let browser = RecordingBrowser::default();

        let outcome = control.handle_buy_product(&gateway, &browser).await;

        let expected = Url::parse(SESSION_URL).unwrap();
        assert_eq!(outcome, PurchaseOutcome::Redirected(expected.clone()));
        assert_eq!(*browser.navigations.lock().unwrap(), vec![expected]);
        assert!(browser.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_reenables_and_alerts_once() {
        let control = PurchaseControl::new(PriceId::new("price_1"));
        let gateway = FakeGateway::new(Err(500));
        let browser = RecordingBrowser::default();

        let outcome = control.handle_buy_product(&gateway, &browser).await;

        assert_eq!(outcome, PurchaseOutcome::Failed);
        assert_eq!(control.state(), PurchaseState::Idle);
        assert_eq!(
            *browser.alerts.lock().unwrap(),
            vec![CHECKOUT_FAILURE_MESSAGE.to_string()]
        );
        assert!(browser.navigations.lock().unwrap().is_empty());
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_click_while_in_flight_sends_no_second_request() {
        let control = PurchaseControl::new(PriceId::new("price_1"));
        let gateway = FakeGateway::gated(Ok(SESSION_URL));
        let browser = RecordingBrowser::default();

        let (first, second) = tokio::join!(control.handle_buy_product(&gateway, &browser), async {
            while gateway.calls() == 0 {
                tokio::task::yield_now().await;
            }
            let outcome = control.handle_buy_product(&gateway, &browser).await;
            gateway.release();
            outcome
        });

        assert!(matches!(first, PurchaseOutcome::Redirected(_)));
        assert_eq!(second, PurchaseOutcome::Ignored);
        assert_eq!(gateway.calls(), 1);
        assert_eq!(browser.navigations.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_allowed_after_failure() {
        let control = PurchaseControl::new(PriceId::new("price_1"));
        let gateway = FakeGateway::new(Err(502));
        let browser = RecordingBrowser::default();

        control.handle_buy_product(&gateway, &browser).await;
        control.handle_buy_product(&gateway, &browser).await;

        assert_eq!(gateway.calls(), 2);
        assert_eq!(browser.alerts.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_gateway_endpoint_from_base_url() {
        let base = Url::parse("https://loja.example/").unwrap();
        let gateway = HttpCheckoutGateway::new(&base).unwrap();
        assert_eq!(gateway.endpoint().as_str(), "https://loja.example/api/checkout");
    }
}
