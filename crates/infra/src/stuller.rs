//! Stuller product API client.
//!
//! Prices are looked up with `POST {base}/products`, basic auth, and a body
//! restricting results to orderable products on the price list. The `Price`
//! field has appeared both as `{"Value": 87.08, "CurrencyCode": "USD"}` and as
//! a bare number or numeric string; all three are accepted.
//!
//! After [`MAX_CONSECUTIVE_FAILURES`] transport failures in a row the circuit
//! opens and calls fail fast with [`FetchError::CircuitOpen`]. Once the
//! cool-down has passed, one trial request goes out; any HTTP response closes
//! the circuit again, another transport failure restarts the cool-down.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use bangler_core::{DomainError, DomainResult, Sku};
use bangler_pricing::{FetchError, UnitPrice, UnitPriceSource};

use crate::config::StullerSettings;

/// Consecutive transport failures before the client stops calling out.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// How long an open circuit fails fast before letting a trial request through.
pub const CIRCUIT_COOL_DOWN: Duration = Duration::from_secs(30);

const DEFAULT_CURRENCY: &str = "USD";
const ERROR_BODY_LIMIT: usize = 200;

pub struct StullerClient {
    http: Client,
    products_url: String,
    username: String,
    password: String,
    failures: AtomicU32,
    opened_at: Mutex<Option<Instant>>,
    cool_down: Duration,
}

impl StullerClient {
    pub fn new(settings: &StullerSettings) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("bangler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            products_url: format!("{}/products", settings.base_url.trim_end_matches('/')),
            username: settings.username.clone(),
            password: settings.password.clone(),
            failures: AtomicU32::new(0),
            opened_at: Mutex::new(None),
            cool_down: CIRCUIT_COOL_DOWN,
        })
    }

    pub fn with_cool_down(mut self, cool_down: Duration) -> Self {
        self.cool_down = cool_down;
        self
    }

    pub fn products_url(&self) -> &str {
        &self.products_url
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Whether a request may go out now. An expired open circuit admits one
    /// trial and restarts its clock, so concurrent callers keep failing fast.
    fn admit(&self) -> bool {
        if self.consecutive_failures() < MAX_CONSECUTIVE_FAILURES {
            return true;
        }
        let mut opened_at = self.opened_at.lock().unwrap_or_else(PoisonError::into_inner);
        match *opened_at {
            Some(at) if at.elapsed() < self.cool_down => false,
            _ => {
                debug!("price service circuit half-open; sending trial request");
                *opened_at = Some(Instant::now());
                true
            }
        }
    }

    fn record_transport_failure(&self) {
        let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= MAX_CONSECUTIVE_FAILURES {
            *self.opened_at.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
            warn!(failures, "price service circuit opened");
        }
    }

    fn record_response(&self) {
        if self.failures.swap(0, Ordering::SeqCst) >= MAX_CONSECUTIVE_FAILURES {
            info!("price service circuit closed");
        }
        *self.opened_at.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl UnitPriceSource for StullerClient {
    async fn fetch_unit_price(&self, sku: &Sku) -> Result<UnitPrice, FetchError> {
        if !self.admit() {
            return Err(FetchError::CircuitOpen);
        }

        let response = self
            .http
            .post(&self.products_url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&price_request(sku))
            .send()
            .await
            .map_err(|e| {
                self.record_transport_failure();
                FetchError::Http(e.to_string())
            })?;

        self.record_response();
        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => return Err(FetchError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::RateLimited),
            s if s.is_client_error() || s.is_server_error() => {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::Status {
                    status: s.as_u16(),
                    message: body.chars().take(ERROR_BODY_LIMIT).collect(),
                });
            }
            _ => {}
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        let price = parse_price_response(sku, &body)?;
        debug!(%sku, amount = %price.amount, currency = %price.currency, "unit price received");
        Ok(price)
    }

    fn name(&self) -> &'static str {
        "stuller"
    }
}

/// Request body for a single-SKU price lookup.
pub fn price_request(sku: &Sku) -> Value {
    json!({
        "SKU": [sku.as_str()],
        "Include": ["All"],
        "Filter": ["OnPriceList", "Orderable"],
    })
}

/// Extract the first product's price from a `/products` response body.
pub fn parse_price_response(sku: &Sku, body: &Value) -> Result<UnitPrice, FetchError> {
    let product = body
        .get("Products")
        .and_then(Value::as_array)
        .and_then(|products| products.first())
        .ok_or_else(|| FetchError::NoProduct(sku.to_string()))?;

    let missing = || FetchError::MissingPrice(sku.to_string());
    match product.get("Price") {
        Some(Value::Object(price)) => {
            let amount = price.get("Value").and_then(decimal).ok_or_else(missing)?;
            let currency = price
                .get("CurrencyCode")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_CURRENCY);
            Ok(UnitPrice::new(amount, currency))
        }
        Some(value) => decimal(value).map(UnitPrice::usd).ok_or_else(missing),
        None => Err(missing()),
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .to_string()
            .parse()
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sku() -> Sku {
        Sku::new("SIZING STOCK:123456:P").unwrap()
    }

    #[test]
    fn request_body_asks_for_one_orderable_sku() {
        let body = price_request(&sku());
        assert_eq!(body["SKU"][0], "SIZING STOCK:123456:P");
        assert_eq!(body["Include"], json!(["All"]));
        assert_eq!(body["Filter"], json!(["OnPriceList", "Orderable"]));
    }

    #[test]
    fn reads_structured_price() {
        let body = json!({"Products": [{"Price": {"Value": 87.08678, "CurrencyCode": "USD"}}]});
        let price = parse_price_response(&sku(), &body).unwrap();
        assert_eq!(price.amount, "87.08678".parse::<Decimal>().unwrap());
        assert_eq!(price.currency, "USD");
    }

    #[test]
    fn reads_bare_number_and_string_prices() {
        let number = json!({"Products": [{"Price": 118.03}]});
        assert_eq!(
            parse_price_response(&sku(), &number).unwrap().amount,
            Decimal::new(11803, 2)
        );
        let text = json!({"Products": [{"Price": " 118.03 "}]});
        assert_eq!(
            parse_price_response(&sku(), &text).unwrap().amount,
            Decimal::new(11803, 2)
        );
    }

    #[test]
    fn empty_product_list_is_a_failure() {
        let body = json!({"Products": []});
        assert_eq!(
            parse_price_response(&sku(), &body).unwrap_err(),
            FetchError::NoProduct("SIZING STOCK:123456:P".into())
        );
    }

    #[test]
    fn missing_or_unreadable_price_is_a_failure() {
        for body in [
            json!({"Products": [{"Description": "no price"}]}),
            json!({"Products": [{"Price": {"CurrencyCode": "USD"}}]}),
            json!({"Products": [{"Price": "call for price"}]}),
        ] {
            assert!(matches!(
                parse_price_response(&sku(), &body),
                Err(FetchError::MissingPrice(_))
            ));
        }
    }

    #[tokio::test]
    async fn circuit_opens_after_repeated_transport_failures() {
        let settings = StullerSettings {
            username: "user".into(),
            password: "pass".into(),
            // Nothing listens on the discard port.
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(2),
        };
        let client = StullerClient::new(&settings).unwrap();
        assert_eq!(client.products_url(), "http://127.0.0.1:9/products");

        for _ in 0..MAX_CONSECUTIVE_FAILURES {
            assert!(matches!(
                client.fetch_unit_price(&sku()).await,
                Err(FetchError::Http(_))
            ));
        }
        assert_eq!(
            client.fetch_unit_price(&sku()).await.unwrap_err(),
            FetchError::CircuitOpen
        );
    }
}
