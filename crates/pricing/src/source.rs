//! Unit-price lookup seam.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use bangler_core::{DomainError, Sku};

/// Current supplier price for one SKU, per unit of its price basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitPrice {
    pub amount: Decimal,
    pub currency: String,
}

impl UnitPrice {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn usd(amount: Decimal) -> Self {
        Self::new(amount, "USD")
    }
}

/// Anything short of an explicit price from the service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("authentication rejected by price service")]
    Unauthorized,

    #[error("price service rate limit exceeded")]
    RateLimited,

    #[error("price service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unreadable price response: {0}")]
    Parse(String),

    #[error("no orderable product found for SKU {0}")]
    NoProduct(String),

    #[error("no price returned for SKU {0}")]
    MissingPrice(String),

    #[error("price service unavailable after repeated failures; try again shortly")]
    CircuitOpen,

    #[error("price lookup timed out after {0:?}")]
    Timeout(Duration),
}

impl From<FetchError> for DomainError {
    fn from(err: FetchError) -> Self {
        DomainError::transient(err.to_string())
    }
}

/// External unit-price collaborator.
///
/// Implementations perform one lookup per call and never retry on their own.
#[async_trait]
pub trait UnitPriceSource: Send + Sync {
    async fn fetch_unit_price(&self, sku: &Sku) -> Result<UnitPrice, FetchError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
