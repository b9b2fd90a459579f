use async_trait::async_trait;
use rust_decimal::Decimal;

use bangler_core::{DomainError, DomainResult, Sku};
use bangler_pricing::{FetchError, UnitPrice, UnitPriceSource};

/// Answers every SKU with one configured price, for offline or manual quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPriceSource {
    price: UnitPrice,
}

impl FixedPriceSource {
    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::configuration(format!(
                "fixed unit price must be > 0 (got {amount})"
            )));
        }
        Ok(Self {
            price: UnitPrice::usd(amount),
        })
    }
}

#[async_trait]
impl UnitPriceSource for FixedPriceSource {
    async fn fetch_unit_price(&self, _sku: &Sku) -> Result<UnitPrice, FetchError> {
        Ok(self.price.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
