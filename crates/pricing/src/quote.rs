use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use bangler_catalog::PriceBasis;
use bangler_core::Sku;
use bangler_geometry::MaterialCalculation;
use bangler_wizard::ResolvedSpecification;

/// Signed difference between a custom fee and the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeDeviation {
    /// `custom - default`.
    pub delta: Decimal,
    /// `delta / default × 100`, two decimals.
    pub percent: Decimal,
}

/// The base fee applied to a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseFee {
    pub applied: Decimal,
    pub default: Decimal,
    pub is_custom: bool,
    /// A custom fee that was not usable (<= 0) and was replaced by the default.
    pub rejected_custom: Option<Decimal>,
    pub deviation: Option<FeeDeviation>,
}

/// Immutable result of one pricing request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub quote_id: Uuid,
    pub priced_at: DateTime<Utc>,
    pub specification: ResolvedSpecification,
    pub sku: Sku,
    pub basis: PriceBasis,
    pub unit_price: Decimal,
    pub currency: String,
    /// Quantity in `basis` units the material cost is computed from.
    pub billed_quantity: Decimal,
    /// Metal weight in pricing weight units, four decimals.
    pub weight: Decimal,
    pub material: MaterialCalculation,
    pub material_cost: Decimal,
    pub base_fee: BaseFee,
    pub total: Decimal,
    /// Set when a custom fee strays past the configured threshold. The quote
    /// is not final until the caller confirms.
    pub needs_confirmation: bool,
}

impl PriceQuote {
    pub fn deviation(&self) -> Option<FeeDeviation> {
        self.base_fee.deviation
    }
}
