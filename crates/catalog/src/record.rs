use serde::{Deserialize, Serialize};

use bangler_core::{AttributeValue, Sku};

use crate::basis::PriceBasis;

/// One concrete product row from a catalog export.
///
/// Values are kept as exported; parsing and validation happen once, in
/// [`CatalogIndex::build`](crate::CatalogIndex::build).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Ordered attribute values (shape, quality, width, thickness for sizing stock).
    pub attributes: Vec<String>,
    pub sku: String,
    /// Supplier unit token (e.g. `"DWT"`).
    pub price_unit: String,
}

impl CatalogRecord {
    pub fn new<I, S>(attributes: I, sku: impl Into<String>, price_unit: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
            sku: sku.into(),
            price_unit: price_unit.into(),
        }
    }
}

/// Terminal value of a catalog path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub path: Vec<AttributeValue>,
    pub sku: Sku,
    pub basis: PriceBasis,
}
