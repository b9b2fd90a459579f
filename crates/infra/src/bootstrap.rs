//! Startup wiring: load reference data and choose a price source.

use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use bangler_catalog::{CatalogIndex, MaterialQuality, SizeTable, schema};
use bangler_core::{DomainError, DomainResult};
use bangler_geometry::DensityTable;
use bangler_pricing::UnitPriceSource;

use crate::catalog_csv::load_catalog;
use crate::config::AppConfig;
use crate::fixed::FixedPriceSource;
use crate::size_file::load_size_table;
use crate::stuller::StullerClient;

/// Immutable data shared by every session for the life of the process.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub catalog: Arc<CatalogIndex>,
    pub sizes: Arc<SizeTable>,
    pub densities: Arc<DensityTable>,
}

impl ReferenceData {
    /// Load catalog, size table and densities, failing if any catalog
    /// quality has no density or a family mixes karat and bare qualities
    /// under one shape.
    pub fn load(config: &AppConfig) -> DomainResult<Self> {
        let catalog = load_catalog(&config.catalog_path)?;
        ensure_consistent_tiers(&catalog)?;
        let sizes = load_size_table(&config.size_table_path)?;
        let densities = config.density_table()?;

        let qualities: BTreeSet<MaterialQuality> = catalog
            .values_at_level(schema::QUALITY)
            .iter()
            .map(|value| MaterialQuality::parse(value.label()))
            .collect();
        densities.ensure_covers(&qualities)?;

        info!(
            products = catalog.len(),
            sizes = sizes.len(),
            qualities = qualities.len(),
            densities = densities.len(),
            "reference data loaded"
        );
        Ok(Self {
            catalog: Arc::new(catalog),
            sizes: Arc::new(sizes),
            densities: Arc::new(densities),
        })
    }
}

/// The wizard asks for a karat only when a family has one, so a family sold
/// both with and without a karat under the same shape cannot be quoted.
fn ensure_consistent_tiers(catalog: &CatalogIndex) -> DomainResult<()> {
    for shape in catalog.values_at_level(schema::SHAPE) {
        let mut tiered = BTreeSet::new();
        let mut bare = BTreeSet::new();
        for value in catalog.options_at(std::slice::from_ref(&shape)) {
            let quality = MaterialQuality::parse(value.label());
            if quality.is_tierless() {
                bare.insert(quality.family);
            } else {
                tiered.insert(quality.family);
            }
        }
        if let Some(family) = bare.intersection(&tiered).next() {
            return Err(DomainError::configuration(format!(
                "quality family {family} under shape {shape} is listed both with and without a karat"
            )));
        }
    }
    Ok(())
}

/// A fixed-price source when `fixed_price` is given, else the Stuller client.
pub fn price_source(
    config: &AppConfig,
    fixed_price: Option<Decimal>,
) -> DomainResult<Arc<dyn UnitPriceSource>> {
    match fixed_price {
        Some(amount) => {
            info!(%amount, "using fixed unit price");
            Ok(Arc::new(FixedPriceSource::new(amount)?))
        }
        None => {
            let settings = config.require_stuller()?;
            info!(base_url = %settings.base_url, "using Stuller price service");
            Ok(Arc::new(StullerClient::new(settings)?))
        }
    }
}
