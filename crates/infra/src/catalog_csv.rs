//! Sizing-stock catalog export (CSV) ingestion.
//!
//! Expected header (any column order, case-insensitive):
//!
//! ```text
//! SKU,Shape,Quality,Width,Thickness,PriceUnit
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use bangler_catalog::{CatalogIndex, CatalogRecord, schema};
use bangler_core::{DomainError, DomainResult};

const SKU: &str = "SKU";
const PRICE_UNIT: &str = "PriceUnit";

/// Read catalog rows from any CSV source.
pub fn read_catalog_records<R: Read>(source: R) -> DomainResult<Vec<CatalogRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| DomainError::configuration(format!("catalog header unreadable: {e}")))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| DomainError::configuration(format!("catalog is missing the {name} column")))
    };
    let sku_col = column(SKU)?;
    let unit_col = column(PRICE_UNIT)?;
    let attribute_cols = schema::LEVELS
        .iter()
        .map(|level| column(*level))
        .collect::<DomainResult<Vec<_>>>()?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let row = row.map_err(|e| DomainError::configuration(format!("catalog line {line}: {e}")))?;
        let cell = |col: usize, name: &str| -> DomainResult<String> {
            row.get(col)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| DomainError::configuration(format!("catalog line {line}: {name} is blank")))
        };

        let attributes = attribute_cols
            .iter()
            .zip(schema::LEVELS)
            .map(|(&col, level)| cell(col, level))
            .collect::<DomainResult<Vec<_>>>()?;
        records.push(CatalogRecord::new(
            attributes,
            cell(sku_col, SKU)?,
            cell(unit_col, PRICE_UNIT)?,
        ));
    }
    Ok(records)
}

pub fn load_catalog_records(path: &Path) -> DomainResult<Vec<CatalogRecord>> {
    let file = File::open(path).map_err(|e| {
        DomainError::configuration(format!("cannot open catalog {}: {e}", path.display()))
    })?;
    read_catalog_records(file)
}

/// Load and index the catalog at `path`.
pub fn load_catalog(path: &Path) -> DomainResult<CatalogIndex> {
    let records = load_catalog_records(path)?;
    info!(path = %path.display(), rows = records.len(), "catalog export read");
    CatalogIndex::build(schema::LEVELS, records)
}
