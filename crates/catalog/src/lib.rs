//! Catalog domain module.
//!
//! Immutable reference data built once at startup: the hierarchical catalog
//! index over sizing-stock products and the size table. Pure domain logic,
//! no IO; loading from files lives in `bangler-infra`.

pub mod basis;
pub mod index;
pub mod quality;
pub mod record;
pub mod size_table;

pub use basis::PriceBasis;
pub use index::CatalogIndex;
pub use quality::MaterialQuality;
pub use record::{CatalogEntry, CatalogRecord};
pub use size_table::SizeTable;

/// Attribute levels of the sizing-stock catalog, in path order.
pub mod schema {
    pub const SHAPE: usize = 0;
    pub const QUALITY: usize = 1;
    pub const WIDTH: usize = 2;
    pub const THICKNESS: usize = 3;

    pub const LEVELS: [&str; 4] = ["Shape", "Quality", "Width", "Thickness"];
}
