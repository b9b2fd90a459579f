//! Ring-sizing geometry.
//!
//! Pure calculations turning a finger size and stock cross-section into a
//! required strip length and metal weight. No IO, no pricing.

pub mod calculator;
pub mod config;
pub mod density;

pub use calculator::{
    GeometryCalculator, LengthBreakdown, MaterialCalculation, compute_length, compute_weight,
};
pub use config::{GRAMS_PER_DWT, GeometryConfig};
pub use density::{DensitySource, DensityTable, ResolvedDensity};
