//! Quote assembly: catalog lookup, material calculation, live unit price and
//! base fee.

pub mod config;
pub mod engine;
pub mod quote;
pub mod source;

pub use config::PricingConfig;
pub use engine::{PricingEngine, ResolvedMaterial};
pub use quote::{BaseFee, FeeDeviation, PriceQuote};
pub use source::{FetchError, UnitPrice, UnitPriceSource};
