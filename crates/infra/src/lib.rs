//! Infrastructure layer: configuration, file ingestion, external services.

pub mod bootstrap;
pub mod catalog_csv;
pub mod config;
pub mod fixed;
pub mod size_file;
pub mod stuller;

pub use bootstrap::{ReferenceData, price_source};
pub use config::{AppConfig, StullerSettings};
pub use fixed::FixedPriceSource;
pub use stuller::StullerClient;
