//! `bangler-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod attribute;
pub mod error;
pub mod id;

pub use aggregate::Aggregate;
pub use attribute::{AttributeKind, AttributeValue, LengthUnit, MM_PER_INCH, Measurement};
pub use error::{DomainError, DomainResult};
pub use id::Sku;
