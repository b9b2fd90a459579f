//! Guided specification wizard.
//!
//! Walks a user through size, shape, metal, karat, width, thickness and an
//! optional base-fee override, validating each answer against the catalog
//! and supporting step-by-step undo.

pub mod error;
pub mod resolver;
pub mod specification;
pub mod step;

pub use error::WizardError;
pub use resolver::{DEFAULT_FEE, SpecificationResolver, WizardCommand, WizardEvent};
pub use specification::{ResolvedSpecification, Specification, WizardState};
pub use step::{Commit, StepKind, StepValue};
