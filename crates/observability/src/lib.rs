//! Logging setup shared by the binary and integration tests.

/// Initialize process-wide logging.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init(settings: &LogSettings) {
    tracing::init(settings);
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, LogSettings};
