use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;

use bangler_core::{DomainError, DomainResult};

/// Pricing policy constants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingConfig {
    /// Base fee charged when no custom fee is given.
    pub default_base_fee: Decimal,
    /// Custom fees deviating by more than this percentage need confirmation.
    pub fee_deviation_threshold_pct: Decimal,
    /// Upper bound on one unit-price lookup.
    pub fetch_timeout: Duration,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_base_fee: Decimal::new(47500, 2),
            fee_deviation_threshold_pct: Decimal::from(20),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl PricingConfig {
    pub fn validate(&self) -> DomainResult<()> {
        let mut problems = Vec::new();
        if self.default_base_fee <= Decimal::ZERO {
            problems.push(format!(
                "default base fee must be > 0 (got {})",
                self.default_base_fee
            ));
        }
        if self.fee_deviation_threshold_pct < Decimal::ZERO {
            problems.push(format!(
                "fee deviation threshold must be >= 0 (got {})",
                self.fee_deviation_threshold_pct
            ));
        }
        if self.fetch_timeout.is_zero() {
            problems.push("fetch timeout must be > 0".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(DomainError::configuration(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PricingConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_fee_and_timeout_are_rejected() {
        let config = PricingConfig {
            default_base_fee: Decimal::ZERO,
            fetch_timeout: Duration::ZERO,
            ..PricingConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DomainError::Configuration(msg) if msg.contains("base fee") && msg.contains("timeout")));
    }
}
