use serde::{Deserialize, Serialize};

use bangler_core::{DomainError, DomainResult};

/// Grams in one pennyweight (DWT), the supplier's pricing mass unit.
pub const GRAMS_PER_DWT: f64 = 1.555_173_84;

/// Calibration constants for strip-to-ring geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Neutral-axis offset of bent stock, as a fraction of thickness.
    pub k_factor: f64,
    /// Extra length reserved for joining and cleanup, inches.
    pub seam_allowance_in: f64,
    /// Smallest purchasable length increment, inches.
    pub round_up_increment_in: f64,
    /// Mass of one pricing weight unit, grams.
    pub grams_per_weight_unit: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            k_factor: 0.5,
            seam_allowance_in: 0.04,
            round_up_increment_in: 1.0,
            grams_per_weight_unit: GRAMS_PER_DWT,
        }
    }
}

impl GeometryConfig {
    /// Reject values that would make every calculation meaningless.
    pub fn validate(&self) -> DomainResult<()> {
        let mut problems = Vec::new();
        if !self.k_factor.is_finite() || self.k_factor < 0.0 {
            problems.push(format!("k-factor must be >= 0 (got {})", self.k_factor));
        }
        if !self.seam_allowance_in.is_finite() || self.seam_allowance_in < 0.0 {
            problems.push(format!(
                "seam allowance must be >= 0 (got {})",
                self.seam_allowance_in
            ));
        }
        if !self.round_up_increment_in.is_finite() || self.round_up_increment_in <= 0.0 {
            problems.push(format!(
                "round-up increment must be > 0 (got {})",
                self.round_up_increment_in
            ));
        }
        if !self.grams_per_weight_unit.is_finite() || self.grams_per_weight_unit <= 0.0 {
            problems.push(format!(
                "grams per weight unit must be > 0 (got {})",
                self.grams_per_weight_unit
            ));
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
        GeometryConfig::default().validate().unwrap();
    }

    #[test]
    fn reports_every_problem() {
        let config = GeometryConfig {
            k_factor: -0.1,
            round_up_increment_in: 0.0,
            ..GeometryConfig::default()
        };
        let err = config.validate().unwrap_err();
        match err {
            DomainError::Configuration(msg) => {
                assert!(msg.contains("k-factor"));
                assert!(msg.contains("round-up increment"));
            }
            other => panic!("expected Configuration, got {other:?}"),
        }
    }
}
