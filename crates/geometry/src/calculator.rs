//! Strip length and weight for a bent ring.
//!
//! ```text
//! diameter = circumference / π
//! length   = π × (diameter + 2 × k × thickness) + seam allowance
//! rounded  = ceil(length / increment) × increment
//!
//! volume per inch = width_mm × thickness_mm × 25.4 / 1000      (cm³/in)
//! weight          = volume per inch × length × density / grams per unit
//! ```
//!
//! Both functions are pure; [`GeometryCalculator`] wires them to the
//! configured constants and records every intermediate value in a
//! [`MaterialCalculation`].

use std::f64::consts::PI;

use serde::Serialize;
use tracing::debug;

use bangler_core::{DomainError, DomainResult, MM_PER_INCH, Measurement};

use crate::config::GeometryConfig;
use crate::density::ResolvedDensity;

const MM3_PER_CM3: f64 = 1000.0;

/// Absorbs float noise so an exact multiple of the increment is not bumped up.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Intermediate values of [`compute_length`]. All lengths share the input unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LengthBreakdown {
    pub diameter: f64,
    /// π × (diameter + 2 × k × thickness), before the seam allowance.
    pub bent_length: f64,
    /// `bent_length` plus the seam allowance.
    pub total_length: f64,
    /// `total_length` rounded up to the purchasable increment.
    pub rounded_length: f64,
}

/// Required strip length for a ring of the given inner circumference.
///
/// All lengths must be in the same unit. Fails with
/// [`DomainError::Validation`] when the circumference is not positive, the
/// thickness is negative, or the thickness is at least the implied diameter.
pub fn compute_length(
    circumference: f64,
    thickness: f64,
    k_factor: f64,
    seam_allowance: f64,
    increment: f64,
) -> DomainResult<LengthBreakdown> {
    if !circumference.is_finite() || circumference <= 0.0 {
        return Err(DomainError::validation(format!(
            "circumference must be > 0 (got {circumference})"
        )));
    }
    if !thickness.is_finite() || thickness < 0.0 {
        return Err(DomainError::validation(format!(
            "thickness must be >= 0 (got {thickness})"
        )));
    }
    if !increment.is_finite() || increment <= 0.0 {
        return Err(DomainError::validation(format!(
            "rounding increment must be > 0 (got {increment})"
        )));
    }

    let diameter = circumference / PI;
    if thickness >= diameter {
        return Err(DomainError::validation(format!(
            "thickness {thickness} is not smaller than the ring diameter {diameter:.4}"
        )));
    }

    let bent_length = PI * (diameter + 2.0 * k_factor * thickness);
    let total_length = bent_length + seam_allowance;
    let rounded_length = (total_length / increment - ROUNDING_EPSILON).ceil() * increment;

    Ok(LengthBreakdown {
        diameter,
        bent_length,
        total_length,
        rounded_length,
    })
}

/// Weight of a rectangular strip, in pricing weight units.
///
/// `width_mm` and `thickness_mm` are the cross-section, `length_in` the strip
/// length, `density` in g/cm³ and `grams_per_weight_unit` converts grams to
/// the supplier's unit (1.555 17384 for DWT).
pub fn compute_weight(
    width_mm: f64,
    thickness_mm: f64,
    length_in: f64,
    density: f64,
    grams_per_weight_unit: f64,
) -> DomainResult<f64> {
    for (name, value) in [
        ("width", width_mm),
        ("thickness", thickness_mm),
        ("length", length_in),
        ("density", density),
        ("grams per weight unit", grams_per_weight_unit),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(DomainError::validation(format!("{name} must be > 0 (got {value})")));
        }
    }

    Ok(volume_per_inch(width_mm, thickness_mm) * length_in * density / grams_per_weight_unit)
}

fn volume_per_inch(width_mm: f64, thickness_mm: f64) -> f64 {
    width_mm * thickness_mm * MM_PER_INCH / MM3_PER_CM3
}

/// Full, immutable record of one material calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialCalculation {
    pub circumference_mm: f64,
    pub circumference_in: f64,
    pub diameter_in: f64,
    pub width_mm: f64,
    pub thickness_mm: f64,
    pub thickness_in: f64,
    pub k_factor: f64,
    pub seam_allowance_in: f64,
    pub bent_length_in: f64,
    pub total_length_in: f64,
    pub rounded_length_in: f64,
    pub volume_cm3_per_in: f64,
    pub density: ResolvedDensity,
    pub grams_per_weight_unit: f64,
    /// Weight of `rounded_length_in` of strip, in pricing weight units.
    pub weight: f64,
}

impl MaterialCalculation {
    pub fn weight_grams(&self) -> f64 {
        self.weight * self.grams_per_weight_unit
    }
}

/// Geometry calculator bound to one set of calibration constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryCalculator {
    config: GeometryConfig,
}

impl GeometryCalculator {
    pub fn new(config: GeometryConfig) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// Length and weight of strip needed for one ring.
    pub fn calculate(
        &self,
        circumference: Measurement,
        width: Measurement,
        thickness: Measurement,
        density: ResolvedDensity,
    ) -> DomainResult<MaterialCalculation> {
        let cfg = &self.config;
        let circumference_in = circumference.to_inches();
        let thickness_in = thickness.to_inches();

        let length = compute_length(
            circumference_in,
            thickness_in,
            cfg.k_factor,
            cfg.seam_allowance_in,
            cfg.round_up_increment_in,
        )?;

        let width_mm = width.to_millimeters();
        let thickness_mm = thickness.to_millimeters();
        let weight = compute_weight(
            width_mm,
            thickness_mm,
            length.rounded_length,
            density.grams_per_cm3,
            cfg.grams_per_weight_unit,
        )?;

        debug!(
            circumference_in,
            thickness_in,
            length_in = length.rounded_length,
            density = density.grams_per_cm3,
            weight,
            "material calculated"
        );

        Ok(MaterialCalculation {
            circumference_mm: circumference.to_millimeters(),
            circumference_in,
            diameter_in: length.diameter,
            width_mm,
            thickness_mm,
            thickness_in,
            k_factor: cfg.k_factor,
            seam_allowance_in: cfg.seam_allowance_in,
            bent_length_in: length.bent_length,
            total_length_in: length.total_length,
            rounded_length_in: length.rounded_length,
            volume_cm3_per_in: volume_per_inch(width_mm, thickness_mm),
            density,
            grams_per_weight_unit: cfg.grams_per_weight_unit,
            weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GRAMS_PER_DWT;
    use crate::density::DensitySource;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn size_twenty_strip_length() {
        // 68.24 mm circumference, 2.0 mm thick, k = 0.5, 0.04 in seam.
        let c_in = 68.24 / MM_PER_INCH;
        let t_in = 2.0 / MM_PER_INCH;
        let out = compute_length(c_in, t_in, 0.5, 0.04, 1.0).unwrap();
        assert!(close(out.diameter, 0.855_17, 1e-4));
        assert!(close(out.total_length, 2.974, 1e-3));
        assert_eq!(out.rounded_length, 3.0);
    }

    #[test]
    fn length_rounds_up_to_increment() {
        let out = compute_length(10.0, 0.1, 0.5, 0.04, 0.25).unwrap();
        assert!(out.rounded_length >= out.total_length);
        assert!(out.rounded_length - out.total_length < 0.25);
        assert!(close((out.rounded_length / 0.25).round() * 0.25, out.rounded_length, 1e-12));
    }

    #[test]
    fn exact_multiple_is_not_bumped() {
        // π × (1/π) = 1 in, no thickness or seam.
        let out = compute_length(1.0, 0.0, 0.5, 0.0, 1.0).unwrap();
        assert_eq!(out.rounded_length, 1.0);
    }

    #[test]
    fn thickness_beyond_diameter_is_invalid() {
        let err = compute_length(10.0, 6.0, 0.5, 0.04, 1.0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_positive_circumference_is_invalid() {
        assert!(matches!(
            compute_length(0.0, 0.1, 0.5, 0.04, 1.0),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            compute_length(-3.0, 0.1, 0.5, 0.04, 1.0),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn strip_weight_in_pennyweight() {
        // 6.5 × 1.5 mm strip, 3 in long, 14K at 13.3 g/cm³.
        let w = compute_weight(6.5, 1.5, 3.0, 13.3, GRAMS_PER_DWT).unwrap();
        assert!(close(w, 6.3537, 1e-3), "weight was {w}");
    }

    #[test]
    fn weight_rejects_non_positive_inputs() {
        assert!(compute_weight(0.0, 1.5, 3.0, 13.3, GRAMS_PER_DWT).is_err());
        assert!(compute_weight(6.5, 1.5, 3.0, -1.0, GRAMS_PER_DWT).is_err());
    }

    #[test]
    fn calculator_keeps_density_used() {
        let calc = GeometryCalculator::new(GeometryConfig::default()).unwrap();
        let density = ResolvedDensity {
            grams_per_cm3: 13.3,
            key: "14K".into(),
            source: DensitySource::Tier,
        };
        let out = calc
            .calculate(
                Measurement::millimeters(68.24),
                Measurement::millimeters(6.5),
                Measurement::millimeters(1.5),
                density.clone(),
            )
            .unwrap();
        assert_eq!(out.density, density);
        assert_eq!(out.rounded_length_in, 3.0);
        assert!(close(out.weight, 6.3537, 1e-3));
        assert!(close(out.weight_grams(), 9.881, 1e-2));
    }

    #[test]
    fn calculator_rejects_invalid_config() {
        let config = GeometryConfig {
            round_up_increment_in: 0.0,
            ..GeometryConfig::default()
        };
        assert!(GeometryCalculator::new(config).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: length strictly increases with circumference.
            #[test]
            fn length_increases_with_circumference(
                c in 2.0f64..12.0,
                dc in 0.001f64..2.0,
                t in 0.0f64..0.1,
                k in 0.0f64..1.0,
            ) {
                let a = compute_length(c, t, k, 0.04, 1.0).unwrap();
                let b = compute_length(c + dc, t, k, 0.04, 1.0).unwrap();
                prop_assert!(b.total_length > a.total_length);
                prop_assert!(b.rounded_length >= a.rounded_length);
            }

            /// Property: length strictly increases with thickness when k > 0.
            #[test]
            fn length_increases_with_thickness(
                c in 2.0f64..12.0,
                t in 0.0f64..0.1,
                dt in 0.001f64..0.1,
                k in 0.05f64..1.0,
            ) {
                let a = compute_length(c, t, k, 0.04, 1.0).unwrap();
                let b = compute_length(c, t + dt, k, 0.04, 1.0).unwrap();
                prop_assert!(b.total_length > a.total_length);
            }

            /// Property: weight scales linearly with length.
            #[test]
            fn weight_is_linear_in_length(len in 0.5f64..20.0) {
                let one = compute_weight(6.5, 1.5, len, 13.3, GRAMS_PER_DWT).unwrap();
                let two = compute_weight(6.5, 1.5, 2.0 * len, 13.3, GRAMS_PER_DWT).unwrap();
                prop_assert!((two - 2.0 * one).abs() < 1e-9);
            }
        }
    }
}
