//! Material density lookup (g/cm³).
//!
//! Density is the one input that can silently misprice a quote: a wrong
//! value still produces a plausible weight. There is therefore no fallback
//! density. A quality that cannot be resolved is a configuration error.
//!
//! Lookup order for a quality such as `14K White`:
//!
//! 1. the exact quality label (`"14K White"`),
//! 2. the tier alone (`"14K"`),
//! 3. the family alone (`"Sterling Silver"`).

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use bangler_catalog::MaterialQuality;
use bangler_core::{DomainError, DomainResult};

/// Which table entry supplied a density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DensitySource {
    Exact,
    Tier,
    Family,
}

/// A density together with the entry it came from, kept for auditability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDensity {
    pub grams_per_cm3: f64,
    pub key: String,
    pub source: DensitySource,
}

/// Quality → density mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityTable {
    entries: BTreeMap<String, (String, f64)>,
}

impl DensityTable {
    /// Empty table; every lookup fails until entries are added.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Typical jewelry-alloy densities, with white-gold variants.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for (key, value) in [
            ("24K", 19.32),
            ("22K", 18.0),
            ("18K", 15.65),
            ("14K", 13.3),
            ("10K", 11.65),
            ("18K White", 15.2),
            ("14K White", 13.0),
            ("10K White", 11.4),
            ("Sterling Silver", 10.36),
            ("Continuum Sterling Silver", 10.36),
        ] {
            table.entries.insert(normalize(key), (key.to_string(), value));
        }
        table
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, key: &str, grams_per_cm3: f64) -> DomainResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DomainError::configuration("density key cannot be blank"));
        }
        if !grams_per_cm3.is_finite() || grams_per_cm3 <= 0.0 {
            return Err(DomainError::configuration(format!(
                "density for {key:?} must be > 0 (got {grams_per_cm3})"
            )));
        }
        self.entries
            .insert(normalize(key), (key.to_string(), grams_per_cm3));
        Ok(())
    }

    /// Layer overrides on top of this table.
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        for (key, value) in overrides {
            self.insert(key, value)?;
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the density for a material quality.
    pub fn resolve(&self, quality: &MaterialQuality) -> DomainResult<ResolvedDensity> {
        let mut candidates = vec![(quality.label(), DensitySource::Exact)];
        if let Some(tier) = &quality.tier {
            candidates.push((tier.clone(), DensitySource::Tier));
        }
        candidates.push((quality.family.clone(), DensitySource::Family));

        for (key, source) in candidates {
            if let Some((label, value)) = self.entries.get(&normalize(&key)) {
                debug!(quality = %quality, key = %label, density = value, ?source, "density resolved");
                return Ok(ResolvedDensity {
                    grams_per_cm3: *value,
                    key: label.clone(),
                    source,
                });
            }
        }

        Err(DomainError::configuration(format!(
            "no density configured for material quality {quality:?}",
            quality = quality.label()
        )))
    }

    /// Fail unless every given quality resolves.
    pub fn ensure_covers<'a, I>(&self, qualities: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = &'a MaterialQuality>,
    {
        let missing: Vec<String> = qualities
            .into_iter()
            .filter(|q| self.resolve(q).is_err())
            .map(MaterialQuality::label)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::configuration(format!(
                "no density configured for: {}",
                missing.join(", ")
            )))
        }
    }
}

impl Default for DensityTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn normalize(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}
