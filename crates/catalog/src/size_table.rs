//! Abstract size → circumference mapping.

use std::collections::BTreeMap;

use serde::Serialize;

use bangler_core::{DomainError, DomainResult, Measurement};

/// Fixed, ordered mapping from size to circumference (millimeters).
///
/// Invariant: circumference strictly increases with size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeTable {
    entries: BTreeMap<u32, f64>,
}

impl SizeTable {
    /// Build from `(size, circumference_mm)` pairs in any order.
    pub fn from_entries<I>(entries: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        let mut map = BTreeMap::new();
        for (size, mm) in entries {
            if !mm.is_finite() || mm <= 0.0 {
                return Err(DomainError::configuration(format!(
                    "size {size} has a non-positive circumference ({mm})"
                )));
            }
            if map.insert(size, mm).is_some() {
                return Err(DomainError::configuration(format!("size {size} is listed twice")));
            }
        }

        if map.is_empty() {
            return Err(DomainError::configuration("size table is empty"));
        }

        let mut previous: Option<(u32, f64)> = None;
        for (&size, &mm) in &map {
            if let Some((prev_size, prev_mm)) = previous {
                if mm <= prev_mm {
                    return Err(DomainError::configuration(format!(
                        "size table must increase: size {size} ({mm} mm) is not larger than size {prev_size} ({prev_mm} mm)"
                    )));
                }
            }
            previous = Some((size, mm));
        }

        Ok(Self { entries: map })
    }

    /// Circumference in millimeters for `size`.
    pub fn circumference_mm(&self, size: u32) -> DomainResult<f64> {
        self.entries.get(&size).copied().ok_or_else(|| {
            DomainError::validation(format!(
                "invalid size {size}; valid sizes are {}",
                self.range_label()
            ))
        })
    }

    pub fn circumference(&self, size: u32) -> DomainResult<Measurement> {
        self.circumference_mm(size).map(Measurement::millimeters)
    }

    /// Valid sizes, ascending.
    pub fn sizes(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }

    pub fn contains(&self, size: u32) -> bool {
        self.entries.contains_key(&size)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn range_label(&self) -> String {
        match (self.entries.keys().next(), self.entries.keys().next_back()) {
            (Some(first), Some(last)) => format!("{first}-{last}"),
            _ => "none".to_string(),
        }
    }
}
