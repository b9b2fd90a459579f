//! Tagged catalog attribute values.
//!
//! Catalog exports spell dimensions as free text (`"6.5 Mm"`, `"0.75 Mm"`).
//! They are parsed **once** into a [`Measurement`] (magnitude + unit) so that
//! comparisons and ordering work on numbers, not strings. Anything that does
//! not look like a number with a known length unit stays [`AttributeKind::Text`].

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

pub const MM_PER_INCH: f64 = 25.4;

/// Length unit recognised in catalog attribute suffixes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Millimeter,
    Centimeter,
    Inch,
}

impl LengthUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" => Some(Self::Millimeter),
            "cm" | "centimeter" | "centimeters" => Some(Self::Centimeter),
            "in" | "inch" | "inches" | "\"" => Some(Self::Inch),
            _ => None,
        }
    }

    fn millimeters_per_unit(self) -> f64 {
        match self {
            Self::Millimeter => 1.0,
            Self::Centimeter => 10.0,
            Self::Inch => MM_PER_INCH,
        }
    }
}

/// Numeric magnitude with a length unit.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub magnitude: f64,
    pub unit: LengthUnit,
}

impl Measurement {
    pub fn new(magnitude: f64, unit: LengthUnit) -> Self {
        Self { magnitude, unit }
    }

    pub fn millimeters(magnitude: f64) -> Self {
        Self::new(magnitude, LengthUnit::Millimeter)
    }

    pub fn to_millimeters(&self) -> f64 {
        self.magnitude * self.unit.millimeters_per_unit()
    }

    pub fn to_inches(&self) -> f64 {
        self.to_millimeters() / MM_PER_INCH
    }

    /// Parse `"<number> <unit>"`; the space is optional. Returns `None` for
    /// anything else, including a bare number.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let split = text
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(text.len());
        let (number, suffix) = text.split_at(split);
        if number.is_empty() || suffix.trim().is_empty() {
            return None;
        }
        let magnitude: f64 = number.parse().ok()?;
        if !magnitude.is_finite() {
            return None;
        }
        let unit = LengthUnit::from_suffix(suffix)?;
        Some(Self::new(magnitude, unit))
    }
}

/// Parsed shape of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeKind<'a> {
    Measure(Measurement),
    Text(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
enum Parsed {
    Measure(Measurement),
    Text(String),
}

/// One catalog attribute value, parsed once.
///
/// Equality, ordering and hashing use the parsed form; `label()` keeps the
/// spelling the value was first built from, for display.
#[derive(Debug, Clone)]
pub struct AttributeValue {
    label: String,
    parsed: Parsed,
}

impl AttributeValue {
    /// Parse a non-blank attribute value.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let label = raw.trim();
        if label.is_empty() {
            return Err(DomainError::validation("attribute value cannot be blank"));
        }
        let parsed = match Measurement::parse(label) {
            Some(m) => Parsed::Measure(m),
            None => Parsed::Text(label.to_string()),
        };
        Ok(Self {
            label: label.to_string(),
            parsed,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> AttributeKind<'_> {
        match &self.parsed {
            Parsed::Measure(m) => AttributeKind::Measure(*m),
            Parsed::Text(t) => AttributeKind::Text(t),
        }
    }

    pub fn measurement(&self) -> Option<Measurement> {
        match self.parsed {
            Parsed::Measure(m) => Some(m),
            Parsed::Text(_) => None,
        }
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AttributeValue {}

impl PartialOrd for AttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Measurements sort before text; measurements by physical length, text lexically.
impl Ord for AttributeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.parsed, &other.parsed) {
            (Parsed::Measure(a), Parsed::Measure(b)) => a
                .to_millimeters()
                .total_cmp(&b.to_millimeters())
                .then(a.unit.cmp(&b.unit)),
            (Parsed::Measure(_), Parsed::Text(_)) => Ordering::Less,
            (Parsed::Text(_), Parsed::Measure(_)) => Ordering::Greater,
            (Parsed::Text(a), Parsed::Text(b)) => a.cmp(b),
        }
    }
}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.parsed {
            Parsed::Measure(m) => {
                0u8.hash(state);
                m.to_millimeters().to_bits().hash(state);
                m.unit.hash(state);
            }
            Parsed::Text(t) => {
                1u8.hash(state);
                t.hash(state);
            }
        }
    }
}

impl core::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.label)
    }
}

impl FromStr for AttributeValue {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> AttributeValue {
        AttributeValue::parse(s).unwrap()
    }

    #[test]
    fn parses_catalog_spelling_of_millimeters() {
        let m = v("6.5 Mm").measurement().unwrap();
        assert_eq!(m.unit, LengthUnit::Millimeter);
        assert!((m.magnitude - 6.5).abs() < f64::EPSILON);
    }

    #[test]
    fn spacing_and_case_do_not_matter_for_measurements() {
        assert_eq!(v("6.5 Mm"), v("6.50mm"));
        assert_eq!(v("1 Mm"), v("1.0 MM"));
        assert_eq!(v("6.5 Mm").label(), "6.5 Mm");
    }

    #[test]
    fn non_dimensional_values_stay_text() {
        assert!(matches!(v("14K Yellow").kind(), AttributeKind::Text("14K Yellow")));
        assert!(matches!(v("20").kind(), AttributeKind::Text(_)));
        assert!(matches!(v("Comfort Fit").kind(), AttributeKind::Text(_)));
    }

    #[test]
    fn blank_values_are_rejected() {
        assert!(AttributeValue::parse("  ").is_err());
    }

    #[test]
    fn measurements_sort_by_magnitude_not_string() {
        let mut values = vec![v("10 Mm"), v("2 Mm"), v("0.75 Mm"), v("1.5 Mm")];
        values.sort();
        let labels: Vec<_> = values.iter().map(|x| x.label()).collect();
        assert_eq!(labels, ["0.75 Mm", "1.5 Mm", "2 Mm", "10 Mm"]);
    }

    #[test]
    fn measurements_sort_before_text() {
        let mut values = vec![v("Flat"), v("3 Mm")];
        values.sort();
        assert_eq!(values[0].label(), "3 Mm");
    }

    #[test]
    fn inches_convert_to_millimeters() {
        let m = Measurement::parse("1 In").unwrap();
        assert!((m.to_millimeters() - 25.4).abs() < 1e-9);
        assert!((Measurement::millimeters(25.4).to_inches() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&v("2 Mm")).unwrap();
        assert_eq!(json, "\"2 Mm\"");
        let back: AttributeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("2 Mm"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: ordering of millimeter values follows their magnitude.
            #[test]
            fn ordering_matches_magnitude(a in 0.01f64..100.0, b in 0.01f64..100.0) {
                let va = v(&format!("{a} Mm"));
                let vb = v(&format!("{b} Mm"));
                prop_assert_eq!(va.cmp(&vb), a.total_cmp(&b));
            }
        }
    }
}
