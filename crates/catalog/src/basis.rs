use core::str::FromStr;

use serde::{Deserialize, Serialize};

use bangler_core::DomainError;

/// Unit the supplier prices a SKU by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBasis {
    /// Pennyweight (DWT), the usual unit for precious-metal mill products.
    Pennyweight,
    Gram,
    Inch,
    Each,
}

impl PriceBasis {
    pub fn token(self) -> &'static str {
        match self {
            Self::Pennyweight => "DWT",
            Self::Gram => "GRAM",
            Self::Inch => "INCH",
            Self::Each => "EACH",
        }
    }
}

impl FromStr for PriceBasis {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DWT" | "PENNYWEIGHT" => Ok(Self::Pennyweight),
            "G" | "GR" | "GRAM" | "GRAMS" => Ok(Self::Gram),
            "IN" | "INCH" | "INCHES" => Ok(Self::Inch),
            "EA" | "EACH" => Ok(Self::Each),
            other => Err(DomainError::configuration(format!(
                "unknown price unit {other:?} (expected DWT, GRAM, INCH or EACH)"
            ))),
        }
    }
}

impl core::fmt::Display for PriceBasis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supplier_tokens() {
        assert_eq!("dwt".parse::<PriceBasis>().unwrap(), PriceBasis::Pennyweight);
        assert_eq!(" G ".parse::<PriceBasis>().unwrap(), PriceBasis::Gram);
        assert_eq!("IN".parse::<PriceBasis>().unwrap(), PriceBasis::Inch);
        assert_eq!("Each".parse::<PriceBasis>().unwrap(), PriceBasis::Each);
    }

    #[test]
    fn unknown_token_is_a_configuration_error() {
        let err = "OZ".parse::<PriceBasis>().unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
    }
}
