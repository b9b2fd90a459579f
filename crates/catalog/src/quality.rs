//! Material quality = optional tier (karat) + family (colour/alloy).
//!
//! Catalog exports carry the two together (`"14K Yellow"`), while the wizard
//! asks for them separately. Tier-less families (`"Sterling Silver"`) have no
//! tier prefix at all.

use serde::{Deserialize, Serialize};

/// Split form of a catalog quality string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialQuality {
    pub tier: Option<String>,
    pub family: String,
}

impl MaterialQuality {
    pub fn new(tier: Option<&str>, family: &str) -> Self {
        Self {
            tier: tier.map(|t| t.trim().to_ascii_uppercase()),
            family: family.trim().to_string(),
        }
    }

    /// Parse a catalog quality label. A leading `<digits>K` token is the tier.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if let Some((first, rest)) = label.split_once(char::is_whitespace) {
            let rest = rest.trim();
            if is_tier_token(first) && !rest.is_empty() {
                return Self::new(Some(first), rest);
            }
        }
        Self::new(None, label)
    }

    pub fn is_tierless(&self) -> bool {
        self.tier.is_none()
    }

    /// Catalog spelling (`"14K Yellow"`, `"Sterling Silver"`).
    pub fn label(&self) -> String {
        match &self.tier {
            Some(tier) => format!("{tier} {}", self.family),
            None => self.family.clone(),
        }
    }
}

impl core::fmt::Display for MaterialQuality {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.label())
    }
}

fn is_tier_token(token: &str) -> bool {
    let Some(digits) = token
        .strip_suffix('K')
        .or_else(|| token.strip_suffix('k'))
    else {
        return false;
    };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
