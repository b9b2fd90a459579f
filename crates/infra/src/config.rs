//! Process configuration from environment variables.
//!
//! Every problem is collected and reported at once; a bad configuration is
//! fatal at startup and never surfaces per request.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::debug;

use bangler_core::{DomainError, DomainResult};
use bangler_geometry::{DensityTable, GeometryConfig};
use bangler_observability::{LogFormat, LogSettings};
use bangler_pricing::PricingConfig;

pub const DEFAULT_STULLER_API_URL: &str = "https://api.stuller.com/v2";
pub const DEFAULT_CATALOG_PATH: &str = "data/sizing_stock.csv";
pub const DEFAULT_SIZE_TABLE_PATH: &str = "data/bangle_sizes.txt";

/// Connection settings for the Stuller price service.
#[derive(Clone, PartialEq, Eq)]
pub struct StullerSettings {
    pub username: String,
    pub password: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl core::fmt::Debug for StullerSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StullerSettings")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Fully validated application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `None` when no credentials are configured; pricing then needs a fixed
    /// unit price.
    pub stuller: Option<StullerSettings>,
    pub pricing: PricingConfig,
    pub geometry: GeometryConfig,
    pub catalog_path: PathBuf,
    pub size_table_path: PathBuf,
    pub density_overrides: Vec<(String, f64)>,
    pub log: LogSettings,
}

impl AppConfig {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> DomainResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut problems = Vec::new();

        let timeout_secs: u64 = parse_or(&get, "STULLER_TIMEOUT_SECS", 30, &mut problems);
        let stuller = match (get("STULLER_USERNAME"), get("STULLER_PASSWORD")) {
            (Some(username), Some(password)) => Some(StullerSettings {
                username,
                password,
                base_url: get("STULLER_API_URL")
                    .unwrap_or_else(|| DEFAULT_STULLER_API_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                timeout: Duration::from_secs(timeout_secs),
            }),
            (None, None) => None,
            (Some(_), None) => {
                problems.push("STULLER_PASSWORD is required when STULLER_USERNAME is set".into());
                None
            }
            (None, Some(_)) => {
                problems.push("STULLER_USERNAME is required when STULLER_PASSWORD is set".into());
                None
            }
        };

        let pricing = PricingConfig {
            default_base_fee: parse_or(&get, "BASE_PRICE", Decimal::new(47500, 2), &mut problems),
            fee_deviation_threshold_pct: parse_or(
                &get,
                "FEE_DEVIATION_THRESHOLD_PCT",
                Decimal::from(20),
                &mut problems,
            ),
            fetch_timeout: Duration::from_secs(timeout_secs),
        };
        let defaults = GeometryConfig::default();
        let geometry = GeometryConfig {
            k_factor: parse_or(&get, "K_FACTOR", defaults.k_factor, &mut problems),
            seam_allowance_in: parse_or(
                &get,
                "SEAM_ALLOWANCE_IN",
                defaults.seam_allowance_in,
                &mut problems,
            ),
            round_up_increment_in: parse_or(
                &get,
                "ROUND_UP_INCREMENT_IN",
                defaults.round_up_increment_in,
                &mut problems,
            ),
            grams_per_weight_unit: defaults.grams_per_weight_unit,
        };
        for check in [pricing.validate(), geometry.validate()] {
            if let Err(err) = check {
                problems.push(problem_text(err));
            }
        }

        let density_overrides = match get("DENSITY_OVERRIDES") {
            Some(raw) => parse_density_overrides(&raw).unwrap_or_else(|err| {
                problems.push(problem_text(err));
                Vec::new()
            }),
            None => Vec::new(),
        };

        let log = LogSettings {
            level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: match get("LOG_FORMAT") {
                Some(raw) => raw.parse().unwrap_or_else(|err: String| {
                    problems.push(format!("LOG_FORMAT: {err}"));
                    LogFormat::default()
                }),
                None => LogFormat::default(),
            },
        };

        if !problems.is_empty() {
            return Err(DomainError::configuration(problems.join("; ")));
        }

        Ok(Self {
            stuller,
            pricing,
            geometry,
            catalog_path: get("CATALOG_PATH")
                .unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string())
                .into(),
            size_table_path: get("SIZE_TABLE_PATH")
                .unwrap_or_else(|| DEFAULT_SIZE_TABLE_PATH.to_string())
                .into(),
            density_overrides,
            log,
        })
    }

    /// Standard densities with the configured overrides applied.
    pub fn density_table(&self) -> DomainResult<DensityTable> {
        DensityTable::standard().with_overrides(
            self.density_overrides
                .iter()
                .map(|(key, value)| (key.as_str(), *value)),
        )
    }

    pub fn require_stuller(&self) -> DomainResult<&StullerSettings> {
        self.stuller.as_ref().ok_or_else(|| {
            DomainError::configuration(
                "Stuller credentials required: set STULLER_USERNAME and STULLER_PASSWORD, or supply a fixed unit price",
            )
        })
    }
}

/// Parse `"14K Yellow=13.1;Sterling Silver=10.4"`.
pub fn parse_density_overrides(raw: &str) -> DomainResult<Vec<(String, f64)>> {
    let mut out = Vec::new();
    for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = part.split_once('=').ok_or_else(|| {
            DomainError::configuration(format!("DENSITY_OVERRIDES entry {part:?} must be key=value"))
        })?;
        let key = key.trim();
        let value: f64 = value.trim().parse().map_err(|_| {
            DomainError::configuration(format!(
                "DENSITY_OVERRIDES entry {part:?} has a non-numeric density"
            ))
        })?;
        if key.is_empty() || !value.is_finite() || value <= 0.0 {
            return Err(DomainError::configuration(format!(
                "DENSITY_OVERRIDES entry {part:?} needs a key and a density > 0"
            )));
        }
        out.push((key.to_string(), value));
    }
    Ok(out)
}

fn parse_or<T, G>(get: &G, key: &str, default: T, problems: &mut Vec<String>) -> T
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            problems.push(format!("{key}: cannot parse {raw:?}"));
            default
        }),
    }
}

fn problem_text(err: DomainError) -> String {
    match err {
        DomainError::Configuration(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> DomainResult<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_any_variables() {
        let config = load(&[]).unwrap();
        assert!(config.stuller.is_none());
        assert_eq!(config.pricing.default_base_fee, Decimal::new(47500, 2));
        assert_eq!(config.pricing.fee_deviation_threshold_pct, Decimal::from(20));
        assert_eq!(config.geometry, GeometryConfig::default());
        assert_eq!(config.catalog_path, PathBuf::from(DEFAULT_CATALOG_PATH));
        assert_eq!(config.log, LogSettings::default());
        assert!(config.require_stuller().is_err());
    }

    #[test]
    fn reads_credentials_and_overrides() {
        let config = load(&[
            ("STULLER_USERNAME", "shop"),
            ("STULLER_PASSWORD", "secret"),
            ("STULLER_API_URL", "https://example.test/v2/"),
            ("STULLER_TIMEOUT_SECS", "5"),
            ("BASE_PRICE", "500"),
            ("K_FACTOR", "0.45"),
            ("DENSITY_OVERRIDES", "14K Yellow=13.1; Sterling Silver=10.4"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        let stuller = config.require_stuller().unwrap();
        assert_eq!(stuller.base_url, "https://example.test/v2");
        assert_eq!(stuller.timeout, Duration::from_secs(5));
        assert!(!format!("{stuller:?}").contains("secret"));
        assert_eq!(config.pricing.default_base_fee, Decimal::from(500));
        assert_eq!(config.pricing.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.geometry.k_factor, 0.45);
        assert_eq!(config.density_overrides.len(), 2);
        assert_eq!(config.log.format, LogFormat::Json);

        let densities = config.density_table().unwrap();
        let yellow = bangler_catalog::MaterialQuality::parse("14K Yellow");
        assert_eq!(densities.resolve(&yellow).unwrap().grams_per_cm3, 13.1);
    }

    #[test]
    fn collects_every_problem() {
        let err = load(&[
            ("STULLER_USERNAME", "shop"),
            ("BASE_PRICE", "-1"),
            ("K_FACTOR", "abc"),
            ("LOG_FORMAT", "xml"),
        ])
        .unwrap_err();
        match err {
            DomainError::Configuration(msg) => {
                assert!(msg.contains("STULLER_PASSWORD"), "{msg}");
                assert!(msg.contains("base fee"), "{msg}");
                assert!(msg.contains("K_FACTOR"), "{msg}");
                assert!(msg.contains("LOG_FORMAT"), "{msg}");
            }
            other => panic!("expected Configuration, got {other:?}"),
        }
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[("BASE_PRICE", "  "), ("STULLER_USERNAME", "")]).unwrap();
        assert_eq!(config.pricing.default_base_fee, Decimal::new(47500, 2));
        assert!(config.stuller.is_none());
    }

    #[test]
    fn density_override_syntax() {
        assert_eq!(
            parse_density_overrides("14K=13.2;").unwrap(),
            vec![("14K".to_string(), 13.2)]
        );
        assert!(parse_density_overrides("14K").is_err());
        assert!(parse_density_overrides("14K=heavy").is_err());
        assert!(parse_density_overrides("14K=0").is_err());
    }
}
