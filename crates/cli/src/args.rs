use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use bangler_infra::AppConfig;
use bangler_observability::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "bangler", version, about = "Size and price bangle sizing stock")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Price every SKU at this unit price instead of calling the price service.
    #[arg(long, global = true, value_name = "AMOUNT")]
    pub unit_price: Option<Decimal>,

    /// Catalog CSV export (overrides CATALOG_PATH).
    #[arg(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Bangle size table (overrides SIZE_TABLE_PATH).
    #[arg(long, global = true, value_name = "PATH")]
    pub sizes: Option<PathBuf>,

    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// `pretty` or `json`.
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Walk through the sizing wizard and price the result (default).
    Quote,
    /// Price one fully specified bangle without prompting.
    Price(PriceArgs),
    /// List the valid next values under a catalog prefix.
    Options {
        /// Leading attribute values: shape, quality, width.
        prefix: Vec<String>,
    },
    /// Load configuration and reference data and report problems.
    Check,
}

#[derive(Debug, Clone, Args)]
pub struct PriceArgs {
    #[arg(long)]
    pub size: u32,

    #[arg(long)]
    pub shape: String,

    /// Catalog quality, e.g. "14K Yellow" or "Sterling Silver".
    #[arg(long)]
    pub quality: String,

    #[arg(long)]
    pub width: String,

    #[arg(long)]
    pub thickness: String,

    /// Custom base fee; the configured default when omitted.
    #[arg(long, value_name = "AMOUNT")]
    pub base_fee: Option<Decimal>,

    /// Accept a base fee that strays past the deviation threshold.
    #[arg(long)]
    pub confirm: bool,

    /// Print the quote as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the environment configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(path) = &self.catalog {
            config.catalog_path = path.clone();
        }
        if let Some(path) = &self.sizes {
            config.size_table_path = path.clone();
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log.format = format;
        }
    }
}
