use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use rust_decimal::Decimal;
use tracing::info;

use bangler_catalog::MaterialQuality;
use bangler_core::AttributeValue;
use bangler_infra::{AppConfig, ReferenceData, price_source};
use bangler_pricing::{PriceQuote, PricingEngine};
use bangler_wizard::{DEFAULT_FEE, ResolvedSpecification, SpecificationResolver, StepKind};

use crate::args::PriceArgs;
use crate::display;
use crate::session::{self, Terminal};

/// Loaded configuration and reference data for one process.
pub struct App {
    pub config: AppConfig,
    pub data: ReferenceData,
}

impl App {
    pub fn load(config: AppConfig) -> Result<Self> {
        let data = ReferenceData::load(&config).map_err(|e| anyhow!(display::domain_error(&e)))?;
        Ok(Self { config, data })
    }

    pub fn wizard(&self) -> SpecificationResolver {
        SpecificationResolver::new(self.data.catalog.clone(), self.data.sizes.clone())
    }

    pub fn engine(&self, unit_price: Option<Decimal>) -> Result<PricingEngine> {
        let source = price_source(&self.config, unit_price)?;
        let engine = PricingEngine::new(
            self.data.catalog.clone(),
            self.data.sizes.clone(),
            self.data.densities.clone(),
            self.config.geometry,
            self.config.pricing.clone(),
            source,
        )?;
        Ok(engine)
    }
}

pub async fn quote(app: &App, unit_price: Option<Decimal>) -> Result<()> {
    let engine = app.engine(unit_price)?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut term = Terminal::new(stdin, std::io::stdout()).watching_ctrl_c();

    if let Some(quote) = session::run_quote(&engine, app.wizard(), &mut term).await? {
        info!(quote_id = %quote.quote_id, total = %quote.total, "quote accepted");
    }
    Ok(())
}

pub async fn price(
    app: &App,
    args: &PriceArgs,
    unit_price: Option<Decimal>,
    out: &mut impl Write,
) -> Result<PriceQuote> {
    let mut wizard = app.wizard();
    let spec = specify(&mut wizard, args)?;
    let engine = app.engine(unit_price)?;

    let quote = engine
        .price_specification_until(&spec, None, session::interrupt(true))
        .await
        .map_err(|e| anyhow!(display::domain_error(&e)))?;

    if quote.needs_confirmation && !args.confirm {
        let warning = display::deviation_warning(&quote).unwrap_or_default();
        bail!("{warning}; pass --confirm to accept");
    }
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&quote)?)?;
    } else {
        write!(out, "{}", display::quote(&quote))?;
    }
    Ok(quote)
}

/// Drive a fresh wizard with the one-shot arguments.
///
/// The quality is split into family and karat the way the wizard asks for
/// them; a karat given for a family that has none is an error.
pub fn specify(wizard: &mut SpecificationResolver, args: &PriceArgs) -> Result<ResolvedSpecification> {
    let quality = MaterialQuality::parse(&args.quality);

    wizard.submit(&args.size.to_string())?;
    wizard.submit(&args.shape)?;
    wizard.submit(&quality.family)?;
    match (wizard.current_step(), quality.tier.as_deref()) {
        (Some(StepKind::QualityTier), tier) => {
            wizard.submit(tier.unwrap_or_default())?;
        }
        (_, Some(tier)) => bail!("{} is not sold by karat (got {tier})", quality.family),
        (_, None) => {}
    }
    wizard.submit(&args.width)?;
    wizard.submit(&args.thickness)?;
    let fee = args
        .base_fee
        .map(|fee| fee.to_string())
        .unwrap_or_else(|| DEFAULT_FEE.to_string());
    wizard.submit(&fee)?;

    Ok(wizard.resolved()?)
}

/// Print the values that may follow `prefix` in the catalog, or the SKU when
/// the prefix is a complete path.
pub fn options(app: &App, prefix: &[String], out: &mut impl Write) -> Result<()> {
    let catalog = &app.data.catalog;
    let path = prefix
        .iter()
        .map(|raw| AttributeValue::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    if path.len() > catalog.levels().len() || catalog.longest_matching_prefix(&path) < path.len() {
        let err = catalog
            .resolve(&path)
            .err()
            .context("catalog prefix should not resolve")?;
        bail!(display::domain_error(&err));
    }

    if path.len() == catalog.levels().len() {
        let entry = catalog.resolve(&path)?;
        writeln!(out, "{} (priced per {})", entry.sku, entry.basis)?;
        return Ok(());
    }

    writeln!(out, "{}:", catalog.levels()[path.len()])?;
    for value in catalog.options_at(&path) {
        writeln!(out, "  {value}")?;
    }
    Ok(())
}

/// Report what the loaded configuration and data look like.
pub fn check(app: &App, out: &mut impl Write) -> Result<()> {
    let config = &app.config;
    let data = &app.data;

    writeln!(out, "catalog     {} ({} products)", config.catalog_path.display(), data.catalog.len())?;
    writeln!(out, "sizes       {} ({} sizes)", config.size_table_path.display(), data.sizes.len())?;
    writeln!(out, "densities   {} qualities covered", data.densities.len())?;
    writeln!(
        out,
        "geometry    k={} seam={} in, rounding to {} in",
        config.geometry.k_factor, config.geometry.seam_allowance_in, config.geometry.round_up_increment_in
    )?;
    writeln!(
        out,
        "pricing     base fee {} (confirm past {}%), timeout {:?}",
        config.pricing.default_base_fee,
        config.pricing.fee_deviation_threshold_pct,
        config.pricing.fetch_timeout
    )?;
    match &config.stuller {
        Some(settings) => writeln!(out, "price api   {} as {}", settings.base_url, settings.username)?,
        None => writeln!(out, "price api   not configured; use --unit-price")?,
    }
    Ok(())
}
