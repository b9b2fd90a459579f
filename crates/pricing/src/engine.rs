//! Pricing pipeline.
//!
//! ```text
//! size ─▶ circumference ─┐
//! catalog path ─▶ SKU + basis ─┐
//! quality ─▶ density ──────────┴▶ MaterialCalculation ─▶ fetch unit price ─▶ PriceQuote
//! ```
//!
//! Everything before the fetch is local and deterministic. The fetch is the
//! only step that can fail transiently; it is bounded by a timeout, can be
//! cancelled by the caller, and is never retried here. Nothing computed for a
//! failed request is kept, so re-invoking with the same specification is
//! always safe.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use bangler_catalog::{CatalogEntry, CatalogIndex, PriceBasis, SizeTable};
use bangler_core::{AttributeValue, DomainError, DomainResult, Measurement, Sku};
use bangler_geometry::{DensityTable, GeometryCalculator, GeometryConfig, MaterialCalculation};
use bangler_wizard::ResolvedSpecification;

use crate::config::PricingConfig;
use crate::quote::{BaseFee, FeeDeviation, PriceQuote};
use crate::source::{FetchError, UnitPrice, UnitPriceSource};

const WEIGHT_DP: u32 = 4;
const MONEY_DP: u32 = 2;

/// Catalog entry and material needed for one specification, before pricing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMaterial {
    pub entry: CatalogEntry,
    pub calculation: MaterialCalculation,
}

/// Orchestrates catalog lookup, geometry and the unit-price fetch.
///
/// Holds only shared, read-only data; one engine serves any number of
/// concurrent requests.
pub struct PricingEngine {
    catalog: Arc<CatalogIndex>,
    sizes: Arc<SizeTable>,
    densities: Arc<DensityTable>,
    geometry: GeometryCalculator,
    config: PricingConfig,
    source: Arc<dyn UnitPriceSource>,
}

impl PricingEngine {
    pub fn new(
        catalog: Arc<CatalogIndex>,
        sizes: Arc<SizeTable>,
        densities: Arc<DensityTable>,
        geometry: GeometryConfig,
        config: PricingConfig,
        source: Arc<dyn UnitPriceSource>,
    ) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            sizes,
            densities,
            geometry: GeometryCalculator::new(geometry)?,
            config,
            source,
        })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Steps 1-3: size, catalog entry and material calculation.
    pub fn resolve_material(&self, spec: &ResolvedSpecification) -> DomainResult<ResolvedMaterial> {
        let circumference = self.sizes.circumference(spec.size)?;
        let entry = self.catalog.resolve(&spec.catalog_path())?.clone();

        let width = measurement(&spec.width, "width")?;
        let thickness = measurement(&spec.thickness, "thickness")?;
        let density = self.densities.resolve(&spec.material_quality())?;

        let calculation = self
            .geometry
            .calculate(circumference, width, thickness, density)?;
        Ok(ResolvedMaterial { entry, calculation })
    }

    /// Price a complete specification.
    ///
    /// `custom_fee` overrides the fee carried on the specification.
    pub async fn price_specification(
        &self,
        spec: &ResolvedSpecification,
        custom_fee: Option<Decimal>,
    ) -> DomainResult<PriceQuote> {
        self.price_specification_until(spec, custom_fee, std::future::pending())
            .await
    }

    /// Like [`price_specification`](Self::price_specification), aborting the
    /// fetch with [`DomainError::Cancelled`] as soon as `cancel` completes.
    #[instrument(skip_all, fields(size = spec.size, shape = %spec.shape, quality = %spec.quality))]
    pub async fn price_specification_until<C>(
        &self,
        spec: &ResolvedSpecification,
        custom_fee: Option<Decimal>,
        cancel: C,
    ) -> DomainResult<PriceQuote>
    where
        C: Future<Output = ()>,
    {
        let material = self.resolve_material(spec)?;
        let unit_price = self.fetch_unit_price(&material.entry.sku, cancel).await?;
        let quote = self.assemble(spec, material, unit_price, custom_fee.or(spec.base_fee))?;

        info!(
            quote_id = %quote.quote_id,
            sku = %quote.sku,
            weight = %quote.weight,
            unit_price = %quote.unit_price,
            total = %quote.total,
            needs_confirmation = quote.needs_confirmation,
            "specification priced"
        );
        Ok(quote)
    }

    async fn fetch_unit_price<C>(&self, sku: &Sku, cancel: C) -> DomainResult<UnitPrice>
    where
        C: Future<Output = ()>,
    {
        let timeout = self.config.fetch_timeout;
        let fetch = tokio::time::timeout(timeout, self.source.fetch_unit_price(sku));
        debug!(%sku, source = self.source.name(), "fetching unit price");

        let outcome = tokio::select! {
            biased;
            _ = cancel => {
                warn!(%sku, "unit price fetch cancelled");
                return Err(DomainError::Cancelled);
            }
            outcome = fetch => outcome,
        };

        let price = match outcome {
            Ok(Ok(price)) => price,
            Ok(Err(err)) => {
                warn!(%sku, error = %err, "unit price fetch failed");
                return Err(err.into());
            }
            Err(_) => {
                warn!(%sku, ?timeout, "unit price fetch timed out");
                return Err(FetchError::Timeout(timeout).into());
            }
        };

        if price.amount <= Decimal::ZERO {
            warn!(%sku, amount = %price.amount, "non-positive unit price");
            return Err(DomainError::transient(format!(
                "price service returned a non-positive price ({}) for {sku}",
                price.amount
            )));
        }
        Ok(price)
    }

    fn assemble(
        &self,
        spec: &ResolvedSpecification,
        material: ResolvedMaterial,
        unit_price: UnitPrice,
        custom_fee: Option<Decimal>,
    ) -> DomainResult<PriceQuote> {
        let ResolvedMaterial { entry, calculation } = material;

        let weight = to_decimal(calculation.weight, "weight")?.round_dp(WEIGHT_DP);
        let billed_quantity = match entry.basis {
            PriceBasis::Pennyweight => weight,
            PriceBasis::Gram => to_decimal(calculation.weight_grams(), "weight")?.round_dp(WEIGHT_DP),
            PriceBasis::Inch => to_decimal(calculation.rounded_length_in, "length")?,
            PriceBasis::Each => Decimal::ONE,
        };
        let material_cost = billed_quantity
            .checked_mul(unit_price.amount)
            .ok_or_else(|| {
                DomainError::transient(format!(
                    "unit price {} for {} is out of range",
                    unit_price.amount, entry.sku
                ))
            })?
            .round_dp(MONEY_DP);

        let base_fee = self.base_fee(custom_fee)?;
        let needs_confirmation = base_fee
            .deviation
            .is_some_and(|d| d.percent.abs() > self.config.fee_deviation_threshold_pct);
        let total = material_cost
            .checked_add(base_fee.applied)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "base fee {} is out of range for this quote",
                    base_fee.applied
                ))
            })?
            .round_dp(MONEY_DP);

        Ok(PriceQuote {
            quote_id: Uuid::now_v7(),
            priced_at: Utc::now(),
            specification: spec.clone(),
            sku: entry.sku,
            basis: entry.basis,
            unit_price: unit_price.amount,
            currency: unit_price.currency,
            billed_quantity,
            weight,
            material: calculation,
            material_cost,
            base_fee,
            total,
            needs_confirmation,
        })
    }

    fn base_fee(&self, custom: Option<Decimal>) -> DomainResult<BaseFee> {
        let default = self.config.default_base_fee;
        let fee = match custom {
            Some(fee) if fee > Decimal::ZERO => {
                let out_of_range =
                    || DomainError::validation(format!("base fee {fee} is out of range"));
                let delta = fee.checked_sub(default).ok_or_else(out_of_range)?;
                let percent = delta
                    .checked_div(default)
                    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                    .ok_or_else(out_of_range)?
                    .round_dp(MONEY_DP);
                BaseFee {
                    applied: fee,
                    default,
                    is_custom: true,
                    rejected_custom: None,
                    deviation: Some(FeeDeviation { delta, percent }),
                }
            }
            Some(fee) => {
                warn!(%fee, %default, "custom base fee must be > 0; using default");
                BaseFee {
                    applied: default,
                    default,
                    is_custom: false,
                    rejected_custom: Some(fee),
                    deviation: None,
                }
            }
            None => BaseFee {
                applied: default,
                default,
                is_custom: false,
                rejected_custom: None,
                deviation: None,
            },
        };
        Ok(fee)
    }
}

fn measurement(value: &AttributeValue, what: &str) -> DomainResult<Measurement> {
    value.measurement().ok_or_else(|| {
        DomainError::configuration(format!(
            "catalog {what} {:?} has no recognisable length unit",
            value.label()
        ))
    })
}

fn to_decimal(value: f64, what: &str) -> DomainResult<Decimal> {
    Decimal::try_from(value)
        .map_err(|_| DomainError::validation(format!("{what} {value} cannot be priced")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use bangler_catalog::{CatalogRecord, schema};

    /// Replays scripted responses, then repeats the last one.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<UnitPrice, FetchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<UnitPrice, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UnitPriceSource for ScriptedSource {
        async fn fetch_unit_price(&self, _sku: &Sku) -> Result<UnitPrice, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop_front().unwrap()
            } else {
                responses.front().cloned().unwrap()
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    struct StalledSource;

    #[async_trait]
    impl UnitPriceSource for StalledSource {
        async fn fetch_unit_price(&self, _sku: &Sku) -> Result<UnitPrice, FetchError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(UnitPrice::usd(Decimal::ONE))
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    fn price(amount: &str) -> Result<UnitPrice, FetchError> {
        Ok(UnitPrice::usd(amount.parse().unwrap()))
    }

    fn catalog() -> Arc<CatalogIndex> {
        let rows = [
            ["Flat", "14K Yellow", "6.5 Mm", "1.5 Mm", "FL-14Y", "DWT"],
            ["Flat", "Sterling Silver", "6.5 Mm", "1.5 Mm", "FL-SS", "GRAM"],
            ["Flat", "Platinum", "6.5 Mm", "1.5 Mm", "FL-PT", "DWT"],
            ["Flat", "10K Yellow", "6.5 Mm", "1.5 Mm", "FL-10Y", "INCH"],
        ];
        let records = rows
            .iter()
            .map(|r| CatalogRecord::new([r[0], r[1], r[2], r[3]], r[4], r[5]));
        Arc::new(CatalogIndex::build(schema::LEVELS, records).unwrap())
    }

    fn engine_with(source: Arc<dyn UnitPriceSource>, config: PricingConfig) -> PricingEngine {
        let sizes = SizeTable::from_entries([(19, 63.0), (20, 68.24)]).unwrap();
        PricingEngine::new(
            catalog(),
            Arc::new(sizes),
            Arc::new(DensityTable::standard()),
            GeometryConfig::default(),
            config,
            source,
        )
        .unwrap()
    }

    fn engine(source: Arc<dyn UnitPriceSource>) -> PricingEngine {
        engine_with(source, PricingConfig::default())
    }

    fn attr(s: &str) -> AttributeValue {
        AttributeValue::parse(s).unwrap()
    }

    fn spec(size: u32, quality: &str) -> ResolvedSpecification {
        ResolvedSpecification {
            size,
            shape: attr("Flat"),
            quality: attr(quality),
            width: attr("6.5 Mm"),
            thickness: attr("1.5 Mm"),
            base_fee: None,
        }
    }

    #[tokio::test]
    async fn prices_gold_by_pennyweight() {
        let source = ScriptedSource::new(vec![price("118.03")]);
        let quote = engine(source)
            .price_specification(&spec(20, "14K Yellow"), None)
            .await
            .unwrap();

        assert_eq!(quote.sku.as_str(), "FL-14Y");
        assert_eq!(quote.basis, PriceBasis::Pennyweight);
        assert_eq!(quote.material.rounded_length_in, 3.0);
        assert_eq!(quote.material.density.grams_per_cm3, 13.3);
        assert_eq!(quote.weight, quote.billed_quantity);
        assert!((quote.weight - Decimal::new(63537, 4)).abs() < Decimal::new(10, 4));
        assert!((quote.material_cost - Decimal::from(750)).abs() < Decimal::ONE);
        assert_eq!(quote.base_fee.applied, Decimal::new(47500, 2));
        assert_eq!(quote.total, quote.material_cost + Decimal::new(47500, 2));
        assert!(!quote.needs_confirmation);
        assert_eq!(quote.currency, "USD");
    }

    #[tokio::test]
    async fn gram_and_inch_bases_bill_their_own_quantity() {
        let source = ScriptedSource::new(vec![price("2.00")]);
        let engine = engine(source);

        let silver = engine
            .price_specification(&spec(20, "Sterling Silver"), None)
            .await
            .unwrap();
        let grams = Decimal::try_from(silver.material.weight_grams()).unwrap().round_dp(4);
        assert_eq!(silver.billed_quantity, grams);
        assert_eq!(silver.material_cost, (grams * Decimal::TWO).round_dp(2));

        let by_length = engine
            .price_specification(&spec(20, "10K Yellow"), None)
            .await
            .unwrap();
        assert_eq!(by_length.billed_quantity, Decimal::from(3));
        assert_eq!(by_length.material_cost, Decimal::new(600, 2));
    }

    #[tokio::test]
    async fn transient_failure_then_retry_succeeds() {
        let source = ScriptedSource::new(vec![
            Err(FetchError::Http("connection reset".into())),
            price("118.03"),
        ]);
        let engine = engine(source.clone());
        let spec = spec(20, "14K Yellow");
        let before = spec.clone();

        let err = engine.price_specification(&spec, None).await.unwrap_err();
        assert!(err.is_retryable(), "got {err:?}");
        assert_eq!(spec, before);

        let quote = engine.price_specification(&spec, None).await.unwrap();
        assert_eq!(quote.sku.as_str(), "FL-14Y");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn local_failures_never_reach_the_price_service() {
        let source = ScriptedSource::new(vec![price("1")]);
        let engine = engine(source.clone());

        let err = engine
            .price_specification(&spec(42, "14K Yellow"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let mut unknown = spec(20, "14K Yellow");
        unknown.width = attr("9 Mm");
        let err = engine.price_specification(&unknown, None).await.unwrap_err();
        assert_eq!(err.alternatives(), ["6.5 Mm"]);

        let err = engine
            .price_specification(&spec(20, "Platinum"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));

        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn cancel_aborts_the_fetch() {
        let engine = engine(Arc::new(StalledSource));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let cancel = async {
            let _ = rx.await;
        };
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
        });

        let err = engine
            .price_specification_until(&spec(20, "14K Yellow"), None, cancel)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Cancelled);
    }

    #[tokio::test]
    async fn slow_fetch_times_out_as_transient() {
        let config = PricingConfig {
            fetch_timeout: Duration::from_millis(20),
            ..PricingConfig::default()
        };
        let engine = engine_with(Arc::new(StalledSource), config);
        let err = engine
            .price_specification(&spec(20, "14K Yellow"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Transient(msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn non_positive_price_is_transient() {
        let engine = engine(ScriptedSource::new(vec![price("0")]));
        let err = engine
            .price_specification(&spec(20, "14K Yellow"), None)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn large_fee_deviation_needs_confirmation() {
        let engine = engine(ScriptedSource::new(vec![price("118.03")]));
        let quote = engine
            .price_specification(&spec(20, "14K Yellow"), Some(Decimal::from(600)))
            .await
            .unwrap();

        let deviation = quote.deviation().unwrap();
        assert_eq!(deviation.delta, Decimal::from(125));
        assert_eq!(deviation.percent, Decimal::new(2632, 2));
        assert!(quote.needs_confirmation);
        assert_eq!(quote.total, quote.material_cost + Decimal::from(600));
    }

    #[tokio::test]
    async fn small_fee_deviation_is_accepted() {
        let engine = engine(ScriptedSource::new(vec![price("118.03")]));
        let mut spec = spec(20, "14K Yellow");
        spec.base_fee = Some(Decimal::from(500));

        let quote = engine.price_specification(&spec, None).await.unwrap();
        assert!(quote.base_fee.is_custom);
        assert!(!quote.needs_confirmation);
        assert_eq!(quote.deviation().unwrap().percent, Decimal::new(526, 2));
    }

    #[tokio::test]
    async fn fee_exactly_at_threshold_is_accepted() {
        let engine = engine(ScriptedSource::new(vec![price("118.03")]));
        let quote = engine
            .price_specification(&spec(20, "14K Yellow"), Some(Decimal::from(570)))
            .await
            .unwrap();

        assert_eq!(quote.deviation().unwrap().percent, Decimal::from(20));
        assert!(!quote.needs_confirmation);
    }

    #[tokio::test]
    async fn oversized_custom_fee_is_a_validation_error() {
        let engine = engine(ScriptedSource::new(vec![price("118.03")]));
        let err = engine
            .price_specification(&spec(20, "14K Yellow"), Some(Decimal::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("out of range")));
    }

    #[tokio::test]
    async fn oversized_unit_price_is_transient() {
        let huge = Ok(UnitPrice::usd(Decimal::MAX / Decimal::TWO));
        let engine = engine(ScriptedSource::new(vec![huge]));
        let err = engine
            .price_specification(&spec(20, "14K Yellow"), None)
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "got {err:?}");
    }

    #[tokio::test]
    async fn invalid_custom_fee_falls_back_to_default() {
        let engine = engine(ScriptedSource::new(vec![price("118.03")]));
        let quote = engine
            .price_specification(&spec(20, "14K Yellow"), Some(Decimal::from(-10)))
            .await
            .unwrap();
        assert_eq!(quote.base_fee.applied, Decimal::new(47500, 2));
        assert_eq!(quote.base_fee.rejected_custom, Some(Decimal::from(-10)));
        assert!(quote.deviation().is_none());
        assert!(!quote.needs_confirmation);
    }

    #[tokio::test]
    async fn quote_serializes_with_density_used() {
        let engine = engine(ScriptedSource::new(vec![price("118.03")]));
        let quote = engine
            .price_specification(&spec(20, "14K Yellow"), None)
            .await
            .unwrap();
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["sku"], "FL-14Y");
        assert_eq!(json["material"]["density"]["key"], "14K");
        assert_eq!(json["specification"]["quality"], "14K Yellow");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn quote_for(fee: Option<Decimal>) -> PriceQuote {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let engine = engine(ScriptedSource::new(vec![price("118.03")]));
            runtime
                .block_on(engine.price_specification(&spec(20, "14K Yellow"), fee))
                .unwrap()
        }

        proptest! {
            /// Property: the total is the material cost plus the applied fee.
            #[test]
            fn total_is_material_plus_fee(cents in 1i64..10_000_000) {
                let quote = quote_for(Some(Decimal::new(cents, 2)));
                prop_assert_eq!(quote.total, quote.material_cost + quote.base_fee.applied);
                prop_assert_eq!(quote.base_fee.applied, Decimal::new(cents, 2));
            }

            /// Property: confirmation is needed exactly when the deviation
            /// exceeds the threshold.
            #[test]
            fn confirmation_tracks_threshold(cents in 1i64..200_000) {
                let quote = quote_for(Some(Decimal::new(cents, 2)));
                let percent = quote.deviation().unwrap().percent;
                prop_assert_eq!(quote.needs_confirmation, percent.abs() > Decimal::from(20));
            }
        }
    }
}
