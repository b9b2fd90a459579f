//! Guided attribute resolution.
//!
//! A [`SpecificationResolver`] walks one session through the fixed step
//! sequence (size, shape, metal, karat, width, thickness, base fee). Each
//! step's options are computed from the commits so far, so every value the
//! wizard offers extends to at least one complete catalog path.
//!
//! The session is an [`Aggregate`]: `handle` decides which commits or
//! reverts a command produces, `apply` pushes or pops the commit stack.
//! `back()` is therefore a plain pop and never re-derives earlier state.

use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use bangler_catalog::{CatalogIndex, MaterialQuality, SizeTable};
use bangler_core::{Aggregate, AttributeValue};

use crate::error::WizardError;
use crate::specification::{ResolvedSpecification, Specification, WizardState};
use crate::step::{Commit, StepKind, StepValue};

/// Keyword that keeps the configured default base fee.
pub const DEFAULT_FEE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardCommand {
    Submit(String),
    Back,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    StepCommitted(Commit),
    StepReverted(StepKind),
    SessionCancelled,
}

/// One wizard session over shared, read-only catalog data.
#[derive(Debug, Clone)]
pub struct SpecificationResolver {
    catalog: Arc<CatalogIndex>,
    sizes: Arc<SizeTable>,
    spec: Specification,
    version: u64,
}

impl SpecificationResolver {
    pub fn new(catalog: Arc<CatalogIndex>, sizes: Arc<SizeTable>) -> Self {
        Self {
            catalog,
            sizes,
            spec: Specification::default(),
            version: 0,
        }
    }

    pub fn state(&self) -> WizardState {
        self.spec.state()
    }

    pub fn current_step(&self) -> Option<StepKind> {
        self.state().awaiting()
    }

    pub fn specification(&self) -> &Specification {
        &self.spec
    }

    /// Valid inputs for the current step, in display order.
    ///
    /// Empty once the session is complete or cancelled. The base-fee step is
    /// free-form and lists only the [`DEFAULT_FEE`] keyword.
    pub fn options(&self) -> Vec<String> {
        match self.current_step() {
            Some(step) => self.option_labels(step),
            None => Vec::new(),
        }
    }

    /// Commit `input` for the current step.
    pub fn submit(&mut self, input: &str) -> Result<WizardState, WizardError> {
        self.execute(&WizardCommand::Submit(input.to_string()))?;
        Ok(self.state())
    }

    /// Undo the most recent user commit.
    pub fn back(&mut self) -> Result<WizardState, WizardError> {
        self.execute(&WizardCommand::Back)?;
        Ok(self.state())
    }

    /// Abandon the session. Cancelling twice is harmless.
    pub fn cancel(&mut self) -> WizardState {
        if let Err(err) = self.execute(&WizardCommand::Cancel) {
            debug!(error = %err, "cancel ignored");
        }
        self.state()
    }

    /// The finished selection, ready for pricing.
    pub fn resolved(&self) -> Result<ResolvedSpecification, WizardError> {
        match self.state() {
            WizardState::Cancelled => return Err(WizardError::SessionClosed),
            WizardState::AwaitingStep(step) => return Err(WizardError::Incomplete { step }),
            WizardState::Complete => {}
        }

        let missing = |step| WizardError::Incomplete { step };
        let base_fee = match self.spec.value(StepKind::BaseFee) {
            Some(Some(StepValue::Fee(fee))) => Some(*fee),
            Some(_) => None,
            None => return Err(missing(StepKind::BaseFee)),
        };

        Ok(ResolvedSpecification {
            size: self.size().ok_or_else(|| missing(StepKind::Size))?,
            shape: self
                .attribute(StepKind::Shape)
                .cloned()
                .ok_or_else(|| missing(StepKind::Shape))?,
            quality: self
                .quality_value()
                .ok_or_else(|| missing(StepKind::QualityFamily))?,
            width: self
                .attribute(StepKind::Width)
                .cloned()
                .ok_or_else(|| missing(StepKind::Width))?,
            thickness: self
                .attribute(StepKind::Thickness)
                .cloned()
                .ok_or_else(|| missing(StepKind::Thickness))?,
            base_fee,
        })
    }

    fn size(&self) -> Option<u32> {
        match self.spec.value(StepKind::Size) {
            Some(Some(StepValue::Size(size))) => Some(*size),
            _ => None,
        }
    }

    fn attribute(&self, step: StepKind) -> Option<&AttributeValue> {
        match self.spec.value(step) {
            Some(Some(StepValue::Attribute(value))) => Some(value),
            _ => None,
        }
    }

    fn text(&self, step: StepKind) -> Option<&str> {
        match self.spec.value(step) {
            Some(Some(StepValue::Text(text))) => Some(text),
            _ => None,
        }
    }

    /// Catalog qualities available under the committed shape, split into
    /// tier and family.
    fn shape_qualities(&self) -> Vec<(AttributeValue, MaterialQuality)> {
        let Some(shape) = self.attribute(StepKind::Shape) else {
            return Vec::new();
        };
        self.catalog
            .options_at(std::slice::from_ref(shape))
            .into_iter()
            .map(|value| {
                let quality = MaterialQuality::parse(value.label());
                (value, quality)
            })
            .collect()
    }

    fn family_is_tierless(&self, family: &str) -> bool {
        self.shape_qualities()
            .iter()
            .filter(|(_, q)| q.family == family)
            .all(|(_, q)| q.is_tierless())
    }

    /// Catalog quality value for the committed family and tier.
    fn quality_value(&self) -> Option<AttributeValue> {
        let family = self.text(StepKind::QualityFamily)?;
        let tier = match self.spec.value(StepKind::QualityTier)? {
            Some(StepValue::Text(tier)) => Some(tier.as_str()),
            Some(_) => return None,
            None => None,
        };
        self.shape_qualities()
            .into_iter()
            .find(|(_, q)| q.family == family && q.tier.as_deref() == tier)
            .map(|(value, _)| value)
    }

    fn catalog_prefix(&self, depth: usize) -> Option<Vec<AttributeValue>> {
        let mut prefix = Vec::with_capacity(depth);
        if depth >= 1 {
            prefix.push(self.attribute(StepKind::Shape)?.clone());
        }
        if depth >= 2 {
            prefix.push(self.quality_value()?);
        }
        if depth >= 3 {
            prefix.push(self.attribute(StepKind::Width)?.clone());
        }
        Some(prefix)
    }

    fn catalog_options(&self, depth: usize) -> Vec<StepValue> {
        self.catalog_prefix(depth)
            .map(|prefix| {
                self.catalog
                    .options_at(&prefix)
                    .into_iter()
                    .map(StepValue::Attribute)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Typed candidates for a selection step.
    fn candidates(&self, step: StepKind) -> Vec<StepValue> {
        match step {
            StepKind::Size => self.sizes.sizes().into_iter().map(StepValue::Size).collect(),
            StepKind::Shape => self.catalog_options(0),
            StepKind::QualityFamily => self
                .shape_qualities()
                .into_iter()
                .map(|(_, q)| q.family)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(StepValue::Text)
                .collect(),
            StepKind::QualityTier => {
                let Some(family) = self.text(StepKind::QualityFamily) else {
                    return Vec::new();
                };
                let mut tiers: Vec<String> = self
                    .shape_qualities()
                    .into_iter()
                    .filter(|(_, q)| q.family == family)
                    .filter_map(|(_, q)| q.tier)
                    .collect();
                tiers.sort_by_key(|tier| (karat(tier), tier.clone()));
                tiers.dedup();
                tiers.into_iter().map(StepValue::Text).collect()
            }
            StepKind::Width => self.catalog_options(2),
            StepKind::Thickness => self.catalog_options(3),
            StepKind::BaseFee => Vec::new(),
        }
    }

    fn option_labels(&self, step: StepKind) -> Vec<String> {
        match step {
            StepKind::BaseFee => vec![DEFAULT_FEE.to_string()],
            _ => self
                .candidates(step)
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    fn rejected(&self, step: StepKind, input: &str) -> WizardError {
        WizardError::Rejected {
            step,
            value: input.trim().to_string(),
            options: self.option_labels(step),
        }
    }

    fn handle_submit(&self, input: &str) -> Result<Vec<WizardEvent>, WizardError> {
        let step = match self.state() {
            WizardState::AwaitingStep(step) => step,
            WizardState::Complete => return Err(WizardError::AlreadyComplete),
            WizardState::Cancelled => return Err(WizardError::SessionClosed),
        };

        if step == StepKind::BaseFee {
            let commit = parse_fee(input).ok_or_else(|| self.rejected(step, input))?;
            return Ok(vec![WizardEvent::StepCommitted(commit)]);
        }

        let value = self
            .candidates(step)
            .into_iter()
            .find(|candidate| input_matches(input, candidate))
            .ok_or_else(|| self.rejected(step, input))?;

        let mut events = Vec::with_capacity(2);
        if let (StepKind::QualityFamily, StepValue::Text(family)) = (step, &value) {
            let skip_tier = self.family_is_tierless(family);
            events.push(WizardEvent::StepCommitted(Commit::chosen(step, value.clone())));
            if skip_tier {
                events.push(WizardEvent::StepCommitted(Commit::skipped(StepKind::QualityTier)));
            }
        } else {
            events.push(WizardEvent::StepCommitted(Commit::chosen(step, value)));
        }
        Ok(events)
    }

    fn handle_back(&self) -> Result<Vec<WizardEvent>, WizardError> {
        if !self.state().is_open() {
            return Err(WizardError::SessionClosed);
        }
        let mut events = Vec::new();
        for commit in self.spec.commits().iter().rev() {
            events.push(WizardEvent::StepReverted(commit.step));
            if !commit.automatic {
                return Ok(events);
            }
        }
        Err(WizardError::NothingToUndo)
    }

    fn handle_cancel(&self) -> Result<Vec<WizardEvent>, WizardError> {
        if self.state().is_open() {
            Ok(vec![WizardEvent::SessionCancelled])
        } else {
            Ok(Vec::new())
        }
    }
}

impl Aggregate for SpecificationResolver {
    type Command = WizardCommand;
    type Event = WizardEvent;
    type Error = WizardError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            WizardEvent::StepCommitted(commit) => {
                debug!(step = %commit.step, value = ?commit.value, automatic = commit.automatic, "step committed");
                self.spec.push(commit.clone());
            }
            WizardEvent::StepReverted(step) => {
                debug!(step = %step, "step reverted");
                self.spec.pop();
            }
            WizardEvent::SessionCancelled => {
                debug!("wizard session cancelled");
                self.spec.discard();
            }
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            WizardCommand::Submit(input) => self.handle_submit(input),
            WizardCommand::Back => self.handle_back(),
            WizardCommand::Cancel => self.handle_cancel(),
        }
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn input_matches(input: &str, candidate: &StepValue) -> bool {
    let input = input.trim();
    match candidate {
        StepValue::Size(size) => input.parse::<u32>().is_ok_and(|n| n == *size),
        StepValue::Attribute(value) => {
            input.eq_ignore_ascii_case(value.label())
                || AttributeValue::parse(input).is_ok_and(|parsed| parsed == *value)
        }
        StepValue::Text(text) => {
            input.eq_ignore_ascii_case(text)
                || (!input.is_empty()
                    && input.chars().all(|c| c.is_ascii_digit())
                    && text.eq_ignore_ascii_case(&format!("{input}K")))
        }
        StepValue::Fee(fee) => parse_fee(input).and_then(|c| c.value) == Some(StepValue::Fee(*fee)),
    }
}

/// `""` or [`DEFAULT_FEE`] keep the default; otherwise a positive amount,
/// optionally prefixed with `$`.
fn parse_fee(input: &str) -> Option<Commit> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case(DEFAULT_FEE) {
        return Some(Commit {
            step: StepKind::BaseFee,
            value: None,
            automatic: false,
        });
    }
    let amount: Decimal = input.trim_start_matches('$').trim().parse().ok()?;
    (amount > Decimal::ZERO).then(|| Commit::chosen(StepKind::BaseFee, StepValue::Fee(amount)))
}

fn karat(tier: &str) -> u32 {
    tier.trim_end_matches(['K', 'k']).parse().unwrap_or(u32::MAX)
}
