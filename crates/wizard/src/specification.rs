use serde::Serialize;

use rust_decimal::Decimal;

use bangler_catalog::MaterialQuality;
use bangler_core::AttributeValue;

use crate::step::{Commit, StepKind, StepValue};

/// Where a wizard session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum WizardState {
    AwaitingStep(StepKind),
    Complete,
    Cancelled,
}

impl WizardState {
    pub fn awaiting(&self) -> Option<StepKind> {
        match self {
            WizardState::AwaitingStep(step) => Some(*step),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, WizardState::Cancelled)
    }
}

/// In-progress selections: a stack of commits plus the resulting cursor.
///
/// Owned by exactly one resolver session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Specification {
    commits: Vec<Commit>,
    state: WizardState,
}

impl Default for Specification {
    fn default() -> Self {
        Self {
            commits: Vec::new(),
            state: WizardState::AwaitingStep(StepKind::FIRST),
        }
    }
}

impl Specification {
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    /// Committed value for `step`. The outer `Option` is "not reached yet",
    /// the inner one the absence sentinel.
    pub fn value(&self, step: StepKind) -> Option<Option<&StepValue>> {
        self.commits
            .iter()
            .find(|c| c.step == step)
            .map(|c| c.value.as_ref())
    }

    pub(crate) fn push(&mut self, commit: Commit) {
        self.commits.push(commit);
        self.state = self.cursor();
    }

    pub(crate) fn pop(&mut self) -> Option<Commit> {
        let popped = self.commits.pop();
        self.state = self.cursor();
        popped
    }

    pub(crate) fn discard(&mut self) {
        self.commits.clear();
        self.state = WizardState::Cancelled;
    }

    fn cursor(&self) -> WizardState {
        match self.commits.last() {
            None => WizardState::AwaitingStep(StepKind::FIRST),
            Some(last) => match last.step.next() {
                Some(step) => WizardState::AwaitingStep(step),
                None => WizardState::Complete,
            },
        }
    }
}

/// A complete, catalog-valid selection ready for pricing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSpecification {
    pub size: u32,
    pub shape: AttributeValue,
    /// Catalog quality value (`"14K Yellow"`, `"Sterling Silver"`).
    pub quality: AttributeValue,
    pub width: AttributeValue,
    pub thickness: AttributeValue,
    /// Custom base fee; `None` means the configured default.
    pub base_fee: Option<Decimal>,
}

impl ResolvedSpecification {
    /// Catalog path in index level order.
    pub fn catalog_path(&self) -> Vec<AttributeValue> {
        vec![
            self.shape.clone(),
            self.quality.clone(),
            self.width.clone(),
            self.thickness.clone(),
        ]
    }

    pub fn material_quality(&self) -> MaterialQuality {
        MaterialQuality::parse(self.quality.label())
    }
}

impl core::fmt::Display for ResolvedSpecification {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "size {} / {} / {} / {} x {}",
            self.size,
            self.shape,
            self.quality,
            self.width,
            self.thickness
        )
    }
}
