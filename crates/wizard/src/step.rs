use serde::Serialize;

use rust_decimal::Decimal;

use bangler_core::AttributeValue;

/// Wizard steps, in the order they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Size,
    Shape,
    QualityFamily,
    QualityTier,
    Width,
    Thickness,
    BaseFee,
}

impl StepKind {
    pub const ALL: [StepKind; 7] = [
        StepKind::Size,
        StepKind::Shape,
        StepKind::QualityFamily,
        StepKind::QualityTier,
        StepKind::Width,
        StepKind::Thickness,
        StepKind::BaseFee,
    ];

    pub const FIRST: StepKind = StepKind::Size;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<StepKind> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Human-readable prompt label.
    pub fn label(self) -> &'static str {
        match self {
            StepKind::Size => "size",
            StepKind::Shape => "shape",
            StepKind::QualityFamily => "metal",
            StepKind::QualityTier => "karat",
            StepKind::Width => "width",
            StepKind::Thickness => "thickness",
            StepKind::BaseFee => "base fee",
        }
    }
}

impl core::fmt::Display for StepKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed value committed for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepValue {
    Size(u32),
    Attribute(AttributeValue),
    Text(String),
    Fee(Decimal),
}

impl core::fmt::Display for StepValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StepValue::Size(size) => write!(f, "{size}"),
            StepValue::Attribute(value) => f.write_str(value.label()),
            StepValue::Text(text) => f.write_str(text),
            StepValue::Fee(fee) => write!(f, "{fee}"),
        }
    }
}

/// One entry on the commit stack.
///
/// `value` is `None` for the absence sentinel: a tier step skipped for a
/// tier-less metal, or a base fee left at the default. `automatic` marks
/// commits the wizard made on its own; `back()` pops them together with the
/// user commit beneath.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commit {
    pub step: StepKind,
    pub value: Option<StepValue>,
    pub automatic: bool,
}

impl Commit {
    pub fn chosen(step: StepKind, value: StepValue) -> Self {
        Self {
            step,
            value: Some(value),
            automatic: false,
        }
    }

    pub fn skipped(step: StepKind) -> Self {
        Self {
            step,
            value: None,
            automatic: true,
        }
    }
}
