use thiserror::Error;

use crate::step::StepKind;

/// Why the wizard refused a transition.
///
/// None of these change session state: the caller re-prompts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// The submitted value is not among the step's current options.
    #[error("{value:?} is not a valid {step}; choose one of: {}", options.join(", "))]
    Rejected {
        step: StepKind,
        value: String,
        options: Vec<String>,
    },

    #[error("already at the first step")]
    NothingToUndo,

    #[error("the specification is complete; go back to change it")]
    AlreadyComplete,

    #[error("the session was cancelled")]
    SessionClosed,

    #[error("the specification is incomplete; {step} is still required")]
    Incomplete { step: StepKind },
}

impl WizardError {
    /// Options to offer again, when the error was a rejection.
    pub fn options(&self) -> &[String] {
        match self {
            Self::Rejected { options, .. } => options,
            _ => &[],
        }
    }
}
