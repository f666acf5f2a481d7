use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong while turning a sheet and a selection into a roll.
///
/// None of these are fatal; each one is scoped to a single roll attempt.
#[derive(Debug, Error)]
pub enum RollError {
    #[error("invalid {field}: {value:?}")]
    InvalidInput { field: &'static str, value: String },
    #[error("vice pool needs attribute '{0}', which is not on the sheet")]
    MissingAxisAttribute(String),
    #[error(transparent)]
    EvaluatorFailure(#[from] EvaluatorError),
    #[error("malformed character sheet: {0}")]
    Sheet(#[from] serde_json::Error),
    #[error("ruleset config: {0}")]
    Config(String),
}

impl RollError {
    pub(crate) fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        RollError::InvalidInput {
            field,
            value: value.into(),
        }
    }
}

/// Failures reported by a roll evaluator.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("roll evaluator rejected the roll: {0}")]
    Rejected(String),
    #[error("roll evaluator did not finish within {0:?}")]
    TimedOut(Duration),
}
