//! Error types for Tastetrip.

use crate::wizard::model::PreferenceKey;
use crate::wizard::registry::{Modality, QuestionKey};

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Hand-off error: {0}")]
    Handoff(#[from] HandoffError),

    #[error("Input error: {0}")]
    Cli(#[from] CliError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Question registry is empty")]
    EmptyRegistry,

    #[error("Summary question at index {index} is not the last step")]
    SummaryNotTerminal { index: usize },
}

/// Rejected wizard intents.
///
/// None of these are faults: the state is left untouched and the host is
/// expected to keep the affordance disabled or show an inline hint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Assistant is still typing")]
    Busy,

    #[error("Conversation is already at the final step")]
    AlreadyComplete,

    #[error("Step {step} asks for {expected}, not {got}")]
    KeyMismatch {
        step: usize,
        expected: QuestionKey,
        got: PreferenceKey,
    },

    #[error("Step {step} is a {actual:?} step, not {requested:?}")]
    WrongModality {
        step: usize,
        actual: Modality,
        requested: Modality,
    },

    #[error("Option {option:?} is not offered for {key}")]
    UnknownOption { key: PreferenceKey, option: String },

    #[error("Ratio {0} must be within 0..=100 in steps of 10")]
    InvalidRatio(i64),

    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Both start and end dates are required")]
    IncompleteRange,

    #[error("Trip of {nights} nights exceeds the {max} night limit")]
    RangeTooLong { nights: i64, max: u32 },

    #[error("Select at least one option for {0}")]
    EmptySelection(PreferenceKey),
}

/// Errors handing the collected preferences to the itinerary generator.
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("Conversation has not reached the final step")]
    Incomplete,

    #[error("Missing answer for {0}")]
    MissingAnswer(PreferenceKey),

    #[error("Itinerary generation failed: {0}")]
    Generator(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors turning typed terminal input into an intent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CliError {
    #[error("Nothing to answer right now")]
    NoInput,

    #[error("Unrecognized input {0:?}")]
    Unrecognized(String),

    #[error("Choice {index} is out of range (1..={max})")]
    ChoiceOutOfRange { index: usize, max: usize },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
