//! Configuration types.

use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::wizard::inputs::{DEFAULT_RATIO, validate_ratio};

/// Wizard pacing and validation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    /// Typing delay before the first question, after the greeting.
    pub first_question_delay: Duration,
    /// Typing delay after a single-value answer (choice, date, range, ratio).
    pub answer_delay: Duration,
    /// Typing delay after a multi-select is confirmed.
    pub selection_delay: Duration,
    /// Longest trip the range picker accepts, in nights.
    pub max_nights: u32,
    /// Whether a multi-select step may be confirmed with nothing selected.
    pub allow_empty_selection: bool,
    /// Slider position before the user moves it.
    pub default_ratio: u8,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            first_question_delay: Duration::from_millis(1000),
            answer_delay: Duration::from_millis(300),
            selection_delay: Duration::from_millis(200),
            max_nights: 4,
            allow_empty_selection: true,
            default_ratio: DEFAULT_RATIO,
        }
    }
}

impl WizardConfig {
    /// Read overrides from `TASTETRIP_*` environment variables. Unset or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            first_question_delay: env_millis("TASTETRIP_FIRST_QUESTION_DELAY_MS")
                .unwrap_or(defaults.first_question_delay),
            answer_delay: env_millis("TASTETRIP_ANSWER_DELAY_MS").unwrap_or(defaults.answer_delay),
            selection_delay: env_millis("TASTETRIP_SELECTION_DELAY_MS")
                .unwrap_or(defaults.selection_delay),
            max_nights: env_parse("TASTETRIP_MAX_NIGHTS").unwrap_or(defaults.max_nights),
            allow_empty_selection: env_parse("TASTETRIP_ALLOW_EMPTY_SELECTION")
                .unwrap_or(defaults.allow_empty_selection),
            default_ratio: env_parse("TASTETRIP_DEFAULT_RATIO").unwrap_or(defaults.default_ratio),
        }
    }

    /// Config with every typing delay set to zero.
    pub fn instant() -> Self {
        Self {
            first_question_delay: Duration::ZERO,
            answer_delay: Duration::ZERO,
            selection_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// `from_env` followed by `validate`.
    pub fn load() -> Result<Self> {
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        validate_ratio(i64::from(self.default_ratio)).map_err(|e| ConfigError::InvalidValue {
            key: "default_ratio".to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_millis(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_millis)
}
