//! Read-only snapshot of the wizard for hosting views.

use chrono::NaiveDate;
use serde::Serialize;

use super::inputs::{max_stay_hint, ratio_label};
use super::model::{Preferences, Transcript};
use super::registry::Modality;
use super::state::WizardState;

/// Which input control the host should show for the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Affordance {
    /// Nothing to answer: the assistant is typing or the wizard is done.
    Hidden,
    DateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        nights: Option<i64>,
        can_confirm: bool,
        hint: String,
    },
    DatePicker,
    Choices {
        options: Vec<String>,
        selected: Option<String>,
    },
    MultiChoices {
        options: Vec<String>,
        selected: Vec<String>,
    },
    Slider {
        value: u8,
        label: String,
    },
}

impl Affordance {
    pub fn for_state(state: &WizardState) -> Self {
        if state.is_typing() {
            return Self::Hidden;
        }
        let Some(question) = state.current_question() else {
            return Self::Hidden;
        };
        let key = question.key.preference();
        let prefs = state.preferences();
        match (question.modality(), key) {
            (Modality::DateRange, _) => {
                let range = state.range();
                let max = state.config().max_nights;
                Self::DateRange {
                    start: range.start,
                    end: range.end,
                    nights: range.nights(),
                    can_confirm: range.can_confirm(max),
                    hint: max_stay_hint(max),
                }
            }
            (Modality::SingleDate, _) => Self::DatePicker,
            (Modality::SingleChoice, Some(key)) => Self::Choices {
                options: question.options.clone(),
                selected: prefs.text(key).map(String::from),
            },
            (Modality::MultiChoice, Some(key)) => Self::MultiChoices {
                options: question.options.clone(),
                selected: prefs.choices(key).to_vec(),
            },
            (Modality::Ratio, _) => {
                let value = state.ratio();
                Self::Slider {
                    value,
                    label: ratio_label(value),
                }
            }
            _ => Self::Hidden,
        }
    }
}

/// Everything a host needs to render one frame of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardSnapshot {
    pub step: usize,
    pub history: Vec<usize>,
    pub preferences: Preferences,
    pub transcript: Transcript,
    pub typing: bool,
    pub complete: bool,
    /// Back control is offered once there is somewhere to go back to.
    pub can_go_back: bool,
    pub affordance: Affordance,
}

impl WizardSnapshot {
    pub fn capture(state: &WizardState) -> Self {
        Self {
            step: state.current_step(),
            history: state.history().steps().to_vec(),
            preferences: state.preferences().clone(),
            transcript: state.transcript().clone(),
            typing: state.is_typing(),
            complete: state.is_complete(),
            can_go_back: state.history().can_go_back() && !state.is_typing(),
            affordance: Affordance::for_state(state),
        }
    }
}

impl WizardState {
    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot::capture(self)
    }
}
