//! Preference and transcript data models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The answer slots collected by the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceKey {
    Duration,
    Date,
    Purpose,
    Budget,
    Transportation,
    Ratio,
    SpotTypes,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 7] = [
        Self::Duration,
        Self::Date,
        Self::Purpose,
        Self::Budget,
        Self::Transportation,
        Self::Ratio,
        Self::SpotTypes,
    ];

    /// Whether answers for this key are a set of options rather than a single value.
    pub fn is_multi_select(&self) -> bool {
        matches!(self, Self::Purpose | Self::SpotTypes)
    }
}

impl std::fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Duration => "duration",
            Self::Date => "date",
            Self::Purpose => "purpose",
            Self::Budget => "budget",
            Self::Transportation => "transportation",
            Self::Ratio => "ratio",
            Self::SpotTypes => "spotTypes",
        };
        write!(f, "{s}")
    }
}

/// A collected (or staged) answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    /// Raw slider position, only present while the ratio step is being edited.
    Ratio(u8),
    Text(String),
    /// Multi-select membership. Order is kept for display only.
    Choices(Vec<String>),
}

impl PreferenceValue {
    /// Text shown in the user's chat bubble when this value is confirmed.
    pub fn display(&self) -> String {
        match self {
            Self::Ratio(ratio) => ratio.to_string(),
            Self::Text(text) => text.clone(),
            Self::Choices(choices) if choices.is_empty() => EMPTY_SELECTION_LABEL.to_string(),
            Self::Choices(choices) => choices.join(", "),
        }
    }
}

/// Bubble text for a multi-select confirmed with nothing selected.
pub const EMPTY_SELECTION_LABEL: &str = "선택 안 함";

/// The preference store, keyed by question slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences(BTreeMap<PreferenceKey, PreferenceValue>);

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: PreferenceKey) -> Option<&PreferenceValue> {
        self.0.get(&key)
    }

    pub fn text(&self, key: PreferenceKey) -> Option<&str> {
        match self.0.get(&key) {
            Some(PreferenceValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Current selection for a multi-select key; empty when nothing is staged.
    pub fn choices(&self, key: PreferenceKey) -> &[String] {
        match self.0.get(&key) {
            Some(PreferenceValue::Choices(choices)) => choices,
            _ => &[],
        }
    }

    pub fn ratio(&self, key: PreferenceKey) -> Option<u8> {
        match self.0.get(&key) {
            Some(PreferenceValue::Ratio(ratio)) => Some(*ratio),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: PreferenceKey, value: PreferenceValue) -> Option<PreferenceValue> {
        self.0.insert(key, value)
    }

    pub fn remove(&mut self, key: PreferenceKey) -> Option<PreferenceValue> {
        self.0.remove(&key)
    }

    pub fn contains_key(&self, key: PreferenceKey) -> bool {
        self.0.contains_key(&key)
    }

    /// Flip membership of `value` in a multi-select slot. Returns whether it
    /// is selected afterwards.
    pub fn toggle(&mut self, key: PreferenceKey, value: &str) -> bool {
        let entry = self
            .0
            .entry(key)
            .or_insert_with(|| PreferenceValue::Choices(Vec::new()));
        if !matches!(entry, PreferenceValue::Choices(_)) {
            *entry = PreferenceValue::Choices(Vec::new());
        }
        let PreferenceValue::Choices(choices) = entry else {
            return false;
        };
        if let Some(pos) = choices.iter().position(|c| c == value) {
            choices.remove(pos);
            false
        } else {
            choices.push(value.to_string());
            true
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = PreferenceKey> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Who authored a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// A single chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub speaker: Speaker,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Chronological chat log. Append-only apart from [`Transcript::rewind_last_answer`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.0.push(message);
    }

    /// Drop the most recent user message and everything after it.
    /// Returns how many messages were removed.
    pub fn rewind_last_answer(&mut self) -> usize {
        match self.0.iter().rposition(|m| m.speaker == Speaker::User) {
            Some(idx) => {
                let removed = self.0.len() - idx;
                self.0.truncate(idx);
                removed
            }
            None => 0,
        }
    }

    pub fn user_messages(&self) -> usize {
        self.0.iter().filter(|m| m.speaker == Speaker::User).count()
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
