//! The ordered, immutable list of wizard steps.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::model::PreferenceKey;

/// What a step is asking for: a preference slot, or the closing summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionKey {
    Preference(PreferenceKey),
    Summary(SummaryMarker),
}

/// Serde marker for the `"summary"` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMarker {
    Summary,
}

impl QuestionKey {
    pub const SUMMARY: QuestionKey = QuestionKey::Summary(SummaryMarker::Summary);

    pub fn preference(&self) -> Option<PreferenceKey> {
        match self {
            Self::Preference(key) => Some(*key),
            Self::Summary(_) => None,
        }
    }
}

impl std::fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preference(key) => write!(f, "{key}"),
            Self::Summary(_) => write!(f, "summary"),
        }
    }
}

/// Input affordance a step is answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    DateRange,
    SingleDate,
    SingleChoice,
    MultiChoice,
    Ratio,
    Summary,
}

/// One step of the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub key: QuestionKey,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl Question {
    pub fn new(key: PreferenceKey, prompt: impl Into<String>) -> Self {
        Self {
            key: QuestionKey::Preference(key),
            prompt: prompt.into(),
            options: Vec::new(),
        }
    }

    pub fn summary(prompt: impl Into<String>) -> Self {
        Self {
            key: QuestionKey::SUMMARY,
            prompt: prompt.into(),
            options: Vec::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Dispatch on key first, then on whether options are offered.
    pub fn modality(&self) -> Modality {
        let key = match self.key {
            QuestionKey::Summary(_) => return Modality::Summary,
            QuestionKey::Preference(key) => key,
        };
        match key {
            PreferenceKey::Duration => Modality::DateRange,
            PreferenceKey::Date if self.options.is_empty() => Modality::SingleDate,
            PreferenceKey::Ratio if self.options.is_empty() => Modality::Ratio,
            k if k.is_multi_select() => Modality::MultiChoice,
            _ => Modality::SingleChoice,
        }
    }

    pub fn offers(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// Contiguous step index → question lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRegistry {
    first_index: usize,
    greeting: String,
    questions: Vec<Question>,
}

impl QuestionRegistry {
    /// Build a registry whose first question sits at `first_index`.
    ///
    /// The summary step, if present, must be the last one.
    pub fn new(
        first_index: usize,
        greeting: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, ConfigError> {
        if questions.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }
        let last = questions.len() - 1;
        if let Some(pos) = questions
            .iter()
            .position(|q| q.key == QuestionKey::SUMMARY)
            .filter(|pos| *pos != last)
        {
            return Err(ConfigError::SummaryNotTerminal {
                index: first_index + pos,
            });
        }
        Ok(Self {
            first_index,
            greeting: greeting.into(),
            questions,
        })
    }

    /// The stock travel questionnaire, steps 2 through 9.
    pub fn travel() -> Self {
        let questions = vec![
            Question::new(PreferenceKey::Duration, "여행일정은 어떻게 되나요?"),
            Question::new(PreferenceKey::Date, "여행 날짜는 언젠가요?"),
            Question::new(
                PreferenceKey::Purpose,
                "이번 여행의 목적은 무엇인가요? (중복 선택 가능)",
            )
            .with_options(["힐링", "먹방", "호캉스", "액티비티", "쇼핑", "문화/예술"]),
            Question::new(PreferenceKey::Budget, "예산은 어느 정도로 생각하시나요?")
                .with_options(["FLEX", "BASIC", "가성비"]),
            Question::new(
                PreferenceKey::Transportation,
                "어떤 이동 수단을 이용하실 건가요?",
            )
            .with_options(["자차", "대중교통", "렌트카"]),
            Question::new(
                PreferenceKey::Ratio,
                "현지인 맛집과 관광지 비율을 어떻게 할까요?",
            ),
            Question::new(
                PreferenceKey::SpotTypes,
                "어떤 종류의 장소를 방문하고 싶으세요? (중복 선택 가능)",
            )
            .with_options(["자연", "도시", "역사/유적", "체험/액티비티", "맛집/카페"]),
            Question::summary(
                "좋아요! 모든 정보를 모았어요. 선택하신 내용을 바탕으로 최고의 여행 코스를 추천해드릴게요!",
            ),
        ];
        Self {
            first_index: 2,
            greeting: "안녕하세요! 당신의 취향을 완성하는 여행을 도와줄 Tpin (티핀)이예요!"
                .to_string(),
            questions,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        index
            .checked_sub(self.first_index)
            .and_then(|offset| self.questions.get(offset))
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn first_index(&self) -> usize {
        self.first_index
    }

    pub fn last_index(&self) -> usize {
        self.first_index + self.questions.len() - 1
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        index == self.last_index()
    }

    /// Step index holding the given preference slot, if any.
    pub fn index_of(&self, key: PreferenceKey) -> Option<usize> {
        self.questions
            .iter()
            .position(|q| q.key == QuestionKey::Preference(key))
            .map(|pos| self.first_index + pos)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl Default for QuestionRegistry {
    fn default() -> Self {
        Self::travel()
    }
}
