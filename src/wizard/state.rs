//! Wizard state machine — pure transitions over one owned state value.
//!
//! Every intent either leaves the state untouched (returning a
//! [`WizardError`]) or applies one transition. Timers are not started here:
//! an advancing transition carries the [`PendingMessage`] the caller should
//! deliver once its typing delay has elapsed.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::WizardConfig;
use crate::error::WizardError;

use super::history::StepHistory;
use super::inputs::{DateRangeInput, format_date, parse_date, ratio_label, validate_ratio};
use super::model::{Message, PreferenceKey, PreferenceValue, Preferences, Transcript};
use super::registry::{Modality, Question, QuestionKey, QuestionRegistry};

/// An assistant message waiting out its typing delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    /// Delivery token; only the currently pending sequence is accepted.
    pub seq: u64,
    pub text: String,
    pub delay: Duration,
}

/// A user action on the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    ConfirmSingle { key: PreferenceKey, value: String },
    ToggleMulti { key: PreferenceKey, value: String },
    ConfirmMultiSelection { key: PreferenceKey },
    /// Pick an option on the current single-choice step.
    Choose { option: String },
    /// Flip an option on the current multi-choice step.
    Toggle { option: String },
    /// Confirm the current multi-choice step.
    ConfirmSelection,
    SetRangeStart { date: NaiveDate },
    SetRangeEnd { date: NaiveDate },
    ConfirmDuration,
    PickDate { date: String },
    SetRatio { value: i64 },
    ConfirmRatio,
    Retreat,
}

/// What an accepted intent did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed (empty date input, retreat on the first step).
    Unchanged,
    /// A provisional value changed; the step did not move.
    Staged,
    Advanced {
        from: usize,
        to: usize,
        key: PreferenceKey,
        /// Next question to type out; `None` once the final step is reached.
        pending: Option<PendingMessage>,
        completed: bool,
    },
    Retreated {
        from: usize,
        to: usize,
        removed_messages: usize,
    },
}

/// The full conversation state, exclusively owned by one controller.
#[derive(Debug, Clone)]
pub struct WizardState {
    registry: QuestionRegistry,
    config: WizardConfig,
    history: StepHistory,
    preferences: Preferences,
    transcript: Transcript,
    range: DateRangeInput,
    pending: Option<PendingMessage>,
    next_seq: u64,
}

impl WizardState {
    /// Fresh conversation: greeting in the transcript, first question pending.
    ///
    /// `today` pre-fills the start of the trip-length picker.
    pub fn new(registry: QuestionRegistry, config: WizardConfig, today: NaiveDate) -> Self {
        let first = registry.first_index();
        let mut transcript = Transcript::new();
        transcript.push(Message::assistant(registry.greeting()));

        let mut state = Self {
            history: StepHistory::new(first),
            preferences: Preferences::new(),
            transcript,
            range: DateRangeInput::starting(today),
            pending: None,
            next_seq: 0,
            registry,
            config,
        };
        if !state.registry.is_terminal(first) {
            if let Some(prompt) = state.registry.get(first).map(|q| q.prompt.clone()) {
                let delay = state.config.first_question_delay;
                state.schedule(prompt, delay);
            }
        }
        state
    }

    // ── Read access ─────────────────────────────────────────────────

    pub fn current_step(&self) -> usize {
        self.history.current()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.registry.get(self.history.current())
    }

    pub fn history(&self) -> &StepHistory {
        &self.history
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn registry(&self) -> &QuestionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn range(&self) -> &DateRangeInput {
        &self.range
    }

    pub fn pending(&self) -> Option<&PendingMessage> {
        self.pending.as_ref()
    }

    /// Whether the assistant is "typing" (a message is pending).
    pub fn is_typing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.registry.is_terminal(self.history.current())
    }

    /// Collected answers, available once the final step is reached.
    pub fn completed_preferences(&self) -> Option<&Preferences> {
        self.is_complete().then_some(&self.preferences)
    }

    /// Current slider position, staged or default.
    pub fn ratio(&self) -> u8 {
        self.preferences
            .ratio(PreferenceKey::Ratio)
            .unwrap_or(self.config.default_ratio)
    }

    // ── Delivery ────────────────────────────────────────────────────

    /// Append the pending assistant message if `seq` is still the pending one.
    pub fn deliver(&mut self, seq: u64) -> Option<Message> {
        if self.pending.as_ref().is_none_or(|p| p.seq != seq) {
            return None;
        }
        let pending = self.pending.take()?;
        let message = Message::assistant(pending.text);
        self.transcript.push(message.clone());
        Some(message)
    }

    /// Drop the pending assistant message without appending it.
    pub fn cancel_pending(&mut self) -> Option<PendingMessage> {
        self.pending.take()
    }

    fn schedule(&mut self, text: String, delay: Duration) -> PendingMessage {
        self.next_seq += 1;
        let pending = PendingMessage {
            seq: self.next_seq,
            text,
            delay,
        };
        self.pending = Some(pending.clone());
        pending
    }

    // ── Intents ─────────────────────────────────────────────────────

    pub fn dispatch(&mut self, intent: Intent) -> Result<Transition, WizardError> {
        match intent {
            Intent::ConfirmSingle { key, value } => self.confirm_single(key, value),
            Intent::ToggleMulti { key, value } => self.toggle_multi(key, &value),
            Intent::ConfirmMultiSelection { key } => self.confirm_multi_selection(key),
            Intent::Choose { option } => self.choose(option),
            Intent::Toggle { option } => self.toggle(&option),
            Intent::ConfirmSelection => self.confirm_selection(),
            Intent::SetRangeStart { date } => self.set_range_start(date),
            Intent::SetRangeEnd { date } => self.set_range_end(date),
            Intent::ConfirmDuration => self.confirm_duration(),
            Intent::PickDate { date } => self.pick_date(&date),
            Intent::SetRatio { value } => self.set_ratio(value),
            Intent::ConfirmRatio => self.confirm_ratio(),
            Intent::Retreat => self.retreat(),
        }
    }

    /// Commit a single value for `key` and advance.
    pub fn confirm_single(
        &mut self,
        key: PreferenceKey,
        value: impl Into<String>,
    ) -> Result<Transition, WizardError> {
        let question = self.question_for(key)?;
        let mut value = value.into();
        match question.modality() {
            // Ranges and ratios go through `confirm_duration` / `confirm_ratio`.
            actual @ (Modality::MultiChoice | Modality::DateRange | Modality::Ratio) => {
                return Err(WizardError::WrongModality {
                    step: self.current_step(),
                    actual,
                    requested: Modality::SingleChoice,
                });
            }
            Modality::SingleChoice if !question.offers(&value) => {
                return Err(WizardError::UnknownOption { key, option: value });
            }
            Modality::SingleDate => {
                value = format_date(parse_date(&value)?);
            }
            _ => {}
        }
        let delay = self.config.answer_delay;
        Ok(self.commit(key, PreferenceValue::Text(value), delay))
    }

    /// Flip membership of `value` in the staged selection for `key`.
    pub fn toggle_multi(&mut self, key: PreferenceKey, value: &str) -> Result<Transition, WizardError> {
        let question = self.multi_question_for(key)?;
        if !question.offers(value) {
            return Err(WizardError::UnknownOption {
                key,
                option: value.to_string(),
            });
        }
        self.preferences.toggle(key, value);
        Ok(Transition::Staged)
    }

    /// Commit the staged selection for `key` and advance.
    pub fn confirm_multi_selection(&mut self, key: PreferenceKey) -> Result<Transition, WizardError> {
        self.multi_question_for(key)?;
        let selection = self.preferences.choices(key).to_vec();
        if selection.is_empty() && !self.config.allow_empty_selection {
            return Err(WizardError::EmptySelection(key));
        }
        let delay = self.config.selection_delay;
        Ok(self.commit(key, PreferenceValue::Choices(selection), delay))
    }

    pub fn choose(&mut self, option: String) -> Result<Transition, WizardError> {
        let key = self.key_for_modality(Modality::SingleChoice)?;
        self.confirm_single(key, option)
    }

    pub fn toggle(&mut self, option: &str) -> Result<Transition, WizardError> {
        let key = self.key_for_modality(Modality::MultiChoice)?;
        self.toggle_multi(key, option)
    }

    pub fn confirm_selection(&mut self) -> Result<Transition, WizardError> {
        let key = self.key_for_modality(Modality::MultiChoice)?;
        self.confirm_multi_selection(key)
    }

    pub fn set_range_start(&mut self, date: NaiveDate) -> Result<Transition, WizardError> {
        self.key_for_modality(Modality::DateRange)?;
        self.range.set_start(date);
        Ok(Transition::Staged)
    }

    pub fn set_range_end(&mut self, date: NaiveDate) -> Result<Transition, WizardError> {
        self.key_for_modality(Modality::DateRange)?;
        self.range.set_end(date);
        Ok(Transition::Staged)
    }

    /// Commit the drafted range as `"{n}박 {n+1}일"`.
    pub fn confirm_duration(&mut self) -> Result<Transition, WizardError> {
        let key = self.key_for_modality(Modality::DateRange)?;
        let label = self.range.label(self.config.max_nights)?;
        let delay = self.config.answer_delay;
        Ok(self.commit(key, PreferenceValue::Text(label), delay))
    }

    /// A non-empty date commits immediately; an empty one is ignored.
    pub fn pick_date(&mut self, input: &str) -> Result<Transition, WizardError> {
        let key = self.key_for_modality(Modality::SingleDate)?;
        if input.trim().is_empty() {
            return Ok(Transition::Unchanged);
        }
        let date = parse_date(input)?;
        let delay = self.config.answer_delay;
        Ok(self.commit(key, PreferenceValue::Text(format_date(date)), delay))
    }

    pub fn set_ratio(&mut self, value: i64) -> Result<Transition, WizardError> {
        let key = self.key_for_modality(Modality::Ratio)?;
        let ratio = validate_ratio(value)?;
        self.preferences.insert(key, PreferenceValue::Ratio(ratio));
        Ok(Transition::Staged)
    }

    /// Commit the slider as `"{100-r}% : {r}%"`; the raw position is not kept.
    pub fn confirm_ratio(&mut self) -> Result<Transition, WizardError> {
        let key = self.key_for_modality(Modality::Ratio)?;
        let label = ratio_label(self.ratio());
        let delay = self.config.answer_delay;
        Ok(self.commit(key, PreferenceValue::Text(label), delay))
    }

    /// Step back to the previous question, discarding the step being left
    /// and the answer that led to it.
    pub fn retreat(&mut self) -> Result<Transition, WizardError> {
        if !self.history.can_go_back() {
            return Ok(Transition::Unchanged);
        }
        self.ensure_idle()?;
        let Some((from, to)) = self.history.pop() else {
            return Ok(Transition::Unchanged);
        };
        if let Some(key) = self.registry.get(from).and_then(|q| q.key.preference()) {
            self.preferences.remove(key);
        }
        let removed_messages = self.transcript.rewind_last_answer();
        Ok(Transition::Retreated {
            from,
            to,
            removed_messages,
        })
    }

    // ── Internals ───────────────────────────────────────────────────

    fn commit(&mut self, key: PreferenceKey, value: PreferenceValue, delay: Duration) -> Transition {
        let from = self.history.current();
        let to = from + 1;
        self.transcript.push(Message::user(value.display()));
        self.preferences.insert(key, value);
        self.history.push(to);

        let completed = self.registry.is_terminal(to);
        let pending = if completed {
            None
        } else {
            self.registry
                .get(to)
                .map(|q| q.prompt.clone())
                .map(|prompt| self.schedule(prompt, delay))
        };
        Transition::Advanced {
            from,
            to,
            key,
            pending,
            completed,
        }
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.is_typing() {
            return Err(WizardError::Busy);
        }
        Ok(())
    }

    /// The current question, provided the wizard can accept an answer.
    fn answerable(&self) -> Result<&Question, WizardError> {
        self.ensure_idle()?;
        if self.is_complete() {
            return Err(WizardError::AlreadyComplete);
        }
        self.current_question().ok_or(WizardError::AlreadyComplete)
    }

    fn question_for(&self, key: PreferenceKey) -> Result<Question, WizardError> {
        let question = self.answerable()?;
        if question.key != QuestionKey::Preference(key) {
            return Err(WizardError::KeyMismatch {
                step: self.current_step(),
                expected: question.key,
                got: key,
            });
        }
        Ok(question.clone())
    }

    fn multi_question_for(&self, key: PreferenceKey) -> Result<Question, WizardError> {
        let question = self.question_for(key)?;
        let actual = question.modality();
        if actual != Modality::MultiChoice {
            return Err(WizardError::WrongModality {
                step: self.current_step(),
                actual,
                requested: Modality::MultiChoice,
            });
        }
        Ok(question)
    }

    fn key_for_modality(&self, requested: Modality) -> Result<PreferenceKey, WizardError> {
        let question = self.answerable()?;
        let actual = question.modality();
        match question.key.preference() {
            Some(key) if actual == requested => Ok(key),
            _ => Err(WizardError::WrongModality {
                step: self.current_step(),
                actual,
                requested,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn new_state() -> WizardState {
        WizardState::new(QuestionRegistry::travel(), WizardConfig::default(), today())
    }

    /// Deliver whatever is pending, as the timer would.
    fn settle(state: &mut WizardState) {
        if let Some(seq) = state.pending().map(|p| p.seq) {
            state.deliver(seq);
        }
    }

    fn ready_state() -> WizardState {
        let mut state = new_state();
        settle(&mut state);
        state
    }

    fn advance_to(state: &mut WizardState, step: usize) {
        while state.current_step() < step {
            let transition = match state.current_question().unwrap().modality() {
                Modality::DateRange => {
                    state.set_range_end(NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()).unwrap();
                    state.confirm_duration()
                }
                Modality::SingleDate => state.pick_date("2025-07-01"),
                Modality::MultiChoice => state.confirm_selection(),
                Modality::SingleChoice => {
                    let option = state.current_question().unwrap().options[0].clone();
                    state.choose(option)
                }
                Modality::Ratio => state.confirm_ratio(),
                Modality::Summary => unreachable!(),
            };
            transition.unwrap();
            settle(state);
        }
    }

    fn assert_transcript_invariant(state: &WizardState) {
        assert_eq!(
            state.transcript().user_messages(),
            state.history().len() - 1,
            "one user message per confirmed step"
        );
    }

    #[test]
    fn initial_state() {
        let state = new_state();
        assert_eq!(state.current_step(), 2);
        assert_eq!(state.history().steps(), [2]);
        assert!(state.preferences().is_empty());
        assert_eq!(state.transcript().len(), 1);
        assert!(state.is_typing());

        let pending = state.pending().unwrap();
        assert_eq!(pending.text, "여행일정은 어떻게 되나요?");
        assert_eq!(pending.delay, Duration::from_millis(1000));
    }

    #[test]
    fn first_question_arrives_on_delivery() {
        let mut state = new_state();
        let seq = state.pending().unwrap().seq;
        let delivered = state.deliver(seq).unwrap();
        assert_eq!(delivered, Message::assistant("여행일정은 어떻게 되나요?"));
        assert_eq!(state.transcript().len(), 2);
        assert!(!state.is_typing());
        // Second delivery of the same token is ignored.
        assert!(state.deliver(seq).is_none());
        assert_eq!(state.transcript().len(), 2);
    }

    #[test]
    fn stale_token_is_ignored() {
        let mut state = new_state();
        let seq = state.pending().unwrap().seq;
        assert!(state.deliver(seq + 1).is_none());
        assert!(state.is_typing());
        assert!(state.cancel_pending().is_some());
        assert!(state.deliver(seq).is_none());
        assert_eq!(state.transcript().len(), 1);
    }

    #[test]
    fn intents_rejected_while_typing() {
        let mut state = new_state();
        assert_eq!(state.confirm_duration(), Err(WizardError::Busy));
        assert_eq!(
            state.set_range_end(today()),
            Err(WizardError::Busy)
        );
    }

    #[test]
    fn single_choice_advances_by_one() {
        let mut state = ready_state();
        advance_to(&mut state, 5);
        let prefs_before = state.preferences().len();
        let transcript_before = state.transcript().len();

        let transition = state.choose("BASIC".into()).unwrap();
        match transition {
            Transition::Advanced {
                from,
                to,
                key,
                pending,
                completed,
            } => {
                assert_eq!((from, to), (5, 6));
                assert_eq!(key, PreferenceKey::Budget);
                assert!(!completed);
                let pending = pending.unwrap();
                assert_eq!(pending.text, "어떤 이동 수단을 이용하실 건가요?");
                assert_eq!(pending.delay, Duration::from_millis(300));
            }
            other => panic!("expected Advanced, got {other:?}"),
        }
        assert_eq!(state.preferences().len(), prefs_before + 1);
        assert_eq!(state.preferences().text(PreferenceKey::Budget), Some("BASIC"));
        assert_eq!(state.transcript().len(), transcript_before + 1);
        assert_eq!(state.transcript().last(), Some(&Message::user("BASIC")));

        settle(&mut state);
        assert_eq!(state.transcript().len(), transcript_before + 2);
        assert_transcript_invariant(&state);
    }

    #[test]
    fn single_choice_rejects_unknown_option() {
        let mut state = ready_state();
        advance_to(&mut state, 5);
        assert_eq!(
            state.choose("LUXURY".into()),
            Err(WizardError::UnknownOption {
                key: PreferenceKey::Budget,
                option: "LUXURY".into()
            })
        );
        assert_eq!(state.current_step(), 5);
    }

    #[test]
    fn confirm_single_checks_key_and_modality() {
        let mut state = ready_state();
        assert!(matches!(
            state.confirm_single(PreferenceKey::Budget, "BASIC"),
            Err(WizardError::KeyMismatch { step: 2, .. })
        ));
        advance_to(&mut state, 4);
        assert!(matches!(
            state.confirm_single(PreferenceKey::Purpose, "힐링"),
            Err(WizardError::WrongModality {
                actual: Modality::MultiChoice,
                ..
            })
        ));
    }

    #[test]
    fn confirm_single_cannot_bypass_range_or_slider() {
        let mut state = ready_state();
        assert_eq!(
            state.confirm_single(PreferenceKey::Duration, "9박 10일"),
            Err(WizardError::WrongModality {
                step: 2,
                actual: Modality::DateRange,
                requested: Modality::SingleChoice,
            })
        );
        assert!(state.preferences().is_empty());
        assert_eq!(state.current_step(), 2);

        advance_to(&mut state, 7);
        assert_eq!(
            state.dispatch(Intent::ConfirmSingle {
                key: PreferenceKey::Ratio,
                value: "banana".into(),
            }),
            Err(WizardError::WrongModality {
                step: 7,
                actual: Modality::Ratio,
                requested: Modality::SingleChoice,
            })
        );
        assert!(!state.preferences().contains_key(PreferenceKey::Ratio));
        assert_eq!(state.current_step(), 7);
    }

    #[test]
    fn confirm_single_normalizes_dates() {
        let mut state = ready_state();
        advance_to(&mut state, 3);
        state
            .confirm_single(PreferenceKey::Date, " 2025-07-01 ")
            .unwrap();
        assert_eq!(state.preferences().text(PreferenceKey::Date), Some("2025-07-01"));
        assert_eq!(state.transcript().last(), Some(&Message::user("2025-07-01")));
    }

    #[test]
    fn toggle_is_staged_and_symmetric() {
        let mut state = ready_state();
        advance_to(&mut state, 4);
        let transcript_len = state.transcript().len();

        assert_eq!(state.toggle("힐링"), Ok(Transition::Staged));
        assert_eq!(state.toggle("먹방"), Ok(Transition::Staged));
        assert_eq!(state.toggle("힐링"), Ok(Transition::Staged));
        assert_eq!(
            state.preferences().choices(PreferenceKey::Purpose),
            ["먹방".to_string()]
        );
        assert_eq!(state.current_step(), 4);
        assert_eq!(state.transcript().len(), transcript_len);

        assert!(matches!(
            state.toggle("등산"),
            Err(WizardError::UnknownOption { .. })
        ));
        assert!(matches!(
            state.toggle_multi(PreferenceKey::SpotTypes, "자연"),
            Err(WizardError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn multi_confirm_appends_joined_answer() {
        let mut state = ready_state();
        advance_to(&mut state, 4);
        state.toggle_multi(PreferenceKey::Purpose, "힐링").unwrap();
        state.toggle_multi(PreferenceKey::Purpose, "먹방").unwrap();
        let transition = state.confirm_multi_selection(PreferenceKey::Purpose).unwrap();
        match transition {
            Transition::Advanced { to, pending, .. } => {
                assert_eq!(to, 5);
                assert_eq!(pending.unwrap().delay, Duration::from_millis(200));
            }
            other => panic!("expected Advanced, got {other:?}"),
        }
        assert_eq!(state.transcript().last(), Some(&Message::user("힐링, 먹방")));
        assert_transcript_invariant(&state);
    }

    #[test]
    fn empty_selection_follows_policy() {
        let mut state = ready_state();
        advance_to(&mut state, 4);
        assert!(state.clone().confirm_selection().is_ok());

        let config = WizardConfig {
            allow_empty_selection: false,
            ..WizardConfig::default()
        };
        let mut strict = WizardState::new(QuestionRegistry::travel(), config, today());
        settle(&mut strict);
        advance_to(&mut strict, 4);
        assert_eq!(
            strict.confirm_selection(),
            Err(WizardError::EmptySelection(PreferenceKey::Purpose))
        );
        strict.toggle("쇼핑").unwrap();
        assert!(strict.confirm_selection().is_ok());
    }

    #[test]
    fn duration_bound_blocks_confirmation() {
        let mut state = ready_state();
        state
            .set_range_end(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap())
            .unwrap();
        assert_eq!(
            state.confirm_duration(),
            Err(WizardError::RangeTooLong { nights: 9, max: 4 })
        );
        assert_eq!(state.current_step(), 2);
        assert!(state.preferences().is_empty());

        state
            .set_range_end(NaiveDate::from_ymd_opt(2025, 6, 3).unwrap())
            .unwrap();
        state.confirm_duration().unwrap();
        assert_eq!(state.preferences().text(PreferenceKey::Duration), Some("2박 3일"));
    }

    #[test]
    fn range_start_auto_advances_end() {
        let mut state = ready_state();
        state
            .set_range_end(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap())
            .unwrap();
        state
            .set_range_start(NaiveDate::from_ymd_opt(2025, 6, 4).unwrap())
            .unwrap();
        assert_eq!(state.range().end, NaiveDate::from_ymd_opt(2025, 6, 4));
    }

    #[test]
    fn empty_date_is_ignored_and_bad_date_rejected() {
        let mut state = ready_state();
        advance_to(&mut state, 3);
        assert_eq!(state.pick_date("  "), Ok(Transition::Unchanged));
        assert!(matches!(
            state.pick_date("tomorrow"),
            Err(WizardError::InvalidDate(_))
        ));
        assert_eq!(state.current_step(), 3);
        state.pick_date("2025-07-01").unwrap();
        assert_eq!(state.preferences().text(PreferenceKey::Date), Some("2025-07-01"));
    }

    #[test]
    fn ratio_stages_then_commits_label() {
        let mut state = ready_state();
        advance_to(&mut state, 7);
        assert_eq!(state.ratio(), 50);
        assert_eq!(state.set_ratio(35), Err(WizardError::InvalidRatio(35)));
        state.set_ratio(30).unwrap();
        assert_eq!(state.preferences().ratio(PreferenceKey::Ratio), Some(30));
        state.confirm_ratio().unwrap();
        assert_eq!(state.preferences().text(PreferenceKey::Ratio), Some("70% : 30%"));
        assert_eq!(state.transcript().last(), Some(&Message::user("70% : 30%")));
    }

    #[test]
    fn modality_helpers_reject_other_steps() {
        let mut state = ready_state();
        assert!(matches!(
            state.set_ratio(50),
            Err(WizardError::WrongModality {
                actual: Modality::DateRange,
                requested: Modality::Ratio,
                ..
            })
        ));
        assert!(matches!(
            state.pick_date("2025-07-01"),
            Err(WizardError::WrongModality { .. })
        ));
    }

    #[test]
    fn retreat_on_first_step_changes_nothing() {
        let mut state = ready_state();
        let before = (
            state.history().clone(),
            state.preferences().clone(),
            state.transcript().clone(),
        );
        assert_eq!(state.retreat(), Ok(Transition::Unchanged));
        assert_eq!(
            (
                state.history().clone(),
                state.preferences().clone(),
                state.transcript().clone()
            ),
            before
        );
    }

    #[test]
    fn retreat_undoes_last_advance() {
        let mut state = ready_state();
        advance_to(&mut state, 5);
        let transcript_before = state.transcript().clone();
        let prefs_before = state.preferences().clone();

        state.choose("FLEX".into()).unwrap();
        settle(&mut state);
        assert_eq!(state.current_step(), 6);

        let transition = state.retreat().unwrap();
        assert_eq!(
            transition,
            Transition::Retreated {
                from: 6,
                to: 5,
                removed_messages: 2
            }
        );
        assert_eq!(state.current_step(), 5);
        assert_eq!(state.transcript(), &transcript_before);
        // The answer for step 5 stays until overwritten.
        assert_eq!(state.preferences().text(PreferenceKey::Budget), Some("FLEX"));
        assert_eq!(state.preferences().len(), prefs_before.len() + 1);
        assert_transcript_invariant(&state);

        state.choose("가성비".into()).unwrap();
        assert_eq!(state.preferences().text(PreferenceKey::Budget), Some("가성비"));
    }

    #[test]
    fn retreat_clears_staged_selection_of_step_left() {
        let mut state = ready_state();
        advance_to(&mut state, 8);
        state.toggle("자연").unwrap();
        state.retreat().unwrap();
        assert_eq!(state.current_step(), 7);
        assert!(!state.preferences().contains_key(PreferenceKey::SpotTypes));
        // Confirmed ratio answer survives.
        assert_eq!(state.preferences().text(PreferenceKey::Ratio), Some("50% : 50%"));
    }

    #[test]
    fn retreat_rejected_while_typing() {
        let mut state = ready_state();
        state.confirm_duration().unwrap_err();
        state.set_range_end(today()).unwrap();
        state.confirm_duration().unwrap();
        assert_eq!(state.retreat(), Err(WizardError::Busy));
        settle(&mut state);
        assert!(matches!(state.retreat(), Ok(Transition::Retreated { .. })));
    }

    #[test]
    fn reaching_summary_completes_without_pending_message() {
        let mut state = ready_state();
        advance_to(&mut state, 8);
        assert!(state.completed_preferences().is_none());
        let transition = state.confirm_selection().unwrap();
        assert!(matches!(
            transition,
            Transition::Advanced {
                to: 9,
                pending: None,
                completed: true,
                ..
            }
        ));
        assert!(!state.is_typing());
        assert!(state.is_complete());
        assert_eq!(state.completed_preferences().unwrap().len(), 7);
        assert_eq!(state.confirm_selection(), Err(WizardError::AlreadyComplete));
        assert_transcript_invariant(&state);

        // Leaving the summary reopens the last question.
        state.retreat().unwrap();
        assert_eq!(state.current_step(), 8);
        assert!(state.completed_preferences().is_none());
    }

    #[test]
    fn intent_serde() {
        let intent: Intent =
            serde_json::from_str(r#"{"type":"toggle_multi","key":"spotTypes","value":"자연"}"#)
                .unwrap();
        assert_eq!(
            intent,
            Intent::ToggleMulti {
                key: PreferenceKey::SpotTypes,
                value: "자연".into()
            }
        );
        let intent: Intent = serde_json::from_str(r#"{"type":"retreat"}"#).unwrap();
        assert_eq!(intent, Intent::Retreat);
    }
}
