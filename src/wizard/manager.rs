//! WizardManager — coordinates wizard state, typing delays, and event fan-out.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WizardConfig;
use crate::error::WizardError;

use super::model::{Message, PreferenceKey, Preferences};
use super::registry::QuestionRegistry;
use super::scheduler::TypingScheduler;
use super::state::{Intent, PendingMessage, Transition, WizardState};
use super::view::WizardSnapshot;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Change notifications for hosting views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    Typing { active: bool },
    MessageAppended { message: Message },
    StepChanged { step: usize },
    /// The final step was reached; these are the answers to hand off.
    Completed { preferences: Preferences },
}

/// Owns one conversation: its state, its single typing timer, and the event
/// channel hosts subscribe to.
pub struct WizardManager {
    session_id: Uuid,
    state: Arc<RwLock<WizardState>>,
    scheduler: TypingScheduler,
    events: broadcast::Sender<WizardEvent>,
}

impl WizardManager {
    /// Start a conversation: greeting now, first question after its delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(registry: QuestionRegistry, config: WizardConfig, today: NaiveDate) -> Self {
        let (events, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        let state = WizardState::new(registry, config, today);
        let pending = state.pending().cloned();
        let manager = Self {
            session_id: Uuid::new_v4(),
            state: Arc::new(RwLock::new(state)),
            scheduler: TypingScheduler::new(),
            events,
        };
        info!(session_id = %manager.session_id, "Chat wizard started");
        if let Some(pending) = pending {
            manager.arm(pending);
        }
        manager
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Subscribe to state changes. Events sent before subscribing are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn is_typing(&self) -> bool {
        self.state.read().await.is_typing()
    }

    pub async fn current_step(&self) -> usize {
        self.state.read().await.current_step()
    }

    /// The collected answers, once the final step has been reached.
    pub async fn completed_preferences(&self) -> Option<Preferences> {
        self.state.read().await.completed_preferences().cloned()
    }

    /// Apply one user intent.
    pub async fn dispatch(&self, intent: Intent) -> Result<Transition, WizardError> {
        let mut state = self.state.write().await;
        let step = state.current_step();
        let transition = match state.dispatch(intent) {
            Ok(transition) => transition,
            Err(e) => {
                warn!(session_id = %self.session_id, step, error = %e, "Intent rejected");
                return Err(e);
            }
        };

        match &transition {
            Transition::Unchanged => {}
            Transition::Staged => {
                debug!(session_id = %self.session_id, step, "Staged input updated");
            }
            Transition::Advanced {
                from,
                to,
                key,
                pending,
                completed,
            } => {
                info!(session_id = %self.session_id, from, to, key = %key, "Step confirmed");
                if let Some(answer) = state.transcript().last().cloned() {
                    let _ = self.events.send(WizardEvent::MessageAppended { message: answer });
                }
                let _ = self.events.send(WizardEvent::StepChanged { step: *to });
                if let Some(pending) = pending {
                    self.arm(pending.clone());
                }
                if *completed {
                    info!(
                        session_id = %self.session_id,
                        answers = state.preferences().len(),
                        "All preferences collected"
                    );
                    let _ = self.events.send(WizardEvent::Completed {
                        preferences: state.preferences().clone(),
                    });
                }
            }
            Transition::Retreated {
                from,
                to,
                removed_messages,
            } => {
                info!(
                    session_id = %self.session_id,
                    from,
                    to,
                    removed_messages,
                    "Stepped back"
                );
                let _ = self.events.send(WizardEvent::StepChanged { step: *to });
            }
        }
        Ok(transition)
    }

    pub async fn confirm_single(
        &self,
        key: PreferenceKey,
        value: impl Into<String>,
    ) -> Result<Transition, WizardError> {
        self.dispatch(Intent::ConfirmSingle {
            key,
            value: value.into(),
        })
        .await
    }

    pub async fn toggle_multi(
        &self,
        key: PreferenceKey,
        value: impl Into<String>,
    ) -> Result<Transition, WizardError> {
        self.dispatch(Intent::ToggleMulti {
            key,
            value: value.into(),
        })
        .await
    }

    pub async fn confirm_multi_selection(&self, key: PreferenceKey) -> Result<Transition, WizardError> {
        self.dispatch(Intent::ConfirmMultiSelection { key }).await
    }

    pub async fn retreat(&self) -> Result<Transition, WizardError> {
        self.dispatch(Intent::Retreat).await
    }

    /// Tear down: cancel the typing timer and drop the pending message.
    pub async fn shutdown(&self) {
        let timer_cancelled = self.scheduler.cancel();
        let dropped = self.state.write().await.cancel_pending();
        if dropped.is_some() {
            let _ = self.events.send(WizardEvent::Typing { active: false });
        }
        info!(
            session_id = %self.session_id,
            timer_cancelled,
            "Chat wizard shut down"
        );
    }

    /// Deliver `pending` into the transcript once its delay elapses.
    fn arm(&self, pending: PendingMessage) {
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let session_id = self.session_id;
        let seq = pending.seq;
        debug!(session_id = %session_id, seq, delay_ms = pending.delay.as_millis() as u64, "Typing");

        let _ = self.events.send(WizardEvent::Typing { active: true });
        self.scheduler.arm(pending.delay, async move {
            let delivered = state.write().await.deliver(seq);
            match delivered {
                Some(message) => {
                    debug!(session_id = %session_id, seq, "Assistant message delivered");
                    let _ = events.send(WizardEvent::MessageAppended { message });
                    let _ = events.send(WizardEvent::Typing { active: false });
                }
                None => debug!(session_id = %session_id, seq, "Stale typing timer ignored"),
            }
        });
    }
}
