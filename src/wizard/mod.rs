//! Chat wizard — the conversational travel-preference collector.
//!
//! The assistant asks a fixed sequence of questions, one per step. Each step
//! is answered through its own input modality (date range, date, single or
//! multi choice, ratio slider). Answers land in `Preferences`, the chat log in
//! a `Transcript`, and the visited steps in a `StepHistory` so the user can go
//! back and change an earlier answer. Once the summary step is reached the
//! collected preferences are handed to the itinerary generator.

pub mod history;
pub mod inputs;
pub mod manager;
pub mod model;
pub mod registry;
pub mod scheduler;
pub mod state;
pub mod view;

pub use history::StepHistory;
pub use inputs::DateRangeInput;
pub use manager::{WizardEvent, WizardManager};
pub use model::{Message, PreferenceKey, PreferenceValue, Preferences, Speaker, Transcript};
pub use registry::{Modality, Question, QuestionKey, QuestionRegistry};
pub use scheduler::TypingScheduler;
pub use state::{Intent, PendingMessage, Transition, WizardState};
pub use view::{Affordance, WizardSnapshot};
