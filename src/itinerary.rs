//! Hand-off from the chat wizard to the external itinerary generator.
//!
//! Only the boundary lives here: the request built from collected
//! preferences, the plan shape the generator returns, and the port trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::HandoffError;
use crate::wizard::{PreferenceKey, PreferenceValue, Preferences, WizardManager};

/// Flattened answers sent to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRequest {
    pub duration: String,
    pub date: String,
    pub purposes: Vec<String>,
    pub budget: String,
    pub transportation: String,
    /// Local-to-tourist split, e.g. `"70% : 30%"`.
    pub ratio: String,
    pub spot_types: Vec<String>,
}

impl ItineraryRequest {
    pub fn from_preferences(prefs: &Preferences) -> Result<Self, HandoffError> {
        Ok(Self {
            duration: text(prefs, PreferenceKey::Duration)?,
            date: text(prefs, PreferenceKey::Date)?,
            purposes: choices(prefs, PreferenceKey::Purpose)?,
            budget: text(prefs, PreferenceKey::Budget)?,
            transportation: text(prefs, PreferenceKey::Transportation)?,
            ratio: text(prefs, PreferenceKey::Ratio)?,
            spot_types: choices(prefs, PreferenceKey::SpotTypes)?,
        })
    }

    /// Pretty-printed JSON body for the generator.
    pub fn to_json(&self) -> Result<String, HandoffError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One-line summary of what the traveller cares about.
    pub fn interests(&self) -> String {
        let mut parts = Vec::new();
        if !self.purposes.is_empty() {
            parts.push(format!("여행 목적: {}", self.purposes.join(", ")));
        }
        if !self.spot_types.is_empty() {
            parts.push(format!("선호 장소: {}", self.spot_types.join(", ")));
        }
        parts.push(format!("예산: {}", self.budget));
        parts.push(format!("이동 수단: {}", self.transportation));
        parts.push(format!("현지인:관광객 비율 {}", self.ratio));
        parts.join(" / ")
    }
}

fn text(prefs: &Preferences, key: PreferenceKey) -> Result<String, HandoffError> {
    prefs
        .text(key)
        .map(String::from)
        .ok_or(HandoffError::MissingAnswer(key))
}

fn choices(prefs: &Preferences, key: PreferenceKey) -> Result<Vec<String>, HandoffError> {
    match prefs.get(key) {
        Some(PreferenceValue::Choices(choices)) => Ok(choices.clone()),
        _ => Err(HandoffError::MissingAnswer(key)),
    }
}

/// One scheduled activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub time: String,
    pub activity: String,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub day: u32,
    pub theme: String,
    pub activities: Vec<Activity>,
}

/// Generated trip plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryPlan {
    pub trip_title: String,
    pub trip_slogan: String,
    pub destination: String,
    pub daily_plans: Vec<ItineraryDay>,
}

/// External collaborator that turns preferences into a plan.
#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    async fn generate(&self, request: &ItineraryRequest) -> Result<ItineraryPlan, HandoffError>;
}

/// Pass a finished conversation's answers to `generator`.
pub async fn hand_off(
    manager: &WizardManager,
    generator: &dyn ItineraryGenerator,
) -> Result<ItineraryPlan, HandoffError> {
    let prefs = manager
        .completed_preferences()
        .await
        .ok_or(HandoffError::Incomplete)?;
    let request = ItineraryRequest::from_preferences(&prefs)?;
    info!(
        session_id = %manager.session_id(),
        duration = %request.duration,
        date = %request.date,
        "Handing preferences to itinerary generator"
    );
    let payload = request.to_json()?;
    debug!(session_id = %manager.session_id(), %payload, "Itinerary request");
    generator.generate(&request).await
}
