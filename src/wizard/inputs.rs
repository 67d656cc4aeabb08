//! Per-modality input handling: trip length range, single date, ratio slider.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::WizardError;

/// Slider granularity for the local/tourist ratio.
pub const RATIO_STEP: u8 = 10;
/// Slider position used before the user touches it.
pub const DEFAULT_RATIO: u8 = 50;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date as typed into a date picker.
pub fn parse_date(input: &str) -> Result<NaiveDate, WizardError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| WizardError::InvalidDate(input.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Check a slider position: 0..=100 in steps of 10.
pub fn validate_ratio(value: i64) -> Result<u8, WizardError> {
    if !(0..=100).contains(&value) || value % i64::from(RATIO_STEP) != 0 {
        return Err(WizardError::InvalidRatio(value));
    }
    Ok(value as u8)
}

/// `"{100-ratio}% : {ratio}%"`, locals on the left.
pub fn ratio_label(ratio: u8) -> String {
    format!("{}% : {}%", 100 - ratio.min(100), ratio.min(100))
}

/// `"{nights}박 {nights+1}일"`.
pub fn stay_label(nights: u32) -> String {
    format!("{}박 {}일", nights, nights + 1)
}

/// Inline hint shown under the range picker.
pub fn max_stay_hint(max_nights: u32) -> String {
    format!("최대 연박 : {}", stay_label(max_nights))
}

/// Draft start/end dates for the trip-length step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeInput {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRangeInput {
    /// A draft whose start is pre-filled (the picker opens on today).
    pub fn starting(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Set the start date. An unset or earlier end date is pulled forward to match.
    pub fn set_start(&mut self, start: NaiveDate) {
        self.start = Some(start);
        if self.end.is_none_or(|end| end < start) {
            self.end = Some(start);
        }
    }

    pub fn set_end(&mut self, end: NaiveDate) {
        self.end = Some(end);
    }

    /// Whole nights between the two dates, direction ignored.
    pub fn nights(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((end - start).num_days().abs()),
            _ => None,
        }
    }

    /// Nights for a confirmable range, or why it cannot be confirmed.
    pub fn validate(&self, max_nights: u32) -> Result<u32, WizardError> {
        let nights = self.nights().ok_or(WizardError::IncompleteRange)?;
        if nights < 0 || nights > i64::from(max_nights) {
            return Err(WizardError::RangeTooLong {
                nights,
                max: max_nights,
            });
        }
        Ok(nights as u32)
    }

    pub fn can_confirm(&self, max_nights: u32) -> bool {
        self.validate(max_nights).is_ok()
    }

    /// The value stored once confirmed, e.g. `"2박 3일"`.
    pub fn label(&self, max_nights: u32) -> Result<String, WizardError> {
        self.validate(max_nights).map(stay_label)
    }
}
