//! Schedule-specific error types.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Slot {slot_id} on {date} is already taken")]
    SlotTaken { date: NaiveDate, slot_id: String },

    #[error("Unknown slot: {0}")]
    UnknownSlot(String),

    #[error("No registrations on {date} for slot {slot_id}")]
    Closed { date: NaiveDate, slot_id: String },

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid value {value:?} for field {field}")]
    InvalidOption { field: String, value: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("Field id {0} already exists")]
    DuplicateField(String),

    #[error("Wrong admin password")]
    Unauthorized,
}

impl ScheduleError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::SlotTaken { .. } => "משבצת זו תפוסה.".to_string(),
            Self::UnknownSlot(_) => "Slot does not exist.".to_string(),
            Self::Closed { .. } => "This slot is closed for registration on that day.".to_string(),
            Self::MissingFields(fields) => format!("Please fill in: {}", fields.join(", ")),
            Self::InvalidOption { field, .. } => format!("Pick one of the listed options for {}", field),
            Self::NotFound { kind, .. } => format!("{} not found", kind),
            Self::InvalidTime(_) => "Times must look like 09:30.".to_string(),
            Self::DuplicateField(id) => format!("A field named {} already exists", id),
            Self::Unauthorized => "Wrong password.".to_string(),
        }
    }
}

/// Errors from the schedule analysis assistant.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analysis is not configured (missing API key)")]
    Disabled,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Model returned no text")]
    EmptyResponse,
}

impl AnalysisError {
    /// Text shown instead of an analysis. Empty model output gets its own message.
    pub fn fallback_text(&self) -> &'static str {
        match self {
            Self::EmptyResponse => "לא הצלחתי לנתח את הלוח כרגע.",
            _ => "שגיאה בחיבור לבינה המלאכותית.",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Disabled => "Schedule analysis is not configured.",
            Self::Network(_) => "Could not reach the analysis service.",
            Self::Api { .. } => "The analysis service returned an error.",
            Self::EmptyResponse => "The analysis service returned nothing.",
        }
    }
}
