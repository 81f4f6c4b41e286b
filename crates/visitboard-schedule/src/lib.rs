//! Weekly visit schedule for the board.
//!
//! Slots, registration fields, registrations and the admin edits over them,
//! plus the week grid shown to the public.

pub mod admin;
pub mod analysis;
pub mod defaults;
pub mod error;
pub mod grid;
pub mod registration;
pub mod types;
pub mod week;

pub use admin::{SettingsEdit, TextKey};
pub use analysis::{schedule_summary, AnalysisClient};
pub use error::{AnalysisError, ScheduleError};
pub use grid::{find_event, Cell, CellRule, PublicSummary, WeekGrid};
pub use registration::RegistrationForm;
pub use types::{
    new_id, Advertisement, AppNotice, AppSettings, CareEvent, EventStatus, EventType, FieldType,
    NoticeType, RegistrationField, TimeSlotDef,
};
pub use week::{DayKind, WeekRange, DAY_NAMES};
