//! Public registration for a (date, slot) cell.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::ScheduleError;
use crate::grid::{find_event, is_bookable};
use crate::types::{new_id, AppSettings, CareEvent, EventStatus, FieldType, RegistrationField};

/// Creator id recorded on registrations made from the public board.
pub const PUBLIC_CREATOR: &str = "public";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub date: NaiveDate,
    pub slot_id: String,
    pub data: BTreeMap<String, String>,
}

impl RegistrationForm {
    pub fn new(date: NaiveDate, slot_id: impl Into<String>) -> Self {
        Self {
            date,
            slot_id: slot_id.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.data.insert(field.into(), value.into());
    }

    fn value(&self, field: &str) -> Option<&str> {
        self.data
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Ids of required fields left empty, in form order.
    pub fn missing_required(&self, fields: &[RegistrationField]) -> Vec<String> {
        fields
            .iter()
            .filter(|f| f.is_required && self.value(&f.id).is_none())
            .map(|f| f.id.clone())
            .collect()
    }

    /// Check the filled-in values against the form definition.
    ///
    /// # Errors
    /// `MissingFields` when required fields are empty, `InvalidOption` when a
    /// select field holds a value outside its options.
    pub fn validate(&self, fields: &[RegistrationField]) -> Result<(), ScheduleError> {
        let missing = self.missing_required(fields);
        if !missing.is_empty() {
            return Err(ScheduleError::MissingFields(missing));
        }

        for field in fields.iter().filter(|f| f.field_type == FieldType::Select) {
            let (Some(options), Some(value)) = (&field.options, self.value(&field.id)) else {
                continue;
            };
            if !options.is_empty() && !options.iter().any(|o| o == value) {
                return Err(ScheduleError::InvalidOption {
                    field: field.id.clone(),
                    value: value.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Turn the form into a pending registration.
    ///
    /// `events` is the current list; the caller appends the result and saves.
    ///
    /// # Errors
    /// Unknown slot, a closed cell (Saturday, Friday after the first slot),
    /// an already-taken cell, or a validation failure.
    pub fn submit(self, settings: &AppSettings, events: &[CareEvent]) -> Result<CareEvent, ScheduleError> {
        if settings.slot(&self.slot_id).is_none() {
            return Err(ScheduleError::UnknownSlot(self.slot_id));
        }

        if !is_bookable(settings, self.date, &self.slot_id) {
            return Err(ScheduleError::Closed {
                date: self.date,
                slot_id: self.slot_id,
            });
        }

        if find_event(events, self.date, &self.slot_id).is_some() {
            return Err(ScheduleError::SlotTaken {
                date: self.date,
                slot_id: self.slot_id,
            });
        }

        self.validate(&settings.fields)?;

        let registration_data = self
            .data
            .into_iter()
            .map(|(k, v)| (k, v.trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        Ok(CareEvent {
            id: new_id(),
            slot_id: self.slot_id,
            date: self.date,
            status: EventStatus::Pending,
            registration_data,
            creator_id: PUBLIC_CREATOR.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn complete_form(date: NaiveDate, slot: &str) -> RegistrationForm {
        RegistrationForm::new(date, slot)
            .with("firstName", "Noa")
            .with("lastName", "Cohen")
            .with("phone", "050-0000000")
            .with("arrivalStatus", "סופי")
    }

    #[test]
    fn test_submit_creates_pending_event() {
        let settings = AppSettings::default();
        let event = complete_form(monday(), "s2")
            .with("notes", "  ")
            .submit(&settings, &[])
            .unwrap();

        assert_eq!(event.slot_id, "s2");
        assert_eq!(event.date, monday());
        assert_eq!(event.status, EventStatus::Pending);
        assert_eq!(event.creator_id, "public");
        assert_eq!(event.field("firstName"), Some("Noa"));
        assert!(event.field("notes").is_none());
        assert!(!event.id.is_empty());
    }

    #[test]
    fn test_missing_required_fields() {
        let settings = AppSettings::default();
        let form = RegistrationForm::new(monday(), "s1")
            .with("firstName", "Noa")
            .with("lastName", "");

        match form.submit(&settings, &[]) {
            Err(ScheduleError::MissingFields(missing)) => {
                assert_eq!(missing, vec!["lastName", "phone", "arrivalStatus"]);
            }
            other => panic!("expected missing fields, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        let settings = AppSettings::default();
        let form = complete_form(monday(), "s1");
        assert!(form.missing_required(&settings.fields).is_empty());
        assert!(form.validate(&settings.fields).is_ok());
    }

    #[test]
    fn test_select_value_must_be_an_option() {
        let settings = AppSettings::default();
        let form = complete_form(monday(), "s1").with("arrivalStatus", "maybe");
        assert!(matches!(
            form.validate(&settings.fields),
            Err(ScheduleError::InvalidOption { ref field, .. }) if field == "arrivalStatus"
        ));
    }

    #[test]
    fn test_taken_slot_is_rejected() {
        let settings = AppSettings::default();
        let first = complete_form(monday(), "s1").submit(&settings, &[]).unwrap();
        let events = vec![first];

        let second = complete_form(monday(), "s1").submit(&settings, &events);
        assert!(matches!(second, Err(ScheduleError::SlotTaken { .. })));

        let other_slot = complete_form(monday(), "s2").submit(&settings, &events);
        assert!(other_slot.is_ok());
    }

    #[test]
    fn test_weekend_cells_are_closed() {
        let settings = AppSettings::default();
        let friday = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();

        assert!(complete_form(friday, "s1").submit(&settings, &[]).is_ok());
        assert!(matches!(
            complete_form(friday, "s3").submit(&settings, &[]),
            Err(ScheduleError::Closed { .. })
        ));
        assert!(matches!(
            complete_form(saturday, "s1").submit(&settings, &[]),
            Err(ScheduleError::Closed { .. })
        ));
    }

    #[test]
    fn test_unknown_slot() {
        let settings = AppSettings::default();
        assert!(matches!(
            complete_form(monday(), "nope").submit(&settings, &[]),
            Err(ScheduleError::UnknownSlot(_))
        ));
    }
}
