//! Admin edits over the settings document and the registrations list.
//!
//! Each edit is applied to an in-memory copy; the caller saves the whole
//! document afterwards.

use chrono::NaiveTime;

use crate::error::ScheduleError;
use crate::types::{
    new_id, Advertisement, AppNotice, AppSettings, CareEvent, EventStatus, EventType, NoticeType,
    RegistrationField, TimeSlotDef,
};

pub const NEW_SLOT_LABEL: &str = "משבצת חדשה";
pub const NEW_NOTICE_TEXT: &str = "הנחיה חדשה";
pub const NEW_AD_TITLE: &str = "פרסומת חדשה";
pub const NEW_AD_DESCRIPTION: &str = "תיאור הפרסומת";

/// Plaintext comparison against the configured admin password.
///
/// # Errors
/// `ScheduleError::Unauthorized` on mismatch.
pub fn check_password(expected: &str, given: &str) -> Result<(), ScheduleError> {
    if !expected.is_empty() && expected == given {
        Ok(())
    } else {
        Err(ScheduleError::Unauthorized)
    }
}

/// Free-text settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    CoordinatorName,
    CoordinatorPhone,
    SafetyNote,
    SystemNote,
    FridayMessage,
    SaturdayMessage,
}

impl TextKey {
    pub const ALL: [TextKey; 6] = [
        Self::CoordinatorName,
        Self::CoordinatorPhone,
        Self::SafetyNote,
        Self::SystemNote,
        Self::FridayMessage,
        Self::SaturdayMessage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CoordinatorName => "coordinator-name",
            Self::CoordinatorPhone => "coordinator-phone",
            Self::SafetyNote => "safety-note",
            Self::SystemNote => "system-note",
            Self::FridayMessage => "friday-message",
            Self::SaturdayMessage => "saturday-message",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    fn slot(self, settings: &mut AppSettings) -> &mut String {
        match self {
            Self::CoordinatorName => &mut settings.coordinator_name,
            Self::CoordinatorPhone => &mut settings.coordinator_phone,
            Self::SafetyNote => &mut settings.safety_note,
            Self::SystemNote => &mut settings.system_note,
            Self::FridayMessage => &mut settings.friday_message,
            Self::SaturdayMessage => &mut settings.saturday_message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEdit {
    AddSlot,
    UpdateSlot {
        id: String,
        label: Option<String>,
        start_time: Option<String>,
        end_time: Option<String>,
        slot_type: Option<EventType>,
    },
    RemoveSlot {
        id: String,
    },
    AddField(RegistrationField),
    RemoveField {
        id: String,
    },
    ToggleFieldRequired {
        id: String,
    },
    ToggleFieldPublic {
        id: String,
    },
    AddNotice,
    UpdateNotice {
        id: String,
        text: Option<String>,
        notice_type: Option<NoticeType>,
    },
    RemoveNotice {
        id: String,
    },
    AddAd,
    UpdateAd {
        id: String,
        title: Option<String>,
        description: Option<String>,
        link: Option<String>,
        image_url: Option<String>,
    },
    RemoveAd {
        id: String,
    },
    SetText {
        key: TextKey,
        value: String,
    },
}

fn check_time(value: &str) -> Result<(), ScheduleError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| ScheduleError::InvalidTime(value.to_string()))
}

fn remove_by<T>(items: &mut Vec<T>, kind: &'static str, id: &str, key: impl Fn(&T) -> &str) -> Result<(), ScheduleError> {
    let before = items.len();
    items.retain(|item| key(item) != id);
    if items.len() == before {
        Err(ScheduleError::not_found(kind, id))
    } else {
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SettingsEdit {
    /// Apply the edit to `settings`.
    ///
    /// Returns the id of the created item for the `Add*` edits.
    ///
    /// # Errors
    /// `NotFound` for unknown ids, `InvalidTime` for malformed slot times,
    /// `DuplicateField` when adding a field whose id is taken.
    pub fn apply(self, settings: &mut AppSettings) -> Result<Option<String>, ScheduleError> {
        match self {
            Self::AddSlot => {
                let id = new_id();
                settings.slots.push(TimeSlotDef {
                    id: id.clone(),
                    label: NEW_SLOT_LABEL.to_string(),
                    start_time: "00:00".to_string(),
                    end_time: "00:00".to_string(),
                    slot_type: EventType::Visitor,
                });
                Ok(Some(id))
            }
            Self::UpdateSlot {
                id,
                label,
                start_time,
                end_time,
                slot_type,
            } => {
                if let Some(t) = &start_time {
                    check_time(t)?;
                }
                if let Some(t) = &end_time {
                    check_time(t)?;
                }
                let slot = settings
                    .slots
                    .iter_mut()
                    .find(|s| s.id == id)
                    .ok_or_else(|| ScheduleError::not_found("Slot", &id))?;
                if let Some(label) = label {
                    slot.label = label;
                }
                if let Some(t) = start_time {
                    slot.start_time = t;
                }
                if let Some(t) = end_time {
                    slot.end_time = t;
                }
                if let Some(kind) = slot_type {
                    slot.slot_type = kind;
                }
                Ok(None)
            }
            Self::RemoveSlot { id } => {
                remove_by(&mut settings.slots, "Slot", &id, |s| s.id.as_str())?;
                Ok(None)
            }
            Self::AddField(field) => {
                if settings.field(&field.id).is_some() {
                    return Err(ScheduleError::DuplicateField(field.id));
                }
                let id = field.id.clone();
                settings.fields.push(field);
                Ok(Some(id))
            }
            Self::RemoveField { id } => {
                remove_by(&mut settings.fields, "Field", &id, |f| f.id.as_str())?;
                Ok(None)
            }
            Self::ToggleFieldRequired { id } => {
                let field = find_field(settings, &id)?;
                field.is_required = !field.is_required;
                Ok(None)
            }
            Self::ToggleFieldPublic { id } => {
                let field = find_field(settings, &id)?;
                field.is_public = !field.is_public;
                Ok(None)
            }
            Self::AddNotice => {
                let id = new_id();
                settings.notices.push(AppNotice {
                    id: id.clone(),
                    text: NEW_NOTICE_TEXT.to_string(),
                    notice_type: NoticeType::General,
                });
                Ok(Some(id))
            }
            Self::UpdateNotice {
                id,
                text,
                notice_type,
            } => {
                let notice = settings
                    .notices
                    .iter_mut()
                    .find(|n| n.id == id)
                    .ok_or_else(|| ScheduleError::not_found("Notice", &id))?;
                if let Some(text) = text {
                    notice.text = text;
                }
                if let Some(kind) = notice_type {
                    notice.notice_type = kind;
                }
                Ok(None)
            }
            Self::RemoveNotice { id } => {
                remove_by(&mut settings.notices, "Notice", &id, |n| n.id.as_str())?;
                Ok(None)
            }
            Self::AddAd => {
                let id = new_id();
                settings.ads.push(Advertisement {
                    id: id.clone(),
                    title: NEW_AD_TITLE.to_string(),
                    description: NEW_AD_DESCRIPTION.to_string(),
                    link: None,
                    image_url: None,
                });
                Ok(Some(id))
            }
            Self::UpdateAd {
                id,
                title,
                description,
                link,
                image_url,
            } => {
                let ad = settings
                    .ads
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or_else(|| ScheduleError::not_found("Ad", &id))?;
                if let Some(title) = title {
                    ad.title = title;
                }
                if let Some(description) = description {
                    ad.description = description;
                }
                // An empty string clears the optional parts.
                if let Some(link) = link {
                    ad.link = non_empty(Some(link));
                }
                if let Some(image_url) = image_url {
                    ad.image_url = non_empty(Some(image_url));
                }
                Ok(None)
            }
            Self::RemoveAd { id } => {
                remove_by(&mut settings.ads, "Ad", &id, |a| a.id.as_str())?;
                Ok(None)
            }
            Self::SetText { key, value } => {
                *key.slot(settings) = value;
                Ok(None)
            }
        }
    }
}

fn find_field<'a>(settings: &'a mut AppSettings, id: &str) -> Result<&'a mut RegistrationField, ScheduleError> {
    settings
        .fields
        .iter_mut()
        .find(|f| f.id == id)
        .ok_or_else(|| ScheduleError::not_found("Field", id))
}

/// Registrations, newest date first.
pub fn events_by_date_desc(events: &[CareEvent]) -> Vec<&CareEvent> {
    let mut sorted: Vec<&CareEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

/// # Errors
/// `NotFound` if no registration has `id`.
pub fn delete_event(events: &mut Vec<CareEvent>, id: &str) -> Result<CareEvent, ScheduleError> {
    let idx = events
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| ScheduleError::not_found("Registration", id))?;
    Ok(events.remove(idx))
}

/// # Errors
/// `NotFound` if no registration has `id`.
pub fn set_status(events: &mut [CareEvent], id: &str, status: EventStatus) -> Result<(), ScheduleError> {
    let event = events
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| ScheduleError::not_found("Registration", id))?;
    event.status = status;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn event(id: &str, day: u32) -> CareEvent {
        CareEvent {
            id: id.to_string(),
            slot_id: "s1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            status: EventStatus::Pending,
            registration_data: BTreeMap::new(),
            creator_id: "public".to_string(),
        }
    }

    #[test]
    fn test_password_check() {
        assert!(check_password("2020", "2020").is_ok());
        assert!(matches!(check_password("2020", "2021"), Err(ScheduleError::Unauthorized)));
        assert!(check_password("", "").is_err());
    }

    #[test]
    fn test_add_update_remove_slot() {
        let mut settings = AppSettings::default();
        let id = SettingsEdit::AddSlot.apply(&mut settings).unwrap().unwrap();
        let slot = settings.slot(&id).unwrap();
        assert_eq!(slot.label, NEW_SLOT_LABEL);
        assert_eq!(slot.slot_type, EventType::Visitor);
        assert_eq!(settings.slots.len(), 6);

        SettingsEdit::UpdateSlot {
            id: id.clone(),
            label: Some("לילה".into()),
            start_time: Some("22:00".into()),
            end_time: Some("23:30".into()),
            slot_type: Some(EventType::Escort),
        }
        .apply(&mut settings)
        .unwrap();
        let slot = settings.slot(&id).unwrap();
        assert_eq!(slot.label, "לילה");
        assert_eq!(slot.end_time, "23:30");
        assert_eq!(slot.slot_type, EventType::Escort);

        SettingsEdit::RemoveSlot { id: id.clone() }.apply(&mut settings).unwrap();
        assert!(settings.slot(&id).is_none());
        assert!(matches!(
            SettingsEdit::RemoveSlot { id }.apply(&mut settings),
            Err(ScheduleError::NotFound { .. })
        ));
    }

    #[test]
    fn test_slot_time_validation() {
        let mut settings = AppSettings::default();
        let result = SettingsEdit::UpdateSlot {
            id: "s1".into(),
            label: None,
            start_time: Some("9am".into()),
            end_time: None,
            slot_type: None,
        }
        .apply(&mut settings);
        assert!(matches!(result, Err(ScheduleError::InvalidTime(_))));
        assert_eq!(settings.slots[0].start_time, "09:00");
    }

    #[test]
    fn test_toggle_field_flags() {
        let mut settings = AppSettings::default();
        SettingsEdit::ToggleFieldRequired { id: "phone".into() }
            .apply(&mut settings)
            .unwrap();
        SettingsEdit::ToggleFieldPublic { id: "phone".into() }
            .apply(&mut settings)
            .unwrap();
        let phone = settings.field("phone").unwrap();
        assert!(!phone.is_required);
        assert!(phone.is_public);
    }

    #[test]
    fn test_add_duplicate_field() {
        let mut settings = AppSettings::default();
        let field = RegistrationField {
            id: "phone".into(),
            label: "x".into(),
            is_required: false,
            is_public: false,
            field_type: FieldType::Text,
            options: None,
        };
        assert!(matches!(
            SettingsEdit::AddField(field).apply(&mut settings),
            Err(ScheduleError::DuplicateField(_))
        ));
    }

    #[test]
    fn test_notices_and_ads() {
        let mut settings = AppSettings::default();
        let notice_id = SettingsEdit::AddNotice.apply(&mut settings).unwrap().unwrap();
        SettingsEdit::UpdateNotice {
            id: notice_id.clone(),
            text: Some("שימו לב".into()),
            notice_type: Some(NoticeType::Visitor),
        }
        .apply(&mut settings)
        .unwrap();
        let notice = settings.notices.iter().find(|n| n.id == notice_id).unwrap();
        assert_eq!(notice.notice_type, NoticeType::Visitor);

        let ad_id = SettingsEdit::AddAd.apply(&mut settings).unwrap().unwrap();
        SettingsEdit::UpdateAd {
            id: ad_id.clone(),
            title: None,
            description: None,
            link: Some("https://example.org".into()),
            image_url: Some(String::new()),
        }
        .apply(&mut settings)
        .unwrap();
        let ad = settings.ads.iter().find(|a| a.id == ad_id).unwrap();
        assert_eq!(ad.title, NEW_AD_TITLE);
        assert_eq!(ad.link.as_deref(), Some("https://example.org"));
        assert!(ad.image_url.is_none());

        SettingsEdit::RemoveAd { id: ad_id }.apply(&mut settings).unwrap();
        SettingsEdit::RemoveNotice { id: notice_id }.apply(&mut settings).unwrap();
        assert_eq!(settings.ads.len(), 1);
        assert_eq!(settings.notices.len(), 2);
    }

    #[test]
    fn test_set_text() {
        let mut settings = AppSettings::default();
        SettingsEdit::SetText {
            key: TextKey::FridayMessage,
            value: "שבת שלום".into(),
        }
        .apply(&mut settings)
        .unwrap();
        assert_eq!(settings.friday_message, "שבת שלום");
        assert_eq!(TextKey::parse("friday-message"), Some(TextKey::FridayMessage));
        assert_eq!(TextKey::parse("nope"), None);
    }

    #[test]
    fn test_event_admin() {
        let mut events = vec![event("a", 3), event("b", 9), event("c", 5)];
        let order: Vec<_> = events_by_date_desc(&events).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);

        set_status(&mut events, "c", EventStatus::Confirmed).unwrap();
        assert_eq!(events[2].status, EventStatus::Confirmed);

        let removed = delete_event(&mut events, "a").unwrap();
        assert_eq!(removed.id, "a");
        assert_eq!(events.len(), 2);
        assert!(delete_event(&mut events, "a").is_err());
    }
}
