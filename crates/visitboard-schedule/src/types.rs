//! Board data model.
//!
//! Field names follow the stored JSON documents (camelCase), so boards written
//! by other clients of the same bucket load unchanged.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Who a slot is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Escort,
    Visitor,
}

impl EventType {
    /// Hebrew role name shown on the board.
    pub fn role_label(self) -> &'static str {
        match self {
            Self::Escort => "מלווה",
            Self::Visitor => "מבקר",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EventStatus {
    Confirmed,
    #[default]
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Tel,
    Select,
    Textarea,
}

/// One input of the registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationField {
    pub id: String,
    pub label: String,
    pub is_required: bool,
    /// Shown on the public grid next to the registrant's name.
    pub is_public: bool,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// A recurring daily time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotDef {
    pub id: String,
    pub label: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type")]
    pub slot_type: EventType,
}

/// A registration of one person for one (date, slot) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareEvent {
    pub id: String,
    pub slot_id: String,
    pub date: NaiveDate,
    pub status: EventStatus,
    #[serde(default)]
    pub registration_data: BTreeMap<String, String>,
    pub creator_id: String,
}

impl CareEvent {
    pub fn field(&self, id: &str) -> Option<&str> {
        self.registration_data.get(id).map(String::as_str)
    }

    /// "first last", trimmed; empty when neither is set.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.field("firstName").unwrap_or_default(),
            self.field("lastName").unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoticeType {
    Safety,
    Escort,
    Visitor,
    #[default]
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppNotice {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub notice_type: NoticeType,
}

/// Community message shown when the board is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Advertisement {
    /// Link worth showing; `#` placeholders are hidden.
    pub fn visible_link(&self) -> Option<&str> {
        self.link
            .as_deref()
            .filter(|l| !l.trim().is_empty() && *l != "#")
    }
}

/// Everything the admin configures, stored as one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub coordinator_name: String,
    pub coordinator_phone: String,
    pub safety_note: String,
    pub system_note: String,
    pub friday_message: String,
    pub saturday_message: String,
    pub slots: Vec<TimeSlotDef>,
    pub fields: Vec<RegistrationField>,
    pub notices: Vec<AppNotice>,
    pub ads: Vec<Advertisement>,
}

impl AppSettings {
    pub fn slot(&self, id: &str) -> Option<&TimeSlotDef> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn slot_index(&self, id: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    pub fn field(&self, id: &str) -> Option<&RegistrationField> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// Fresh random identifier for new records.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let json = r#"{
            "id": "abc",
            "slotId": "s1",
            "date": "2025-03-02",
            "status": "Pending",
            "registrationData": {"firstName": "דנה", "lastName": "לוי"},
            "creatorId": "public"
        }"#;

        let event: CareEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.slot_id, "s1");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert_eq!(event.status, EventStatus::Pending);
        assert_eq!(event.display_name(), "דנה לוי");

        let out = serde_json::to_value(&event).unwrap();
        assert_eq!(out["slotId"], "s1");
        assert_eq!(out["date"], "2025-03-02");
        assert_eq!(out["creatorId"], "public");
    }

    #[test]
    fn test_field_type_names() {
        let field: RegistrationField = serde_json::from_str(
            r#"{"id":"arrival","label":"x","isRequired":true,"isPublic":false,"type":"select","options":["a","b"]}"#,
        )
        .unwrap();
        assert_eq!(field.field_type, FieldType::Select);
        assert_eq!(field.options.as_deref().map(<[String]>::len), Some(2));

        let out = serde_json::to_string(&RegistrationField {
            options: None,
            field_type: FieldType::Tel,
            ..field
        })
        .unwrap();
        assert!(out.contains(r#""type":"tel""#));
        assert!(!out.contains("options"));
    }

    #[test]
    fn test_partial_settings_fill_in_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"coordinatorName": "רבקה"}"#).unwrap();
        assert_eq!(settings.coordinator_name, "רבקה");
        assert_eq!(settings.slots.len(), AppSettings::default().slots.len());
    }

    #[test]
    fn test_ad_link_visibility() {
        let mut ad = Advertisement {
            id: "a".into(),
            title: "t".into(),
            description: "d".into(),
            link: Some("#".into()),
            image_url: None,
        };
        assert!(ad.visible_link().is_none());
        ad.link = Some("https://example.org".into());
        assert_eq!(ad.visible_link(), Some("https://example.org"));
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
