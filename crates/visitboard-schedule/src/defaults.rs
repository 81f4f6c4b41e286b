//! Settings a fresh board starts with.

use crate::types::{
    Advertisement, AppNotice, AppSettings, EventType, FieldType, NoticeType, RegistrationField,
    TimeSlotDef,
};

pub const DEFAULT_COORDINATOR_NAME: &str = "פדר רבקי";
pub const DEFAULT_COORDINATOR_PHONE: &str = "052-7626549";
pub const DEFAULT_SAFETY_NOTE: &str = "חשוב מאד ביציאה לשים לב שהלחצן מצוקה בהשג ידה!";
pub const DEFAULT_SYSTEM_NOTE: &str =
    "העדכון בטבלה חשוב ביותר כדי למנוע עומסים ואי נעימויות מצד אחד, וחוסר מבקרים מהצד השני.";
pub const DEFAULT_FRIDAY_MESSAGE: &str = "לאחר משמרת הבוקר - זמן התארגנות לשבת.";
pub const DEFAULT_SATURDAY_MESSAGE: &str = "שבת שלום! אין ביקורים ביום זה.";
pub const ESCORT_GUIDELINE: &str =
    "מלווה יחיד אחראי/ת להיות לצד רוחי ולדאוג לכל צרכיה ולהיות בשטח עם המבקרים שיגיעו.";

fn slot(id: &str, label: &str, start: &str, end: &str, slot_type: EventType) -> TimeSlotDef {
    TimeSlotDef {
        id: id.to_string(),
        label: label.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        slot_type,
    }
}

fn field(id: &str, label: &str, required: bool, public: bool, field_type: FieldType) -> RegistrationField {
    RegistrationField {
        id: id.to_string(),
        label: label.to_string(),
        is_required: required,
        is_public: public,
        field_type,
        options: None,
    }
}

pub fn default_slots() -> Vec<TimeSlotDef> {
    vec![
        slot("s1", "בוקר", "09:00", "14:00", EventType::Escort),
        slot("s2", "צהריים", "14:00", "16:00", EventType::Visitor),
        slot("s3", "ערב (ליווי)", "16:00", "22:00", EventType::Escort),
        slot("s4", "ערב 1 (ביקור)", "16:00", "19:00", EventType::Visitor),
        slot("s5", "ערב 2 (ביקור)", "19:00", "22:00", EventType::Visitor),
    ]
}

pub fn default_fields() -> Vec<RegistrationField> {
    let mut arrival = field("arrivalStatus", "האם ההגעה סופית?", true, true, FieldType::Select);
    arrival.options = Some(vec!["סופי".to_string(), "ייתכנו שינויים".to_string()]);

    vec![
        field("firstName", "שם פרטי", true, true, FieldType::Text),
        field("lastName", "שם משפחה", true, true, FieldType::Text),
        field("phone", "טלפון", true, false, FieldType::Tel),
        field("relation", "קרבה", false, true, FieldType::Text),
        arrival,
        field("notes", "הערות", false, false, FieldType::Textarea),
    ]
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            coordinator_name: DEFAULT_COORDINATOR_NAME.to_string(),
            coordinator_phone: DEFAULT_COORDINATOR_PHONE.to_string(),
            safety_note: DEFAULT_SAFETY_NOTE.to_string(),
            system_note: DEFAULT_SYSTEM_NOTE.to_string(),
            friday_message: DEFAULT_FRIDAY_MESSAGE.to_string(),
            saturday_message: DEFAULT_SATURDAY_MESSAGE.to_string(),
            slots: default_slots(),
            fields: default_fields(),
            notices: vec![
                AppNotice {
                    id: "n1".to_string(),
                    text: ESCORT_GUIDELINE.to_string(),
                    notice_type: NoticeType::Escort,
                },
                AppNotice {
                    id: "n2".to_string(),
                    text: DEFAULT_SAFETY_NOTE.to_string(),
                    notice_type: NoticeType::Safety,
                },
            ],
            ads: vec![Advertisement {
                id: "a1".to_string(),
                title: "תודה לתומכים".to_string(),
                description: "כאן ניתן לפרסם הודעות תודה או פרסומות של הקהילה.".to_string(),
                link: Some("#".to_string()),
                image_url: None,
            }],
        }
    }
}
