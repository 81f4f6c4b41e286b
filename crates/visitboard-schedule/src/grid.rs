//! The public week grid: one row per slot, one column per day.

use chrono::NaiveDate;

use crate::types::{AppSettings, CareEvent, RegistrationField, TimeSlotDef};
use crate::week::{DayKind, WeekRange};

/// First registration for `(date, slot_id)`, by linear scan.
pub fn find_event<'a>(events: &'a [CareEvent], date: NaiveDate, slot_id: &str) -> Option<&'a CareEvent> {
    events.iter().find(|e| e.date == date && e.slot_id == slot_id)
}

/// What a (day, slot row) position shows, before looking at registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRule {
    Bookable,
    /// Saturday message, spanning `rows` rows from here.
    SaturdayNotice { rows: usize },
    /// Friday message, spanning `rows` rows from here.
    FridayNotice { rows: usize },
    /// Hidden under a notice above it.
    Covered,
}

impl CellRule {
    pub fn for_position(date: NaiveDate, slot_index: usize, slot_count: usize) -> Self {
        match DayKind::of(date) {
            DayKind::Regular => Self::Bookable,
            DayKind::Saturday if slot_index == 0 => Self::SaturdayNotice { rows: slot_count },
            DayKind::Saturday => Self::Covered,
            DayKind::Friday if slot_index == 0 => Self::Bookable,
            DayKind::Friday if slot_index == 1 => Self::FridayNotice {
                rows: slot_count.saturating_sub(1),
            },
            DayKind::Friday => Self::Covered,
        }
    }

    pub fn is_bookable(self) -> bool {
        matches!(self, Self::Bookable)
    }
}

/// Whether registrations are accepted for `slot_id` on `date`.
pub fn is_bookable(settings: &AppSettings, date: NaiveDate, slot_id: &str) -> bool {
    settings
        .slot_index(slot_id)
        .map(|idx| CellRule::for_position(date, idx, settings.slots.len()).is_bookable())
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell<'a> {
    Open,
    Occupied(&'a CareEvent),
    SaturdayNotice { rows: usize },
    FridayNotice { rows: usize },
    Covered,
}

#[derive(Debug, Clone)]
pub struct GridRow<'a> {
    pub slot: &'a TimeSlotDef,
    pub cells: Vec<(NaiveDate, Cell<'a>)>,
}

#[derive(Debug, Clone)]
pub struct WeekGrid<'a> {
    pub week: WeekRange,
    pub rows: Vec<GridRow<'a>>,
}

impl<'a> WeekGrid<'a> {
    pub fn build(week: WeekRange, settings: &'a AppSettings, events: &'a [CareEvent]) -> Self {
        let dates = week.dates();
        let slot_count = settings.slots.len();

        let rows = settings
            .slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| {
                let cells = dates
                    .iter()
                    .map(|&date| {
                        let cell = match CellRule::for_position(date, idx, slot_count) {
                            CellRule::Bookable => match find_event(events, date, &slot.id) {
                                Some(event) => Cell::Occupied(event),
                                None => Cell::Open,
                            },
                            CellRule::SaturdayNotice { rows } => Cell::SaturdayNotice { rows },
                            CellRule::FridayNotice { rows } => Cell::FridayNotice { rows },
                            CellRule::Covered => Cell::Covered,
                        };
                        (date, cell)
                    })
                    .collect();
                GridRow { slot, cells }
            })
            .collect();

        Self { week, rows }
    }

    pub fn cell(&self, date: NaiveDate, slot_id: &str) -> Option<&Cell<'a>> {
        let col = self.week.day_index(date)?;
        let row = self.rows.iter().find(|r| r.slot.id == slot_id)?;
        row.cells.get(col).map(|(_, cell)| cell)
    }

    pub fn open_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .filter(|(_, c)| matches!(c, Cell::Open))
            .count()
    }

    pub fn occupied_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .filter(|(_, c)| matches!(c, Cell::Occupied(_)))
            .count()
    }
}

/// What the public sees for a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicSummary {
    pub name: String,
    /// Values of public fields other than the name fields, in form order.
    pub details: Vec<String>,
}

impl PublicSummary {
    pub fn of(event: &CareEvent, fields: &[RegistrationField]) -> Self {
        let details = fields
            .iter()
            .filter(|f| f.is_public && f.id != "firstName" && f.id != "lastName")
            .filter_map(|f| event.field(&f.id))
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
            .collect();

        Self {
            name: event.display_name(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventStatus;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(id: &str, date: NaiveDate, slot: &str) -> CareEvent {
        let mut data = BTreeMap::new();
        data.insert("firstName".to_string(), "Noa".to_string());
        data.insert("lastName".to_string(), "Cohen".to_string());
        data.insert("phone".to_string(), "050".to_string());
        data.insert("relation".to_string(), "granddaughter".to_string());
        CareEvent {
            id: id.to_string(),
            slot_id: slot.to_string(),
            date,
            status: EventStatus::Pending,
            registration_data: data,
            creator_id: "public".to_string(),
        }
    }

    #[test]
    fn test_find_event_exact_match_only() {
        let events = vec![event("a", date(2025, 3, 2), "s1"), event("b", date(2025, 3, 2), "s2")];
        assert_eq!(find_event(&events, date(2025, 3, 2), "s2").map(|e| e.id.as_str()), Some("b"));
        assert!(find_event(&events, date(2025, 3, 3), "s1").is_none());
        assert!(find_event(&events, date(2025, 3, 2), "s3").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let events = vec![event("a", date(2025, 3, 2), "s1"), event("b", date(2025, 3, 2), "s1")];
        assert_eq!(find_event(&events, date(2025, 3, 2), "s1").map(|e| e.id.as_str()), Some("a"));
    }

    #[test]
    fn test_weekend_rules() {
        let friday = date(2025, 3, 7);
        let saturday = date(2025, 3, 8);

        assert_eq!(CellRule::for_position(friday, 0, 5), CellRule::Bookable);
        assert_eq!(CellRule::for_position(friday, 1, 5), CellRule::FridayNotice { rows: 4 });
        assert_eq!(CellRule::for_position(friday, 4, 5), CellRule::Covered);

        assert_eq!(CellRule::for_position(saturday, 0, 5), CellRule::SaturdayNotice { rows: 5 });
        assert_eq!(CellRule::for_position(saturday, 3, 5), CellRule::Covered);

        assert_eq!(CellRule::for_position(date(2025, 3, 4), 3, 5), CellRule::Bookable);
    }

    #[test]
    fn test_is_bookable() {
        let settings = AppSettings::default();
        assert!(is_bookable(&settings, date(2025, 3, 7), "s1"));
        assert!(!is_bookable(&settings, date(2025, 3, 7), "s2"));
        assert!(!is_bookable(&settings, date(2025, 3, 8), "s1"));
        assert!(is_bookable(&settings, date(2025, 3, 3), "s5"));
        assert!(!is_bookable(&settings, date(2025, 3, 3), "missing"));
    }

    #[test]
    fn test_grid_layout() {
        let settings = AppSettings::default();
        let week = WeekRange::containing(date(2025, 3, 4), 0);
        let events = vec![
            event("a", date(2025, 3, 3), "s2"),
            // outside the week
            event("b", date(2025, 3, 10), "s2"),
        ];

        let grid = WeekGrid::build(week, &settings, &events);
        assert_eq!(grid.rows.len(), 5);
        assert!(grid.rows.iter().all(|r| r.cells.len() == 7));

        assert!(matches!(grid.cell(date(2025, 3, 3), "s2"), Some(Cell::Occupied(e)) if e.id == "a"));
        assert_eq!(grid.cell(date(2025, 3, 3), "s1"), Some(&Cell::Open));
        assert_eq!(grid.cell(date(2025, 3, 8), "s1"), Some(&Cell::SaturdayNotice { rows: 5 }));
        assert_eq!(grid.cell(date(2025, 3, 7), "s2"), Some(&Cell::FridayNotice { rows: 4 }));
        assert_eq!(grid.cell(date(2025, 3, 7), "s3"), Some(&Cell::Covered));

        // 5 weekdays * 5 slots + Friday's first slot, minus one registration
        assert_eq!(grid.occupied_count(), 1);
        assert_eq!(grid.open_count(), 25);
    }

    #[test]
    fn test_event_on_blocked_cell_is_not_shown() {
        let settings = AppSettings::default();
        let week = WeekRange::containing(date(2025, 3, 4), 0);
        let events = vec![event("a", date(2025, 3, 8), "s1")];

        let grid = WeekGrid::build(week, &settings, &events);
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_public_summary_hides_private_fields() {
        let settings = AppSettings::default();
        let summary = PublicSummary::of(&event("a", date(2025, 3, 3), "s1"), &settings.fields);
        assert_eq!(summary.name, "Noa Cohen");
        assert_eq!(summary.details, vec!["granddaughter".to_string()]);
    }
}
