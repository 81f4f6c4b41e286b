//! Sunday-first weeks, the way the board is laid out.

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

/// Day names, Sunday first.
pub const DAY_NAMES: [&str; 7] = ["ראשון", "שני", "שלישי", "רביעי", "חמישי", "שישי", "שבת"];

/// How a weekday is treated on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    Regular,
    /// Only the first slot of the day is open.
    Friday,
    /// No visits.
    Saturday,
}

impl DayKind {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            _ => Self::Regular,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    start: NaiveDate,
}

impl WeekRange {
    /// The week containing `today`, shifted by `offset` weeks.
    pub fn containing(today: NaiveDate, offset: i32) -> Self {
        let back = i64::from(today.weekday().num_days_from_sunday());
        let start = today - Duration::days(back) + Duration::weeks(i64::from(offset));
        Self { start }
    }

    /// Week relative to the local current date.
    pub fn current(offset: i32) -> Self {
        Self::containing(Local::now().date_naive(), offset)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(6)
    }

    pub fn dates(&self) -> [NaiveDate; 7] {
        std::array::from_fn(|i| self.start + Duration::days(i as i64))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }

    /// Column of `date`, Sunday = 0.
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        self.contains(date)
            .then(|| (date - self.start).num_days() as usize)
    }

    pub fn next(&self) -> Self {
        Self {
            start: self.start + Duration::weeks(1),
        }
    }

    pub fn previous(&self) -> Self {
        Self {
            start: self.start - Duration::weeks(1),
        }
    }

    /// Short "d.m - d.m" label for the header.
    pub fn label(&self) -> String {
        format!(
            "{}.{} - {}.{}",
            self.start.day(),
            self.start.month(),
            self.end().day(),
            self.end().month()
        )
    }
}
