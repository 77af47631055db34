//! Week arithmetic.
//!
//! Every schedule belongs to a week, and a week is identified by its Monday.
//! Weeks start on Monday; Sunday is the last day of the week it belongs to.

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::DaySlot;

/// Errors produced when parsing a week from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekKeyError {
    #[error("Invalid date '{0}'. Use YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Date '{0}' is out of range.")]
    OutOfRange(String),
}

/// A week, identified by the Monday it starts on.
///
/// The canonical text form is the ISO date of that Monday (`2024-06-03`).
/// Parsing accepts any date and normalizes it to its Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    /// The week that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self(monday_of(date))
    }

    /// The week that contains today's local date.
    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    pub fn monday(&self) -> NaiveDate {
        self.0
    }

    /// Monday through Friday of this week.
    pub fn weekdays(&self) -> [NaiveDate; 5] {
        weekdays_of(*self)
    }

    /// Calendar date of one weekday in this week.
    pub fn day(&self, slot: DaySlot) -> NaiveDate {
        self.0 + Duration::days(slot.index() as i64)
    }

    /// The week `weeks` weeks later (or earlier, when negative), or `None`
    /// past the end of the calendar.
    pub fn offset_weeks(&self, weeks: i64) -> Option<Self> {
        let monday = self.0.checked_add_signed(Duration::try_weeks(weeks)?)?;
        fits_whole_week(monday).then_some(Self(monday))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for WeekKey {
    type Err = WeekKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| WeekKeyError::InvalidDate(s.to_string()))?;
        if !fits_whole_week(date) {
            return Err(WeekKeyError::OutOfRange(s.to_string()));
        }
        Ok(Self::containing(date))
    }
}

impl TryFrom<String> for WeekKey {
    type Error = WeekKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekKey> for String {
    fn from(week: WeekKey) -> Self {
        week.to_string()
    }
}

/// The Monday on or before `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    // number_from_monday: Monday = 1 .. Sunday = 7
    let back = date.weekday().number_from_monday() as i64 - 1;
    date - Duration::days(back)
}

/// Whether every day of the week around `date` is representable.
fn fits_whole_week(date: NaiveDate) -> bool {
    date.checked_sub_signed(Duration::days(6)).is_some()
        && date.checked_add_signed(Duration::days(6)).is_some()
}

/// Monday through Friday of `week`, in calendar order.
pub fn weekdays_of(week: WeekKey) -> [NaiveDate; 5] {
    let monday = week.monday();
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}

/// Short month/day form (`6/3`), or `--/--` when the date isn't known yet.
pub fn format_short(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => format!("{}/{}", d.month(), d.day()),
        None => "--/--".to_string(),
    }
}
