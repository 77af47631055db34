//! CSV export of one week's schedule.
//!
//! The output opens cleanly in spreadsheet applications: it starts with a
//! UTF-8 byte order mark and has one column per weekday.

use crate::models::{DaySlot, Duty, Roster, Schedule};
use crate::week::{format_short, WeekKey};

const BOM: char = '\u{feff}';

/// Renders `schedule` as CSV, labelling participants through `roster`.
pub fn to_csv(week: WeekKey, schedule: &Schedule, roster: &Roster) -> String {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(5);

    let mut header = vec![String::new()];
    header.extend(
        DaySlot::ALL
            .iter()
            .map(|day| format!("{}({})", day, format_short(Some(week.day(*day))))),
    );
    rows.push(header);

    for (duty, title, note_title) in [
        (Duty::Morning, "Morning (drop-off)", "Morning note"),
        (Duty::Evening, "Evening (pick-up)", "Evening note"),
    ] {
        let mut who = vec![title.to_string()];
        let mut notes = vec![note_title.to_string()];
        for (_, day) in schedule.iter() {
            who.push(roster.label(day.assignee(duty)).to_string());
            notes.push(day.note(duty).unwrap_or_default().to_string());
        }
        rows.push(who);
        rows.push(notes);
    }

    let body = rows
        .iter()
        .map(|row| row.iter().map(|cell| escape(cell)).collect::<Vec<_>>().join(","))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}{}", BOM, body)
}

/// Default download name for a week's export.
pub fn default_file_name(week: WeekKey) -> String {
    format!("pickup_{}.csv", week)
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
