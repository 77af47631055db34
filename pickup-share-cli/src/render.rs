//! Text and JSON views of a week.

use pickup_share_core::{
    format_short, Assignee, DaySlot, Duty, EngineState, Roster, Schedule, WeekKey,
};
use serde::Serialize;

const FIRST_COLUMN: usize = 10;
const MIN_COLUMN: usize = 9;

/// Renders the schedule as a table with one column per weekday.
pub fn week_table(week: WeekKey, schedule: &Schedule, roster: &Roster) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();

    let mut header = vec![String::new()];
    header.extend(
        DaySlot::ALL
            .iter()
            .map(|day| format!("{} {}", day, format_short(Some(week.day(*day))))),
    );
    rows.push(header);

    for (duty, title) in [(Duty::Morning, "Drop-off"), (Duty::Evening, "Pick-up")] {
        let mut who = vec![title.to_string()];
        let mut notes = vec!["  note".to_string()];
        for (_, day) in schedule.iter() {
            who.push(roster.label(day.assignee(duty)).to_string());
            notes.push(day.note(duty).unwrap_or_default().replace('\n', " "));
        }
        rows.push(who);
        if notes.iter().skip(1).any(|n| !n.is_empty()) {
            rows.push(notes);
        }
    }

    let widths: Vec<usize> = (0..=DaySlot::ALL.len())
        .map(|col| {
            let floor = if col == 0 { FIRST_COLUMN } else { MIN_COLUMN };
            rows.iter()
                .map(|row| row[col].chars().count())
                .max()
                .unwrap_or(0)
                .max(floor)
        })
        .collect();

    let mut out = format!("Week of {}\n\n", week);
    for row in &rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&totals_line(schedule, roster));
    out
}

/// `Totals: Mom 3, Dad 2, C 0, D 1, Unassigned 4`
pub fn totals_line(schedule: &Schedule, roster: &Roster) -> String {
    let totals = schedule.totals();
    let parts: Vec<String> = Assignee::PARTICIPANTS
        .iter()
        .chain(std::iter::once(&Assignee::Unassigned))
        .map(|a| format!("{} {}", roster.label(*a), totals.count(*a)))
        .collect();
    format!("Totals: {}", parts.join(", "))
}

/// One-line status for interactive sessions.
pub fn status_line(state: &EngineState) -> String {
    let mut flags = Vec::new();
    if !state.loaded {
        flags.push("loading");
    }
    if state.write_pending {
        flags.push("saving");
    }
    if state.can_undo {
        flags.push("undo");
    }
    if state.can_redo {
        flags.push("redo");
    }
    if flags.is_empty() {
        "[synced]".to_string()
    } else {
        format!("[{}]", flags.join("] ["))
    }
}

#[derive(Serialize)]
struct WeekView<'a> {
    room: &'a str,
    week: WeekKey,
    dates: Vec<String>,
    schedule: &'a Schedule,
    totals: Vec<TotalView<'a>>,
}

#[derive(Serialize)]
struct TotalView<'a> {
    assignee: Assignee,
    label: &'a str,
    count: usize,
}

/// Machine-readable view of a week, with dates and totals alongside the
/// stored document.
pub fn week_json(
    room: &str,
    week: WeekKey,
    schedule: &Schedule,
    roster: &Roster,
) -> serde_json::Result<String> {
    let totals = schedule.totals();
    let view = WeekView {
        room,
        week,
        dates: week.weekdays().iter().map(|d| d.to_string()).collect(),
        schedule,
        totals: Assignee::ALL
            .iter()
            .map(|a| TotalView {
                assignee: *a,
                label: roster.label(*a),
                count: totals.count(*a),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&view)
}
