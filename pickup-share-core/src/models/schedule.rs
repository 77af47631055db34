use serde::{Deserialize, Serialize};
use std::fmt;

use super::assignee::Assignee;
use super::day::{DaySlot, Duty};

/// Who covers one weekday, with optional free-text notes per duty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayAssignment {
    #[serde(alias = "morning")]
    pub morning_assignee: Assignee,
    #[serde(alias = "evening")]
    pub evening_assignee: Assignee,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morning_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evening_note: Option<String>,
}

impl DayAssignment {
    pub fn assignee(&self, duty: Duty) -> Assignee {
        match duty {
            Duty::Morning => self.morning_assignee,
            Duty::Evening => self.evening_assignee,
        }
    }

    pub fn note(&self, duty: Duty) -> Option<&str> {
        match duty {
            Duty::Morning => self.morning_note.as_deref(),
            Duty::Evening => self.evening_note.as_deref(),
        }
    }

    pub fn set_assignee(&mut self, duty: Duty, assignee: Assignee) {
        match duty {
            Duty::Morning => self.morning_assignee = assignee,
            Duty::Evening => self.evening_assignee = assignee,
        }
    }

    /// Sets a note; an empty note clears it.
    pub fn set_note(&mut self, duty: Duty, note: impl Into<String>) {
        let note = note.into();
        let note = if note.is_empty() { None } else { Some(note) };
        match duty {
            Duty::Morning => self.morning_note = note,
            Duty::Evening => self.evening_note = note,
        }
    }
}

/// A single change a person makes to a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Assign {
        day: DaySlot,
        duty: Duty,
        assignee: Assignee,
    },
    Note {
        day: DaySlot,
        duty: Duty,
        text: String,
    },
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Assign {
                day,
                duty,
                assignee,
            } => write!(f, "{} {} -> {}", day, duty, assignee),
            Edit::Note { day, duty, text } if text.is_empty() => {
                write!(f, "{} {} note cleared", day, duty)
            }
            Edit::Note { day, duty, text } => write!(f, "{} {} note: {}", day, duty, text),
        }
    }
}

/// One week of assignments: always exactly one entry per weekday.
///
/// On the wire a schedule is a map from weekday label (`Mon`..`Fri`) to a
/// [`DayAssignment`]. Weekdays missing from an incoming document come back
/// unassigned; all five are always written.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ScheduleDocument", into = "ScheduleDocument")]
pub struct Schedule {
    days: [DayAssignment; 5],
}

impl Schedule {
    pub fn day(&self, day: DaySlot) -> &DayAssignment {
        &self.days[day.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (DaySlot, &DayAssignment)> {
        DaySlot::ALL.into_iter().zip(self.days.iter())
    }

    /// Returns a copy of this schedule with `edit` applied.
    pub fn apply(&self, edit: &Edit) -> Schedule {
        let mut next = self.clone();
        match edit {
            Edit::Assign {
                day,
                duty,
                assignee,
            } => next.days[day.index()].set_assignee(*duty, *assignee),
            Edit::Note { day, duty, text } => {
                next.days[day.index()].set_note(*duty, text.as_str())
            }
        }
        next
    }

    pub fn with_assignee(&self, day: DaySlot, duty: Duty, assignee: Assignee) -> Schedule {
        self.apply(&Edit::Assign {
            day,
            duty,
            assignee,
        })
    }

    pub fn with_note(&self, day: DaySlot, duty: Duty, text: impl Into<String>) -> Schedule {
        self.apply(&Edit::Note {
            day,
            duty,
            text: text.into(),
        })
    }

    pub fn totals(&self) -> Totals {
        let mut counts = [0; 5];
        for day in &self.days {
            for duty in Duty::ALL {
                counts[day.assignee(duty).index()] += 1;
            }
        }
        Totals { counts }
    }
}

/// How many duties each assignee holds in a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    counts: [usize; 5],
}

impl Totals {
    pub fn count(&self, assignee: Assignee) -> usize {
        self.counts[assignee.index()]
    }
}

/// Wire shape of a schedule: named weekday fields, all optional on read.
#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct ScheduleDocument {
    #[serde(rename = "Mon", alias = "月")]
    mon: Option<DayAssignment>,
    #[serde(rename = "Tue", alias = "火")]
    tue: Option<DayAssignment>,
    #[serde(rename = "Wed", alias = "水")]
    wed: Option<DayAssignment>,
    #[serde(rename = "Thu", alias = "木")]
    thu: Option<DayAssignment>,
    #[serde(rename = "Fri", alias = "金")]
    fri: Option<DayAssignment>,
}

impl From<ScheduleDocument> for Schedule {
    fn from(doc: ScheduleDocument) -> Self {
        Self {
            days: [doc.mon, doc.tue, doc.wed, doc.thu, doc.fri].map(Option::unwrap_or_default),
        }
    }
}

impl From<Schedule> for ScheduleDocument {
    fn from(schedule: Schedule) -> Self {
        let [mon, tue, wed, thu, fri] = schedule.days.map(Some);
        Self {
            mon,
            tue,
            wed,
            thu,
            fri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_schedule_is_unassigned() {
        let schedule = Schedule::default();
        assert_eq!(schedule.iter().count(), 5);
        for (_, day) in schedule.iter() {
            assert_eq!(day.morning_assignee, Assignee::Unassigned);
            assert_eq!(day.evening_assignee, Assignee::Unassigned);
            assert!(day.morning_note.is_none());
            assert!(day.evening_note.is_none());
        }
    }

    #[test]
    fn test_with_assignee_changes_only_that_cell() {
        let before = Schedule::default();
        let after = before.with_assignee(DaySlot::Mon, Duty::Morning, Assignee::B);

        assert_eq!(after.day(DaySlot::Mon).morning_assignee, Assignee::B);
        assert_eq!(
            after.day(DaySlot::Mon).evening_assignee,
            Assignee::Unassigned
        );
        for day in [DaySlot::Tue, DaySlot::Wed, DaySlot::Thu, DaySlot::Fri] {
            assert_eq!(after.day(day), before.day(day));
        }
        // the original is untouched
        assert_eq!(before, Schedule::default());
    }

    #[test]
    fn test_with_note_and_clear() {
        let schedule = Schedule::default().with_note(DaySlot::Wed, Duty::Evening, "late pickup");
        assert_eq!(
            schedule.day(DaySlot::Wed).note(Duty::Evening),
            Some("late pickup")
        );

        let cleared = schedule.with_note(DaySlot::Wed, Duty::Evening, "");
        assert_eq!(cleared.day(DaySlot::Wed).note(Duty::Evening), None);
    }

    #[test]
    fn test_totals() {
        let schedule = Schedule::default()
            .with_assignee(DaySlot::Mon, Duty::Morning, Assignee::A)
            .with_assignee(DaySlot::Tue, Duty::Morning, Assignee::A)
            .with_assignee(DaySlot::Tue, Duty::Evening, Assignee::C);
        let totals = schedule.totals();

        assert_eq!(totals.count(Assignee::A), 2);
        assert_eq!(totals.count(Assignee::B), 0);
        assert_eq!(totals.count(Assignee::C), 1);
        assert_eq!(totals.count(Assignee::Unassigned), 7);
    }

    #[test]
    fn test_serializes_all_weekdays_in_order() {
        let schedule = Schedule::default().with_note(DaySlot::Fri, Duty::Morning, "early");
        let json = serde_json::to_string(&schedule).unwrap();

        let positions: Vec<usize> = ["\"Mon\"", "\"Tue\"", "\"Wed\"", "\"Thu\"", "\"Fri\""]
            .iter()
            .map(|k| json.find(k).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let value = serde_json::to_value(&schedule).unwrap();
        assert_eq!(
            value["Fri"],
            json!({"morningAssignee": "-", "eveningAssignee": "-", "morningNote": "early"})
        );
        assert_eq!(
            value["Mon"],
            json!({"morningAssignee": "-", "eveningAssignee": "-"})
        );
    }

    #[test]
    fn test_partial_document_defaults_missing_days() {
        let value = json!({
            "Tue": {"morningAssignee": "C"},
            "Sat": {"morningAssignee": "A"}
        });
        let schedule: Schedule = serde_json::from_value(value).unwrap();

        assert_eq!(schedule.day(DaySlot::Tue).morning_assignee, Assignee::C);
        assert_eq!(
            schedule.day(DaySlot::Tue).evening_assignee,
            Assignee::Unassigned
        );
        assert_eq!(schedule.day(DaySlot::Mon), &DayAssignment::default());
    }

    #[test]
    fn test_reads_legacy_field_names() {
        let value = json!({
            "月": {"morning": "A", "evening": "B", "eveningNote": "extended care"}
        });
        let schedule: Schedule = serde_json::from_value(value).unwrap();
        let monday = schedule.day(DaySlot::Mon);

        assert_eq!(monday.morning_assignee, Assignee::A);
        assert_eq!(monday.evening_assignee, Assignee::B);
        assert_eq!(monday.note(Duty::Evening), Some("extended care"));
    }

    #[test]
    fn test_edit_display() {
        let edit = Edit::Assign {
            day: DaySlot::Mon,
            duty: Duty::Morning,
            assignee: Assignee::B,
        };
        assert_eq!(edit.to_string(), "Mon morning -> B");

        let edit = Edit::Note {
            day: DaySlot::Thu,
            duty: Duty::Evening,
            text: String::new(),
        };
        assert_eq!(edit.to_string(), "Thu evening note cleared");
    }
}
