use clap::Args;
use pickup_share_core::{DaySlot, Duty, Edit, Roster, WeekKey};

use crate::config::Config;
use crate::session::Session;

#[derive(Args)]
pub struct SetCommand {
    /// Weekday (mon, tue, wed, thu, fri)
    pub day: String,

    /// Duty (morning/dropoff or evening/pickup)
    pub duty: String,

    /// Participant tag (A-D), display name, or "-" to unassign
    pub who: String,
}

#[derive(Args)]
pub struct NoteCommand {
    /// Weekday (mon, tue, wed, thu, fri)
    pub day: String,

    /// Duty (morning/dropoff or evening/pickup)
    pub duty: String,

    /// Note text; leave empty to clear the note
    pub text: Vec<String>,
}

impl SetCommand {
    pub fn to_edit(&self, roster: &Roster) -> Result<Edit, String> {
        let (day, duty) = parse_slot(&self.day, &self.duty)?;
        let assignee = roster.resolve(&self.who)?;
        Ok(Edit::Assign {
            day,
            duty,
            assignee,
        })
    }

    pub async fn run(
        &self,
        config: &Config,
        week: WeekKey,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let edit = self.to_edit(&config.participants)?;
        apply(config, week, edit).await
    }
}

impl NoteCommand {
    pub fn to_edit(&self) -> Result<Edit, String> {
        let (day, duty) = parse_slot(&self.day, &self.duty)?;
        Ok(Edit::Note {
            day,
            duty,
            text: self.text.join(" "),
        })
    }

    pub async fn run(
        &self,
        config: &Config,
        week: WeekKey,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let edit = self.to_edit()?;
        apply(config, week, edit).await
    }
}

/// Parses a weekday and a duty given on the command line.
pub(crate) fn parse_slot(day: &str, duty: &str) -> Result<(DaySlot, Duty), String> {
    let day: DaySlot = day.parse()?;
    let duty: Duty = duty.parse()?;
    Ok((day, duty))
}

/// Opens the week, applies one edit and waits for it to be saved.
async fn apply(
    config: &Config,
    week: WeekKey,
    edit: Edit,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(config, week).await?;
    session.handle().edit(edit.clone())?;
    let state = session.settle().await?;
    session.close().await;

    let roster = &config.participants;
    match &edit {
        Edit::Assign {
            day,
            duty,
            assignee,
        } => {
            println!(
                "{} {} ({}): {}",
                day,
                duty,
                week.day(*day),
                roster.label(*assignee)
            );
        }
        Edit::Note { day, duty, text } if text.is_empty() => {
            println!("Cleared {} {} note ({})", day, duty, week.day(*day));
        }
        Edit::Note { day, duty, .. } => {
            let note = state.schedule.day(*day).note(*duty).unwrap_or_default();
            println!("{} {} note ({}): {}", day, duty, week.day(*day), note);
        }
    }
    Ok(())
}
