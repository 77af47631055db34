use clap::Args;
use pickup_share_core::{default_file_name, Edit, EngineState, Roster, Schedule, WeekKey};
use std::io::BufRead;
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::edit::parse_slot;
use super::export::write_csv;
use crate::config::Config;
use crate::render;
use crate::session::Session;

const HELP: &str = "\
Commands:
  set DAY DUTY WHO     assign a duty (e.g. set mon morning A)
  note DAY DUTY TEXT   set a note; no text clears it
  undo | redo          step through your edits
  prev | next | today  change week
  week DATE            jump to the week containing DATE
  export [PATH]        write this week as CSV
  help                 show this list
  quit                 leave";

#[derive(Args)]
pub struct WatchCommand {}

/// One line typed into an interactive session.
#[derive(Debug, PartialEq)]
enum Input {
    Edit(Edit),
    Undo,
    Redo,
    Previous,
    Next,
    Today,
    Week(WeekKey),
    Export(Option<PathBuf>),
    Help,
    Quit,
    Nothing,
}

fn parse_input(line: &str, roster: &Roster) -> Result<Input, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((command, args)) = words.split_first() else {
        return Ok(Input::Nothing);
    };

    match command.to_lowercase().as_str() {
        "set" => match args {
            [day, duty, who @ ..] if !who.is_empty() => {
                let (day, duty) = parse_slot(day, duty)?;
                let assignee = roster.resolve(&who.join(" "))?;
                Ok(Input::Edit(Edit::Assign {
                    day,
                    duty,
                    assignee,
                }))
            }
            _ => Err("Usage: set DAY DUTY WHO".to_string()),
        },
        "note" => match args {
            [day, duty, text @ ..] => {
                let (day, duty) = parse_slot(day, duty)?;
                Ok(Input::Edit(Edit::Note {
                    day,
                    duty,
                    text: text.join(" "),
                }))
            }
            _ => Err("Usage: note DAY DUTY [TEXT]".to_string()),
        },
        "undo" | "u" => Ok(Input::Undo),
        "redo" | "r" => Ok(Input::Redo),
        "prev" | "previous" | "p" => Ok(Input::Previous),
        "next" | "n" => Ok(Input::Next),
        "today" => Ok(Input::Today),
        "week" => match args {
            [date] => date.parse().map(Input::Week).map_err(|e| e.to_string()),
            _ => Err("Usage: week YYYY-MM-DD".to_string()),
        },
        "export" => match args {
            [] => Ok(Input::Export(None)),
            [path] => Ok(Input::Export(Some(PathBuf::from(path)))),
            _ => Err("Usage: export [PATH]".to_string()),
        },
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" | "q" => Ok(Input::Quit),
        other => Err(format!(
            "Unknown command '{}'. Type 'help' for commands.",
            other
        )),
    }
}

/// What was last printed, so unchanged states aren't printed again.
#[derive(Default)]
struct Screen {
    view: Option<(WeekKey, Schedule)>,
    status: String,
}

impl Screen {
    fn update(&mut self, state: &EngineState, roster: &Roster) {
        let Some(week) = state.week else {
            return;
        };

        let status = render::status_line(state);
        if !state.loaded {
            if self.status != status {
                println!("Loading week {}...", week);
                self.status = status;
            }
            return;
        }

        let view = (week, state.schedule.clone());
        if self.view.as_ref() != Some(&view) {
            println!();
            println!("{}", render::week_table(week, &state.schedule, roster));
            println!("{}", status);
            self.view = Some(view);
        } else if self.status != status {
            println!("{}", status);
        }
        self.status = status;
    }
}

impl WatchCommand {
    pub async fn run(
        &self,
        config: &Config,
        week: WeekKey,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let session = Session::open(config, week).await?;
        let roster = &config.participants;
        let mut states = session.handle().watch();
        let mut lines = read_lines();
        let mut screen = Screen::default();

        println!("{}", HELP);
        let initial = states.borrow_and_update().clone();
        screen.update(&initial, roster);

        loop {
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = states.borrow_and_update().clone();
                    screen.update(&state, roster);
                }
                line = lines.recv() => {
                    // end of input
                    let Some(line) = line else {
                        break;
                    };
                    match parse_input(&line, roster) {
                        Ok(Input::Quit) => break,
                        Ok(input) => {
                            if let Err(e) = dispatch(input, &session, config) {
                                eprintln!("{}", e);
                            }
                        }
                        Err(e) => eprintln!("{}", e),
                    }
                }
            }
        }

        // Leaving should not lose the last edit.
        if let Err(e) = session.settle().await {
            tracing::warn!("failed to save before exit: {}", e);
        }
        session.close().await;
        Ok(())
    }
}

/// Forwards stdin lines from a plain thread, which is left behind on exit.
fn read_lines() -> mpsc::UnboundedReceiver<String> {
    let (sender, receiver) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if sender.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("failed to read input: {}", e);
                    break;
                }
            }
        }
    });
    receiver
}

fn dispatch(
    input: Input,
    session: &Session,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = session.handle();
    match input {
        Input::Edit(edit) => handle.edit(edit)?,
        Input::Undo => handle.undo()?,
        Input::Redo => handle.redo()?,
        Input::Previous => handle.previous_week()?,
        Input::Next => handle.next_week()?,
        Input::Today => handle.activate(WeekKey::current())?,
        Input::Week(week) => handle.activate(week)?,
        Input::Export(path) => {
            let state = handle.state();
            let week = state.week.ok_or("No week is open")?;
            if !state.loaded {
                return Err(format!("Week {} is still loading", week).into());
            }
            let path = path.unwrap_or_else(|| PathBuf::from(default_file_name(week)));
            write_csv(&path, week, &state.schedule, config)?;
            println!("Exported week {} to {}", week, path.display());
        }
        Input::Help => println!("{}", HELP),
        Input::Quit | Input::Nothing => {}
    }
    Ok(())
}
