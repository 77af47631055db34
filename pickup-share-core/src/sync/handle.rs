use tokio::sync::{mpsc, oneshot, watch};

use super::error::EngineError;
use super::state::EngineState;
use crate::models::{Assignee, DaySlot, Duty, Edit};
use crate::week::WeekKey;

/// Requests delivered to the engine task.
#[derive(Debug)]
pub(crate) enum Command {
    Activate(WeekKey),
    ShiftWeeks(i64),
    Edit(Edit),
    Undo,
    Redo,
    Barrier(oneshot::Sender<()>),
    Shutdown,
}

/// Cloneable front end to a running [`SyncEngine`](super::SyncEngine).
///
/// Commands are queued and processed in order; methods return as soon as
/// the command is queued. Dropping every handle shuts the engine down.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<EngineState>,
}

impl EngineHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        state: watch::Receiver<EngineState>,
    ) -> Self {
        Self { commands, state }
    }

    fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .map_err(|_| EngineError::Stopped)
    }

    /// Switches to `week`, subscribing to its document.
    pub fn activate(&self, week: WeekKey) -> Result<(), EngineError> {
        self.send(Command::Activate(week))
    }

    /// Moves to the week before the active one. Ignored before any activation.
    pub fn previous_week(&self) -> Result<(), EngineError> {
        self.send(Command::ShiftWeeks(-1))
    }

    /// Moves to the week after the active one. Ignored before any activation.
    pub fn next_week(&self) -> Result<(), EngineError> {
        self.send(Command::ShiftWeeks(1))
    }

    pub fn edit(&self, edit: Edit) -> Result<(), EngineError> {
        self.send(Command::Edit(edit))
    }

    pub fn set_assignee(
        &self,
        day: DaySlot,
        duty: Duty,
        assignee: Assignee,
    ) -> Result<(), EngineError> {
        self.edit(Edit::Assign {
            day,
            duty,
            assignee,
        })
    }

    pub fn set_note(
        &self,
        day: DaySlot,
        duty: Duty,
        text: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.edit(Edit::Note {
            day,
            duty,
            text: text.into(),
        })
    }

    pub fn undo(&self) -> Result<(), EngineError> {
        self.send(Command::Undo)
    }

    pub fn redo(&self) -> Result<(), EngineError> {
        self.send(Command::Redo)
    }

    /// Asks the engine to stop. Unsent writes are dropped.
    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.send(Command::Shutdown)
    }

    /// Resolves once every command sent before it has been processed.
    pub async fn barrier(&self) -> Result<(), EngineError> {
        let (reply, done) = oneshot::channel();
        self.send(Command::Barrier(reply))?;
        done.await.map_err(|_| EngineError::Stopped)
    }

    /// The most recently published state.
    pub fn state(&self) -> EngineState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every state change.
    pub fn watch(&self) -> watch::Receiver<EngineState> {
        self.state.clone()
    }

    /// Waits until the published state satisfies `condition`.
    pub async fn wait_until(
        &self,
        condition: impl FnMut(&EngineState) -> bool,
    ) -> Result<EngineState, EngineError> {
        let mut state = self.state.clone();
        let matched = state
            .wait_for(condition)
            .await
            .map_err(|_| EngineError::Stopped)?;
        Ok(matched.clone())
    }
}
