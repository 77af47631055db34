use crate::models::Schedule;
use crate::week::WeekKey;

/// What the engine currently shows, published after every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineState {
    /// The active week, once one has been activated.
    pub week: Option<WeekKey>,
    pub schedule: Schedule,
    pub can_undo: bool,
    pub can_redo: bool,
    /// A snapshot of the active week's document has been applied.
    pub loaded: bool,
    /// A debounced write is waiting for its timer or is in flight.
    pub write_pending: bool,
    /// Writes attempted since the engine started, successful or not.
    pub writes_sent: u64,
}

impl EngineState {
    /// True once `week` is active and its document has been loaded.
    pub fn is_showing(&self, week: WeekKey) -> bool {
        self.week == Some(week) && self.loaded
    }
}
