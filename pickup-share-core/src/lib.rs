//! Pickup Share Core Library
//!
//! Shared weekly pickup/drop-off schedule: the model, a local undo history,
//! document stores, and the engine that keeps a week in sync with its store.

pub mod document_key;
pub mod export;
pub mod history;
pub mod models;
pub mod store;
pub mod sync;
pub mod week;

pub use document_key::{DocumentKey, RoomId, RoomIdError};
pub use export::{default_file_name, to_csv};
pub use history::History;
pub use models::{Assignee, DayAssignment, DaySlot, Duty, Edit, Roster, Schedule, Totals};
pub use store::{
    DocumentSnapshot, DocumentStore, FileStore, FirestoreStore, MemoryStore, StoreError,
    Subscription,
};
pub use sync::{EngineConfig, EngineError, EngineHandle, EngineState, SyncEngine, DEFAULT_DEBOUNCE};
pub use week::{format_short, monday_of, weekdays_of, WeekKey, WeekKeyError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
