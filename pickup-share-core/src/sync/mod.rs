//! Keeps a local, undoable schedule in step with its remote document.
//!
//! ## Protocol
//!
//! The engine reacts to three kinds of events, one at a time:
//! 1. Week activation: drop the old subscription and any unsent write, make
//!    sure the week's document exists, subscribe to it
//! 2. Remote snapshot: replace the local history with the snapshot while the
//!    outbound-write suppression flag is raised, then lower the flag once the
//!    resulting change has been handled
//! 3. Local edit: record it in the history and (unless suppressed) re-arm a
//!    debounce timer; when the timer expires, write the current schedule
//!
//! Remote failures are logged and otherwise ignored.

mod engine;
mod error;
mod handle;
mod state;

pub use engine::{EngineConfig, SyncEngine, DEFAULT_DEBOUNCE};
pub use error::EngineError;
pub use handle::EngineHandle;
pub use state::EngineState;
