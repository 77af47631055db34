//! Sync engine error types.

use thiserror::Error;

/// Errors returned by an [`EngineHandle`](super::EngineHandle).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine task has finished and no longer accepts commands.
    #[error("Sync engine has stopped")]
    Stopped,
}
