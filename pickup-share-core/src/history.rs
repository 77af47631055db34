//! Linear undo/redo history.

/// A branch-free history of states with a cursor.
///
/// Pushing after an undo discards the undone states. The history is never
/// empty.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    index: usize,
}

impl<T: Clone> History<T> {
    pub fn new(initial: T) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> &T {
        &self.entries[self.index]
    }

    /// Records a new state, dropping any redo entries.
    pub fn push(&mut self, next: T) {
        self.entries.truncate(self.index + 1);
        self.entries.push(next);
        self.index += 1;
    }

    /// Steps back one state. Returns false at the oldest state.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Steps forward one state. Returns false at the newest state.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Replaces the whole history with a single state.
    pub fn reset(&mut self, value: T) {
        self.entries.clear();
        self.entries.push(value);
        self.index = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Number of recorded states, always at least one.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
