//! Linear undo/redo history.
//!
//! The stack always holds at least one entry: the state before any edit.
//! `index` points at the entry currently shown. Pushing after an undo
//! truncates the redo tail, so history never branches.
//!
//! Capacity is unbounded; every entry stays in memory until `clear`.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    index: usize,
}

impl<T> History<T> {
    /// Start a history whose only entry is `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self { entries: vec![initial], index: 0 }
    }

    /// Record a completed edit, discarding any redo entries.
    pub fn push(&mut self, entry: T) {
        self.entries.truncate(self.index + 1);
        self.entries.push(entry);
        self.index = self.entries.len() - 1;
    }

    /// Step back one entry. `None` when already at the initial entry.
    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward one entry. `None` when already at the newest entry.
    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    /// Drop every entry and start over from `initial`.
    pub fn clear(&mut self, initial: T) {
        self.entries.clear();
        self.entries.push(initial);
        self.index = 0;
    }

    /// The entry currently shown.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.index)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of entries, including the initial one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the initial entry is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
