//! Undo history.
//!
//! The [`UndoManager`] keeps committed edits in a bounded list with a cursor:
//! edits before the cursor can be undone, edits after it can be redone.
//! Recording a new edit drops the redo tail.

use log::{debug, trace};

use crate::edit::UndoableEdit;

/// Bounded list of committed edits with an undo cursor.
#[derive(Debug, Default)]
pub struct UndoManager {
    size: usize,
    edits: Vec<UndoableEdit>,
    index: usize,
    replaying: bool,
    deferred: Vec<UndoableEdit>,
}

impl UndoManager {
    /// Creates a manager keeping at most `size` edits; `0` keeps every edit.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of edits held, undoable or redoable.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.replaying && self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.replaying && self.index < self.edits.len()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
        self.index = 0;
        self.deferred.clear();
    }

    /// Records a committed edit.
    ///
    /// Edits committed while an undo or redo is replaying are held back and
    /// recorded once the replay has finished.
    pub fn record(&mut self, edit: UndoableEdit) {
        if self.replaying {
            trace!(changes = edit.len(); "Deferring edit recorded during replay");
            self.deferred.push(edit);
            return;
        }
        self.edits.truncate(self.index);
        if self.size > 0 && self.edits.len() >= self.size {
            self.edits.remove(0);
        }
        self.edits.push(edit);
        self.index = self.edits.len();
        debug!(len = self.edits.len(); "Edit recorded");
    }

    /// Takes the edit under the undo cursor out of the history.
    ///
    /// Must be followed by [`UndoManager::end_undo`].
    pub(crate) fn begin_undo(&mut self) -> Option<UndoableEdit> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.replaying = true;
        Some(std::mem::take(&mut self.edits[self.index]))
    }

    pub(crate) fn end_undo(&mut self, edit: UndoableEdit) {
        if let Some(slot) = self.edits.get_mut(self.index) {
            *slot = edit;
        }
        self.finish_replay();
    }

    /// Takes the edit after the undo cursor out of the history.
    ///
    /// Must be followed by [`UndoManager::end_redo`].
    pub(crate) fn begin_redo(&mut self) -> Option<UndoableEdit> {
        if !self.can_redo() {
            return None;
        }
        self.replaying = true;
        Some(std::mem::take(&mut self.edits[self.index]))
    }

    pub(crate) fn end_redo(&mut self, edit: UndoableEdit) {
        if let Some(slot) = self.edits.get_mut(self.index) {
            *slot = edit;
        }
        self.index += 1;
        self.finish_replay();
    }

    fn finish_replay(&mut self) {
        self.replaying = false;
        for edit in std::mem::take(&mut self.deferred) {
            self.record(edit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Change;

    fn edit_of(n: usize) -> UndoableEdit {
        (0..n).map(|_| Change::root(None)).collect()
    }

    #[test]
    fn test_empty_history() {
        let history = UndoManager::new(10);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.is_empty());
    }

    #[test]
    fn test_record_and_cursor() {
        let mut history = UndoManager::new(10);
        history.record(edit_of(1));
        history.record(edit_of(2));
        assert!(history.can_undo());
        assert!(!history.can_redo());

        let edit = history.begin_undo().unwrap();
        assert_eq!(edit.len(), 2);
        history.end_undo(edit);
        assert!(history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn test_record_truncates_redo_tail() {
        let mut history = UndoManager::new(10);
        history.record(edit_of(1));
        history.record(edit_of(2));
        let edit = history.begin_undo().unwrap();
        history.end_undo(edit);

        history.record(edit_of(3));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_size_limit_drops_oldest() {
        let mut history = UndoManager::new(2);
        history.record(edit_of(1));
        history.record(edit_of(2));
        history.record(edit_of(3));
        assert_eq!(history.len(), 2);

        let edit = history.begin_undo().unwrap();
        assert_eq!(edit.len(), 3);
        history.end_undo(edit);
        let edit = history.begin_undo().unwrap();
        assert_eq!(edit.len(), 2);
        history.end_undo(edit);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_zero_size_is_unlimited() {
        let mut history = UndoManager::new(0);
        for n in 0..250 {
            history.record(edit_of(n % 3 + 1));
        }
        assert_eq!(history.len(), 250);
    }

    #[test]
    fn test_edits_during_replay_are_deferred() {
        let mut history = UndoManager::new(10);
        history.record(edit_of(1));
        let edit = history.begin_undo().unwrap();
        assert!(!history.can_undo());

        history.record(edit_of(4));
        assert_eq!(history.len(), 1);

        history.end_undo(edit);
        assert_eq!(history.len(), 1, "redo tail replaced by deferred edit");
        let last = history.begin_undo().unwrap();
        assert_eq!(last.len(), 4);
        history.end_undo(last);
    }

    #[test]
    fn test_redo_advances_cursor() {
        let mut history = UndoManager::new(10);
        history.record(edit_of(1));
        let edit = history.begin_undo().unwrap();
        history.end_undo(edit);

        let edit = history.begin_redo().unwrap();
        history.end_redo(edit);
        assert!(!history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn test_clear() {
        let mut history = UndoManager::new(10);
        history.record(edit_of(1));
        history.clear();
        assert!(history.is_empty());
        assert!(!history.can_undo());
    }
}
