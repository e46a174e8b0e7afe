//! The transaction log.
//!
//! An [`UndoableEdit`] is the ordered list of changes applied during one
//! outermost transaction. It is committed as one unit and reverted or
//! reapplied as one unit.

use std::rc::Rc;

use log::debug;

use crate::{change::Change, event::ModelEvent, model::Model};

/// Ordered list of applied changes forming one undo unit.
///
/// Cloning is cheap: the change list is shared until one of the clones is
/// modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoableEdit {
    changes: Rc<Vec<Change>>,
}

impl UndoableEdit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the applied changes in application order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub(crate) fn push(&mut self, change: Change) {
        Rc::make_mut(&mut self.changes).push(change);
    }

    /// Reverts every change of the edit, last first.
    ///
    /// Returns the records applied while reverting. The edit itself is
    /// refreshed from the live state so that [`UndoableEdit::reapply`]
    /// restores exactly what was reverted.
    pub(crate) fn revert(&mut self, model: &mut Model) -> UndoableEdit {
        debug!(changes = self.len(); "Reverting edit");
        let mut applied = UndoableEdit::new();
        let changes = Rc::make_mut(&mut self.changes);
        for change in changes.iter_mut().rev() {
            let record = change.inverse().apply(model);
            model.fire(ModelEvent::ChangeExecuted(record.clone()));
            *change = record.inverse();
            applied.push(record);
        }
        applied
    }

    /// Applies every change of the edit again, in order.
    pub(crate) fn reapply(&mut self, model: &mut Model) -> UndoableEdit {
        debug!(changes = self.len(); "Reapplying edit");
        let mut applied = UndoableEdit::new();
        let changes = Rc::make_mut(&mut self.changes);
        for change in changes.iter_mut() {
            let record = change.clone().apply(model);
            model.fire(ModelEvent::ChangeExecuted(record.clone()));
            *change = record.clone();
            applied.push(record);
        }
        applied
    }
}

impl FromIterator<Change> for UndoableEdit {
    fn from_iter<T: IntoIterator<Item = Change>>(iter: T) -> Self {
        Self {
            changes: Rc::new(iter.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use scenery_core::cell::Cell;

    use super::*;

    #[test]
    fn test_clone_shares_until_push() {
        let mut model = Model::new();
        let layer = model.default_layer().unwrap();
        let cell = model.create_cell(Cell::vertex());

        let mut edit = UndoableEdit::new();
        edit.push(Change::child(Some(layer), cell, None));
        let snapshot = edit.clone();
        edit.push(Change::value(cell, None));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(edit.len(), 2);
    }

    #[test]
    fn test_revert_then_reapply() {
        let mut model = Model::new();
        let layer = model.default_layer().unwrap();
        let cell = model.create_cell(Cell::vertex());

        let mut edit: UndoableEdit = [
            Change::child(Some(layer), cell, None).apply(&mut model),
            Change::value(cell, Some("v".into())).apply(&mut model),
        ]
        .into_iter()
        .collect();

        let reverted = edit.revert(&mut model);
        assert!(!model.contains(cell));
        assert_eq!(model.get_value(cell), None);
        assert!(matches!(reverted.changes()[0], Change::Value(_)));
        assert!(matches!(reverted.changes()[1], Change::Child(_)));

        edit.reapply(&mut model);
        assert!(model.contains(cell));
        assert_eq!(model.get_value(cell), Some("v"));
    }
}
