//! Model events and the listener interface.
//!
//! The model announces every step of a transaction to its subscribers:
//!
//! ```text
//! begin_update ─► BeginUpdate [StartEdit]
//! execute      ─► ChangeExecuted(change)
//! end_update   ─► [EndEdit] EndUpdate(edit) ─► BeforeUndo(edit) ─► Change(edit) ─► Undo(edit)
//! undo / redo  ─► StartEdit ChangeExecuted.. EndEdit Change(applied) Undone / Redone
//! ```
//!
//! Bracketed events fire only on the outermost transition. The commit
//! sequence after `EndUpdate` runs once per outermost transaction and only
//! when the transaction executed at least one change.

use std::{cell::RefCell, rc::Rc};

use crate::{change::Change, edit::UndoableEdit, model::Model};

/// Notification raised by a [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// A transaction bracket was opened, at any depth.
    BeginUpdate,
    /// The outermost transaction bracket was opened.
    StartEdit,
    /// A change was applied; carries the applied record.
    ChangeExecuted(Change),
    /// The outermost transaction bracket was closed.
    EndEdit,
    /// A transaction bracket was closed; carries the edit collected so far.
    EndUpdate(UndoableEdit),
    /// A non-empty edit is about to be committed.
    BeforeUndo(UndoableEdit),
    /// The committed change list. View layers invalidate from this event.
    Change(UndoableEdit),
    /// A non-empty edit was committed as one undo unit.
    Undo(UndoableEdit),
    /// An edit was reverted by [`Model::undo`].
    Undone(UndoableEdit),
    /// An edit was reapplied by [`Model::redo`].
    Redone(UndoableEdit),
}

impl ModelEvent {
    /// Returns the kebab-case event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeginUpdate => "begin-update",
            Self::StartEdit => "start-edit",
            Self::ChangeExecuted(_) => "change-executed",
            Self::EndEdit => "end-edit",
            Self::EndUpdate(_) => "end-update",
            Self::BeforeUndo(_) => "before-undo",
            Self::Change(_) => "change",
            Self::Undo(_) => "undo",
            Self::Undone(_) => "undone",
            Self::Redone(_) => "redone",
        }
    }

    /// Returns the edit carried by the event, if any.
    pub fn edit(&self) -> Option<&UndoableEdit> {
        match self {
            Self::EndUpdate(edit)
            | Self::BeforeUndo(edit)
            | Self::Change(edit)
            | Self::Undo(edit)
            | Self::Undone(edit)
            | Self::Redone(edit) => Some(edit),
            Self::BeginUpdate | Self::StartEdit | Self::ChangeExecuted(_) | Self::EndEdit => None,
        }
    }
}

/// Handle returned by [`Model::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Receiver of model events.
///
/// Listeners get mutable access to the model and may run further
/// transactions while handling an event. Events raised in the meantime are
/// queued and delivered after the current event has reached every listener.
pub trait ModelListener {
    fn model_changed(&mut self, model: &mut Model, event: &ModelEvent);
}

impl<F> ModelListener for F
where
    F: FnMut(&mut Model, &ModelEvent),
{
    fn model_changed(&mut self, model: &mut Model, event: &ModelEvent) {
        self(model, event)
    }
}

/// Shared handle to a registered listener.
pub(crate) type SharedListener = Rc<RefCell<dyn ModelListener>>;

/// Listener that records every event it receives.
///
/// Useful for tests and for tools that print a transcript of a session.
///
/// # Examples
///
/// ```
/// # use scenery::{Model, event::EventRecorder};
/// let mut model = Model::new();
/// let recorder = EventRecorder::attach(&mut model);
///
/// model.begin_update();
/// model.end_update().unwrap();
///
/// assert_eq!(recorder.borrow().names(), vec!["begin-update", "start-edit", "end-edit", "end-update"]);
/// ```
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<ModelEvent>,
}

impl EventRecorder {
    /// Creates a recorder and subscribes it to `model`.
    pub fn attach(model: &mut Model) -> Rc<RefCell<Self>> {
        let recorder = Rc::new(RefCell::new(Self::default()));
        model.subscribe(recorder.clone());
        recorder
    }

    pub fn events(&self) -> &[ModelEvent] {
        &self.events
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(ModelEvent::name).collect()
    }

    /// Returns the events named `name`, in order.
    pub fn named(&self, name: &str) -> Vec<&ModelEvent> {
        self.events.iter().filter(|e| e.name() == name).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl ModelListener for EventRecorder {
    fn model_changed(&mut self, _model: &mut Model, event: &ModelEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let edit = UndoableEdit::default();
        assert_eq!(ModelEvent::BeginUpdate.name(), "begin-update");
        assert_eq!(ModelEvent::Change(edit.clone()).name(), "change");
        assert_eq!(ModelEvent::Undo(edit.clone()).name(), "undo");
        assert_eq!(ModelEvent::Redone(edit).name(), "redone");
    }

    #[test]
    fn test_edit_accessor() {
        assert!(ModelEvent::StartEdit.edit().is_none());
        assert!(ModelEvent::BeforeUndo(UndoableEdit::default()).edit().is_some());
    }

    #[test]
    fn test_closure_listener() {
        let mut model = Model::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        model.subscribe(Rc::new(RefCell::new(
            move |_: &mut Model, event: &ModelEvent| sink.borrow_mut().push(event.name()),
        )));

        model.begin_update();
        model.end_update().unwrap();

        assert_eq!(
            *seen.borrow(),
            vec!["begin-update", "start-edit", "end-edit", "end-update"]
        );
    }

    #[test]
    fn test_recorder_named() {
        let mut model = Model::new();
        let recorder = EventRecorder::attach(&mut model);
        model.begin_update();
        model.begin_update();
        model.end_update().unwrap();
        model.end_update().unwrap();

        let recorder = recorder.borrow();
        assert_eq!(recorder.named("begin-update").len(), 2);
        assert_eq!(recorder.named("start-edit").len(), 1);
        assert_eq!(recorder.named("end-edit").len(), 1);
    }
}
