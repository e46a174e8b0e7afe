//! Integration tests for the public Model API
//!
//! These tests drive the model the way an editor would: through the
//! mutation primitives, transactions and undo, observing the events it
//! raises.

use scenery::{
    Change, GraphView, Model, ModelError, ModelEvent,
    cell::Cell,
    event::EventRecorder,
    geometry::{Geometry, Point},
};

/// Root with a non-numeric id so that the first inserted cell gets "0".
fn model_with_named_root() -> Model {
    Model::with_root(Cell::new().with_id("root"))
}

#[test]
fn test_insert_two_vertices_and_an_edge() {
    let mut model = model_with_named_root();
    let root = model.root().expect("root");
    let recorder = EventRecorder::attach(&mut model);

    let a = model.create_cell(Cell::vertex());
    let b = model.create_cell(Cell::vertex());
    let e = model.create_edge(Cell::edge(), Some(a), Some(b));

    model
        .update(|model| {
            model.add(root, a, None)?;
            model.add(root, b, None)?;
            model.add(root, e, None)?;
            Ok(())
        })
        .expect("insert");

    let recorder = recorder.borrow();
    let commits = recorder.named("undo");
    assert_eq!(commits.len(), 1);
    let edit = commits[0].edit().expect("edit");
    assert_eq!(edit.len(), 3);
    assert!(edit.changes().iter().all(|c| matches!(c, Change::Child(_))));

    assert_eq!(model.get_id(a).expect("id of A"), "0");
    assert_eq!(model.get_id(b).expect("id of B"), "1");
    assert_eq!(model.get_id(e).expect("id of E"), "2");
    assert_eq!(model.get_terminal(e, true), Some(a));
    assert_eq!(model.get_terminal(e, false), Some(b));
    assert_eq!(model.get_edges(a), vec![e]);
    assert_eq!(model.get_edges(b), vec![e]);
}

#[test]
fn test_set_geometry_then_undo() {
    let mut model = model_with_named_root();
    let root = model.root().expect("root");
    let original = Geometry::new(0.0, 0.0, 20.0, 20.0);
    let a = model.create_cell(Cell::vertex().with_geometry(original.clone()));
    model.add(root, a, None).expect("insert");

    let moved = Geometry::new(10.0, 20.0, 40.0, 30.0);
    model
        .update(|model| model.set_geometry(a, Some(moved.clone())))
        .expect("set geometry");
    assert_eq!(model.get_geometry(a), Some(&moved));

    let recorder = EventRecorder::attach(&mut model);
    model.undo().expect("undo");
    assert_eq!(model.get_geometry(a), Some(&original));

    let recorder = recorder.borrow();
    let executed = recorder.named("change-executed");
    assert_eq!(executed.len(), 1);
    let ModelEvent::ChangeExecuted(Change::Geometry(change)) = executed[0] else {
        panic!("expected a geometry change, got {:?}", executed[0]);
    };
    assert_eq!(change.cell(), a);
    assert_eq!(change.geometry(), &Some(original));
    assert_eq!(change.previous(), &Some(moved));
    assert_eq!(recorder.named("undone").len(), 1);
}

#[test]
fn test_nested_transactions_commit_once_in_call_order() {
    let mut model = Model::new();
    let layer = model.default_layer().expect("layer");
    let recorder = EventRecorder::attach(&mut model);
    let a = model.create_cell(Cell::vertex());

    model.begin_update();
    model.add(layer, a, None).expect("add");
    model.begin_update();
    model.set_value(a, Some("A".into())).expect("value");
    model.set_style(a, Some("rounded".into())).expect("style");
    model.end_update().expect("inner end");
    assert!(recorder.borrow().named("undo").is_empty(), "inner end does not commit");
    model.set_collapsed(a, true).expect("collapse");
    model.end_update().expect("outer end");

    let recorder = recorder.borrow();
    let commits = recorder.named("undo");
    assert_eq!(commits.len(), 1);
    let kinds: Vec<_> = commits[0]
        .edit()
        .expect("edit")
        .changes()
        .iter()
        .map(Change::kind)
        .collect();
    assert_eq!(kinds, vec!["child", "value", "style", "collapsed"]);
    assert_eq!(recorder.named("change").len(), 1);
    assert_eq!(recorder.named("start-edit").len(), 1);
}

#[test]
fn test_undo_reverts_whole_transaction() {
    let mut model = Model::new();
    let layer = model.default_layer().expect("layer");
    let a = model.create_cell(Cell::vertex());
    let b = model.create_cell(Cell::vertex());

    model
        .update(|model| {
            model.add(layer, a, None)?;
            model.add(layer, b, None)?;
            model.set_value(a, Some("A".into()))
        })
        .expect("transaction");

    model.undo().expect("undo");
    assert_eq!(model.get_child_count(layer), 0);
    assert_eq!(model.get_value(a), None);
    assert_eq!(model.undo(), Err(ModelError::NothingToUndo));

    model.redo().expect("redo");
    assert_eq!(model.get_children(layer), &[a, b]);
    assert_eq!(model.get_value(a), Some("A"));
}

#[test]
fn test_unbalanced_end_update_is_rejected() {
    let mut model = Model::new();
    let recorder = EventRecorder::attach(&mut model);
    assert_eq!(model.end_update(), Err(ModelError::UnbalancedUpdate));
    assert!(recorder.borrow().events().is_empty());

    // Later transactions still commit normally
    let layer = model.default_layer().expect("layer");
    model.set_value(layer, Some("x".into())).expect("value");
    assert_eq!(recorder.borrow().named("undo").len(), 1);
}

#[test]
fn test_collapse_cascade_evicts_and_recomputes() {
    let mut model = Model::new();
    let layer = model.default_layer().expect("layer");
    let view = GraphView::attach(&mut model);

    let group = model.create_cell(
        Cell::vertex().with_geometry(Geometry::new(0.0, 0.0, 200.0, 200.0)),
    );
    let d = model.create_cell(Cell::vertex().with_geometry(Geometry::new(10.0, 10.0, 20.0, 20.0)));
    model.add(layer, group, None).expect("group");
    model.add(group, d, None).expect("descendant");
    assert!(view.borrow().state(d).is_some());

    model.set_collapsed(group, true).expect("collapse");
    assert!(view.borrow().state(d).is_none());

    // Moving the group while collapsed; the stale origin must not come back
    model
        .set_geometry(group, Some(Geometry::new(100.0, 0.0, 200.0, 200.0)))
        .expect("move");
    model.set_collapsed(group, false).expect("expand");

    let view = view.borrow();
    let state = view.state(d).expect("state recomputed");
    assert!(!state.is_invalid());
    assert_eq!(state.origin(), Point::new(110.0, 10.0));
}

#[test]
fn test_edge_rehomed_when_terminal_moves_into_group() {
    let mut model = Model::new();
    let layer = model.default_layer().expect("layer");
    let group = model.create_cell(Cell::new().with_geometry(Geometry::new(50.0, 50.0, 300.0, 300.0)));
    let a = model.create_cell(Cell::vertex().with_geometry(Geometry::new(0.0, 0.0, 20.0, 20.0)));
    let b = model.create_cell(Cell::vertex().with_geometry(Geometry::new(10.0, 10.0, 20.0, 20.0)));
    let e = model.create_edge(Cell::edge(), Some(a), Some(b));

    model
        .update(|model| {
            model.add(layer, group, None)?;
            model.add(group, a, None)?;
            model.add(layer, b, None)?;
            model.add(layer, e, None)?;
            Ok(())
        })
        .expect("setup");
    assert_eq!(model.get_parent(e), Some(layer));

    model.add(group, b, None).expect("move b");
    assert_eq!(model.get_parent(e), Some(group));

    model.undo().expect("undo");
    assert_eq!(model.get_parent(b), Some(layer));
    assert_eq!(model.get_parent(e), Some(layer));
}

#[test]
fn test_listener_can_react_inside_commit() {
    use std::{cell::RefCell, rc::Rc};

    let mut model = Model::new();
    let layer = model.default_layer().expect("layer");
    let observed = Rc::new(RefCell::new(Vec::new()));
    let sink = observed.clone();

    // Records the size of each committed edit and the depth at commit time
    model.subscribe(Rc::new(RefCell::new(
        move |model: &mut Model, event: &ModelEvent| {
            if let ModelEvent::Undo(edit) = event {
                sink.borrow_mut().push((edit.len(), model.update_level()));
            }
        },
    )));

    model.set_value(layer, Some("a".into())).expect("value");
    model
        .update(|model| {
            model.set_value(layer, Some("b".into()))?;
            model.set_value(layer, Some("c".into()))
        })
        .expect("values");

    assert_eq!(*observed.borrow(), vec![(1, 0), (2, 0)]);
}
