//! Structural properties of the model under random edit sequences.

use proptest::prelude::*;

use scenery::{
    Model, ModelError,
    cell::Cell,
    geometry::Geometry,
    identifier::CellKey,
};

// ===================
// Strategies
// ===================

#[derive(Debug, Clone)]
enum Op {
    AddVertex { parent: usize },
    AddEdge { source: usize, target: usize, parent: usize, preset: bool },
    Move { cell: usize, parent: usize },
    Remove { cell: usize },
    SetValue { cell: usize, value: String },
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<usize>().prop_map(|parent| Op::AddVertex { parent }),
        2 => (any::<usize>(), any::<usize>(), any::<usize>(), any::<bool>()).prop_map(
            |(source, target, parent, preset)| Op::AddEdge { source, target, parent, preset }
        ),
        3 => (any::<usize>(), any::<usize>()).prop_map(|(cell, parent)| Op::Move { cell, parent }),
        1 => any::<usize>().prop_map(|cell| Op::Remove { cell }),
        1 => (any::<usize>(), "[a-z]{1,3}").prop_map(|(cell, value)| Op::SetValue { cell, value }),
        1 => Just(Op::Undo),
        1 => Just(Op::Redo),
    ]
}

// ===================
// Helpers
// ===================

fn contained_vertices(model: &Model) -> Vec<CellKey> {
    let Some(root) = model.root() else {
        return Vec::new();
    };
    model.filter_descendants(root, Cell::is_vertex)
}

fn pick(cells: &[CellKey], index: usize) -> Option<CellKey> {
    if cells.is_empty() {
        None
    } else {
        Some(cells[index % cells.len()])
    }
}

fn apply(model: &mut Model, op: &Op) -> Result<(), ModelError> {
    let Some(layer) = model.default_layer() else {
        return Ok(());
    };
    let vertices = contained_vertices(model);
    let mut containers = vec![layer];
    containers.extend(vertices.iter().copied());

    match *op {
        Op::AddVertex { parent } => {
            let parent = containers[parent % containers.len()];
            let cell = model.create_cell(
                Cell::vertex().with_geometry(Geometry::new(5.0, 5.0, 10.0, 10.0)),
            );
            model.add(parent, cell, None)?;
        }
        Op::AddEdge {
            source,
            target,
            parent,
            preset,
        } => {
            let (Some(source), Some(target)) = (pick(&vertices, source), pick(&vertices, target))
            else {
                return Ok(());
            };
            let parent = containers[parent % containers.len()];
            if preset {
                // Terminals known up front, the edge is placed on insertion
                let edge = model.create_edge(Cell::edge(), Some(source), Some(target));
                model.add(parent, edge, None)?;
            } else {
                let edge = model.create_cell(Cell::edge());
                model.update(|model| {
                    model.add(parent, edge, None)?;
                    model.set_terminals(edge, Some(source), Some(target))
                })?;
            }
        }
        Op::Move { cell, parent } => {
            let Some(cell) = pick(&vertices, cell) else {
                return Ok(());
            };
            let parent = containers[parent % containers.len()];
            if !model.is_ancestor(cell, parent) {
                model.add(parent, cell, None)?;
            }
        }
        Op::Remove { cell } => {
            if let Some(cell) = pick(&vertices, cell) {
                model.remove(cell)?;
            }
        }
        Op::SetValue { cell, ref value } => {
            if let Some(cell) = pick(&vertices, cell) {
                model.set_value(cell, Some(value.clone()))?;
            }
        }
        Op::Undo => {
            if model.can_undo() {
                model.undo()?;
            }
        }
        Op::Redo => {
            if model.can_redo() {
                model.redo()?;
            }
        }
    }
    Ok(())
}

// ===================
// Property Test Functions
// ===================

/// Every contained cell is listed exactly once by its parent and is
/// registered under a unique id.
fn check_tree_and_registry_consistent(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model = Model::new();
    for op in &ops {
        apply(&mut model, op).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let root = model.root().expect("root");
        let cells = model.get_descendants(root);
        prop_assert_eq!(model.registered_count(), cells.len());

        for &cell in &cells {
            let id = model.get_id(cell).expect("contained cells have ids");
            prop_assert_eq!(model.get_cell(id.as_str()), Some(cell));

            if let Some(parent) = model.get_parent(cell) {
                let listed = model
                    .get_children(parent)
                    .iter()
                    .filter(|child| **child == cell)
                    .count();
                prop_assert_eq!(listed, 1);
            } else {
                prop_assert_eq!(cell, root);
            }
        }
    }
    Ok(())
}

/// Edges with both terminals in the tree live under the nearest common
/// ancestor of their terminals and are listed by both terminals.
fn check_edges_under_common_ancestor(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model = Model::new();
    for op in &ops {
        apply(&mut model, op).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let root = model.root().expect("root");
        for edge in model.filter_descendants(root, Cell::is_edge) {
            let (Some(source), Some(target)) =
                (model.get_terminal(edge, true), model.get_terminal(edge, false))
            else {
                continue;
            };
            prop_assert!(model.get_edges(source).contains(&edge));
            prop_assert!(model.get_edges(target).contains(&edge));
            if !model.contains(source) || !model.contains(target) {
                continue;
            }

            let expected = if source == target {
                model.get_parent(source)
            } else {
                model.get_nearest_common_ancestor(source, target)
            };
            prop_assert_eq!(model.get_parent(edge), expected);
        }
    }
    Ok(())
}

/// Undoing every committed edit returns the model to its initial tree.
fn check_undo_everything_restores_initial_tree(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model = Model::new();
    let layer = model.default_layer().expect("layer");
    let initial = model.registered_count();

    for op in &ops {
        apply(&mut model, op).map_err(|e| TestCaseError::fail(e.to_string()))?;
    }
    while model.can_undo() {
        model.undo().map_err(|e| TestCaseError::fail(e.to_string()))?;
    }

    prop_assert_eq!(model.get_child_count(layer), 0);
    prop_assert_eq!(model.registered_count(), initial);
    prop_assert_eq!(model.update_level(), 0);
    Ok(())
}

proptest! {
    #[test]
    fn tree_and_registry_consistent(ops in prop::collection::vec(op_strategy(), 1..40)) {
        check_tree_and_registry_consistent(ops)?;
    }

    #[test]
    fn edges_under_common_ancestor(ops in prop::collection::vec(op_strategy(), 1..40)) {
        check_edges_under_common_ancestor(ops)?;
    }

    #[test]
    fn undo_everything_restores_initial_tree(ops in prop::collection::vec(op_strategy(), 1..40)) {
        check_undo_everything_restores_initial_tree(ops)?;
    }
}
