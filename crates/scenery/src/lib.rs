//! Scenery - A transactional scene-graph model for diagram editors.
//!
//! A [`Model`] owns a tree of cells (vertices, edges and containers). Every
//! mutation is an invertible [`Change`] applied inside a possibly nested
//! transaction; the outermost transaction commits its changes as one
//! [`UndoableEdit`] which can be undone and redone as a unit. A
//! [`GraphView`] listens to committed edits and keeps per-cell view state
//! valid by invalidating only what each change affects.
//!
//! # Examples
//!
//! ```
//! use scenery::{GraphView, Model, cell::Cell, geometry::Geometry};
//!
//! let mut model = Model::new();
//! let view = GraphView::attach(&mut model);
//! let layer = model.default_layer().unwrap();
//!
//! let a = model.create_cell(Cell::vertex().with_geometry(Geometry::new(10.0, 20.0, 40.0, 30.0)));
//! model.add(layer, a, None).unwrap();
//! assert!(view.borrow().state(a).is_some());
//!
//! model.undo().unwrap();
//! assert!(view.borrow().state(a).is_none());
//! ```

pub mod change;
pub mod config;
pub mod edit;
pub mod event;
pub mod history;
pub mod model;
pub mod view;

mod error;

pub use scenery_core::{cell, geometry, identifier, style};

pub use change::Change;
pub use edit::UndoableEdit;
pub use error::ModelError;
pub use event::{ListenerId, ModelEvent, ModelListener};
pub use model::Model;
pub use view::{CellState, GraphView};
