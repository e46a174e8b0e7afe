//! The change family: one undoable command per mutable property.
//!
//! A [`Change`] describes the transition of exactly one property of one
//! cell (or of the model's root pointer) from `previous` to `current`.
//!
//! - [`Change::apply`] writes the pending value into the model and returns
//!   the applied record, with `previous` captured from the live state.
//! - [`Change::inverse`] swaps `previous` and `current`.
//!
//! Applying a record's inverse restores the property, and applying the
//! inverse of that restores it again. The same record therefore serves as
//! the "do" and, inverted, the "undo" command.
//!
//! # Example
//!
//! ```
//! # use scenery::{Model, Change};
//! # use scenery_core::cell::Cell;
//! let mut model = Model::new();
//! let layer = model.default_layer().unwrap();
//! let cell = model.create_cell(Cell::vertex());
//! model.add(layer, cell, None).unwrap();
//!
//! let record = model.execute(Change::value(cell, Some("A".to_string()))).unwrap();
//! assert_eq!(model.get_value(cell), Some("A"));
//!
//! model.execute(record.inverse()).unwrap();
//! assert_eq!(model.get_value(cell), None);
//! ```

use std::mem;

use scenery_core::{geometry::Geometry, identifier::CellKey, style::Style};

use crate::model::Model;

/// One atomic, invertible mutation of a model.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Replaces the model's root cell.
    Root(RootChange),
    /// Inserts, moves or removes a cell in the tree.
    Child(ChildChange),
    /// Connects or disconnects one end of an edge.
    Terminal(TerminalChange),
    Geometry(GeometryChange),
    Value(ValueChange),
    Style(StyleChange),
    Collapsed(CollapsedChange),
    Visible(VisibleChange),
}

/// Replacement of the model's root.
#[derive(Debug, Clone, PartialEq)]
pub struct RootChange {
    root: Option<CellKey>,
    previous: Option<CellKey>,
}

impl RootChange {
    /// The root after the change.
    pub fn root(&self) -> Option<CellKey> {
        self.root
    }

    /// The root before the change.
    pub fn previous(&self) -> Option<CellKey> {
        self.previous
    }
}

/// Structural move of one cell.
///
/// `parent == None` removes the cell from the tree. An `index` of `None`
/// appends at the child count of the parent at the time the change is
/// applied; applied records always carry the resolved index.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildChange {
    child: CellKey,
    parent: Option<CellKey>,
    index: Option<usize>,
    previous: Option<CellKey>,
    previous_index: Option<usize>,
}

impl ChildChange {
    pub fn child(&self) -> CellKey {
        self.child
    }

    /// The parent after the change, `None` when the cell was removed.
    pub fn parent(&self) -> Option<CellKey> {
        self.parent
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// The parent before the change, `None` when the cell was detached.
    pub fn previous(&self) -> Option<CellKey> {
        self.previous
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.previous_index
    }
}

/// Assignment of the source or target terminal of an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalChange {
    edge: CellKey,
    terminal: Option<CellKey>,
    previous: Option<CellKey>,
    source: bool,
}

impl TerminalChange {
    pub fn edge(&self) -> CellKey {
        self.edge
    }

    pub fn terminal(&self) -> Option<CellKey> {
        self.terminal
    }

    pub fn previous(&self) -> Option<CellKey> {
        self.previous
    }

    /// True if the source end changed, false for the target end.
    pub fn is_source(&self) -> bool {
        self.source
    }
}

/// Generates a change struct for a single cell attribute.
macro_rules! attribute_change {
    ($(#[$meta:meta])* $name:ident, $field:ident: $ty:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            cell: CellKey,
            $field: $ty,
            previous: $ty,
        }

        impl $name {
            pub fn cell(&self) -> CellKey {
                self.cell
            }

            /// The value after the change.
            pub fn $field(&self) -> &$ty {
                &self.$field
            }

            /// The value before the change.
            pub fn previous(&self) -> &$ty {
                &self.previous
            }
        }
    };
}

attribute_change!(
    /// Replacement of a cell's geometry.
    GeometryChange, geometry: Option<Geometry>
);
attribute_change!(
    /// Replacement of a cell's user value.
    ValueChange, value: Option<String>
);
attribute_change!(
    /// Replacement of a cell's style.
    StyleChange, style: Option<Style>
);
attribute_change!(CollapsedChange, collapsed: bool);
attribute_change!(VisibleChange, visible: bool);

impl Change {
    /// Replaces the root with `root`; `None` empties the model.
    pub fn root(root: Option<CellKey>) -> Self {
        Self::Root(RootChange {
            root,
            previous: None,
        })
    }

    /// Moves `child` to `parent` at `index`; a `None` parent removes it.
    pub fn child(parent: Option<CellKey>, child: CellKey, index: Option<usize>) -> Self {
        Self::Child(ChildChange {
            child,
            parent,
            index,
            previous: None,
            previous_index: None,
        })
    }

    /// Sets the source (`is_source`) or target terminal of `edge`.
    pub fn terminal(edge: CellKey, terminal: Option<CellKey>, is_source: bool) -> Self {
        Self::Terminal(TerminalChange {
            edge,
            terminal,
            previous: None,
            source: is_source,
        })
    }

    pub fn geometry(cell: CellKey, geometry: Option<Geometry>) -> Self {
        Self::Geometry(GeometryChange {
            cell,
            geometry,
            previous: None,
        })
    }

    pub fn value(cell: CellKey, value: Option<String>) -> Self {
        Self::Value(ValueChange {
            cell,
            value,
            previous: None,
        })
    }

    pub fn style(cell: CellKey, style: Option<Style>) -> Self {
        Self::Style(StyleChange {
            cell,
            style,
            previous: None,
        })
    }

    pub fn collapsed(cell: CellKey, collapsed: bool) -> Self {
        Self::Collapsed(CollapsedChange {
            cell,
            collapsed,
            previous: collapsed,
        })
    }

    pub fn visible(cell: CellKey, visible: bool) -> Self {
        Self::Visible(VisibleChange {
            cell,
            visible,
            previous: visible,
        })
    }

    /// Returns a short kebab-case name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Root(_) => "root",
            Self::Child(_) => "child",
            Self::Terminal(_) => "terminal",
            Self::Geometry(_) => "geometry",
            Self::Value(_) => "value",
            Self::Style(_) => "style",
            Self::Collapsed(_) => "collapsed",
            Self::Visible(_) => "visible",
        }
    }

    /// Returns the cell whose property this change targets.
    ///
    /// `None` for root changes, which target the model itself.
    pub fn target(&self) -> Option<CellKey> {
        match self {
            Self::Root(_) => None,
            Self::Child(change) => Some(change.child),
            Self::Terminal(change) => Some(change.edge),
            Self::Geometry(change) => Some(change.cell),
            Self::Value(change) => Some(change.cell),
            Self::Style(change) => Some(change.cell),
            Self::Collapsed(change) => Some(change.cell),
            Self::Visible(change) => Some(change.cell),
        }
    }

    /// Returns every cell key the change refers to.
    pub fn cells(&self) -> Vec<CellKey> {
        match self {
            Self::Root(change) => change.root.into_iter().chain(change.previous).collect(),
            Self::Child(change) => [Some(change.child), change.parent, change.previous]
                .into_iter()
                .flatten()
                .collect(),
            Self::Terminal(change) => [Some(change.edge), change.terminal, change.previous]
                .into_iter()
                .flatten()
                .collect(),
            other => other.target().into_iter().collect(),
        }
    }

    /// Returns the change that undoes this one by swapping its two values.
    pub fn inverse(&self) -> Self {
        let mut change = self.clone();
        match &mut change {
            Self::Root(c) => mem::swap(&mut c.root, &mut c.previous),
            Self::Child(c) => {
                mem::swap(&mut c.parent, &mut c.previous);
                mem::swap(&mut c.index, &mut c.previous_index);
            }
            Self::Terminal(c) => mem::swap(&mut c.terminal, &mut c.previous),
            Self::Geometry(c) => mem::swap(&mut c.geometry, &mut c.previous),
            Self::Value(c) => mem::swap(&mut c.value, &mut c.previous),
            Self::Style(c) => mem::swap(&mut c.style, &mut c.previous),
            Self::Collapsed(c) => mem::swap(&mut c.collapsed, &mut c.previous),
            Self::Visible(c) => mem::swap(&mut c.visible, &mut c.previous),
        }
        change
    }

    /// Writes the pending value into `model` and returns the applied record.
    ///
    /// The record's `previous` is whatever the model held before, so
    /// `record.inverse()` restores it. Key validity is checked by
    /// [`Model::execute`] before this is called.
    pub(crate) fn apply(self, model: &mut Model) -> Self {
        match self {
            Self::Root(mut c) => {
                c.previous = model.root_changed(c.root);
                Self::Root(c)
            }
            Self::Child(mut c) => {
                if c.parent.is_none() {
                    model.connect(c.child, false);
                }
                let (previous, previous_index) =
                    model.parent_for_cell_changed(c.child, c.parent, c.index);
                if c.parent.is_some() {
                    model.connect(c.child, true);
                }
                c.index = c
                    .parent
                    .and_then(|parent| model.cell(parent))
                    .and_then(|parent| parent.index_of(c.child));
                c.previous = previous;
                c.previous_index = previous_index;
                Self::Child(c)
            }
            Self::Terminal(mut c) => {
                c.previous = model.terminal_for_cell_changed(c.edge, c.terminal, c.source);
                Self::Terminal(c)
            }
            Self::Geometry(mut c) => {
                c.previous = model.geometry_for_cell_changed(c.cell, c.geometry.clone());
                Self::Geometry(c)
            }
            Self::Value(mut c) => {
                c.previous = model.value_for_cell_changed(c.cell, c.value.clone());
                Self::Value(c)
            }
            Self::Style(mut c) => {
                c.previous = model.style_for_cell_changed(c.cell, c.style.clone());
                Self::Style(c)
            }
            Self::Collapsed(mut c) => {
                c.previous = model.collapsed_state_for_cell_changed(c.cell, c.collapsed);
                Self::Collapsed(c)
            }
            Self::Visible(mut c) => {
                c.previous = model.visible_state_for_cell_changed(c.cell, c.visible);
                Self::Visible(c)
            }
        }
    }
}
