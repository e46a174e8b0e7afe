//! Scene tree nodes and the arena that owns them.
//!
//! A [`Cell`] is one node of the diagram: a vertex, an edge, or a plain
//! container such as the root or a layer. All cells of a model live in a
//! single [`CellArena`]; relationships are stored as [`CellKey`]s:
//!
//! - `children`: the ordered child list. Order is z-order and traversal order.
//! - `parent`: a back reference kept consistent with the parent's child list.
//! - `source`/`target`: the terminals of an edge. Either may be absent.
//! - `edges`: the incident-edge registry of a terminal, the edges that
//!   reference this cell as source or target.
//!
//! The arena primitives below are plain, non-transactional mutations. They
//! keep parent and child lists consistent with each other but know nothing
//! about ids, undo or notification; that is the model's job.

use indexmap::IndexSet;
use log::trace;

use crate::{
    geometry::Geometry,
    identifier::{ArenaTag, CellId, CellKey},
    style::Style,
};

/// A node of the scene tree.
///
/// Cells are built as plain values and handed to the model, which stores
/// them in its arena.
///
/// # Examples
///
/// ```
/// use scenery_core::{cell::Cell, geometry::Geometry};
///
/// let vertex = Cell::vertex()
///     .with_value("Hello")
///     .with_geometry(Geometry::new(10.0, 10.0, 80.0, 30.0))
///     .with_style("rounded");
///
/// assert!(vertex.is_vertex());
/// assert!(vertex.is_visible());
/// assert_eq!(vertex.value(), Some("Hello"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    id: Option<CellId>,
    value: Option<String>,
    geometry: Option<Geometry>,
    style: Option<Style>,
    vertex: bool,
    edge: bool,
    connectable: bool,
    visible: bool,
    collapsed: bool,
    parent: Option<CellKey>,
    children: Vec<CellKey>,
    source: Option<CellKey>,
    target: Option<CellKey>,
    edges: IndexSet<CellKey>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            id: None,
            value: None,
            geometry: None,
            style: None,
            vertex: false,
            edge: false,
            connectable: true,
            visible: true,
            collapsed: false,
            parent: None,
            children: Vec::new(),
            source: None,
            target: None,
            edges: IndexSet::new(),
        }
    }
}

impl Cell {
    /// Creates a plain container cell (root, layer or group without shape).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a vertex cell.
    pub fn vertex() -> Self {
        Self {
            vertex: true,
            ..Self::default()
        }
    }

    /// Creates an edge cell with an empty relative geometry.
    pub fn edge() -> Self {
        Self {
            edge: true,
            geometry: Some(Geometry::relative()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<CellId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_style(mut self, style: impl Into<Style>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_connectable(mut self, connectable: bool) -> Self {
        self.connectable = connectable;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    pub fn id(&self) -> Option<&CellId> {
        self.id.as_ref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn style(&self) -> Option<&Style> {
        self.style.as_ref()
    }

    pub fn is_vertex(&self) -> bool {
        self.vertex
    }

    pub fn is_edge(&self) -> bool {
        self.edge
    }

    pub fn is_connectable(&self) -> bool {
        self.connectable
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn parent(&self) -> Option<CellKey> {
        self.parent
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child_at(&self, index: usize) -> Option<CellKey> {
        self.children.get(index).copied()
    }

    /// Returns the position of `child` in the child list.
    pub fn index_of(&self, child: CellKey) -> Option<usize> {
        self.children.iter().position(|c| *c == child)
    }

    pub fn children(&self) -> &[CellKey] {
        &self.children
    }

    /// Returns the source terminal if `is_source`, else the target terminal.
    pub fn terminal(&self, is_source: bool) -> Option<CellKey> {
        if is_source { self.source } else { self.target }
    }

    /// Number of edges connected to this cell.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_at(&self, index: usize) -> Option<CellKey> {
        self.edges.get_index(index).copied()
    }

    /// Incident edges in connection order.
    pub fn edges(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.edges.iter().copied()
    }

    pub fn set_id(&mut self, id: Option<CellId>) -> Option<CellId> {
        std::mem::replace(&mut self.id, id)
    }

    pub fn set_value(&mut self, value: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.value, value)
    }

    pub fn set_geometry(&mut self, geometry: Option<Geometry>) -> Option<Geometry> {
        std::mem::replace(&mut self.geometry, geometry)
    }

    pub fn set_style(&mut self, style: Option<Style>) -> Option<Style> {
        std::mem::replace(&mut self.style, style)
    }

    pub fn set_visible(&mut self, visible: bool) -> bool {
        std::mem::replace(&mut self.visible, visible)
    }

    pub fn set_collapsed(&mut self, collapsed: bool) -> bool {
        std::mem::replace(&mut self.collapsed, collapsed)
    }

    /// Plain terminal pointer assignment.
    ///
    /// This does not touch the incident-edge registries of the old or new
    /// terminal. Use [`CellArena::insert_edge`] for connected assignment.
    pub fn set_terminal(&mut self, terminal: Option<CellKey>, is_source: bool) -> Option<CellKey> {
        if is_source {
            std::mem::replace(&mut self.source, terminal)
        } else {
            std::mem::replace(&mut self.target, terminal)
        }
    }

    /// Drops every structural link so the cell can be stored as a fresh,
    /// detached node.
    fn detach_links(&mut self) {
        self.parent = None;
        self.children.clear();
        self.source = None;
        self.target = None;
        self.edges.clear();
    }
}

/// Owner of every cell of one model.
///
/// Slots are never reused: a removed cell stays in the arena, detached, so
/// that an undo can insert it again with its subtree intact.
#[derive(Debug)]
pub struct CellArena {
    tag: ArenaTag,
    cells: Vec<Cell>,
}

impl Default for CellArena {
    fn default() -> Self {
        Self::new()
    }
}

impl CellArena {
    pub fn new() -> Self {
        Self {
            tag: ArenaTag::next(),
            cells: Vec::new(),
        }
    }

    /// Stores a detached cell and returns its key.
    ///
    /// Structural links carried by `cell` (for example from a clone of
    /// another cell) are dropped.
    pub fn alloc(&mut self, mut cell: Cell) -> CellKey {
        cell.detach_links();
        let key = CellKey::new(self.tag, self.cells.len());
        self.cells.push(cell);
        key
    }

    /// Returns true if `key` was issued by this arena.
    pub fn contains(&self, key: CellKey) -> bool {
        key.arena() == self.tag && key.index() < self.cells.len()
    }

    pub fn get(&self, key: CellKey) -> Option<&Cell> {
        if key.arena() != self.tag {
            return None;
        }
        self.cells.get(key.index())
    }

    pub fn get_mut(&mut self, key: CellKey) -> Option<&mut Cell> {
        if key.arena() != self.tag {
            return None;
        }
        self.cells.get_mut(key.index())
    }

    /// Number of cells ever allocated, attached or not.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Inserts `child` into `parent` at `index`, detaching it from its
    /// previous parent first.
    ///
    /// The index is interpreted after the detach, so moving a cell within
    /// the same parent lands it exactly at `index`. `None` appends. An index
    /// past the end is clamped.
    pub fn insert_child(&mut self, parent: CellKey, child: CellKey, index: Option<usize>) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach_from_parent(child);

        let children = &mut self.cells[parent.index()].children;
        let index = index.unwrap_or(children.len()).min(children.len());
        children.insert(index, child);
        self.cells[child.index()].parent = Some(parent);
        trace!(parent:% = parent, child:% = child, index; "Inserted child");
    }

    /// Removes the child at `index` of `parent` and clears its parent pointer.
    pub fn remove_child_at(&mut self, parent: CellKey, index: usize) -> Option<CellKey> {
        let children = &mut self.get_mut(parent)?.children;
        if index >= children.len() {
            return None;
        }
        let child = children.remove(index);
        if let Some(cell) = self.get_mut(child) {
            cell.parent = None;
        }
        trace!(parent:% = parent, child:% = child, index; "Removed child");
        Some(child)
    }

    /// Removes `child` from its current parent, if any.
    pub fn detach_from_parent(&mut self, child: CellKey) -> Option<CellKey> {
        let parent = self.get(child)?.parent?;
        let index = self.get(parent)?.index_of(child)?;
        self.remove_child_at(parent, index);
        Some(parent)
    }

    /// Connects `edge` to `terminal` on the given side and registers the edge
    /// in the terminal's incident-edge registry.
    ///
    /// The edge is first removed from the registry of its previous terminal
    /// on that side. A self loop is registered once.
    pub fn insert_edge(&mut self, terminal: CellKey, edge: CellKey, is_outgoing: bool) {
        if !self.contains(terminal) || !self.contains(edge) {
            return;
        }
        self.remove_from_terminal(edge, is_outgoing);
        self.cells[edge.index()].set_terminal(Some(terminal), is_outgoing);
        self.cells[terminal.index()].edges.insert(edge);
    }

    /// Disconnects `edge` from `terminal` on the given side.
    ///
    /// The edge stays in the registry while its other end still points at
    /// `terminal`, which keeps self loops registered until both ends leave.
    pub fn remove_edge(&mut self, terminal: CellKey, edge: CellKey, is_outgoing: bool) {
        if !self.contains(terminal) || !self.contains(edge) {
            return;
        }
        if self.cells[edge.index()].terminal(!is_outgoing) != Some(terminal) {
            self.cells[terminal.index()].edges.shift_remove(&edge);
        }
        self.cells[edge.index()].set_terminal(None, is_outgoing);
    }

    /// Disconnects `edge` from whatever terminal it has on the given side.
    pub fn remove_from_terminal(&mut self, edge: CellKey, is_source: bool) {
        if let Some(terminal) = self.get(edge).and_then(|cell| cell.terminal(is_source)) {
            self.remove_edge(terminal, edge, is_source);
        }
    }

    /// Plain terminal pointer assignment, see [`Cell::set_terminal`].
    pub fn set_terminal(
        &mut self,
        edge: CellKey,
        terminal: Option<CellKey>,
        is_source: bool,
    ) -> Option<CellKey> {
        self.get_mut(edge)?.set_terminal(terminal, is_source)
    }
}

impl std::ops::Index<CellKey> for CellArena {
    type Output = Cell;

    /// # Panics
    /// Panics if the key was not issued by this arena.
    fn index(&self, key: CellKey) -> &Self::Output {
        assert_eq!(key.arena(), self.tag, "Cell key {key} belongs to another arena");
        &self.cells[key.index()]
    }
}
