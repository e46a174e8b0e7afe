//! Cached view state and change-driven invalidation.
//!
//! [`GraphView`] keeps one [`CellState`] per visible cell: its absolute
//! origin and bounds plus a snapshot of label and style. The view listens to
//! the model's committed change lists and, per change, decides which states
//! to mark invalid and which to evict. Validation then creates states for
//! newly visible cells and recomputes only the invalid ones.
//!
//! | Change | Effect |
//! |---|---|
//! | root | every state dropped, view returns to the top level |
//! | child | moved subtree invalidated; evicted if detached or under a collapsed parent; old and new parent invalidated shallowly |
//! | terminal | edge invalidated |
//! | geometry | cell invalidated if the geometry differs by value |
//! | value | cell invalidated shallowly |
//! | style | cell, subtree and connected edges invalidated |
//! | collapsed, visible | cell states evicted, children first |

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use log::{debug, trace};

use scenery_core::{
    geometry::{Bounds, Point},
    identifier::CellKey,
    style::Style,
};

use crate::{
    change::Change,
    event::{ModelEvent, ModelListener},
    model::Model,
};

/// Cached view state of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellState {
    cell: CellKey,
    origin: Point,
    bounds: Option<Bounds>,
    label: Option<String>,
    style: Option<Style>,
    invalid: bool,
}

impl CellState {
    fn new(cell: CellKey) -> Self {
        Self {
            cell,
            origin: Point::default(),
            bounds: None,
            label: None,
            style: None,
            invalid: true,
        }
    }

    pub fn cell(&self) -> CellKey {
        self.cell
    }

    /// Absolute origin of the cell's coordinate system.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Absolute bounds; `None` for cells without geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn style(&self) -> Option<&Style> {
        self.style.as_ref()
    }

    /// True if the state must be recomputed by the next validation.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }
}

/// Invalidation propagator and cell state cache for one model.
#[derive(Debug, Default)]
pub struct GraphView {
    states: HashMap<CellKey, CellState>,
    current_root: Option<CellKey>,
    graph_bounds: Option<Bounds>,
    validation_count: usize,
}

impl GraphView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validated view and subscribes it to `model`.
    pub fn attach(model: &mut Model) -> Rc<RefCell<Self>> {
        let mut view = Self::new();
        view.revalidate(model);
        let view = Rc::new(RefCell::new(view));
        model.subscribe(view.clone());
        view
    }

    pub fn state(&self, cell: CellKey) -> Option<&CellState> {
        self.states.get(&cell)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// The cell the view is drilled into, `None` at the top level.
    pub fn current_root(&self) -> Option<CellKey> {
        self.current_root
    }

    /// Union of the bounds of every cell with geometry.
    pub fn graph_bounds(&self) -> Option<Bounds> {
        self.graph_bounds
    }

    /// Number of states recomputed by the last validation.
    pub fn validation_count(&self) -> usize {
        self.validation_count
    }

    /// Shows only `cell` and its descendants.
    pub fn drill_into(&mut self, model: &Model, cell: CellKey) {
        debug!(cell:% = cell; "Drilling into cell");
        self.current_root = Some(cell);
        self.states.clear();
        self.revalidate(model);
    }

    /// Returns to the top level.
    pub fn home(&mut self, model: &Model) {
        self.current_root = None;
        self.states.clear();
        self.revalidate(model);
    }

    /// Marks the state of `cell` invalid, optionally with its descendants
    /// and the edges connected to each visited cell.
    pub fn invalidate(&mut self, model: &Model, cell: CellKey, recurse: bool, include_edges: bool) {
        let mut visited = HashSet::new();
        self.invalidate_with(model, cell, recurse, include_edges, &mut visited);
    }

    fn invalidate_with(
        &mut self,
        model: &Model,
        cell: CellKey,
        recurse: bool,
        include_edges: bool,
        visited: &mut HashSet<CellKey>,
    ) {
        if let Some(state) = self.states.get_mut(&cell) {
            state.invalid = true;
        }
        if !visited.insert(cell) {
            return;
        }
        if recurse {
            for child in model.get_children(cell) {
                self.invalidate_with(model, *child, recurse, include_edges, visited);
            }
        }
        if include_edges {
            for edge in model.get_edges(cell) {
                self.invalidate_with(model, edge, recurse, include_edges, visited);
            }
        }
    }

    /// Drops the cached state of `cell` only.
    pub fn remove_state(&mut self, cell: CellKey) -> Option<CellState> {
        self.states.remove(&cell)
    }

    /// Drops the cached states of `cell` and its descendants, children first.
    ///
    /// Edges connected to the evicted cells are invalidated.
    pub fn remove_state_for_cell(&mut self, model: &Model, cell: CellKey) {
        for child in model.get_children(cell) {
            self.remove_state_for_cell(model, *child);
        }
        self.invalidate(model, cell, false, true);
        if self.remove_state(cell).is_some() {
            trace!(cell:% = cell; "State removed");
        }
    }

    /// Invalidates every state and validates.
    pub fn revalidate(&mut self, model: &Model) {
        for state in self.states.values_mut() {
            state.invalid = true;
        }
        self.validate(model);
    }

    /// Brings the cache in line with the model.
    ///
    /// States are created for visible cells and removed for cells that are
    /// hidden or behind a collapsed ancestor; then every invalid state is
    /// recomputed, parents and terminals before the cells depending on them.
    pub fn validate(&mut self, model: &Model) {
        self.validation_count = 0;
        let Some(root) = self.current_root.or(model.root()) else {
            self.states.clear();
            self.graph_bounds = None;
            return;
        };
        if !model.contains(root) {
            self.current_root = None;
            self.states.clear();
            return self.validate(model);
        }

        let mut live = HashSet::new();
        self.validate_cell(model, root, true, &mut live);
        self.states.retain(|cell, _| live.contains(cell));
        self.validate_cell_state(model, root, true);

        self.graph_bounds = self
            .states
            .values()
            .filter(|state| Some(state.cell) != self.current_root)
            .filter_map(|state| state.bounds)
            .reduce(|acc, bounds| acc.merge(&bounds));
        debug!(
            states = self.states.len(),
            recomputed = self.validation_count;
            "View validated"
        );
    }

    fn validate_cell(
        &mut self,
        model: &Model,
        cell: CellKey,
        visible: bool,
        live: &mut HashSet<CellKey>,
    ) {
        let visible = visible && model.is_visible(cell);
        if visible {
            self.states
                .entry(cell)
                .or_insert_with(|| CellState::new(cell));
            live.insert(cell);
        } else {
            self.states.remove(&cell);
        }

        let expanded = !model.is_collapsed(cell) || self.current_root == Some(cell);
        for child in model.get_children(cell) {
            self.validate_cell(model, *child, visible && expanded, live);
        }
    }

    fn validate_cell_state(&mut self, model: &Model, cell: CellKey, recurse: bool) {
        let Some(state) = self.states.get_mut(&cell) else {
            return;
        };
        if state.invalid {
            state.invalid = false;
            if self.current_root != Some(cell) {
                if let Some(parent) = model.get_parent(cell) {
                    self.validate_cell_state(model, parent, false);
                }
            }
            for is_source in [true, false] {
                if let Some(terminal) = self.visible_terminal(model, cell, is_source) {
                    self.validate_cell_state(model, terminal, false);
                }
            }
            self.update_cell_state(model, cell);
            self.validation_count += 1;
        }

        if recurse {
            for child in model.get_children(cell) {
                self.validate_cell_state(model, *child, true);
            }
        }
    }

    /// Returns the terminal of `edge`, or its nearest ancestor with a state
    /// when the terminal itself is hidden.
    fn visible_terminal(&self, model: &Model, edge: CellKey, is_source: bool) -> Option<CellKey> {
        let terminal = model.get_terminal(edge, is_source)?;
        model
            .ancestors(terminal)
            .find(|cell| self.states.contains_key(cell))
    }

    fn update_cell_state(&mut self, model: &Model, cell: CellKey) {
        let parent_state = if self.current_root == Some(cell) {
            None
        } else {
            model
                .get_parent(cell)
                .and_then(|parent| self.states.get(&parent))
        };
        let parent_origin = parent_state.map(CellState::origin).unwrap_or_default();
        let parent_bounds = parent_state.and_then(CellState::bounds);

        let geometry = model.get_geometry(cell);
        let (origin, bounds) = if model.is_edge(cell) {
            (parent_origin, self.edge_bounds(model, cell, parent_origin))
        } else if let Some(geometry) = geometry {
            let origin = match parent_bounds {
                Some(parent) if geometry.is_relative() => Point::new(
                    parent.min_x() + geometry.x() * parent.width(),
                    parent.min_y() + geometry.y() * parent.height(),
                ),
                _ => parent_origin.add_point(geometry.position()),
            };
            (origin, Some(Bounds::new_from_top_left(origin, geometry.size())))
        } else {
            (parent_origin, None)
        };

        let label = model.get_value(cell).map(str::to_string);
        let style = model.get_style(cell).cloned();
        if let Some(state) = self.states.get_mut(&cell) {
            state.origin = origin;
            state.bounds = bounds;
            state.label = label;
            state.style = style;
        }
    }

    /// Bounds covering the edge's ends and control points.
    fn edge_bounds(&self, model: &Model, edge: CellKey, origin: Point) -> Option<Bounds> {
        let geometry = model.get_geometry(edge);
        let mut points = Vec::new();

        for is_source in [true, false] {
            let end = self
                .visible_terminal(model, edge, is_source)
                .and_then(|terminal| self.states.get(&terminal))
                .and_then(CellState::bounds)
                .map(Bounds::center)
                .or_else(|| {
                    geometry
                        .and_then(|g| g.terminal_point(is_source))
                        .map(|p| origin.add_point(p))
                });
            points.extend(end);
        }
        if let Some(control) = geometry.and_then(|g| g.points()) {
            points.extend(control.iter().map(|p| origin.add_point(*p)));
        }

        Bounds::from_points(points)
    }

    /// Applies the invalidation policy for a committed change list and
    /// validates.
    pub fn graph_model_changed(&mut self, model: &Model, changes: &[Change]) {
        for change in changes {
            self.process_change(model, change);
        }
        self.validate(model);
    }

    fn process_change(&mut self, model: &Model, change: &Change) {
        trace!(kind = change.kind(); "Processing change");
        match change {
            Change::Root(_) => {
                self.states.clear();
                self.current_root = None;
            }
            Change::Child(change) => {
                let child = change.child();
                let parent = model.get_parent(child);
                self.invalidate(model, child, true, true);

                let detached = parent.is_none_or(|p| !model.contains(p) || model.is_collapsed(p));
                if detached {
                    self.remove_state_for_cell(model, child);
                    if self
                        .current_root
                        .is_some_and(|current| model.is_ancestor(child, current))
                    {
                        debug!(cell:% = child; "Current root removed, returning to top level");
                        self.current_root = None;
                        self.states.clear();
                    }
                }

                if parent != change.previous() {
                    if let Some(parent) = parent {
                        self.invalidate(model, parent, false, false);
                    }
                    if let Some(previous) = change.previous() {
                        self.invalidate(model, previous, false, false);
                    }
                }
            }
            Change::Terminal(change) => {
                self.invalidate(model, change.edge(), true, true);
            }
            Change::Geometry(change) => {
                if change.previous() != change.geometry() {
                    self.invalidate(model, change.cell(), true, true);
                }
            }
            Change::Value(change) => {
                self.invalidate(model, change.cell(), false, false);
            }
            Change::Style(change) => {
                self.invalidate(model, change.cell(), true, true);
            }
            Change::Collapsed(change) => {
                self.remove_state_for_cell(model, change.cell());
            }
            Change::Visible(change) => {
                self.remove_state_for_cell(model, change.cell());
            }
        }
    }
}

impl ModelListener for GraphView {
    fn model_changed(&mut self, model: &mut Model, event: &ModelEvent) {
        if let ModelEvent::Change(edit) = event {
            self.graph_model_changed(model, edit.changes());
        }
    }
}
