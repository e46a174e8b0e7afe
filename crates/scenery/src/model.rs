//! The transactional scene-graph model.
//!
//! [`Model`] owns the cell arena, the root pointer, the id registry and the
//! transaction state. Every mutation goes through [`Model::execute`], which
//! applies one [`Change`], appends the applied record to the current
//! transaction log and notifies listeners. Transactions nest; only the
//! outermost [`Model::end_update`] commits the log as one undo unit.
//!
//! # Example
//!
//! ```
//! use scenery::{Model, cell::Cell, geometry::Geometry};
//!
//! let mut model = Model::new();
//! let layer = model.default_layer().unwrap();
//!
//! let a = model.create_cell(Cell::vertex().with_geometry(Geometry::new(0.0, 0.0, 40.0, 30.0)));
//! let b = model.create_cell(Cell::vertex().with_geometry(Geometry::new(100.0, 0.0, 40.0, 30.0)));
//! let edge = model.create_edge(Cell::edge(), Some(a), Some(b));
//!
//! model
//!     .update(|model| {
//!         model.add(layer, a, None)?;
//!         model.add(layer, b, None)?;
//!         model.add(layer, edge, None)?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(model.get_edge_count(a), 1);
//! assert!(model.can_undo());
//!
//! model.undo().unwrap();
//! assert_eq!(model.get_child_count(layer), 0);
//! ```

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, VecDeque},
    fmt,
    rc::Rc,
};

use log::{debug, info, trace, warn};

use scenery_core::{
    cell::{Cell, CellArena},
    geometry::{Geometry, Point},
    identifier::{CellId, CellKey},
    style::Style,
};

use crate::{
    change::Change,
    config::{AppConfig, ModelConfig},
    edit::UndoableEdit,
    error::ModelError,
    event::{ListenerId, ModelEvent, ModelListener, SharedListener},
    history::UndoManager,
};

/// Transactional scene-graph model.
pub struct Model {
    arena: CellArena,
    root: Option<CellKey>,
    /// Id registry of the cells reachable from `root`.
    cells: HashMap<CellId, CellKey>,
    config: ModelConfig,
    next_id: u64,
    /// Ids handed out after `next_id` reached `u64::MAX`.
    exhausted_ids: u64,
    update_level: usize,
    ending_update: bool,
    current_edit: UndoableEdit,
    history: UndoManager,
    listeners: Vec<(ListenerId, SharedListener)>,
    next_listener_id: u64,
    pending_events: VecDeque<ModelEvent>,
    dispatching: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("root", &self.root)
            .field("registered", &self.cells.len())
            .field("next_id", &self.next_id)
            .field("update_level", &self.update_level)
            .field("current_edit", &self.current_edit.len())
            .field("history", &self.history)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Creates a model with a root and one default layer.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Creates a model with a root and one default layer, using `config`.
    pub fn with_config(config: AppConfig) -> Self {
        let mut model = Self::empty(config);
        let root = model.create_root();
        model.root_changed(Some(root));
        info!(root:% = root; "Model created");
        model
    }

    /// Creates a model whose root is `root`.
    ///
    /// The root and any children already attached to it are registered.
    pub fn with_root(root: Cell) -> Self {
        Self::with_root_and_config(root, AppConfig::default())
    }

    pub fn with_root_and_config(root: Cell, config: AppConfig) -> Self {
        let mut model = Self::empty(config);
        let root = model.arena.alloc(root);
        model.root_changed(Some(root));
        info!(root:% = root; "Model created");
        model
    }

    fn empty(config: AppConfig) -> Self {
        Self {
            arena: CellArena::new(),
            root: None,
            cells: HashMap::new(),
            config: config.model().clone(),
            next_id: 0,
            exhausted_ids: 0,
            update_level: 0,
            ending_update: false,
            current_edit: UndoableEdit::new(),
            history: UndoManager::new(config.history().size()),
            listeners: Vec::new(),
            next_listener_id: 0,
            pending_events: VecDeque::new(),
            dispatching: false,
        }
    }

    /// Allocates a detached root with one child layer.
    ///
    /// Nothing is registered until the root is installed.
    pub fn create_root(&mut self) -> CellKey {
        let root = self.arena.alloc(Cell::new());
        let layer = self.arena.alloc(Cell::new());
        self.arena.insert_child(root, layer, None);
        root
    }

    /// Stores `cell` in the model's arena without inserting it in the tree.
    pub fn create_cell(&mut self, cell: Cell) -> CellKey {
        self.arena.alloc(cell)
    }

    /// Stores an edge with its terminal pointers preset.
    ///
    /// The terminals' incident-edge registries are updated when the edge is
    /// inserted with [`Model::add`].
    pub fn create_edge(
        &mut self,
        edge: Cell,
        source: Option<CellKey>,
        target: Option<CellKey>,
    ) -> CellKey {
        let edge = self.arena.alloc(edge);
        self.arena.set_terminal(edge, source, true);
        self.arena.set_terminal(edge, target, false);
        edge
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_create_ids(&self) -> bool {
        self.config.create_ids()
    }

    pub fn set_create_ids(&mut self, value: bool) {
        self.config.set_create_ids(value);
    }

    pub fn is_maintain_edge_parent(&self) -> bool {
        self.config.maintain_edge_parent()
    }

    pub fn set_maintain_edge_parent(&mut self, value: bool) {
        self.config.set_maintain_edge_parent(value);
    }

    // ----------------------------------------------------------------------
    // Listeners
    // ----------------------------------------------------------------------

    /// Registers a listener for model events.
    pub fn subscribe<L>(&mut self, listener: Rc<RefCell<L>>) -> ListenerId
    where
        L: ModelListener + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        let listener: SharedListener = listener;
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Delivers `event` to every listener.
    ///
    /// Events fired while a dispatch is running are queued and delivered in
    /// order once the running event has reached every listener.
    pub(crate) fn fire(&mut self, event: ModelEvent) {
        self.pending_events.push_back(event);
        if self.dispatching {
            return;
        }

        self.dispatching = true;
        while let Some(event) = self.pending_events.pop_front() {
            trace!(event = event.name(); "Dispatching event");
            let listeners: Vec<SharedListener> = self
                .listeners
                .iter()
                .map(|(_, listener)| Rc::clone(listener))
                .collect();
            for listener in listeners {
                let Ok(mut handler) = listener.try_borrow_mut() else {
                    warn!(event = event.name(); "Listener is borrowed, event skipped");
                    continue;
                };
                handler.model_changed(self, &event);
            }
        }
        self.dispatching = false;
    }

    // ----------------------------------------------------------------------
    // Transactions
    // ----------------------------------------------------------------------

    /// Opens a transaction bracket.
    pub fn begin_update(&mut self) {
        self.update_level += 1;
        self.fire(ModelEvent::BeginUpdate);
        if self.update_level == 1 {
            self.fire(ModelEvent::StartEdit);
        }
    }

    /// Closes a transaction bracket.
    ///
    /// Closing the outermost bracket commits the collected changes as one
    /// edit: listeners see `EndUpdate`, then for a non-empty edit
    /// `BeforeUndo`, `Change` and `Undo`, and the edit is recorded in the
    /// undo history. Brackets closed by listeners while the commit is being
    /// dispatched do not commit again.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnbalancedUpdate`] if no bracket is open.
    pub fn end_update(&mut self) -> Result<(), ModelError> {
        if self.update_level == 0 {
            warn!("end_update called without an open transaction");
            return Err(ModelError::UnbalancedUpdate);
        }

        self.update_level -= 1;
        if self.update_level == 0 {
            self.fire(ModelEvent::EndEdit);
        }

        if !self.ending_update {
            self.ending_update = self.update_level == 0;
            self.fire(ModelEvent::EndUpdate(self.current_edit.clone()));

            if self.ending_update && !self.current_edit.is_empty() {
                self.fire(ModelEvent::BeforeUndo(self.current_edit.clone()));
                let edit = std::mem::take(&mut self.current_edit);
                info!(changes = edit.len(); "Edit committed");
                self.fire(ModelEvent::Change(edit.clone()));
                self.fire(ModelEvent::Undo(edit.clone()));
                self.history.record(edit);
            }
            self.ending_update = false;
        }

        Ok(())
    }

    /// Runs `f` inside one transaction bracket.
    ///
    /// The bracket is closed whatever `f` returns, so an early `?` inside the
    /// closure never leaves the depth unbalanced. Changes executed before
    /// the error are kept and committed.
    pub fn update<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ModelError>,
    ) -> Result<T, ModelError> {
        self.begin_update();
        let result = f(self);
        let ended = self.end_update();
        let value = result?;
        ended?;
        Ok(value)
    }

    /// Current transaction depth.
    pub fn update_level(&self) -> usize {
        self.update_level
    }

    /// Changes executed in the open transaction so far.
    pub fn current_edit(&self) -> &UndoableEdit {
        &self.current_edit
    }

    /// Applies `change` inside a transaction and returns the applied record.
    ///
    /// # Errors
    ///
    /// - [`ModelError::ForeignCell`] if the change refers to a cell that was
    ///   not created by this model.
    /// - [`ModelError::CyclicInsert`] if a child change would insert a cell
    ///   beneath itself or one of its descendants.
    pub fn execute(&mut self, change: Change) -> Result<Change, ModelError> {
        self.check_change(&change)?;

        self.begin_update();
        let applied = change.apply(self);
        debug!(kind = applied.kind(), level = self.update_level; "Change executed");
        self.current_edit.push(applied.clone());
        self.fire(ModelEvent::ChangeExecuted(applied.clone()));
        self.end_update()?;

        Ok(applied)
    }

    fn check_change(&self, change: &Change) -> Result<(), ModelError> {
        if let Some(foreign) = change
            .cells()
            .into_iter()
            .find(|cell| !self.arena.contains(*cell))
        {
            return Err(ModelError::ForeignCell(foreign));
        }
        if let Change::Child(child_change) = change {
            let child = child_change.child();
            if let Some(parent) = child_change.parent() {
                if self.is_ancestor(child, parent) {
                    return Err(ModelError::CyclicInsert { parent, child });
                }
            }
        }
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Undo history
    // ----------------------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Reverts the most recently committed edit as a whole.
    ///
    /// Listeners see `StartEdit`, one `ChangeExecuted` per reverted change,
    /// `EndEdit`, `Change` with the reverting records and finally `Undone`.
    pub fn undo(&mut self) -> Result<UndoableEdit, ModelError> {
        let mut edit = self.history.begin_undo().ok_or(ModelError::NothingToUndo)?;
        info!(changes = edit.len(); "Undo");

        self.fire(ModelEvent::StartEdit);
        let applied = edit.revert(self);
        self.fire(ModelEvent::EndEdit);
        self.fire(ModelEvent::Change(applied));

        self.history.end_undo(edit.clone());
        self.fire(ModelEvent::Undone(edit.clone()));
        Ok(edit)
    }

    /// Reapplies the most recently undone edit.
    pub fn redo(&mut self) -> Result<UndoableEdit, ModelError> {
        let mut edit = self.history.begin_redo().ok_or(ModelError::NothingToRedo)?;
        info!(changes = edit.len(); "Redo");

        self.fire(ModelEvent::StartEdit);
        let applied = edit.reapply(self);
        self.fire(ModelEvent::EndEdit);
        self.fire(ModelEvent::Change(applied));

        self.history.end_redo(edit.clone());
        self.fire(ModelEvent::Redone(edit.clone()));
        Ok(edit)
    }

    // ----------------------------------------------------------------------
    // Mutation primitives
    // ----------------------------------------------------------------------

    /// Replaces the root. `None` empties the model.
    pub fn set_root(&mut self, root: Option<CellKey>) -> Result<(), ModelError> {
        self.execute(Change::root(root))?;
        Ok(())
    }

    /// Replaces the root with a fresh root and default layer.
    pub fn clear(&mut self) -> Result<(), ModelError> {
        let root = self.create_root();
        self.set_root(Some(root))
    }

    /// Inserts `child` into `parent` at `index`, appending for `None`.
    ///
    /// A cell is never inserted into itself; that call returns `child`
    /// without doing anything. When the parent changes and edge-parent
    /// maintenance is on, the moved cell (if it is an edge), the edges inside
    /// the moved subtree and the edges connected to it are moved to the
    /// nearest common ancestor of their terminals within the same
    /// transaction.
    pub fn add(
        &mut self,
        parent: CellKey,
        child: CellKey,
        index: Option<usize>,
    ) -> Result<CellKey, ModelError> {
        if parent == child {
            return Ok(child);
        }

        let parent_changed = self.get_parent(child) != Some(parent);
        self.update(|model| {
            model.execute(Change::child(Some(parent), child, index))?;
            if model.config.maintain_edge_parent() && parent_changed {
                model.update_edge_parents(child)?;
            }
            Ok(child)
        })
    }

    /// Removes `cell` from the tree. Removing the root empties the model.
    pub fn remove(&mut self, cell: CellKey) -> Result<CellKey, ModelError> {
        if self.root == Some(cell) {
            self.set_root(None)?;
        } else if self.get_parent(cell).is_some() {
            self.execute(Change::child(None, cell, None))?;
        }
        Ok(cell)
    }

    /// Sets the source or target terminal of `edge`.
    ///
    /// With edge-parent maintenance on, an edge that is part of the tree is
    /// moved under the nearest common ancestor of its new terminals.
    pub fn set_terminal(
        &mut self,
        edge: CellKey,
        terminal: Option<CellKey>,
        is_source: bool,
    ) -> Result<(), ModelError> {
        let changed = self.get_terminal(edge, is_source) != terminal;
        self.update(|model| {
            model.execute(Change::terminal(edge, terminal, is_source))?;
            if model.config.maintain_edge_parent() && changed && model.contains(edge) {
                if let Some(root) = model.root {
                    model.update_edge_parent(edge, root)?;
                }
            }
            Ok(())
        })
    }

    /// Sets both terminals of `edge` in one transaction.
    pub fn set_terminals(
        &mut self,
        edge: CellKey,
        source: Option<CellKey>,
        target: Option<CellKey>,
    ) -> Result<(), ModelError> {
        self.update(|model| {
            model.set_terminal(edge, source, true)?;
            model.set_terminal(edge, target, false)
        })
    }

    pub fn set_value(&mut self, cell: CellKey, value: Option<String>) -> Result<(), ModelError> {
        self.execute(Change::value(cell, value))?;
        Ok(())
    }

    pub fn set_geometry(
        &mut self,
        cell: CellKey,
        geometry: Option<Geometry>,
    ) -> Result<(), ModelError> {
        self.execute(Change::geometry(cell, geometry))?;
        Ok(())
    }

    /// Sets the style of `cell`. Setting an equal style does nothing.
    pub fn set_style(&mut self, cell: CellKey, style: Option<Style>) -> Result<(), ModelError> {
        if self.get_style(cell) != style.as_ref() || !self.arena.contains(cell) {
            self.execute(Change::style(cell, style))?;
        }
        Ok(())
    }

    /// Collapses or expands `cell`. Setting the current state does nothing.
    pub fn set_collapsed(&mut self, cell: CellKey, collapsed: bool) -> Result<(), ModelError> {
        if self.is_collapsed(cell) != collapsed || !self.arena.contains(cell) {
            self.execute(Change::collapsed(cell, collapsed))?;
        }
        Ok(())
    }

    /// Shows or hides `cell`. Setting the current state does nothing.
    pub fn set_visible(&mut self, cell: CellKey, visible: bool) -> Result<(), ModelError> {
        if self.is_visible(cell) != visible || !self.arena.contains(cell) {
            self.execute(Change::visible(cell, visible))?;
        }
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Edge-parent maintenance
    // ----------------------------------------------------------------------

    /// Moves every edge in the subtree of `cell`, `cell` included, and every
    /// edge connected to that subtree under the nearest common ancestor of
    /// its terminals.
    pub fn update_edge_parents(&mut self, cell: CellKey) -> Result<(), ModelError> {
        let root = self.get_root(cell);
        self.update_edge_parents_under(cell, root)
    }

    fn update_edge_parents_under(&mut self, cell: CellKey, root: CellKey) -> Result<(), ModelError> {
        for child in self.get_children(cell).to_vec() {
            self.update_edge_parents_under(child, root)?;
        }
        if self.is_edge(cell) && self.is_ancestor(root, cell) {
            self.update_edge_parent(cell, root)?;
        }
        for edge in self.get_edges(cell) {
            if self.is_ancestor(root, edge) {
                self.update_edge_parent(edge, root)?;
            }
        }
        Ok(())
    }

    /// Moves `edge` under the nearest common ancestor of its terminals.
    ///
    /// Terminals with a relative geometry are replaced by their parent
    /// first. Nothing happens unless both terminals live under `root`. The
    /// edge geometry is translated so the edge keeps its absolute position.
    pub fn update_edge_parent(&mut self, edge: CellKey, root: CellKey) -> Result<(), ModelError> {
        let source = self
            .get_terminal(edge, true)
            .and_then(|t| self.connection_anchor(t));
        let target = self
            .get_terminal(edge, false)
            .and_then(|t| self.connection_anchor(t));
        let (Some(source), Some(target)) = (source, target) else {
            return Ok(());
        };
        if !self.is_ancestor(root, source) || !self.is_ancestor(root, target) {
            return Ok(());
        }

        let cell = if source == target {
            self.get_parent(source)
        } else {
            self.get_nearest_common_ancestor(source, target)
        };
        let Some(cell) = cell else {
            return Ok(());
        };

        let current = self.get_parent(edge);
        if (self.get_parent(cell) != Some(root) || self.is_ancestor(cell, edge))
            && current != Some(cell)
        {
            if let Some(geometry) = self.get_geometry(edge).cloned() {
                let old_origin = current.map(|p| self.get_origin(p)).unwrap_or_default();
                let delta = self.get_origin(cell).sub_point(old_origin);
                if !delta.is_zero() {
                    self.set_geometry(edge, Some(geometry.translate(-delta.x(), -delta.y())))?;
                }
            }
            debug!(edge:% = edge, parent:% = cell; "Moving edge to common ancestor");
            self.add(cell, edge, None)?;
        }
        Ok(())
    }

    /// Climbs from `terminal` past cells placed relative to their parent.
    fn connection_anchor(&self, mut terminal: CellKey) -> Option<CellKey> {
        loop {
            let cell = self.arena.get(terminal)?;
            if cell.is_edge() || !cell.geometry().is_some_and(Geometry::is_relative) {
                return Some(terminal);
            }
            terminal = cell.parent()?;
        }
    }

    /// Returns the absolute origin of `cell`: the sum of the positions of
    /// the cell and its non-edge ancestors.
    pub fn get_origin(&self, cell: CellKey) -> Point {
        self.ancestors(cell)
            .filter_map(|key| self.arena.get(key))
            .filter(|cell| !cell.is_edge())
            .filter_map(Cell::geometry)
            .fold(Point::default(), |origin, geometry| {
                origin.add_point(geometry.position())
            })
    }

    /// Returns the deepest cell that is an ancestor of, or equal to, both
    /// `a` and `b`. A parentless cell (the root) is never returned.
    pub fn get_nearest_common_ancestor(&self, a: CellKey, b: CellKey) -> Option<CellKey> {
        let path: HashSet<CellKey> = self.ancestors(b).collect();
        self.ancestors(a)
            .find(|cell| path.contains(cell))
            .filter(|cell| self.get_parent(*cell).is_some())
    }

    // ----------------------------------------------------------------------
    // Change callbacks
    // ----------------------------------------------------------------------

    pub(crate) fn root_changed(&mut self, root: Option<CellKey>) -> Option<CellKey> {
        let previous = std::mem::replace(&mut self.root, root);
        self.next_id = 0;
        self.exhausted_ids = 0;
        self.cells.clear();
        if let Some(root) = root {
            self.cell_added(root);
        }
        info!(root:? = root, previous:? = previous; "Root replaced");
        previous
    }

    /// Moves `child` and returns its previous parent and index.
    pub(crate) fn parent_for_cell_changed(
        &mut self,
        child: CellKey,
        parent: Option<CellKey>,
        index: Option<usize>,
    ) -> (Option<CellKey>, Option<usize>) {
        let previous = self.get_parent(child);
        let previous_index = previous
            .and_then(|p| self.arena.get(p))
            .and_then(|p| p.index_of(child));

        match parent {
            Some(parent) => {
                if Some(parent) != previous || index != previous_index {
                    self.arena.insert_child(parent, child, index);
                }
            }
            None => {
                self.arena.detach_from_parent(child);
            }
        }

        let contained_now = parent.is_some_and(|p| self.contains(p));
        let contained_before = previous.is_some_and(|p| self.contains(p));
        if contained_now && !contained_before {
            self.cell_added(child);
        } else if contained_before && !contained_now {
            self.cell_removed(child);
        }

        (previous, previous_index)
    }

    /// Registers or unregisters the terminals of `cell` and its descendants.
    ///
    /// The terminal pointers themselves are kept so that reinserting the
    /// subtree reconnects it.
    pub(crate) fn connect(&mut self, cell: CellKey, is_connect: bool) {
        let Some(current) = self.arena.get(cell) else {
            return;
        };
        let source = current.terminal(true);
        let target = current.terminal(false);
        let children = current.children().to_vec();

        if let Some(source) = source {
            self.terminal_for_cell_changed(cell, is_connect.then_some(source), true);
        }
        if let Some(target) = target {
            self.terminal_for_cell_changed(cell, is_connect.then_some(target), false);
        }
        self.arena.set_terminal(cell, source, true);
        self.arena.set_terminal(cell, target, false);

        for child in children {
            self.connect(child, is_connect);
        }
    }

    pub(crate) fn terminal_for_cell_changed(
        &mut self,
        edge: CellKey,
        terminal: Option<CellKey>,
        is_source: bool,
    ) -> Option<CellKey> {
        let previous = self.get_terminal(edge, is_source);
        match terminal {
            Some(terminal) => self.arena.insert_edge(terminal, edge, is_source),
            None => {
                if let Some(previous) = previous {
                    self.arena.remove_edge(previous, edge, is_source);
                }
            }
        }
        previous
    }

    pub(crate) fn geometry_for_cell_changed(
        &mut self,
        cell: CellKey,
        geometry: Option<Geometry>,
    ) -> Option<Geometry> {
        self.arena.get_mut(cell)?.set_geometry(geometry)
    }

    pub(crate) fn value_for_cell_changed(
        &mut self,
        cell: CellKey,
        value: Option<String>,
    ) -> Option<String> {
        self.arena.get_mut(cell)?.set_value(value)
    }

    pub(crate) fn style_for_cell_changed(
        &mut self,
        cell: CellKey,
        style: Option<Style>,
    ) -> Option<Style> {
        self.arena.get_mut(cell)?.set_style(style)
    }

    pub(crate) fn collapsed_state_for_cell_changed(
        &mut self,
        cell: CellKey,
        collapsed: bool,
    ) -> bool {
        self.arena
            .get_mut(cell)
            .map_or(collapsed, |cell| cell.set_collapsed(collapsed))
    }

    pub(crate) fn visible_state_for_cell_changed(&mut self, cell: CellKey, visible: bool) -> bool {
        self.arena
            .get_mut(cell)
            .map_or(visible, |cell| cell.set_visible(visible))
    }

    // ----------------------------------------------------------------------
    // Id registry
    // ----------------------------------------------------------------------

    /// Registers `cell` and its descendants, assigning missing ids and
    /// resolving collisions with a fresh id for the newcomer.
    fn cell_added(&mut self, cell: CellKey) {
        let Some(current) = self.arena.get(cell) else {
            return;
        };
        let mut id = current.id().cloned();
        if id.is_none() && self.config.create_ids() {
            id = Some(self.create_id());
        }

        if let Some(mut id) = id {
            while self.cells.get(&id).is_some_and(|other| *other != cell) {
                let fresh = self.create_id();
                trace!(id:% = id, fresh:% = fresh; "Id collision, reassigning");
                id = fresh;
            }
            if let Some(next) = id.as_numeric().and_then(|n| n.checked_add(1)) {
                self.next_id = self.next_id.max(next);
            }
            trace!(cell:% = cell, id:% = id; "Cell registered");
            self.cells.insert(id.clone(), cell);
            if let Some(current) = self.arena.get_mut(cell) {
                current.set_id(Some(id));
            }
        }

        for child in self.get_children(cell).to_vec() {
            self.cell_added(child);
        }
    }

    /// Deregisters `cell` and its descendants, children first.
    fn cell_removed(&mut self, cell: CellKey) {
        for child in self.get_children(cell).to_vec().into_iter().rev() {
            self.cell_removed(child);
        }
        let Some(id) = self.arena.get(cell).and_then(Cell::id).cloned() else {
            return;
        };
        if self.cells.get(&id) == Some(&cell) {
            trace!(cell:% = cell, id:% = id; "Cell deregistered");
            self.cells.remove(&id);
        }
    }

    /// Returns a new id from the configured affixes and the id counter.
    ///
    /// Once the counter reaches `u64::MAX` ids continue with a `-n` suffix,
    /// which never reads back as a numeric id.
    pub fn create_id(&mut self) -> CellId {
        let counter = match self.next_id.checked_add(1) {
            Some(next) => std::mem::replace(&mut self.next_id, next).to_string(),
            None => {
                self.exhausted_ids = self.exhausted_ids.wrapping_add(1);
                warn!(suffix = self.exhausted_ids; "Id counter exhausted");
                format!("{}-{}", self.next_id, self.exhausted_ids)
            }
        };
        CellId::new(format!(
            "{}{}{}",
            self.config.id_prefix(),
            counter,
            self.config.id_postfix()
        ))
    }

    // ----------------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------------

    pub fn root(&self) -> Option<CellKey> {
        self.root
    }

    /// Returns the first child of the root.
    pub fn default_layer(&self) -> Option<CellKey> {
        self.root.and_then(|root| self.get_child_at(root, 0))
    }

    pub fn cell(&self, key: CellKey) -> Option<&Cell> {
        self.arena.get(key)
    }

    /// Returns the registered cell with the given id.
    pub fn get_cell(&self, id: &str) -> Option<CellKey> {
        self.cells.get(id).copied()
    }

    /// Like [`Model::get_cell`], failing with [`ModelError::UnknownCell`].
    pub fn find_cell(&self, id: &str) -> Result<CellKey, ModelError> {
        self.get_cell(id)
            .ok_or_else(|| ModelError::UnknownCell(CellId::new(id)))
    }

    /// Number of registered cells.
    pub fn registered_count(&self) -> usize {
        self.cells.len()
    }

    pub fn get_id(&self, cell: CellKey) -> Option<&CellId> {
        self.arena.get(cell).and_then(Cell::id)
    }

    pub fn get_parent(&self, cell: CellKey) -> Option<CellKey> {
        self.arena.get(cell).and_then(Cell::parent)
    }

    pub fn get_child_count(&self, cell: CellKey) -> usize {
        self.arena.get(cell).map_or(0, Cell::child_count)
    }

    pub fn get_child_at(&self, cell: CellKey, index: usize) -> Option<CellKey> {
        self.arena.get(cell).and_then(|cell| cell.child_at(index))
    }

    pub fn get_children(&self, cell: CellKey) -> &[CellKey] {
        self.arena.get(cell).map(Cell::children).unwrap_or_default()
    }

    /// Returns the children of `parent` that are vertices (if `vertices`)
    /// or edges (if `edges`), in child order. With both flags off every
    /// child is returned.
    pub fn get_child_cells(&self, parent: CellKey, vertices: bool, edges: bool) -> Vec<CellKey> {
        self.get_children(parent)
            .iter()
            .copied()
            .filter(|child| {
                self.arena.get(*child).is_some_and(|cell| {
                    (!vertices && !edges)
                        || (vertices && cell.is_vertex())
                        || (edges && cell.is_edge())
                })
            })
            .collect()
    }

    pub fn get_child_vertices(&self, parent: CellKey) -> Vec<CellKey> {
        self.get_child_cells(parent, true, false)
    }

    pub fn get_child_edges(&self, parent: CellKey) -> Vec<CellKey> {
        self.get_child_cells(parent, false, true)
    }

    /// Returns `parent` and all of its descendants in pre-order.
    pub fn get_descendants(&self, parent: CellKey) -> Vec<CellKey> {
        self.filter_descendants(parent, |_| true)
    }

    /// Returns `parent` and its descendants accepted by `filter`, in pre-order.
    pub fn filter_descendants(&self, parent: CellKey, filter: impl Fn(&Cell) -> bool) -> Vec<CellKey> {
        let mut result = Vec::new();
        let mut stack = vec![parent];
        while let Some(key) = stack.pop() {
            let Some(cell) = self.arena.get(key) else {
                continue;
            };
            if filter(cell) {
                result.push(key);
            }
            stack.extend(cell.children().iter().rev());
        }
        result
    }

    /// Returns true if `cell` is reachable from the root.
    pub fn contains(&self, cell: CellKey) -> bool {
        self.root.is_some_and(|root| self.is_ancestor(root, cell))
    }

    /// Returns true if `parent` is `child` or one of its ancestors.
    pub fn is_ancestor(&self, parent: CellKey, child: CellKey) -> bool {
        self.ancestors(child).any(|cell| cell == parent)
    }

    /// Walks from `cell` up to the topmost ancestor, `cell` included.
    pub fn ancestors(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        std::iter::successors(Some(cell).filter(|c| self.arena.contains(*c)), |c| {
            self.get_parent(*c)
        })
    }

    /// Returns the topmost ancestor of `cell`.
    pub fn get_root(&self, cell: CellKey) -> CellKey {
        self.ancestors(cell).last().unwrap_or(cell)
    }

    pub fn is_root(&self, cell: CellKey) -> bool {
        self.root == Some(cell)
    }

    /// Returns true if `cell` is a direct child of the root.
    pub fn is_layer(&self, cell: CellKey) -> bool {
        self.get_parent(cell).is_some_and(|parent| self.is_root(parent))
    }

    pub fn get_terminal(&self, edge: CellKey, is_source: bool) -> Option<CellKey> {
        self.arena.get(edge).and_then(|cell| cell.terminal(is_source))
    }

    pub fn get_edge_count(&self, cell: CellKey) -> usize {
        self.arena.get(cell).map_or(0, Cell::edge_count)
    }

    pub fn get_edge_at(&self, cell: CellKey, index: usize) -> Option<CellKey> {
        self.arena.get(cell).and_then(|cell| cell.edge_at(index))
    }

    /// Returns the edges connected to `cell`, in connection order.
    pub fn get_edges(&self, cell: CellKey) -> Vec<CellKey> {
        self.arena
            .get(cell)
            .map(|cell| cell.edges().collect())
            .unwrap_or_default()
    }

    /// Returns the connected edges whose target is `cell`. Self loops are included.
    pub fn get_incoming_edges(&self, cell: CellKey) -> Vec<CellKey> {
        self.directed_edges(cell, false)
    }

    /// Returns the connected edges whose source is `cell`. Self loops are included.
    pub fn get_outgoing_edges(&self, cell: CellKey) -> Vec<CellKey> {
        self.directed_edges(cell, true)
    }

    fn directed_edges(&self, cell: CellKey, is_source: bool) -> Vec<CellKey> {
        self.get_edges(cell)
            .into_iter()
            .filter(|edge| self.get_terminal(*edge, is_source) == Some(cell))
            .collect()
    }

    /// Returns the edges connecting `source` and `target`; with `directed`
    /// only those going from `source` to `target`.
    pub fn get_edges_between(&self, source: CellKey, target: CellKey, directed: bool) -> Vec<CellKey> {
        self.get_edges(source)
            .into_iter()
            .filter(|edge| {
                let s = self.get_terminal(*edge, true);
                let t = self.get_terminal(*edge, false);
                (s == Some(source) && t == Some(target))
                    || (!directed && s == Some(target) && t == Some(source))
            })
            .collect()
    }

    pub fn get_value(&self, cell: CellKey) -> Option<&str> {
        self.arena.get(cell).and_then(Cell::value)
    }

    pub fn get_geometry(&self, cell: CellKey) -> Option<&Geometry> {
        self.arena.get(cell).and_then(Cell::geometry)
    }

    pub fn get_style(&self, cell: CellKey) -> Option<&Style> {
        self.arena.get(cell).and_then(Cell::style)
    }

    pub fn is_vertex(&self, cell: CellKey) -> bool {
        self.arena.get(cell).is_some_and(Cell::is_vertex)
    }

    pub fn is_edge(&self, cell: CellKey) -> bool {
        self.arena.get(cell).is_some_and(Cell::is_edge)
    }

    pub fn is_connectable(&self, cell: CellKey) -> bool {
        self.arena.get(cell).is_some_and(Cell::is_connectable)
    }

    pub fn is_collapsed(&self, cell: CellKey) -> bool {
        self.arena.get(cell).is_some_and(Cell::is_collapsed)
    }

    /// Unknown cells report as visible.
    pub fn is_visible(&self, cell: CellKey) -> bool {
        self.arena.get(cell).is_none_or(Cell::is_visible)
    }
}
