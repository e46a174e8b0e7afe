//! Edit scripts and their replay.
//!
//! A script is a TOML document holding an ordered list of `[[step]]`
//! tables, each tagged by `op`:
//!
//! ```toml
//! [[step]]
//! op = "add-vertex"
//! name = "a"
//! value = "A"
//! geometry = { x = 10.0, y = 20.0, width = 40.0, height = 30.0 }
//!
//! [[step]]
//! op = "begin"
//!
//! [[step]]
//! op = "set-value"
//! cell = "a"
//! value = "renamed"
//!
//! [[step]]
//! op = "end"
//! ```
//!
//! Cells are addressed by script-local names. A cell created by a step uses
//! its name as its id, so the report shows the same names. `root` and
//! `layer` refer to the model root and its default layer.

use std::{cell::RefCell, collections::HashMap, fmt::Write as _, rc::Rc};

use log::{debug, info};
use serde::Deserialize;

use scenery::{
    GraphView, Model, ModelError, ModelEvent, ModelListener,
    cell::Cell,
    config::AppConfig,
    geometry::{Bounds, Geometry},
    identifier::CellKey,
};

use crate::error::CliError;

/// A parsed edit script.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default, rename = "step")]
    steps: Vec<Step>,
}

impl Script {
    /// Parses a script from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Script`] with the offending span when the source
    /// is not a valid script.
    pub fn parse(src: &str) -> Result<Self, CliError> {
        toml::from_str(src).map_err(|err| CliError::from_toml(err, src))
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// One script step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    AddVertex {
        name: String,
        parent: Option<String>,
        index: Option<usize>,
        value: Option<String>,
        style: Option<String>,
        geometry: Option<GeometrySpec>,
    },
    AddEdge {
        name: String,
        source: Option<String>,
        target: Option<String>,
        parent: Option<String>,
        value: Option<String>,
        style: Option<String>,
        geometry: Option<GeometrySpec>,
    },
    Move {
        cell: String,
        parent: String,
        index: Option<usize>,
    },
    Remove {
        cell: String,
    },
    /// Sets both terminals; an omitted terminal disconnects that end.
    Connect {
        edge: String,
        source: Option<String>,
        target: Option<String>,
    },
    SetValue {
        cell: String,
        value: Option<String>,
    },
    SetGeometry {
        cell: String,
        geometry: Option<GeometrySpec>,
    },
    SetStyle {
        cell: String,
        style: Option<String>,
    },
    SetCollapsed {
        cell: String,
        collapsed: bool,
    },
    SetVisible {
        cell: String,
        visible: bool,
    },
    Begin,
    End,
    Undo,
    Redo,
}

/// Geometry as written in a script.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeometrySpec {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    relative: bool,
}

impl From<GeometrySpec> for Geometry {
    fn from(spec: GeometrySpec) -> Self {
        Geometry::new(spec.x, spec.y, spec.width, spec.height).with_relative(spec.relative)
    }
}

/// Collects one line per committed, undone or redone edit.
#[derive(Debug, Default)]
struct Transcript {
    commits: usize,
    lines: Vec<String>,
}

impl ModelListener for Transcript {
    fn model_changed(&mut self, _model: &mut Model, event: &ModelEvent) {
        match event {
            ModelEvent::Undo(edit) => {
                self.commits += 1;
                self.lines
                    .push(format!("edit #{}: {} changes", self.commits, edit.len()));
            }
            ModelEvent::Undone(edit) => self.lines.push(format!("undo: {} changes", edit.len())),
            ModelEvent::Redone(edit) => self.lines.push(format!("redo: {} changes", edit.len())),
            _ => {}
        }
    }
}

/// Replays scripts against a model with an attached view.
pub struct Replay {
    model: Model,
    view: Rc<RefCell<GraphView>>,
    transcript: Rc<RefCell<Transcript>>,
    names: HashMap<String, CellKey>,
}

impl Replay {
    /// Creates a fresh model from `config` and attaches a view to it.
    pub fn new(config: AppConfig) -> Self {
        let mut model = Model::with_config(config);
        let view = GraphView::attach(&mut model);
        let transcript = Rc::new(RefCell::new(Transcript::default()));
        model.subscribe(transcript.clone());

        let mut names = HashMap::new();
        if let Some(root) = model.root() {
            names.insert("root".to_string(), root);
        }
        if let Some(layer) = model.default_layer() {
            names.insert("layer".to_string(), layer);
        }

        Self {
            model,
            view,
            transcript,
            names,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns the bounds of everything the view currently shows.
    pub fn graph_bounds(&self) -> Option<Bounds> {
        self.view.borrow().graph_bounds()
    }

    /// Runs every step of `script` in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step. A script that leaves a `begin`
    /// without its `end` fails with [`CliError::OpenTransaction`].
    pub fn run(&mut self, script: &Script) -> Result<(), CliError> {
        for (index, step) in script.steps().iter().enumerate() {
            self.apply(index + 1, step)?;
        }

        let open = self.model.update_level();
        if open > 0 {
            return Err(CliError::OpenTransaction(open));
        }

        info!(steps = script.steps().len(), edits = self.model.history_len(); "Script replayed");
        Ok(())
    }

    fn apply(&mut self, step: usize, op: &Step) -> Result<(), CliError> {
        debug!(step, op:?; "Applying step");
        let model_err = |source: ModelError| CliError::Model { step, source };

        match op {
            Step::AddVertex {
                name,
                parent,
                index,
                value,
                style,
                geometry,
            } => {
                let parent = self.parent_or_layer(step, parent.as_deref())?;
                let cell = self.build(step, Cell::vertex(), name, value, style, geometry)?;
                let key = self.model.create_cell(cell);
                self.model.add(parent, key, *index).map_err(model_err)?;
                self.names.insert(name.clone(), key);
            }
            Step::AddEdge {
                name,
                source,
                target,
                parent,
                value,
                style,
                geometry,
            } => {
                let parent = self.parent_or_layer(step, parent.as_deref())?;
                let source = self.optional(step, source.as_deref())?;
                let target = self.optional(step, target.as_deref())?;
                let cell = self.build(step, Cell::edge(), name, value, style, geometry)?;
                let key = self.model.create_edge(cell, source, target);
                self.model.add(parent, key, None).map_err(model_err)?;
                self.names.insert(name.clone(), key);
            }
            Step::Move {
                cell,
                parent,
                index,
            } => {
                let cell = self.lookup(step, cell)?;
                let parent = self.lookup(step, parent)?;
                self.model.add(parent, cell, *index).map_err(model_err)?;
            }
            Step::Remove { cell } => {
                let cell = self.lookup(step, cell)?;
                self.model.remove(cell).map_err(model_err)?;
            }
            Step::Connect {
                edge,
                source,
                target,
            } => {
                let edge = self.lookup(step, edge)?;
                let source = self.optional(step, source.as_deref())?;
                let target = self.optional(step, target.as_deref())?;
                self.model
                    .set_terminals(edge, source, target)
                    .map_err(model_err)?;
            }
            Step::SetValue { cell, value } => {
                let cell = self.lookup(step, cell)?;
                self.model
                    .set_value(cell, value.clone())
                    .map_err(model_err)?;
            }
            Step::SetGeometry { cell, geometry } => {
                let cell = self.lookup(step, cell)?;
                self.model
                    .set_geometry(cell, geometry.map(Geometry::from))
                    .map_err(model_err)?;
            }
            Step::SetStyle { cell, style } => {
                let cell = self.lookup(step, cell)?;
                self.model
                    .set_style(cell, style.as_deref().map(Into::into))
                    .map_err(model_err)?;
            }
            Step::SetCollapsed { cell, collapsed } => {
                let cell = self.lookup(step, cell)?;
                self.model
                    .set_collapsed(cell, *collapsed)
                    .map_err(model_err)?;
            }
            Step::SetVisible { cell, visible } => {
                let cell = self.lookup(step, cell)?;
                self.model.set_visible(cell, *visible).map_err(model_err)?;
            }
            Step::Begin => self.model.begin_update(),
            Step::End => self.model.end_update().map_err(model_err)?,
            Step::Undo => {
                self.model.undo().map_err(model_err)?;
            }
            Step::Redo => {
                self.model.redo().map_err(model_err)?;
            }
        }
        Ok(())
    }

    fn build(
        &self,
        step: usize,
        cell: Cell,
        name: &str,
        value: &Option<String>,
        style: &Option<String>,
        geometry: &Option<GeometrySpec>,
    ) -> Result<Cell, CliError> {
        if self.names.contains_key(name) {
            return Err(CliError::DuplicateName {
                step,
                name: name.to_string(),
            });
        }

        let mut cell = cell.with_id(name);
        if let Some(value) = value {
            cell = cell.with_value(value.as_str());
        }
        if let Some(style) = style {
            cell = cell.with_style(style.as_str());
        }
        if let Some(geometry) = geometry {
            cell = cell.with_geometry(Geometry::from(*geometry));
        }
        Ok(cell)
    }

    fn lookup(&self, step: usize, name: &str) -> Result<CellKey, CliError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| CliError::UnknownName {
                step,
                name: name.to_string(),
            })
    }

    fn optional(&self, step: usize, name: Option<&str>) -> Result<Option<CellKey>, CliError> {
        name.map(|name| self.lookup(step, name)).transpose()
    }

    fn parent_or_layer(&self, step: usize, name: Option<&str>) -> Result<CellKey, CliError> {
        self.lookup(step, name.unwrap_or("layer"))
    }

    /// Renders the transcript, the cell outline and the graph bounds.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for line in &self.transcript.borrow().lines {
            let _ = writeln!(out, "{line}");
        }

        if let Some(root) = self.model.root() {
            let _ = writeln!(out);
            self.outline(&mut out, root, 0);
        }

        let _ = writeln!(out);
        match self.graph_bounds() {
            Some(bounds) => {
                let _ = writeln!(
                    out,
                    "bounds: x={:.1} y={:.1} width={:.1} height={:.1}",
                    bounds.min_x(),
                    bounds.min_y(),
                    bounds.width(),
                    bounds.height()
                );
            }
            None => {
                let _ = writeln!(out, "bounds: none");
            }
        }
        out
    }

    fn outline(&self, out: &mut String, cell: CellKey, depth: usize) {
        let model = &self.model;
        let id = model
            .get_id(cell)
            .map_or_else(|| cell.to_string(), ToString::to_string);
        let kind = if model.is_edge(cell) {
            "edge"
        } else if model.is_vertex(cell) {
            "vertex"
        } else {
            "cell"
        };
        let value = model.get_value(cell).unwrap_or("-");

        let mut flags = String::new();
        if model.is_collapsed(cell) {
            flags.push_str(" [collapsed]");
        }
        if !model.is_visible(cell) {
            flags.push_str(" [hidden]");
        }
        let _ = writeln!(out, "{:indent$}{id} {kind} {value}{flags}", "", indent = depth * 2);

        for &child in model.get_children(cell) {
            self.outline(out, child, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(src: &str) -> Result<Replay, CliError> {
        let script = Script::parse(src)?;
        let mut replay = Replay::new(AppConfig::default());
        replay.run(&script)?;
        Ok(replay)
    }

    #[test]
    fn test_parse_steps() {
        let script = Script::parse(
            r#"
            [[step]]
            op = "add-vertex"
            name = "a"
            geometry = { x = 1.0, y = 2.0, width = 3.0, height = 4.0 }

            [[step]]
            op = "set-collapsed"
            cell = "a"
            collapsed = true

            [[step]]
            op = "undo"
            "#,
        )
        .unwrap();

        assert_eq!(script.steps().len(), 3);
        assert!(matches!(
            &script.steps()[0],
            Step::AddVertex { name, geometry: Some(_), parent: None, .. } if name == "a"
        ));
        assert_eq!(script.steps()[2], Step::Undo);
    }

    #[test]
    fn test_parse_error_carries_span() {
        let err = Script::parse("[[step]\nop = \"begin\"\n").unwrap_err();
        let CliError::Script { span, message, .. } = err else {
            panic!("expected a script error, got {err:?}");
        };
        assert!(span.is_some());
        assert!(!message.is_empty());
    }

    #[test]
    fn test_empty_script() {
        let replay = replay("").unwrap();
        assert_eq!(replay.model().history_len(), 0);
        assert!(replay.report().contains("bounds: none"));
    }

    #[test]
    fn test_names_become_ids() {
        let replay = replay(
            r#"
            [[step]]
            op = "add-vertex"
            name = "a"
            value = "A"
            "#,
        )
        .unwrap();

        let a = replay.model().get_cell("a").unwrap();
        assert_eq!(replay.model().get_value(a), Some("A"));
    }

    #[test]
    fn test_transaction_steps_commit_once() {
        let replay = replay(
            r#"
            [[step]]
            op = "begin"

            [[step]]
            op = "add-vertex"
            name = "a"

            [[step]]
            op = "add-vertex"
            name = "b"

            [[step]]
            op = "end"
            "#,
        )
        .unwrap();

        assert_eq!(replay.model().history_len(), 1);
        assert!(replay.report().starts_with("edit #1: 2 changes\n"));
    }

    #[test]
    fn test_open_transaction_is_an_error() {
        let err = replay("[[step]]\nop = \"begin\"\n").err().unwrap();
        assert!(matches!(err, CliError::OpenTransaction(1)));
    }

    #[test]
    fn test_unknown_name() {
        let err = replay("[[step]]\nop = \"remove\"\ncell = \"ghost\"\n")
            .err()
            .unwrap();
        assert!(matches!(err, CliError::UnknownName { step: 1, ref name } if name == "ghost"));
    }

    #[test]
    fn test_duplicate_name() {
        let err = replay(
            r#"
            [[step]]
            op = "add-vertex"
            name = "a"

            [[step]]
            op = "add-vertex"
            name = "a"
            "#,
        )
        .err()
        .unwrap();
        assert!(matches!(err, CliError::DuplicateName { step: 2, .. }));
    }

    #[test]
    fn test_undo_with_empty_history() {
        let err = replay("[[step]]\nop = \"undo\"\n").err().unwrap();
        assert!(matches!(
            err,
            CliError::Model {
                step: 1,
                source: ModelError::NothingToUndo
            }
        ));
    }

    #[test]
    fn test_report_outline() {
        let replay = replay(
            r#"
            [[step]]
            op = "add-vertex"
            name = "a"
            value = "A"
            geometry = { x = 0.0, y = 0.0, width = 10.0, height = 10.0 }

            [[step]]
            op = "add-vertex"
            name = "b"
            geometry = { x = 30.0, y = 0.0, width = 10.0, height = 20.0 }

            [[step]]
            op = "add-edge"
            name = "e"
            source = "a"
            target = "b"

            [[step]]
            op = "set-visible"
            cell = "b"
            visible = false
            "#,
        )
        .unwrap();

        let report = replay.report();
        assert!(report.contains("    a vertex A\n"), "{report}");
        assert!(report.contains("    b vertex - [hidden]\n"), "{report}");
        assert!(report.contains("    e edge -\n"), "{report}");
        assert!(report.contains("edit #4: 1 changes\n"), "{report}");
    }
}
