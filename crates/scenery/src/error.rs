//! Error types for Scenery model operations.
//!
//! Queries never fail: asking about an unknown cell yields `None`, `0` or an
//! empty list. Only the programmer errors below are reported.

use thiserror::Error;

use scenery_core::identifier::{CellId, CellKey};

/// The main error type for model operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("No cell with id `{0}` is registered")]
    UnknownCell(CellId),

    #[error("Cell {0} does not belong to this model")]
    ForeignCell(CellKey),

    #[error("Cannot insert cell {child} beneath its own descendant {parent}")]
    CyclicInsert { parent: CellKey, child: CellKey },

    #[error("end_update called without a matching begin_update")]
    UnbalancedUpdate,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}
