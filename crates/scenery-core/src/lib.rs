//! Scenery Core Types and Definitions
//!
//! This crate provides the foundational types the Scenery diagram model is
//! built from. It includes:
//!
//! - **Identifiers**: Stable string ids and arena handles ([`identifier`] module)
//! - **Geometry**: Points, bounds and cell geometry ([`geometry`] module)
//! - **Style**: The opaque `key=value` style blob ([`style::Style`])
//! - **Cells**: Scene tree nodes and the arena that owns them ([`cell`] module)
//!
//! None of these types are transactional. Undoable mutation is layered on top
//! by the `scenery` crate.

pub mod cell;
pub mod geometry;
pub mod identifier;
pub mod style;
