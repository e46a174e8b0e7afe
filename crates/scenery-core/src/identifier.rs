//! Cell identity.
//!
//! Every cell has two kinds of identity:
//!
//! - [`CellKey`]: a `Copy` handle into the [`CellArena`](crate::cell::CellArena)
//!   that owns the cell. Structural references (parent, children, terminals,
//!   incident edges) are always keys.
//! - [`CellId`]: the stable, user-visible string id. It is assigned or
//!   repaired by the model when the cell is inserted into the tree and is the
//!   key of the model's id registry.

use std::{
    borrow::Borrow,
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

/// Source of unique arena tags.
///
/// # Thread Safety
///
/// Tags are handed out atomically so arenas created on different threads
/// never share a tag.
static NEXT_ARENA_TAG: AtomicU32 = AtomicU32::new(0);

/// Tag identifying the arena a [`CellKey`] was issued by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaTag(u32);

impl ArenaTag {
    /// Returns a tag that has not been handed out before.
    pub(crate) fn next() -> Self {
        Self(NEXT_ARENA_TAG.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle of a cell inside its owning arena.
///
/// Keys are only meaningful for the arena that issued them; an arena rejects
/// keys carrying another arena's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    arena: ArenaTag,
    index: usize,
}

impl CellKey {
    pub(crate) fn new(arena: ArenaTag, index: usize) -> Self {
        Self { arena, index }
    }

    /// Returns the tag of the arena that issued this key.
    pub fn arena(self) -> ArenaTag {
        self.arena
    }

    /// Returns the slot index inside the arena.
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Stable string identifier of a cell.
///
/// # Examples
///
/// ```
/// use scenery_core::identifier::CellId;
///
/// let id = CellId::from("42");
/// assert_eq!(id.as_numeric(), Some(42));
///
/// let named = CellId::new("vertex-a");
/// assert_eq!(named.as_numeric(), None);
/// assert_eq!(named, "vertex-a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(String);

impl CellId {
    /// Creates an id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value of the id if it consists only of digits.
    ///
    /// Numeric ids feed the model's id counter so that generated ids never
    /// reuse a number that has been seen before.
    pub fn as_numeric(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CellId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for CellId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CellId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CellId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
