use std::fmt;

/// The storage discipline a row type is declared with. Part of a
/// [`RowTypeId`]'s content hash so that the same Rust type used as, say,
/// both a dense column in one table and a shared singleton in another hashes
/// to two distinct row types.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RowKind {
    Dense,
    Sparse,
    Shared,
    Tag,
}

/// A content-addressed identity for a typed column, used to look up columns
/// within a table without compile-time knowledge of the row type.
///
/// Hashed from the row type's Rust path (`std::any::type_name`) and its
/// [`RowKind`] with `blake3`, truncated to 64 bits. This is not meant to be
/// stable across compiler versions or crate refactors; it only needs to be
/// stable for the lifetime of one running process, which `type_name` is.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct RowTypeId(u64);

impl RowTypeId {
    pub fn of<T: 'static>(kind: RowKind) -> Self {
        Self::from_name(std::any::type_name::<T>(), kind)
    }

    /// Builds a `RowTypeId` from an explicit name rather than a Rust type.
    /// Used for well-known kernel-internal rows (the stable-id row, event
    /// rows) that are not tied to any one application-defined type.
    pub fn from_name(name: &str, kind: RowKind) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(name.as_bytes());
        hasher.update(&[kind as u8]);
        let hash = hasher.finalize();
        let bytes: [u8; 8] = hash.as_bytes()[..8].try_into().unwrap();
        Self(u64::from_le_bytes(bytes))
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RowTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowTypeId({:016x})", self.0)
    }
}

/// Well-known row types the kernel itself reserves, independent of any
/// application-declared row.
pub mod reserved {
    use super::{RowKind, RowTypeId};

    /// The dense row carrying each element's [`crate::StableRef`]-backing
    /// mapping slot. A table contains this row if and only if it
    /// participates in the event pipeline.
    pub fn stable_id_row() -> RowTypeId {
        RowTypeId::from_name("gridkernel::stable_id", RowKind::Dense)
    }

    /// The sparse row carrying per-element lifecycle events.
    pub fn event_row() -> RowTypeId {
        RowTypeId::from_name("gridkernel::event", RowKind::Sparse)
    }

    /// The sparse row carrying the destination table of a pending move
    /// event, present only for elements currently flagged for a move.
    pub fn move_target_row() -> RowTypeId {
        RowTypeId::from_name("gridkernel::move_target", RowKind::Sparse)
    }
}
