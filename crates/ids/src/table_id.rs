use std::fmt;

/// Which database a [`TableId`] belongs to: the main database, or one of the
/// per-worker shadow databases (see `gridkernel-db`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DatabaseIndex {
    Main,
    Shadow(u32),
}

/// A (database-index, table-index) pair.
///
/// `DatabaseIndex` is deliberately excluded from [`TableId::same_table`]:
/// callers comparing shadow and main tables for structural identity (e.g.
/// "is this the shadow of that main table") use `same_table`, while `Eq`
/// stays strict so that a `HashMap<TableId, _>` never conflates a shadow
/// table with its main counterpart.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct TableId {
    pub database: DatabaseIndex,
    pub index: u32,
}

impl TableId {
    pub const fn new(database: DatabaseIndex, index: u32) -> Self {
        Self { database, index }
    }

    pub const fn main(index: u32) -> Self {
        Self::new(DatabaseIndex::Main, index)
    }

    pub const fn shadow(worker: u32, index: u32) -> Self {
        Self::new(DatabaseIndex::Shadow(worker), index)
    }

    /// Structural identity ignoring which database the table lives in.
    pub fn same_table(&self, other: &TableId) -> bool {
        self.index == other.index
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.database {
            DatabaseIndex::Main => write!(f, "TableId(main:{})", self.index),
            DatabaseIndex::Shadow(w) => write!(f, "TableId(shadow{}:{})", w, self.index),
        }
    }
}
