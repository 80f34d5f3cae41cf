/// The access mode a task declares for a (table, row) pair in its
/// fingerprint.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AccessMode {
    Read,
    Write,
    /// Modifies the set or count of elements in a table: `addElements`,
    /// `swapRemove`, `migrate`. Conflicts with every other access mode on
    /// the same table, including other `ModifyStructure` accesses.
    ModifyStructure,
}

impl AccessMode {
    /// True if two accesses to the *same* (table, row) from different tasks
    /// must be ordered relative to one another.
    pub fn conflicts_with(self, other: AccessMode) -> bool {
        use AccessMode::*;
        !matches!((self, other), (Read, Read))
    }
}
