use gridkernel_ids::{AccessMode, RowTypeId, TableId};
use smallvec::SmallVec;

/// One declared access in a task's fingerprint. `TableStructure` and
/// `WholeDatabase` are the coarse declarations from `getModifierForTable` /
/// `getDatabase`: they don't name a row, so they conflict against *every*
/// row access on the table (or database) they name, not just a matching one.
#[derive(Clone, Eq, PartialEq, Debug)]
enum Declared {
    Row(TableId, RowTypeId, AccessMode),
    TableStructure(TableId),
    WholeDatabase,
}

/// The set of (table, row, access-mode) triples a task will touch, plus any
/// whole-table or whole-database dependencies. The sole input to dependency
/// analysis.
#[derive(Clone, Default, Debug)]
pub struct Fingerprint {
    declared: SmallVec<[Declared; 8]>,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, table: TableId, row: RowTypeId, mode: AccessMode) {
        self.declared.push(Declared::Row(table, row, mode));
    }

    pub fn add_table_structure(&mut self, table: TableId) {
        self.declared.push(Declared::TableStructure(table));
    }

    pub fn add_whole_database(&mut self) {
        self.declared.push(Declared::WholeDatabase);
    }

    fn is_whole_database(&self) -> bool {
        self.declared.iter().any(|d| matches!(d, Declared::WholeDatabase))
    }

    fn touches_any_row(&self) -> bool {
        self.declared.iter().any(|d| !matches!(d, Declared::WholeDatabase))
    }

    /// True if `self`, submitted after `earlier`, must be ordered after it.
    /// The relation is not symmetric in general: it is always evaluated as
    /// "does `self` (the later task) depend on `earlier`" but the conflict
    /// predicate it is built from is symmetric.
    pub fn conflicts_with(&self, earlier: &Fingerprint) -> bool {
        if self.is_whole_database() && earlier.touches_any_row() {
            return true;
        }
        if earlier.is_whole_database() && self.touches_any_row() {
            return true;
        }
        for a in &self.declared {
            for b in &earlier.declared {
                if declared_conflict(a, b) {
                    return true;
                }
            }
        }
        false
    }
}

fn declared_conflict(a: &Declared, b: &Declared) -> bool {
    match (a, b) {
        (Declared::Row(ta, ra, ma), Declared::Row(tb, rb, mb)) => ta == tb && ra == rb && ma.conflicts_with(*mb),
        (Declared::Row(ta, _, _), Declared::TableStructure(tb)) | (Declared::TableStructure(tb), Declared::Row(ta, _, _)) => ta == tb,
        (Declared::TableStructure(ta), Declared::TableStructure(tb)) => ta == tb,
        (Declared::WholeDatabase, _) | (_, Declared::WholeDatabase) => false, // handled by the fast path above
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridkernel_ids::DatabaseIndex;

    fn tid(i: u32) -> TableId {
        TableId::new(DatabaseIndex::Main, i)
    }

    fn row(n: &str) -> RowTypeId {
        RowTypeId::from_name(n, gridkernel_ids::RowKind::Dense)
    }

    #[test]
    fn two_readers_do_not_conflict() {
        let mut a = Fingerprint::new();
        a.add_row(tid(0), row("hp"), AccessMode::Read);
        let mut b = Fingerprint::new();
        b.add_row(tid(0), row("hp"), AccessMode::Read);
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn reader_conflicts_with_earlier_writer() {
        let mut writer = Fingerprint::new();
        writer.add_row(tid(0), row("hp"), AccessMode::Write);
        let mut reader = Fingerprint::new();
        reader.add_row(tid(0), row("hp"), AccessMode::Read);
        assert!(reader.conflicts_with(&writer));
    }

    #[test]
    fn structural_access_conflicts_with_any_row_on_table() {
        let mut structural = Fingerprint::new();
        structural.add_table_structure(tid(0));
        let mut reader = Fingerprint::new();
        reader.add_row(tid(0), row("hp"), AccessMode::Read);
        assert!(structural.conflicts_with(&reader));
        assert!(reader.conflicts_with(&structural));
    }

    #[test]
    fn unrelated_tables_never_conflict() {
        let mut a = Fingerprint::new();
        a.add_row(tid(0), row("hp"), AccessMode::Write);
        let mut b = Fingerprint::new();
        b.add_row(tid(1), row("hp"), AccessMode::Write);
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn whole_database_serializes_against_any_row_toucher() {
        let mut earlier = Fingerprint::new();
        earlier.add_row(tid(0), row("hp"), AccessMode::Read);
        let mut later = Fingerprint::new();
        later.add_whole_database();
        assert!(later.conflicts_with(&earlier));
    }
}
