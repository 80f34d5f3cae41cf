//! The runtime database: an indexed collection of tables, plus the
//! per-thread shadow databases that let worker threads append elements
//! without synchronization.

use std::sync::Arc;

use gridkernel_ids::{DatabaseIndex, MappingPool, RowTypeId, TableId};
use gridkernel_table::Table;

/// A schema filter: which rows a table should carry in a shadow database,
/// given the set of rows the corresponding main table carries. Modules
/// typically exclude cold rows (graphics resources, anything never touched
/// by a thread-local task) from their shadow declarations.
pub trait ShadowSchema {
    fn include(&self, row: RowTypeId) -> bool;
}

impl<F: Fn(RowTypeId) -> bool> ShadowSchema for F {
    fn include(&self, row: RowTypeId) -> bool {
        self(row)
    }
}

/// Includes every row the main table has. The simplest, least efficient
/// shadow schema; useful for tests and for modules with no cold rows.
pub struct FullSchema;
impl ShadowSchema for FullSchema {
    fn include(&self, _row: RowTypeId) -> bool {
        true
    }
}

/// An indexed collection of [`Table`]s. `database` identifies whether this
/// is the main database or one worker's shadow.
pub struct Database {
    database: DatabaseIndex,
    tables: Vec<Table>,
    pool: Arc<MappingPool>,
}

impl Database {
    pub fn new(database: DatabaseIndex, pool: Arc<MappingPool>) -> Self {
        Self {
            database,
            tables: Vec::new(),
            pool,
        }
    }

    pub fn pool(&self) -> &Arc<MappingPool> {
        &self.pool
    }

    pub fn database_index(&self) -> DatabaseIndex {
        self.database
    }

    /// Adds a new, empty table to this database and returns a handle to
    /// populate its schema. Table ids are assigned in insertion order and
    /// are immutable thereafter; they're handed out once, during the
    /// database-creation phase.
    pub fn add_table(&mut self) -> &mut Table {
        let id = TableId::new(self.database, self.tables.len() as u32);
        self.tables.push(Table::new(id));
        self.tables.last_mut().unwrap()
    }

    pub fn try_get(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.index as usize).filter(|t| t.table_id() == id)
    }

    pub fn try_get_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.get_mut(id.index as usize).filter(|t| t.table_id() == id)
    }

    /// Mutable access to two distinct tables at once, safely: `a` and `b`
    /// must name different table indices, checked up front via
    /// `split_at_mut` rather than raw pointers. Used by event processing,
    /// which moves elements between a source and a destination table it
    /// doesn't know are disjoint from any other caller's perspective, only
    /// from its own.
    pub fn try_get2_mut(&mut self, a: TableId, b: TableId) -> Option<(&mut Table, &mut Table)> {
        if a.index == b.index {
            return None;
        }
        let (lo, hi, swapped) = if a.index < b.index { (a, b, false) } else { (b, a, true) };
        let hi_idx = hi.index as usize;
        if hi_idx >= self.tables.len() {
            return None;
        }
        let (left, right) = self.tables.split_at_mut(hi_idx);
        let t_lo = left.get_mut(lo.index as usize)?;
        let t_hi = right.first_mut()?;
        if t_lo.table_id() != lo || t_hi.table_id() != hi {
            return None;
        }
        Some(if swapped { (t_hi, t_lo) } else { (t_lo, t_hi) })
    }

    /// Mutable access to a table through a shared `&Database`.
    ///
    /// # Safety
    /// The scheduler (`gridkernel-sched`) is the only intended caller. It
    /// upholds the precondition by construction: a task only ever receives
    /// a `Database` reference from which it's valid to call this for the
    /// tables named in the task's own access fingerprint, and the
    /// dependency graph guarantees no other task concurrently holds a
    /// conflicting reference to the same table. A task that touches a table
    /// it did not declare breaks this invariant and is a bug in that task,
    /// not in the scheduler. Calling this outside the scheduler must
    /// replicate that non-aliasing discipline by hand.
    pub unsafe fn table_mut_unchecked(&self, id: TableId) -> Option<&mut Table> {
        let idx = id.index as usize;
        if idx >= self.tables.len() {
            return None;
        }
        let ptr = self.tables.as_ptr().add(idx) as *mut Table;
        let table = unsafe { &mut *ptr };
        (table.table_id() == id).then_some(table)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Returns the ids of every table that contains all of `rows`.
    pub fn query(&self, rows: &[RowTypeId]) -> Vec<TableId> {
        self.tables
            .iter()
            .filter(|t| rows.iter().all(|r| t.has_row(*r)))
            .map(|t| t.table_id())
            .collect()
    }

    /// Builds a shadow database replicating this database's table layout
    /// (same table count, same indices, so `TableId::same_table` lines a
    /// shadow table up with its main counterpart) but restricted per-table
    /// to the rows `schema` admits. Used once per worker thread at
    /// scheduler init.
    pub fn new_shadow(&self, worker: u32, pool: Arc<MappingPool>, schema: &dyn ShadowSchema) -> Database {
        let mut shadow = Database::new(DatabaseIndex::Shadow(worker), pool);
        for table in &self.tables {
            let t = shadow.add_table();
            debug_assert_eq!(t.table_id().index, table.table_id().index);
            for row in table.row_types() {
                if schema.include(row) {
                    if let Some(storage) = table.row(row) {
                        t.declare_row(row, storage.empty_like());
                    }
                }
            }
        }
        shadow
    }

    /// Drains every table of `src` into the correspondingly-indexed table of
    /// `self`, one `Table::migrate` call per non-empty table. Run once per
    /// frame as the shadow-migration barrier: after this call every table
    /// in `src` reports size zero.
    pub fn migrate_all_from(&mut self, src: &mut Database, pool: &MappingPool) {
        for i in 0..src.tables.len().min(self.tables.len()) {
            let count = src.tables[i].element_count();
            if count == 0 {
                continue;
            }
            src.tables[i].migrate(0, count, &mut self.tables[i], pool);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridkernel_ids::{reserved, RowKind};
    use gridkernel_table::DenseColumn;

    fn fresh_pool() -> Arc<MappingPool> {
        Arc::new(MappingPool::new())
    }

    #[test]
    fn shadow_migration_drains_to_zero() {
        let pool = fresh_pool();
        let mut main = Database::new(DatabaseIndex::Main, pool.clone());
        {
            let t = main.add_table();
            t.declare_row(reserved::stable_id_row(), Box::new(DenseColumn::<gridkernel_ids::MappingSlotId>::new()));
            t.declare_row(RowTypeId::from_name("hp", RowKind::Dense), Box::new(DenseColumn::<u32>::new()));
        }
        let mut shadow = main.new_shadow(0, pool.clone(), &FullSchema);
        shadow.tables.get_mut(0).unwrap().add_elements(&pool, 3);

        main.migrate_all_from(&mut shadow, &pool);

        assert_eq!(shadow.tables[0].element_count(), 0);
        assert_eq!(main.tables[0].element_count(), 3);
    }

    #[test]
    fn shadow_schema_subset_tolerated() {
        let pool = fresh_pool();
        let mut main = Database::new(DatabaseIndex::Main, pool.clone());
        let cold = RowTypeId::from_name("cold", RowKind::Dense);
        {
            let t = main.add_table();
            t.declare_row(reserved::stable_id_row(), Box::new(DenseColumn::<gridkernel_ids::MappingSlotId>::new()));
            t.declare_row(cold, Box::new(DenseColumn::<u32>::new()));
        }
        // shadow omits `cold`.
        let mut shadow = main.new_shadow(0, pool.clone(), &|r: RowTypeId| r != cold);
        assert!(!shadow.tables[0].has_row(cold));
        shadow.tables.get_mut(0).unwrap().add_elements(&pool, 1);

        main.migrate_all_from(&mut shadow, &pool);
        assert_eq!(main.tables[0].element_count(), 1);
        // main's cold row was default-backfilled for the migrated element.
        assert_eq!(main.tables[0].dense::<u32>(cold).unwrap().at(0), Some(&0));
    }
}
