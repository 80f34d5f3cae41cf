use gridkernel_db::Database;
use gridkernel_ids::{reserved, TableId};
use gridkernel_table::{SparseColumn, Table};

use crate::flags::EventFlags;

fn event_row(table: &Table) -> Option<&SparseColumn<EventFlags>> {
    table.sparse::<EventFlags>(reserved::event_row())
}

fn event_row_mut(table: &mut Table) -> Option<&mut SparseColumn<EventFlags>> {
    table.sparse_mut::<EventFlags>(reserved::event_row())
}

fn target_row_mut(table: &mut Table) -> Option<&mut SparseColumn<TableId>> {
    table.sparse_mut::<TableId>(reserved::move_target_row())
}

/// Marks element `index` of `table` as newly created this frame. No-op if
/// `table` doesn't carry the event row (it isn't opted into the pipeline).
pub fn mark_create(table: &mut Table, index: u32) {
    if let Some(row) = event_row_mut(table) {
        *row.get_or_add(index, EventFlags::empty) |= EventFlags::CREATE;
    }
}

/// Marks element `index` for migration to `dest` at the next
/// [`EventPipeline::process`]. Overwrites any previously pending move
/// target for the same element.
pub fn mark_move(table: &mut Table, index: u32, dest: TableId) {
    if let Some(row) = event_row_mut(table) {
        *row.get_or_add(index, EventFlags::empty) |= EventFlags::MOVE;
    }
    if let Some(row) = target_row_mut(table) {
        *row.get_or_add(index, || dest) = dest;
    }
}

/// Marks element `index` for destruction at the next
/// [`EventPipeline::process`].
pub fn mark_destroy(table: &mut Table, index: u32) {
    if let Some(row) = event_row_mut(table) {
        *row.get_or_add(index, EventFlags::empty) |= EventFlags::DESTROY;
    }
}

/// Applies pending creates, moves, and destroys, then clears the event
/// rows for the next frame. `process` and `clear` are separate methods so
/// a module's post-process hook can still observe which elements were
/// touched this frame before the flags are wiped.
pub struct EventPipeline;

impl EventPipeline {
    /// Destroys everything flagged `DESTROY`, then migrates everything
    /// still flagged `MOVE` (destroy always wins over move on the same
    /// element). Creates require no action here: by the time anything
    /// observes the `CREATE` flag the element already exists.
    ///
    /// `&mut Database` already proves no other code holds a reference into
    /// any table, so delegating to the unchecked form is sound.
    pub fn process(db: &mut Database) {
        unsafe { Self::process_unchecked(db) };
    }

    /// Same effect as [`process`](Self::process), through a shared
    /// reference: lets event application run as a scheduler task (see
    /// `gridkernel_modules::ModuleRegistry::run_frame`) instead of
    /// requiring exclusive ownership of the whole database up front.
    ///
    /// # Safety
    /// Same contract as [`Database::table_mut_unchecked`]: sound when the
    /// caller has proven no other code concurrently holds a reference into
    /// any of `db`'s tables — in practice, a task that declared whole-
    /// database access via `TaskBuilder::get_database`, which the
    /// scheduler serializes against every row-touching task in the frame.
    pub unsafe fn process_unchecked(db: &Database) {
        let tables: Vec<TableId> = db.tables().filter(|t| t.has_row(reserved::event_row())).map(|t| t.table_id()).collect();
        let pool = db.pool().clone();

        for &table_id in &tables {
            let Some(table) = (unsafe { db.table_mut_unchecked(table_id) }) else { continue };
            let mut destroys: Vec<u32> = event_row(table)
                .map(|row| row.iter().filter(|(_, f)| f.contains(EventFlags::DESTROY)).map(|(i, _)| i).collect())
                .unwrap_or_default();
            destroys.sort_unstable_by(|a, b| b.cmp(a));

            for index in destroys {
                table.swap_remove(&pool, index);
            }
        }

        for &table_id in &tables {
            let Some(table) = (unsafe { db.table_mut_unchecked(table_id) }) else { continue };
            let mut moves: Vec<(u32, TableId)> = match event_row(table) {
                Some(row) => row
                    .iter()
                    .filter(|(_, f)| f.contains(EventFlags::MOVE) && !f.contains(EventFlags::DESTROY))
                    .filter_map(|(i, _)| target_row_of(table, i).map(|dest| (i, dest)))
                    .collect(),
                None => Vec::new(),
            };
            moves.sort_unstable_by(|a, b| b.0.cmp(&a.0));

            for (index, dest) in moves {
                if dest == table_id {
                    continue;
                }
                let (Some(src), Some(dst)) = (unsafe { db.table_mut_unchecked(table_id) }, unsafe { db.table_mut_unchecked(dest) }) else {
                    continue;
                };
                src.migrate_one(index, dst, &pool);
            }
        }
    }

    /// Wipes the event and move-target rows of every table that carries
    /// them, ready for the next frame's marks.
    pub fn clear(db: &mut Database) {
        let tables: Vec<TableId> = db.tables().filter(|t| t.has_row(reserved::event_row())).map(|t| t.table_id()).collect();
        for table_id in tables {
            if let Some(table) = db.try_get_mut(table_id) {
                if let Some(row) = event_row_mut(table) {
                    row.clear();
                }
                if let Some(row) = target_row_mut(table) {
                    row.clear();
                }
            }
        }
    }
}

fn target_row_of(table: &Table, index: u32) -> Option<TableId> {
    table.sparse::<TableId>(reserved::move_target_row())?.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridkernel_ids::{DatabaseIndex, MappingPool, RowKind, RowTypeId};
    use gridkernel_table::DenseColumn;
    use std::sync::Arc;

    fn fresh() -> (Database, Arc<MappingPool>) {
        let pool = Arc::new(MappingPool::new());
        let mut db = Database::new(DatabaseIndex::Main, pool.clone());
        {
            let t = db.add_table();
            t.declare_row(reserved::stable_id_row(), Box::new(DenseColumn::<gridkernel_ids::MappingSlotId>::new()));
            t.declare_row(RowTypeId::from_name("hp", RowKind::Dense), Box::new(DenseColumn::<u32>::new()));
            t.declare_row(reserved::event_row(), Box::new(SparseColumn::<EventFlags>::new()));
            t.declare_row(reserved::move_target_row(), Box::new(SparseColumn::<TableId>::new()));
        }
        {
            let t = db.add_table();
            t.declare_row(reserved::stable_id_row(), Box::new(DenseColumn::<gridkernel_ids::MappingSlotId>::new()));
            t.declare_row(RowTypeId::from_name("hp", RowKind::Dense), Box::new(DenseColumn::<u32>::new()));
        }
        (db, pool)
    }

    #[test]
    fn destroy_then_clear_leaves_table_empty() {
        let (mut db, pool) = fresh();
        let t0 = TableId::main(0);
        db.try_get_mut(t0).unwrap().add_elements(&pool, 3);
        mark_destroy(db.try_get_mut(t0).unwrap(), 0);
        mark_destroy(db.try_get_mut(t0).unwrap(), 2);

        EventPipeline::process(&mut db);
        assert_eq!(db.try_get(t0).unwrap().element_count(), 1);

        EventPipeline::clear(&mut db);
        assert!(event_row(db.try_get(t0).unwrap()).unwrap().get(1).is_none());
    }

    #[test]
    fn destroy_takes_precedence_over_move_on_same_element() {
        let (mut db, pool) = fresh();
        let t0 = TableId::main(0);
        let t1 = TableId::main(1);
        db.try_get_mut(t0).unwrap().add_elements(&pool, 1);
        mark_destroy(db.try_get_mut(t0).unwrap(), 0);
        mark_move(db.try_get_mut(t0).unwrap(), 0, t1);

        EventPipeline::process(&mut db);

        assert_eq!(db.try_get(t0).unwrap().element_count(), 0);
        assert_eq!(db.try_get(t1).unwrap().element_count(), 0);
    }

    #[test]
    fn move_relocates_stable_ref_to_destination_table() {
        let (mut db, pool) = fresh();
        let t0 = TableId::main(0);
        let t1 = TableId::main(1);
        db.try_get_mut(t0).unwrap().add_elements(&pool, 1);
        let stable = db.try_get(t0).unwrap().stable_ref_at(&pool, 0).unwrap();
        mark_move(db.try_get_mut(t0).unwrap(), 0, t1);

        EventPipeline::process(&mut db);

        assert_eq!(pool.resolve(stable), Some((t1, 0)));
        assert_eq!(db.try_get(t1).unwrap().element_count(), 1);
    }
}
