use gridkernel_ids::{reserved, MappingPool, MappingSlotId, RowTypeId, StableRef, TableId};
use hashbrown::HashMap;

use crate::column::{DenseColumn, ErasedColumn, SharedColumn, SparseColumn, TagColumn};

/// An ordered set of rows sharing one element count.
///
/// `row_order` is the canonical iteration order used for coherent resize:
/// every structural operation (`add_elements`, `swap_remove`, `migrate`)
/// walks rows in this order so that a panic partway through (debug
/// assertion firing) leaves a reproducible partial state rather than one
/// that depends on hash-map iteration order.
pub struct Table {
    table_id: TableId,
    rows: HashMap<RowTypeId, Box<dyn ErasedColumn>>,
    row_order: Vec<RowTypeId>,
    element_count: u32,
}

impl Table {
    pub fn new(table_id: TableId) -> Self {
        Self {
            table_id,
            rows: HashMap::new(),
            row_order: Vec::new(),
            element_count: 0,
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    /// Adds a row to this table's schema. Only meant to be called during
    /// database construction; schema is frozen once the simulation starts
    /// running tasks. If the table already has elements, the new row is
    /// default-backfilled to stay size-coherent with the rest of the table.
    pub fn declare_row(&mut self, id: RowTypeId, mut storage: Box<dyn ErasedColumn>) {
        if self.rows.contains_key(&id) {
            return;
        }
        storage.add_elements(self.element_count as usize);
        self.row_order.push(id);
        self.rows.insert(id, storage);
    }

    pub fn has_row(&self, id: RowTypeId) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn row_types(&self) -> impl Iterator<Item = RowTypeId> + '_ {
        self.row_order.iter().copied()
    }

    pub fn row(&self, id: RowTypeId) -> Option<&dyn ErasedColumn> {
        self.rows.get(&id).map(|b| b.as_ref())
    }

    pub fn dense<T: 'static>(&self, id: RowTypeId) -> Option<&DenseColumn<T>> {
        self.rows.get(&id)?.as_any().downcast_ref()
    }

    pub fn dense_mut<T: 'static>(&mut self, id: RowTypeId) -> Option<&mut DenseColumn<T>> {
        self.rows.get_mut(&id)?.as_any_mut().downcast_mut()
    }

    pub fn sparse<T: 'static>(&self, id: RowTypeId) -> Option<&SparseColumn<T>> {
        self.rows.get(&id)?.as_any().downcast_ref()
    }

    pub fn sparse_mut<T: 'static>(&mut self, id: RowTypeId) -> Option<&mut SparseColumn<T>> {
        self.rows.get_mut(&id)?.as_any_mut().downcast_mut()
    }

    pub fn shared<T: 'static>(&self, id: RowTypeId) -> Option<&T> {
        self.rows.get(&id)?.as_any().downcast_ref::<SharedColumn<T>>().map(|c| &c.value)
    }

    pub fn shared_mut<T: 'static>(&mut self, id: RowTypeId) -> Option<&mut T> {
        self.rows
            .get_mut(&id)?
            .as_any_mut()
            .downcast_mut::<SharedColumn<T>>()
            .map(|c| &mut c.value)
    }

    pub fn has_tag(&self, id: RowTypeId) -> bool {
        self.rows.get(&id).map(|r| r.as_any().is::<TagColumn>()).unwrap_or(false)
    }

    pub fn has_stable_id(&self) -> bool {
        self.has_row(reserved::stable_id_row())
    }

    fn stable_id_row(&self) -> Option<&DenseColumn<MappingSlotId>> {
        self.dense(reserved::stable_id_row())
    }

    fn stable_id_row_mut(&mut self) -> Option<&mut DenseColumn<MappingSlotId>> {
        self.dense_mut(reserved::stable_id_row())
    }

    /// Resolves a live `StableRef` for the element currently at `i`, if
    /// this table carries a stable-id row and `i` is in bounds.
    pub fn stable_ref_at(&self, pool: &MappingPool, i: u32) -> Option<StableRef> {
        let slot = *self.stable_id_row()?.at(i as usize)?;
        pool.current_ref(slot)
    }

    /// Extends every row by `n` default-constructed elements and returns the
    /// starting index of the run. `n == 0` is a no-op that
    /// returns the current size.
    pub fn add_elements(&mut self, pool: &MappingPool, n: u32) -> u32 {
        let start = self.element_count;
        for id in self.row_order.clone() {
            if let Some(row) = self.rows.get_mut(&id) {
                row.add_elements(n as usize);
            }
        }
        self.element_count += n;
        if self.has_stable_id() {
            for offset in 0..n {
                let index = start + offset;
                let stable_ref = pool.alloc(self.table_id, index);
                let slot = MappingPool::slot_of(stable_ref);
                if let Some(col) = self.stable_id_row_mut() {
                    if let Some(cell) = col.at_mut(index as usize) {
                        *cell = slot;
                    }
                }
            }
        }
        start
    }

    /// Swap-removes element `i`: every row swaps `i` with the last element,
    /// then pops. If this table carries a stable-id row,
    /// the removed element's mapping slot is recycled and the relocated
    /// element's slot is updated to its new position.
    pub fn swap_remove(&mut self, pool: &MappingPool, i: u32) {
        debug_assert!(i < self.element_count, "swap_remove index out of bounds");
        let last = self.element_count - 1;
        let removed_slot = self.stable_id_row().and_then(|c| c.at(i as usize).copied());

        for id in self.row_order.clone() {
            if let Some(row) = self.rows.get_mut(&id) {
                row.erase(i as usize, last as usize);
            }
        }
        self.element_count -= 1;

        if let Some(removed_slot) = removed_slot {
            pool.recycle(removed_slot);
            if last != i {
                if let Some(&moved_slot) = self.stable_id_row().and_then(|c| c.at(i as usize)) {
                    pool.relocate(moved_slot, self.table_id, i);
                }
            }
        }
    }

    /// Moves `count` elements starting at `src_index` into `dst`, which
    /// must have distinct identity from `self` (migrating within the same
    /// table at overlapping ranges is a precondition violation). Rows
    /// present in only one of the two tables are tolerated: a row unique to
    /// `self` has its value discarded; a row unique to `dst` is
    /// default-backfilled so both sides stay size-coherent after every
    /// element. This tolerance is what lets a shadow table's schema be a
    /// strict subset of the main table's.
    pub fn migrate(&mut self, src_index: u32, count: u32, dst: &mut Table, pool: &MappingPool) {
        debug_assert!(
            self.table_id != dst.table_id,
            "migrate requires source and destination to be distinct tables"
        );
        for _ in 0..count {
            debug_assert!(src_index < self.element_count, "migrate src_index out of bounds");
            self.migrate_one(src_index, dst, pool);
        }
    }

    /// Moves the single element at `index` into `dst`. `migrate` is this
    /// called `count` times at a fixed `src_index`: swap-remove means the
    /// element that slides into `src_index` after one removal is exactly
    /// the next one due to migrate, so a fixed-index loop and a
    /// scattered-index call sequence are the same operation.
    pub fn migrate_one(&mut self, index: u32, dst: &mut Table, pool: &MappingPool) {
        debug_assert!(index < self.element_count, "migrate_one index out of bounds");
        let last = self.element_count - 1;
        let dst_index = dst.element_count;
        let moving_slot = self.stable_id_row().and_then(|c| c.at(index as usize).copied());

        for id in self.row_order.clone() {
            let Some(src_row) = self.rows.get_mut(&id) else { continue };
            match dst.rows.get_mut(&id) {
                Some(dst_row) => src_row.move_one(index as usize, last as usize, dst_index as usize, dst_row.as_mut()),
                None => src_row.erase(index as usize, last as usize),
            }
        }
        for id in dst.row_order.clone() {
            if !self.rows.contains_key(&id) {
                if let Some(dst_row) = dst.rows.get_mut(&id) {
                    dst_row.add_elements(1);
                }
            }
        }

        self.element_count -= 1;
        dst.element_count += 1;

        if let Some(slot) = moving_slot {
            pool.relocate(slot, dst.table_id, dst_index);
        }
        if last != index {
            if let Some(&moved_slot) = self.stable_id_row().and_then(|c| c.at(index as usize)) {
                pool.relocate(moved_slot, self.table_id, index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridkernel_ids::{DatabaseIndex, RowKind};

    fn tid(i: u32) -> TableId {
        TableId::new(DatabaseIndex::Main, i)
    }

    fn with_stable_id(table_id: TableId) -> Table {
        let mut t = Table::new(table_id);
        t.declare_row(reserved::stable_id_row(), Box::new(DenseColumn::<MappingSlotId>::new()));
        t
    }

    #[test]
    fn add_elements_zero_is_noop() {
        let pool = MappingPool::new();
        let mut t = with_stable_id(tid(0));
        t.add_elements(&pool, 2);
        let start = t.add_elements(&pool, 0);
        assert_eq!(start, 2);
        assert_eq!(t.element_count(), 2);
    }

    #[test]
    fn add_then_swap_remove_all_restores_count() {
        let pool = MappingPool::new();
        let mut t = with_stable_id(tid(0));
        t.add_elements(&pool, 5);
        for _ in 0..5 {
            t.swap_remove(&pool, 0);
        }
        assert_eq!(t.element_count(), 0);
    }

    #[test]
    fn stable_ref_survives_unrelated_swap_remove() {
        let pool = MappingPool::new();
        let mut t = with_stable_id(tid(0));
        t.add_elements(&pool, 3);
        let kept = t.stable_ref_at(&pool, 1).unwrap();
        t.swap_remove(&pool, 0);
        assert_eq!(pool.resolve(kept), Some((tid(0), 0)));
    }

    #[test]
    fn stable_ref_invalidated_by_its_own_removal() {
        let pool = MappingPool::new();
        let mut t = with_stable_id(tid(0));
        t.add_elements(&pool, 2);
        let victim = t.stable_ref_at(&pool, 0).unwrap();
        t.swap_remove(&pool, 0);
        assert_eq!(pool.resolve(victim), None);
    }

    #[test]
    fn migrate_preserves_stable_ref_and_moves_shared_row_schema_subset() {
        let pool = MappingPool::new();
        let mut src = with_stable_id(tid(0));
        src.declare_row(
            RowTypeId::from_name("position", RowKind::Dense),
            Box::new(DenseColumn::<u32>::new()),
        );
        src.add_elements(&pool, 1);
        *src.dense_mut::<u32>(RowTypeId::from_name("position", RowKind::Dense)).unwrap().at_mut(0).unwrap() = 42;

        let mut dst = with_stable_id(tid(1));
        dst.declare_row(
            RowTypeId::from_name("position", RowKind::Dense),
            Box::new(DenseColumn::<u32>::new()),
        );
        // dst carries an extra cold row absent from src.
        dst.declare_row(RowTypeId::from_name("cold", RowKind::Dense), Box::new(DenseColumn::<u32>::new()));

        let r = src.stable_ref_at(&pool, 0).unwrap();
        src.migrate(0, 1, &mut dst, &pool);

        assert_eq!(src.element_count(), 0);
        assert_eq!(dst.element_count(), 1);
        assert_eq!(pool.resolve(r), Some((tid(1), 0)));
        assert_eq!(
            *dst.dense::<u32>(RowTypeId::from_name("position", RowKind::Dense)).unwrap().at(0).unwrap(),
            42
        );
        // cold row was default-backfilled to keep size coherent.
        assert_eq!(dst.dense::<u32>(RowTypeId::from_name("cold", RowKind::Dense)).unwrap().at(0), Some(&0));
    }

    #[test]
    fn migrate_tolerates_row_only_in_source() {
        let pool = MappingPool::new();
        let mut src = with_stable_id(tid(0));
        src.declare_row(RowTypeId::from_name("hot", RowKind::Dense), Box::new(DenseColumn::<u32>::new()));
        src.add_elements(&pool, 1);

        let mut dst = with_stable_id(tid(1));
        src.migrate(0, 1, &mut dst, &pool);

        assert_eq!(dst.element_count(), 1);
        assert!(!dst.has_row(RowTypeId::from_name("hot", RowKind::Dense)));
    }

    #[test]
    fn round_trip_migrate_back_preserves_dense_values() {
        let pool = MappingPool::new();
        let id = RowTypeId::from_name("v", RowKind::Dense);
        let mut a = with_stable_id(tid(0));
        a.declare_row(id, Box::new(DenseColumn::<u32>::new()));
        a.add_elements(&pool, 1);
        *a.dense_mut::<u32>(id).unwrap().at_mut(0).unwrap() = 7;

        let mut b = with_stable_id(tid(1));
        b.declare_row(id, Box::new(DenseColumn::<u32>::new()));

        a.migrate(0, 1, &mut b, &pool);
        b.migrate(0, 1, &mut a, &pool);

        assert_eq!(a.element_count(), 1);
        assert_eq!(b.element_count(), 0);
        assert_eq!(*a.dense::<u32>(id).unwrap().at(0).unwrap(), 7);
    }
}
