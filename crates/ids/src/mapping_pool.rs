use parking_lot::Mutex;

use crate::table_id::TableId;

/// An index into the [`MappingPool`]'s slot vector. Not meaningful on its
/// own; always paired with an expected version inside a [`StableRef`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct MappingSlotId(u32);

/// A versioned, relocation-tolerant handle to an element.
///
/// Survives element migration between tables and swap-removal within a
/// table. Becomes stale the instant the element it names is destroyed: the
/// backing slot's version advances, and `resolve` starts returning `None`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct StableRef {
    slot: MappingSlotId,
    expected_version: u64,
}

struct Slot {
    location: Option<(TableId, u32)>,
    version: u64,
}

/// The process-wide store of mapping slots backing every [`StableRef`],
/// shared between the main database and all per-thread shadow databases.
/// Slots are append-only storage with a freelist of recycled indices, the
/// same discipline used by a classic free-list allocator, minus the
/// `RefCell` indirection such allocators typically add (slots here hold
/// plain data, not externally-owned `T`) and plus the version field this
/// component needs.
pub struct MappingPool {
    inner: Mutex<Inner>,
}

struct Inner {
    slots: Vec<Slot>,
    freelist: Vec<u32>,
}

impl Default for MappingPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingPool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: Vec::new(),
                freelist: Vec::new(),
            }),
        }
    }

    /// Allocates a fresh mapping slot pointing at `(table, element_index)`
    /// and returns the `StableRef` naming it.
    pub fn alloc(&self, table: TableId, element_index: u32) -> StableRef {
        let mut inner = self.inner.lock();
        let idx = match inner.freelist.pop() {
            Some(idx) => idx,
            None => {
                let idx = inner.slots.len() as u32;
                inner.slots.push(Slot {
                    location: None,
                    version: 0,
                });
                idx
            }
        };
        let version = {
            let slot = &mut inner.slots[idx as usize];
            slot.location = Some((table, element_index));
            slot.version
        };
        StableRef {
            slot: MappingSlotId(idx),
            expected_version: version,
        }
    }

    /// Unpacks a `StableRef` into its current location, or `None` if the
    /// ref is stale (the slot's version has since advanced past it).
    pub fn resolve(&self, r: StableRef) -> Option<(TableId, u32)> {
        let inner = self.inner.lock();
        let slot = inner.slots.get(r.slot.0 as usize)?;
        if slot.version != r.expected_version {
            return None;
        }
        slot.location
    }

    /// Updates a live slot's location after the element it names moves
    /// (migrate, or a swap-remove shifting the last element). Does not
    /// touch the version: relocation never invalidates a `StableRef`.
    pub fn relocate(&self, slot: MappingSlotId, table: TableId, element_index: u32) {
        let mut inner = self.inner.lock();
        if let Some(s) = inner.slots.get_mut(slot.0 as usize) {
            s.location = Some((table, element_index));
        }
    }

    /// Recycles a slot: advances its version (invalidating every
    /// outstanding `StableRef` with the prior version) and returns it to
    /// the freelist. Idempotent: recycling an already-free slot is a
    /// no-op, which is what makes duplicate destroy events in the same
    /// frame harmless.
    pub fn recycle(&self, slot: MappingSlotId) {
        let mut inner = self.inner.lock();
        let Some(s) = inner.slots.get_mut(slot.0 as usize) else {
            return;
        };
        if s.location.is_none() {
            return;
        }
        s.location = None;
        s.version += 1;
        inner.freelist.push(slot.0);
    }

    /// The slot id backing a live `StableRef`. Tables use this to know
    /// which slot to [`relocate`](Self::relocate) when an element moves.
    pub fn slot_of(r: StableRef) -> MappingSlotId {
        r.slot
    }

    /// Reconstructs the current, valid `StableRef` naming `slot`, if the
    /// slot is presently allocated. Used when a table needs to hand out a
    /// fresh reference to an element it already knows the mapping slot of.
    pub fn current_ref(&self, slot: MappingSlotId) -> Option<StableRef> {
        let inner = self.inner.lock();
        let s = inner.slots.get(slot.0 as usize)?;
        s.location.is_some().then_some(StableRef {
            slot,
            expected_version: s.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ref_resolves() {
        let pool = MappingPool::new();
        let r = pool.alloc(TableId::main(0), 3);
        assert_eq!(pool.resolve(r), Some((TableId::main(0), 3)));
    }

    #[test]
    fn recycle_invalidates_ref() {
        let pool = MappingPool::new();
        let r = pool.alloc(TableId::main(0), 0);
        pool.recycle(MappingPool::slot_of(r));
        assert_eq!(pool.resolve(r), None);
    }

    #[test]
    fn double_recycle_is_idempotent() {
        let pool = MappingPool::new();
        let r = pool.alloc(TableId::main(0), 0);
        let slot = MappingPool::slot_of(r);
        pool.recycle(slot);
        pool.recycle(slot);
        assert_eq!(pool.resolve(r), None);
    }

    #[test]
    fn relocate_preserves_ref() {
        let pool = MappingPool::new();
        let r = pool.alloc(TableId::main(0), 0);
        pool.relocate(MappingPool::slot_of(r), TableId::main(1), 5);
        assert_eq!(pool.resolve(r), Some((TableId::main(1), 5)));
    }

    #[test]
    fn recycled_slot_is_reused_with_new_version() {
        let pool = MappingPool::new();
        let r1 = pool.alloc(TableId::main(0), 0);
        pool.recycle(MappingPool::slot_of(r1));
        let r2 = pool.alloc(TableId::main(0), 0);
        assert_eq!(MappingPool::slot_of(r1), MappingPool::slot_of(r2));
        assert_eq!(pool.resolve(r1), None);
        assert_eq!(pool.resolve(r2), Some((TableId::main(0), 0)));
    }
}
