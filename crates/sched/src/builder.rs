use std::marker::PhantomData;
use std::sync::Arc;

use gridkernel_db::Database;
use gridkernel_events::{mark_create, mark_destroy, mark_move};
use gridkernel_ids::{AccessMode, MappingPool, StableRef, TableId};
use gridkernel_table::{DenseRow, SharedRow, SparseRow, TagRow};

use crate::fingerprint::Fingerprint;
use crate::pinning::Pinning;
use crate::query::{Query, QueryMut, SharedQuery, SparseQuery, SparseQueryMut, TagQuery};
use crate::task::{AppTask, TaskCallback};

/// Read access to a dense row by [`StableRef`] rather than by table: useful
/// for tasks that hold onto a handle across frames (projectile targets,
/// parent links) and don't want to re-run a table scan to dereference it.
pub struct Resolver<R: DenseRow> {
    _marker: PhantomData<R>,
}

impl<R: DenseRow> Resolver<R> {
    pub fn get<'a>(&self, db: &'a Database, r: StableRef) -> Option<&'a R> {
        let (table, index) = db.pool().resolve(r)?;
        db.try_get(table)?.dense::<R>(R::row_type_id())?.at(index as usize)
    }

    pub fn get_mut<'a>(&self, db: &'a Database, r: StableRef) -> Option<&'a mut R> {
        let (table, index) = db.pool().resolve(r)?;
        let t = unsafe { db.table_mut_unchecked(table)? };
        t.dense_mut::<R>(R::row_type_id())?.at_mut(index as usize)
    }
}

/// Structural access to one table: `addElements`, `swapRemove`, `migrate`.
/// Declaring this blocks every row access on the same table from running
/// concurrently, since element count and indices are changing underfoot.
pub struct TableModifier {
    table: TableId,
}

impl TableModifier {
    pub fn table(&self) -> TableId {
        self.table
    }

    pub fn add_elements(&self, db: &Database, n: u32) -> Option<u32> {
        let pool = db.pool().clone();
        let t = unsafe { db.table_mut_unchecked(self.table)? };
        Some(t.add_elements(&pool, n))
    }

    pub fn swap_remove(&self, db: &Database, i: u32) -> bool {
        let pool = db.pool().clone();
        match unsafe { db.table_mut_unchecked(self.table) } {
            Some(t) => {
                t.swap_remove(&pool, i);
                true
            }
            None => false,
        }
    }

    pub fn migrate(&self, db: &Database, src_index: u32, count: u32, dst: TableId) -> bool {
        let pool = db.pool().clone();
        let (Some(src), Some(dst_table)) = (unsafe { db.table_mut_unchecked(self.table) }, unsafe { db.table_mut_unchecked(dst) }) else {
            return false;
        };
        src.migrate(src_index, count, dst_table, &pool);
        true
    }

    /// Flags element `index` as newly created, to be picked up by the next
    /// event pipeline pass.
    pub fn mark_create(&self, db: &Database, index: u32) -> bool {
        match unsafe { db.table_mut_unchecked(self.table) } {
            Some(t) => {
                mark_create(t, index);
                true
            }
            None => false,
        }
    }

    /// Flags element `index` to migrate to `dest` at the next event
    /// pipeline pass.
    pub fn mark_move(&self, db: &Database, index: u32, dest: TableId) -> bool {
        match unsafe { db.table_mut_unchecked(self.table) } {
            Some(t) => {
                mark_move(t, index, dest);
                true
            }
            None => false,
        }
    }

    /// Flags element `index` for destruction at the next event pipeline
    /// pass.
    pub fn mark_destroy(&self, db: &Database, index: u32) -> bool {
        match unsafe { db.table_mut_unchecked(self.table) } {
            Some(t) => {
                mark_destroy(t, index);
                true
            }
            None => false,
        }
    }
}

/// Whole-database access: serializes against every other task in the same
/// frame. Reserved for rare, coarse-grained work (schema inspection,
/// cross-cutting debug tooling) that can't be expressed as a set of
/// per-table declarations.
pub struct DatabaseHandle;

impl DatabaseHandle {
    /// # Safety
    /// Same contract as [`Database::table_mut_unchecked`]: valid because
    /// this task declared whole-database access, which the scheduler
    /// serializes against every other task.
    pub unsafe fn table_mut<'a>(&self, db: &'a Database, table: TableId) -> Option<&'a mut gridkernel_table::Table> {
        unsafe { db.table_mut_unchecked(table) }
    }
}

/// Accumulates one task's declared data access and thread-affinity
/// requirement against a frozen `Database` schema, then produces an
/// [`AppTask`] the scheduler can place in its dependency graph.
pub struct TaskBuilder<'db> {
    db: &'db Database,
    name: String,
    fingerprint: Fingerprint,
    pinning: Pinning,
    callback: Option<TaskCallback>,
    discarded: bool,
}

impl<'db> TaskBuilder<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self {
            db,
            name: String::new(),
            fingerprint: Fingerprint::new(),
            pinning: Pinning::Any,
            callback: None,
            discarded: false,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn set_pinning(&mut self, pinning: Pinning) -> &mut Self {
        self.pinning = pinning;
        self
    }

    pub fn set_callback<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&crate::task::TaskArgs) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Abandons this task: no `AppTask` is produced on `finalize`. Used by
    /// modules that build a task speculatively and decide during their own
    /// init pass that it isn't needed this run.
    pub fn discard(&mut self) {
        self.discarded = true;
    }

    pub fn query<R: DenseRow>(&mut self) -> Query<R> {
        let tables = self.db.query(&[R::row_type_id()]);
        for &t in &tables {
            self.fingerprint.add_row(t, R::row_type_id(), AccessMode::Read);
        }
        Query::new(tables)
    }

    pub fn query_mut<R: DenseRow>(&mut self) -> QueryMut<R> {
        let tables = self.db.query(&[R::row_type_id()]);
        for &t in &tables {
            self.fingerprint.add_row(t, R::row_type_id(), AccessMode::Write);
        }
        QueryMut::new(tables)
    }

    pub fn sparse_query<R: SparseRow>(&mut self) -> SparseQuery<R> {
        let tables = self.db.query(&[R::row_type_id()]);
        for &t in &tables {
            self.fingerprint.add_row(t, R::row_type_id(), AccessMode::Read);
        }
        SparseQuery::new(tables)
    }

    pub fn sparse_query_mut<R: SparseRow>(&mut self) -> SparseQueryMut<R> {
        let tables = self.db.query(&[R::row_type_id()]);
        for &t in &tables {
            self.fingerprint.add_row(t, R::row_type_id(), AccessMode::Write);
        }
        SparseQueryMut::new(tables)
    }

    pub fn shared_query<R: SharedRow>(&mut self, write: bool) -> SharedQuery<R> {
        let tables = self.db.query(&[R::row_type_id()]);
        let mode = if write { AccessMode::Write } else { AccessMode::Read };
        for &t in &tables {
            self.fingerprint.add_row(t, R::row_type_id(), mode);
        }
        SharedQuery::new(tables)
    }

    pub fn tag_query<R: TagRow>(&mut self) -> TagQuery<R> {
        let tables = self.db.query(&[R::row_type_id()]);
        for &t in &tables {
            self.fingerprint.add_row(t, R::row_type_id(), AccessMode::Read);
        }
        TagQuery::new(tables)
    }

    pub fn get_resolver<R: DenseRow>(&mut self) -> Resolver<R> {
        let tables = self.db.query(&[R::row_type_id()]);
        for &t in &tables {
            self.fingerprint.add_row(t, R::row_type_id(), AccessMode::Read);
        }
        Resolver { _marker: PhantomData }
    }

    pub fn get_modifier_for_table(&mut self, table: TableId) -> TableModifier {
        self.fingerprint.add_table_structure(table);
        TableModifier { table }
    }

    pub fn get_database(&mut self) -> DatabaseHandle {
        self.fingerprint.add_whole_database();
        DatabaseHandle
    }

    pub fn pool(&self) -> &Arc<MappingPool> {
        self.db.pool()
    }

    /// Produces the finished task, or `None` if [`discard`](Self::discard)
    /// was called or no callback was ever set.
    pub fn finalize(self) -> Option<AppTask> {
        if self.discarded {
            return None;
        }
        let callback = self.callback?;
        Some(AppTask {
            name: self.name,
            fingerprint: self.fingerprint,
            pinning: self.pinning,
            callback,
        })
    }
}
