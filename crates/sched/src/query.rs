use gridkernel_db::Database;
use gridkernel_ids::TableId;
use gridkernel_table::{DenseColumn, DenseRow, SharedRow, SparseColumn, SparseRow, TagRow};
use std::marker::PhantomData;

/// A resolved set of tables carrying a dense row, read-only.
pub struct Query<R: DenseRow> {
    tables: Vec<TableId>,
    _marker: PhantomData<R>,
}

impl<R: DenseRow> Query<R> {
    pub(crate) fn new(tables: Vec<TableId>) -> Self {
        Self { tables, _marker: PhantomData }
    }

    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }

    pub fn get<'a>(&self, db: &'a Database, table: TableId) -> Option<&'a DenseColumn<R>> {
        db.try_get(table)?.dense::<R>(R::row_type_id())
    }
}

/// A resolved set of tables carrying a dense row, read-write.
pub struct QueryMut<R: DenseRow> {
    tables: Vec<TableId>,
    _marker: PhantomData<R>,
}

impl<R: DenseRow> QueryMut<R> {
    pub(crate) fn new(tables: Vec<TableId>) -> Self {
        Self { tables, _marker: PhantomData }
    }

    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }

    pub fn get_mut<'a>(&self, db: &'a Database, table: TableId) -> Option<&'a mut DenseColumn<R>> {
        // SAFETY: caller holds a `&Database` produced for a task whose
        // fingerprint declared write access to this row on `table`; the
        // scheduler guarantees no other task concurrently touches it.
        let t = unsafe { db.table_mut_unchecked(table)? };
        t.dense_mut::<R>(R::row_type_id())
    }
}

/// A resolved set of tables carrying a sparse row, read-only.
pub struct SparseQuery<R: SparseRow> {
    tables: Vec<TableId>,
    _marker: PhantomData<R>,
}

impl<R: SparseRow> SparseQuery<R> {
    pub(crate) fn new(tables: Vec<TableId>) -> Self {
        Self { tables, _marker: PhantomData }
    }

    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }

    pub fn get<'a>(&self, db: &'a Database, table: TableId) -> Option<&'a SparseColumn<R>> {
        db.try_get(table)?.sparse::<R>(R::row_type_id())
    }
}

/// A resolved set of tables carrying a sparse row, read-write.
pub struct SparseQueryMut<R: SparseRow> {
    tables: Vec<TableId>,
    _marker: PhantomData<R>,
}

impl<R: SparseRow> SparseQueryMut<R> {
    pub(crate) fn new(tables: Vec<TableId>) -> Self {
        Self { tables, _marker: PhantomData }
    }

    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }

    pub fn get_mut<'a>(&self, db: &'a Database, table: TableId) -> Option<&'a mut SparseColumn<R>> {
        let t = unsafe { db.table_mut_unchecked(table)? };
        t.sparse_mut::<R>(R::row_type_id())
    }
}

/// A resolved set of tables carrying a shared singleton row.
pub struct SharedQuery<R: SharedRow> {
    tables: Vec<TableId>,
    _marker: PhantomData<R>,
}

impl<R: SharedRow> SharedQuery<R> {
    pub(crate) fn new(tables: Vec<TableId>) -> Self {
        Self { tables, _marker: PhantomData }
    }

    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }

    pub fn get<'a>(&self, db: &'a Database, table: TableId) -> Option<&'a R> {
        db.try_get(table)?.shared::<R>(R::row_type_id())
    }

    pub fn get_mut<'a>(&self, db: &'a Database, table: TableId) -> Option<&'a mut R> {
        let t = unsafe { db.table_mut_unchecked(table)? };
        t.shared_mut::<R>(R::row_type_id())
    }
}

/// Presence-only query over a tag row: tag columns carry no payload, so
/// there's nothing to borrow, only membership to test.
pub struct TagQuery<R: TagRow> {
    tables: Vec<TableId>,
    _marker: PhantomData<R>,
}

impl<R: TagRow> TagQuery<R> {
    pub(crate) fn new(tables: Vec<TableId>) -> Self {
        Self { tables, _marker: PhantomData }
    }

    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }

    pub fn has(&self, db: &Database, table: TableId) -> bool {
        db.try_get(table).map(|t| t.has_tag(R::row_type_id())).unwrap_or(false)
    }
}
