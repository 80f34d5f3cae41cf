//! Row storage variants and the runtime [`Table`] built from them.

mod column;
mod table;

pub use column::{DenseColumn, ErasedColumn, SharedColumn, SparseColumn, TagColumn};
pub use table::Table;

pub use gridkernel_ids::{reserved, DatabaseIndex, MappingPool, RowKind, RowTypeId, StableRef, TableId};

/// Ties a Rust type to one row-storage discipline, so `query::<Position>()`
/// at the task-builder call site can derive a [`RowTypeId`]
/// without the caller spelling it out by hand each time. One trait per
/// [`RowKind`] rather than a single trait with an associated constant: it
/// lets `gridkernel-sched`'s query methods bound on exactly the kind they
/// need at compile time instead of asserting it at runtime.
pub trait DenseRow: 'static + Send + Sync + Default {
    fn row_type_id() -> RowTypeId {
        RowTypeId::of::<Self>(RowKind::Dense)
    }
}

pub trait SparseRow: 'static + Send + Sync {
    fn row_type_id() -> RowTypeId
    where
        Self: Sized,
    {
        RowTypeId::of::<Self>(RowKind::Sparse)
    }
}

pub trait SharedRow: 'static + Send + Sync + Default {
    fn row_type_id() -> RowTypeId {
        RowTypeId::of::<Self>(RowKind::Shared)
    }
}

pub trait TagRow: 'static + Send + Sync {
    fn row_type_id() -> RowTypeId
    where
        Self: Sized,
    {
        RowTypeId::of::<Self>(RowKind::Tag)
    }
}
