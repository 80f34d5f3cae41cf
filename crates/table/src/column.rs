use std::any::Any;

use gridkernel_ids::RowKind;
use hashbrown::HashMap;

/// Type-erased storage for one row (column) of a [`crate::table::Table`].
///
/// A discriminated union at the call site (`kind`) plus `Any` downcasting at
/// the rare cross-table move is the boundary Design Notes call for: it
/// avoids virtual dispatch on the hot per-element path while still letting
/// `Table::migrate` move values between two tables without either side
/// knowing the concrete `T` at compile time.
pub trait ErasedColumn: Any + Send + Sync {
    fn kind(&self) -> RowKind;

    /// Element count this column reports. Dense/sparse report the number of
    /// occupied slots; shared/tag report the table's element count, passed
    /// in by the caller, since they don't track it themselves.
    fn len(&self, table_count: usize) -> usize;

    /// Extends this column by `n` elements, default-constructed for dense
    /// columns. No-op for sparse (absence is the default), shared, and tag
    /// columns, whose value doesn't vary per element.
    fn add_elements(&mut self, n: usize);

    /// Swap-removes element `i`, where `last` is the table's last valid
    /// index *before* this removal. No-op for shared and tag columns.
    fn erase(&mut self, i: usize, last: usize);

    /// Moves the value at `i` into `dst` (which must be the same concrete
    /// column type; enforced at runtime via `Any` downcast, and tolerated —
    /// silently skipped — if it is not, matching `Table::migrate`'s
    /// row-type-intersection rule), appending it at `dst_index`, then
    /// erases `i` from `self` via the same swap-remove discipline as
    /// [`erase`](Self::erase). No-op for shared and tag columns: their
    /// value isn't tied to any one element.
    fn move_one(&mut self, i: usize, last: usize, dst_index: usize, dst: &mut dyn ErasedColumn);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// A fresh, empty column of the same concrete type, at zero elements
    /// regardless of how many `self` currently holds. Used when replicating
    /// a table's schema into a shadow database.
    fn empty_like(&self) -> Box<dyn ErasedColumn>;
}

/// Contiguous buffer of `T`, one value per element.
pub struct DenseColumn<T> {
    pub data: Vec<T>,
}

impl<T: Default + Send + Sync + 'static> DenseColumn<T> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn at(&self, i: usize) -> Option<&T> {
        self.data.get(i)
    }

    pub fn at_mut(&mut self, i: usize) -> Option<&mut T> {
        self.data.get_mut(i)
    }
}

impl<T: Default + Send + Sync + 'static> Default for DenseColumn<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default + Send + Sync + 'static> ErasedColumn for DenseColumn<T> {
    fn kind(&self) -> RowKind {
        RowKind::Dense
    }

    fn len(&self, _table_count: usize) -> usize {
        self.data.len()
    }

    fn add_elements(&mut self, n: usize) {
        self.data.resize_with(self.data.len() + n, T::default);
    }

    fn erase(&mut self, i: usize, _last: usize) {
        self.data.swap_remove(i);
    }

    fn move_one(&mut self, i: usize, _last: usize, _dst_index: usize, dst: &mut dyn ErasedColumn) {
        let value = self.data.swap_remove(i);
        if let Some(dst) = dst.as_any_mut().downcast_mut::<DenseColumn<T>>() {
            dst.data.push(value);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn empty_like(&self) -> Box<dyn ErasedColumn> {
        Box::new(DenseColumn::<T>::new())
    }
}

/// Associative `element index -> T` storage, absence meaningful.
/// Used for event rows among others. Iteration order is unspecified by
/// design: callers must not rely on it.
pub struct SparseColumn<T> {
    pub data: HashMap<u32, T>,
}

impl<T: Send + Sync + 'static> SparseColumn<T> {
    pub fn new() -> Self {
        Self { data: HashMap::new() }
    }

    pub fn get(&self, i: u32) -> Option<&T> {
        self.data.get(&i)
    }

    /// Returns the existing value at `i`, or inserts and returns `default()`.
    pub fn get_or_add(&mut self, i: u32, default: impl FnOnce() -> T) -> &mut T {
        self.data.entry(i).or_insert_with(default)
    }

    pub fn remove(&mut self, i: u32) -> Option<T> {
        self.data.remove(&i)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.data.iter().map(|(&k, v)| (k, v))
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl<T: Send + Sync + 'static> Default for SparseColumn<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> ErasedColumn for SparseColumn<T> {
    fn kind(&self) -> RowKind {
        RowKind::Sparse
    }

    fn len(&self, _table_count: usize) -> usize {
        self.data.len()
    }

    fn add_elements(&mut self, _n: usize) {}

    fn erase(&mut self, i: usize, last: usize) {
        self.data.remove(&(i as u32));
        if last != i {
            if let Some(moved) = self.data.remove(&(last as u32)) {
                self.data.insert(i as u32, moved);
            }
        }
    }

    fn move_one(&mut self, i: usize, last: usize, dst_index: usize, dst: &mut dyn ErasedColumn) {
        let value = self.data.remove(&(i as u32));
        if last != i {
            if let Some(moved) = self.data.remove(&(last as u32)) {
                self.data.insert(i as u32, moved);
            }
        }
        if let Some(value) = value {
            if let Some(dst) = dst.as_any_mut().downcast_mut::<SparseColumn<T>>() {
                dst.data.insert(dst_index as u32, value);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn empty_like(&self) -> Box<dyn ErasedColumn> {
        Box::new(SparseColumn::<T>::new())
    }
}

/// One `T` shared across every element in the table.
pub struct SharedColumn<T> {
    pub value: T,
}

impl<T: Send + Sync + 'static> SharedColumn<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Default + Send + Sync + 'static> ErasedColumn for SharedColumn<T> {
    fn kind(&self) -> RowKind {
        RowKind::Shared
    }

    fn len(&self, table_count: usize) -> usize {
        table_count
    }

    fn add_elements(&mut self, _n: usize) {}
    fn erase(&mut self, _i: usize, _last: usize) {}
    fn move_one(&mut self, _i: usize, _last: usize, _dst_index: usize, _dst: &mut dyn ErasedColumn) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn empty_like(&self) -> Box<dyn ErasedColumn> {
        Box::new(SharedColumn::<T>::new(T::default()))
    }
}

/// Zero-payload presence marker. Presence is table membership:
/// a table either carries this row or it doesn't.
#[derive(Default)]
pub struct TagColumn;

impl ErasedColumn for TagColumn {
    fn kind(&self) -> RowKind {
        RowKind::Tag
    }

    fn len(&self, table_count: usize) -> usize {
        table_count
    }

    fn add_elements(&mut self, _n: usize) {}
    fn erase(&mut self, _i: usize, _last: usize) {}
    fn move_one(&mut self, _i: usize, _last: usize, _dst_index: usize, _dst: &mut dyn ErasedColumn) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn empty_like(&self) -> Box<dyn ErasedColumn> {
        Box::new(TagColumn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_swap_remove_moves_last_into_place() {
        let mut col: DenseColumn<u32> = DenseColumn::new();
        col.add_elements(3);
        *col.at_mut(0).unwrap() = 10;
        *col.at_mut(1).unwrap() = 20;
        *col.at_mut(2).unwrap() = 30;
        col.erase(0, 2);
        assert_eq!(col.data, vec![30, 20]);
    }

    #[test]
    fn sparse_erase_remaps_last_entry() {
        let mut col: SparseColumn<&'static str> = SparseColumn::new();
        *col.get_or_add(0, || "a") = "a";
        *col.get_or_add(2, || "c") = "c";
        col.erase(0, 2);
        assert_eq!(col.get(0), Some(&"c"));
        assert_eq!(col.get(2), None);
    }
}
