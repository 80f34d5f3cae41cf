//! Identifier algebra for the gridkernel table database.
//!
//! This crate has no knowledge of tables, rows, or tasks; it only defines
//! the identity types ([`TableId`], [`RowTypeId`]), the access-mode lattice
//! used to build dependency fingerprints ([`AccessMode`]), and the
//! process-wide [`MappingPool`] backing every [`StableRef`].

mod access;
mod mapping_pool;
mod row_type;
mod table_id;

pub use access::AccessMode;
pub use mapping_pool::{MappingPool, MappingSlotId, StableRef};
pub use row_type::{reserved, RowKind, RowTypeId};
pub use table_id::{DatabaseIndex, TableId};
