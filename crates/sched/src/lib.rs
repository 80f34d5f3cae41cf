//! Task declarations, access-fingerprint dependency analysis, and the
//! pinning-aware worker pool that runs one frame's tasks against a
//! [`gridkernel_db::Database`].

mod builder;
mod error;
mod fingerprint;
mod graph;
mod pinning;
mod query;
mod scheduler;
mod task;

pub use builder::{DatabaseHandle, Resolver, TableModifier, TaskBuilder};
pub use error::SchedulerError;
pub use fingerprint::Fingerprint;
pub use graph::TaskGraph;
pub use pinning::Pinning;
pub use query::{Query, QueryMut, SharedQuery, SparseQuery, SparseQueryMut, TagQuery};
pub use scheduler::Scheduler;
pub use task::{AppTask, TaskArgs, TaskCallback};
