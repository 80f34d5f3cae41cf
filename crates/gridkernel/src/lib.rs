//! Frame driver: wires a [`gridkernel_db::Database`], a
//! [`gridkernel_sched::Scheduler`], the event pipeline, and a
//! [`gridkernel_modules::ModuleRegistry`] into one per-frame call.

mod config;
mod frame;
mod logging;

pub use config::{AppConfig, FrameConfig, SchedulerConfig};
pub use frame::App;
pub use logging::init_default_logging;

pub use gridkernel_db::{Database, FullSchema, ShadowSchema};
pub use gridkernel_events::{mark_create, mark_destroy, mark_move, EventFlags, EventPipeline};
pub use gridkernel_ids::{reserved, AccessMode, DatabaseIndex, MappingPool, MappingSlotId, RowKind, RowTypeId, StableRef, TableId};
pub use gridkernel_modules::{gate_task, scene_driver_task, Clock, FixedClock, Module, ModuleRegistry, RenderHook, SceneGate, SceneId, SceneState, SystemClock};
pub use gridkernel_sched::{
    AppTask, DatabaseHandle, Pinning, Query, QueryMut, Resolver, Scheduler, SchedulerError, SharedQuery, SparseQuery, SparseQueryMut, TableModifier, TagQuery, TaskArgs, TaskBuilder,
};
pub use gridkernel_table::{DenseColumn, DenseRow, ErasedColumn, SharedColumn, SharedRow, SparseColumn, SparseRow, TagColumn, TagRow};
