use std::any::Any;
use std::sync::Arc;

use gridkernel_db::Database;

use crate::fingerprint::Fingerprint;
use crate::pinning::Pinning;

/// The arguments a running task's callback receives. `main` is the frame's
/// shared database; `local` is the calling worker's shadow database, where
/// new elements can be appended without taking a lock. Both are accessed
/// through `Database::table_mut_unchecked`, relying on the scheduler to
/// have proven the task's fingerprint doesn't alias any concurrently
/// running task's.
pub struct TaskArgs<'a> {
    pub thread_index: u32,
    pub shared: &'a (dyn Any + Send + Sync),
    pub main: &'a Database,
    pub local: &'a Database,
}

pub type TaskCallback = Arc<dyn Fn(&TaskArgs) + Send + Sync>;

/// A task ready to enter the scheduler: its declared access fingerprint,
/// its thread-affinity constraint, and the closure to run. Produced by
/// [`crate::builder::TaskBuilder::finalize`]. Cheaply `Clone`: the
/// callback is an `Arc`, so a module's standing tasks (built once at
/// scheduler setup) can be combined with this frame's freshly submitted
/// ones into a single dependency graph without rebuilding them.
#[derive(Clone)]
pub struct AppTask {
    pub(crate) name: String,
    pub(crate) fingerprint: Fingerprint,
    pub(crate) pinning: Pinning,
    pub(crate) callback: TaskCallback,
}

impl AppTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn pinning(&self) -> Pinning {
        self.pinning
    }

    pub fn run(&self, args: &TaskArgs) {
        (self.callback)(args)
    }
}
