use std::any::Any;
use std::sync::Arc;

use gridkernel_db::Database;
use gridkernel_events::EventPipeline;
use gridkernel_sched::{AppTask, Scheduler, TaskBuilder};

use crate::module::Module;

/// The ordered set of modules making up one application. Dispatch across
/// hooks always walks modules in registration order; there is no
/// dependency sort, so a module that reads another module's schema or
/// tables must be registered after it.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
    frozen: bool,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    /// Panics if called after [`freeze`](Self::freeze). Registration is a
    /// setup-time-only operation; once a frame has run, the module list is
    /// fixed for the rest of the process.
    pub fn register(&mut self, module: Arc<dyn Module>) {
        assert!(!self.frozen, "cannot register a module after the registry is frozen");
        self.modules.push(module);
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Runs `create_database` on every module, then `create_dependent_database`
    /// on every module, in registration order for each pass.
    pub fn create_databases(&self, db: &mut Database) {
        for m in &self.modules {
            m.create_database(db);
        }
        for m in &self.modules {
            m.create_dependent_database(db);
        }
    }

    /// Runs `init` on every module, then `dependent_init` on every module.
    pub fn init(&self, db: &Database) {
        for m in &self.modules {
            m.init(db);
        }
        for m in &self.modules {
            m.dependent_init(db);
        }
    }

    /// Collects every module's standing tasks, in registration order.
    pub fn init_scheduler_tasks(&self, db: &Database) -> Vec<AppTask> {
        self.modules.iter().flat_map(|m| m.init_scheduler(db)).collect()
    }

    /// Runs one full frame: pre-process hooks, then a scheduler pass that
    /// applies pending events alongside any module-contributed
    /// event-processing tasks, post-process hooks, this frame's task
    /// submission and execution, clear hooks, then the event clear pass.
    ///
    /// `standing` are tasks built once at scheduler setup
    /// ([`Module::init_scheduler`]); `shared` is opaque, module-defined
    /// frame state handed to every task's callback.
    pub fn run_frame(&self, db: &mut Database, scheduler: &Scheduler, standing: &[AppTask], shared: &(dyn Any + Send + Sync)) {
        for m in &self.modules {
            m.pre_process_events(db);
        }

        let mut process_tasks: Vec<AppTask> = self.modules.iter().flat_map(|m| m.process_events(db)).collect();
        process_tasks.push(kernel_apply_events_task(db));
        scheduler.run_frame(db, &process_tasks, shared);

        for m in &self.modules {
            m.post_process_events(db);
        }

        let mut tasks: Vec<AppTask> = standing.to_vec();
        tasks.extend(self.modules.iter().flat_map(|m| m.update(db)));
        scheduler.run_frame(db, &tasks, shared);

        for m in &self.modules {
            m.clear_events(db);
        }
        EventPipeline::clear(db);
    }
}

/// The event-application step itself, expressed as a task instead of a
/// bare call: it doesn't know ahead of time which tables carry pending
/// events, so it declares whole-database access through
/// `TaskBuilder::get_database`, and the scheduler serializes it against
/// every row-touching task submitted in the same pass (including any
/// module-contributed `process_events` tasks).
fn kernel_apply_events_task(db: &Database) -> AppTask {
    let mut builder = TaskBuilder::new(db);
    builder.set_name("gridkernel::apply_events");
    builder.get_database();
    builder.set_callback(|args| {
        // Safety: this task's fingerprint declares whole-database access,
        // so the scheduler guarantees no other task in this pass holds a
        // reference into any of `args.main`'s tables while this runs.
        unsafe { EventPipeline::process_unchecked(args.main) };
    });
    builder.finalize().expect("callback is always set")
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Tagging(u32, Arc<Mutex<Vec<u32>>>);
    impl Module for Tagging {
        fn init(&self, _db: &Database) {
            self.1.lock().push(self.0);
        }
    }

    #[test]
    fn init_dispatches_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(Tagging(1, order.clone())));
        registry.register(Arc::new(Tagging(2, order.clone())));
        registry.register(Arc::new(Tagging(3, order.clone())));

        let pool = Arc::new(gridkernel_ids::MappingPool::new());
        let db = Database::new(gridkernel_ids::DatabaseIndex::Main, pool);
        registry.init(&db);

        assert_eq!(*order.lock(), vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "frozen")]
    fn register_after_freeze_panics() {
        let mut registry = ModuleRegistry::new();
        registry.freeze();
        registry.register(Arc::new(Tagging(1, Arc::new(Mutex::new(Vec::new())))));
    }
}
