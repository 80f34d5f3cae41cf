use gridkernel_db::Database;
use gridkernel_sched::{AppTask, TaskBuilder};

/// One self-contained slice of simulation behavior: the schema it owns,
/// the tasks it submits each frame, and the hooks it wants around the
/// event pipeline.
///
/// Every method has a default no-op body; a module implements only the
/// hooks relevant to it. Dispatch across modules is registration order,
/// not a dependency sort — a module that needs another module's schema to
/// exist first must be registered after it.
pub trait Module: Send + Sync {
    /// Declares this module's own tables and rows. Runs once, before any
    /// module's `create_dependent_database`.
    fn create_database(&self, _db: &mut Database) {}

    /// Declares schema that depends on another module's tables already
    /// existing (e.g. a row added to a table a different module owns).
    /// Runs once, after every module's `create_database` has run.
    fn create_dependent_database(&self, _db: &Database) {}

    /// Builds this module's standing tasks once, at scheduler setup. Tasks
    /// returned here run every frame without being rebuilt; contrast with
    /// [`update`](Self::update), which is asked fresh each frame.
    fn init_scheduler(&self, _db: &Database) -> Vec<AppTask> {
        Vec::new()
    }

    /// One-time setup run once schema exists. Runs before any module's
    /// `dependent_init`.
    fn init(&self, _db: &Database) {}

    /// One-time setup that may assume every module's `init` has already
    /// run.
    fn dependent_init(&self, _db: &Database) {}

    fn pre_process_events(&self, _db: &Database) {}

    /// Builds this frame's event-processing tasks, run through the
    /// scheduler alongside the kernel's own event-application task (which
    /// applies pending creates, moves, and destroys via
    /// `gridkernel_events::EventPipeline`). A module implements this to
    /// observe or validate pending events before they're applied, in the
    /// same dependency-graph pass as that application.
    fn process_events(&self, _db: &Database) -> Vec<AppTask> {
        Vec::new()
    }

    fn post_process_events(&self, _db: &Database) {}
    fn clear_events(&self, _db: &Database) {}

    /// Builds this frame's per-frame tasks. Called once per frame, before
    /// the scheduler runs; a module with nothing new to submit this frame
    /// returns an empty vec (its standing tasks from `init_scheduler`
    /// still run).
    fn update(&self, _db: &Database) -> Vec<AppTask> {
        Vec::new()
    }

    /// Convenience for building one task against `db` without threading a
    /// `TaskBuilder` through every call site by hand.
    fn build_task<'db>(&self, db: &'db Database) -> TaskBuilder<'db> {
        TaskBuilder::new(db)
    }
}
