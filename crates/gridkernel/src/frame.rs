use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use gridkernel_db::{Database, ShadowSchema};
use gridkernel_ids::{DatabaseIndex, MappingPool};
use gridkernel_modules::{Clock, FixedClock, Module, ModuleRegistry, RenderHook, SystemClock};
use gridkernel_sched::{AppTask, Scheduler, SchedulerError};

use crate::config::AppConfig;

/// Ties the database, module registry, and scheduler together into one
/// per-frame driver. `S` is opaque frame-shared state (input, timing,
/// anything a task needs that doesn't belong in a table) handed to every
/// task's callback unchanged.
pub struct App<S> {
    db: Database,
    pool: Arc<MappingPool>,
    modules: ModuleRegistry,
    scheduler: Option<Scheduler>,
    standing_tasks: Vec<AppTask>,
    clock: Box<dyn Clock>,
    render_hooks: Vec<Arc<dyn RenderHook>>,
    shared: S,
}

impl<S: Send + Sync + 'static> App<S> {
    pub fn new(shared: S) -> Self {
        let pool = Arc::new(MappingPool::new());
        let db = Database::new(DatabaseIndex::Main, pool.clone());
        Self {
            db,
            pool,
            modules: ModuleRegistry::new(),
            scheduler: None,
            standing_tasks: Vec::new(),
            clock: Box::new(SystemClock::new()),
            render_hooks: Vec::new(),
            shared,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn register_module(&mut self, module: Arc<dyn Module>) {
        self.modules.register(module);
    }

    /// Registers a render-side hook, called directly on the main thread
    /// around each frame's simulation tasks rather than through the
    /// scheduler. See [`RenderHook`].
    pub fn register_render_hook(&mut self, hook: Arc<dyn RenderHook>) {
        self.render_hooks.push(hook);
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn shared(&self) -> &S {
        &self.shared
    }

    /// Runs schema construction, module init, and scheduler setup: builds
    /// every worker's shadow database, collects each module's standing
    /// tasks, then freezes the module registry. Must be called exactly
    /// once, before the first [`run_frame`](Self::run_frame).
    ///
    /// If `config.frame.fixed_step_millis` is set, it replaces whatever
    /// clock is currently installed (the default `SystemClock`, or one
    /// set via [`with_clock`](Self::with_clock)) with a [`FixedClock`] at
    /// that step — config is the authoritative source for frame timing.
    pub fn build(&mut self, config: AppConfig, shadow_schema: &dyn ShadowSchema) -> Result<(), SchedulerError> {
        if let Some(millis) = config.frame.fixed_step_millis {
            self.clock = Box::new(FixedClock::new(Duration::from_millis(millis)));
        }

        self.modules.create_databases(&mut self.db);
        self.modules.init(&self.db);
        self.standing_tasks = self.modules.init_scheduler_tasks(&self.db);

        let worker_count = config.scheduler.worker_count;
        let mut shadows = Vec::with_capacity(worker_count);
        for worker in 0..worker_count {
            shadows.push(self.db.new_shadow(worker as u32, self.pool.clone(), shadow_schema));
        }
        self.scheduler = Some(Scheduler::new(worker_count, shadows)?);
        self.modules.freeze();
        Ok(())
    }

    /// Ticks the clock, runs one full module/event/task frame, then
    /// migrates every worker's shadow database back into the main one.
    /// Returns the elapsed time the clock reported for this frame.
    ///
    /// Render hooks registered via
    /// [`register_render_hook`](Self::register_render_hook) run on the
    /// main thread, outside the scheduler: `pre_sim_update` right before
    /// this frame's tasks are submitted, `post_sim_update` right after
    /// they've all finished.
    ///
    /// # Panics
    /// Panics if called before [`build`](Self::build).
    pub fn run_frame(&mut self) -> Duration {
        let dt = self.clock.tick();
        let scheduler = self.scheduler.as_ref().expect("App::build must run before App::run_frame");

        for hook in &self.render_hooks {
            hook.pre_sim_update(&self.db);
        }

        let shared: &(dyn Any + Send + Sync) = &self.shared;
        self.modules.run_frame(&mut self.db, scheduler, &self.standing_tasks, shared);

        let pool = self.pool.clone();
        if let Some(scheduler) = self.scheduler.as_mut() {
            for shadow in scheduler.shadows_mut() {
                self.db.migrate_all_from(shadow, &pool);
            }
        }

        for hook in &self.render_hooks {
            hook.post_sim_update(&self.db);
        }

        dt
    }

    /// Runs every render hook's `render_only_update`, without ticking the
    /// clock or running any simulation task. For a host that wants to
    /// keep presenting (camera interpolation, UI) on frames where the
    /// simulation itself is paused or throttled.
    pub fn render_only(&self) {
        for hook in &self.render_hooks {
            hook.render_only_update(&self.db);
        }
    }

    pub fn elapsed_total(&self) -> Duration {
        self.clock.elapsed_total()
    }
}
