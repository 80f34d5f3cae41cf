use gridkernel_db::Database;

/// A render-side hook, run outside the task scheduler: the frame driver
/// calls these directly on the main thread around the simulation update,
/// for presentation code that shouldn't compete for scheduler slots.
pub trait RenderHook: Send + Sync {
    /// Runs before the frame's simulation tasks are submitted.
    fn pre_sim_update(&self, _db: &Database) {}

    /// Runs after the frame's simulation tasks have all finished.
    fn post_sim_update(&self, _db: &Database) {}

    /// Runs on frames where the simulation itself is paused or throttled,
    /// so presentation still gets a chance to update (camera interpolation,
    /// UI) without ticking any simulation state.
    fn render_only_update(&self, _db: &Database) {}
}
