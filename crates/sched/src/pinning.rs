/// A task's thread-affinity constraint.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Pinning {
    /// Any worker may execute this task.
    Any,
    /// Only worker 0 (the main thread) may execute this task.
    Main,
    /// Only the named worker index may execute this task.
    Specific(u32),
    /// Requires all workers idle; while running, no other task runs.
    Synchronous,
}

impl Pinning {
    pub fn may_run_on(self, thread_index: u32) -> bool {
        match self {
            Pinning::Any => true,
            Pinning::Main => thread_index == 0,
            Pinning::Specific(id) => thread_index == id,
            Pinning::Synchronous => true, // any worker may pick it up; exclusivity is enforced by the scheduler's sync lock, not by thread choice
        }
    }
}
