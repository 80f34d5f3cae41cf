use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler configured with {worker_count} workers but {shadow_count} shadow databases")]
    ShadowCountMismatch { worker_count: usize, shadow_count: usize },

    #[error("scheduler needs at least one worker")]
    NoWorkers,
}
