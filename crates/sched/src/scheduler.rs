use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use gridkernel_db::Database;
use parking_lot::{Mutex, RwLock};

use crate::error::SchedulerError;
use crate::graph::TaskGraph;
use crate::task::{AppTask, TaskArgs};

/// A fixed pool of worker threads, each owning one shadow database. Tasks
/// for one frame are handed out through a shared ready queue as their
/// dependency-graph predecessors finish; a task only runs on a worker its
/// [`crate::pinning::Pinning`] admits.
///
/// Modeled on a classic job-thread pool: a bounded set of long-lived
/// workers pulling from a shared channel, rather than spawning one thread
/// per task. Workers here are scoped to one `run_frame` call instead of
/// living for the process's lifetime, which keeps the unsafe table-access
/// lifetimes tied to the frame's borrows instead of requiring the database
/// to be `'static`.
pub struct Scheduler {
    worker_count: usize,
    shadows: Vec<Database>,
}

impl Scheduler {
    /// `shadows.len()` must equal `worker_count`; each worker thread is
    /// assigned the shadow at its own index.
    pub fn new(worker_count: usize, shadows: Vec<Database>) -> Result<Self, SchedulerError> {
        if worker_count == 0 {
            return Err(SchedulerError::NoWorkers);
        }
        if shadows.len() != worker_count {
            return Err(SchedulerError::ShadowCountMismatch {
                worker_count,
                shadow_count: shadows.len(),
            });
        }
        Ok(Self { worker_count, shadows })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn shadows(&self) -> &[Database] {
        &self.shadows
    }

    pub fn shadows_mut(&mut self) -> &mut [Database] {
        &mut self.shadows
    }

    /// Runs every task in `tasks` to completion against `main`, respecting
    /// the dependency graph induced by their access fingerprints and each
    /// task's pinning. Blocks until every task has run exactly once.
    ///
    /// A panic inside a task's callback is caught at the worker boundary
    /// and re-raised on this thread once every worker has wound down, so
    /// one task's panic doesn't silently strand the rest of the frame.
    pub fn run_frame(&self, main: &Database, tasks: &[AppTask], shared: &(dyn Any + Send + Sync)) {
        if tasks.is_empty() {
            return;
        }
        let graph = TaskGraph::build(tasks);
        let done = Mutex::new(vec![false; tasks.len()]);
        let remaining = AtomicUsize::new(tasks.len());
        let (ready_tx, ready_rx) = crossbeam_channel::unbounded::<usize>();
        for root in graph.roots() {
            ready_tx.send(root).expect("receiver outlives this scope");
        }

        let first_panic: Mutex<Option<Box<dyn Any + Send>>> = Mutex::new(None);
        let shadows = &self.shadows;
        // A regular task holds the read side while it runs; a `Synchronous`
        // task takes the write side, which only succeeds once every
        // in-flight read guard has dropped and blocks new ones from being
        // taken until it drops its own, giving the "all workers idle while
        // this runs" guarantee `Pinning::Synchronous` promises.
        let sync_lock = RwLock::new(());

        std::thread::scope(|scope| {
            for worker in 0..self.worker_count {
                let ready_rx = ready_rx.clone();
                let ready_tx = ready_tx.clone();
                let done = &done;
                let remaining = &remaining;
                let graph = &graph;
                let first_panic = &first_panic;
                let sync_lock = &sync_lock;
                scope.spawn(move || {
                    let args_local = &shadows[worker];
                    loop {
                        if remaining.load(Ordering::Acquire) == 0 {
                            break;
                        }
                        let idx = match ready_rx.recv_timeout(Duration::from_millis(5)) {
                            Ok(idx) => idx,
                            Err(_) => continue,
                        };
                        let task = &tasks[idx];
                        if !task.pinning().may_run_on(worker as u32) {
                            let _ = ready_tx.send(idx);
                            continue;
                        }

                        let task_args = TaskArgs {
                            thread_index: worker as u32,
                            shared,
                            main,
                            local: args_local,
                        };
                        let result = if matches!(task.pinning(), crate::pinning::Pinning::Synchronous) {
                            let _guard = sync_lock.write();
                            std::panic::catch_unwind(AssertUnwindSafe(|| task.run(&task_args)))
                        } else {
                            let _guard = sync_lock.read();
                            std::panic::catch_unwind(AssertUnwindSafe(|| task.run(&task_args)))
                        };

                        {
                            let mut d = done.lock();
                            d[idx] = true;
                        }
                        remaining.fetch_sub(1, Ordering::AcqRel);

                        if let Err(payload) = result {
                            first_panic.lock().get_or_insert(payload);
                        } else {
                            for succ in graph.successors_ready_after(idx, |i| done.lock()[i]) {
                                let _ = ready_tx.send(succ);
                            }
                        }
                    }
                });
            }
        });

        if let Some(payload) = first_panic.into_inner() {
            std::panic::resume_unwind(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TaskBuilder;
    use gridkernel_ids::{reserved, DatabaseIndex, MappingPool};
    use gridkernel_table::{DenseColumn, DenseRow};
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    #[derive(Default)]
    struct Hp(u32);
    impl gridkernel_table::DenseRow for Hp {}

    fn fresh_db() -> (Database, Arc<MappingPool>) {
        let pool = Arc::new(MappingPool::new());
        let mut db = Database::new(DatabaseIndex::Main, pool.clone());
        {
            let t = db.add_table();
            t.declare_row(reserved::stable_id_row(), Box::new(DenseColumn::<gridkernel_ids::MappingSlotId>::new()));
            t.declare_row(Hp::row_type_id(), Box::new(DenseColumn::<Hp>::new()));
        }
        db.try_get_mut(gridkernel_ids::TableId::main(0)).unwrap().add_elements(&pool, 3);
        (db, pool)
    }

    #[test]
    fn two_independent_writers_both_run() {
        let (db, pool) = fresh_db();
        let counter = Arc::new(AtomicU32::new(0));

        let mut a = TaskBuilder::new(&db);
        let _ = a.query_mut::<Hp>();
        a.set_callback(|_| {
            // writer declares but this test only checks execution count
        });
        let task_a = a.finalize().unwrap();

        let mut b = TaskBuilder::new(&db);
        let counter_ref = counter.clone();
        b.set_callback(move |_| {
            counter_ref.fetch_add(1, Ordering::SeqCst);
        });
        let task_b = b.finalize().unwrap();

        let scheduler = Scheduler::new(1, vec![Database::new(DatabaseIndex::Shadow(0), pool)]).unwrap();
        scheduler.run_frame(&db, &[task_a, task_b], &());

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn panicking_task_propagates_after_frame_drains() {
        let (db, pool) = fresh_db();
        let mut a = TaskBuilder::new(&db);
        a.set_callback(|_| panic!("boom"));
        let task_a = a.finalize().unwrap();

        let scheduler = Scheduler::new(1, vec![Database::new(DatabaseIndex::Shadow(0), pool)]).unwrap();
        scheduler.run_frame(&db, &[task_a], &());
    }
}
