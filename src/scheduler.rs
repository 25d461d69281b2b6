//! Fixed-size worker pool with fork-join barrier semantics
//!
//! Tasks go into a shared FIFO queue and are picked up by a small, fixed set
//! of OS threads. [`TaskScheduler::wait`] blocks until every task submitted
//! since the previous barrier has finished executing, not merely been
//! dequeued.
//!
//! Tasks that borrow caller data (e.g. disjoint `&mut` slices of the enemy
//! array) go through [`TaskScheduler::scope`], which never returns before its
//! batch has drained.

use std::collections::VecDeque;
use std::io;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use crate::error::SchedulerError;

/// Upper bound on worker threads
pub const MAX_WORKERS: usize = 8;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker count for a machine with `hardware_threads` logical CPUs.
///
/// One thread is left for the caller, and the pool never exceeds
/// [`MAX_WORKERS`].
pub fn worker_count_for(hardware_threads: usize) -> usize {
    hardware_threads.saturating_sub(1).clamp(1, MAX_WORKERS)
}

/// Worker count derived from the current machine
pub fn default_worker_count() -> usize {
    let hardware = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    worker_count_for(hardware)
}

struct QueueState {
    queue: VecDeque<Job>,
    /// Submitted but not yet finished (queued + executing)
    pending: usize,
    /// Tasks that panicked since the last barrier
    panicked: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    task_available: Condvar,
    batch_done: Condvar,
}

/// A fixed pool of worker threads consuming a shared task queue
pub struct TaskScheduler {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskScheduler {
    /// Start a pool sized for this machine
    pub fn new() -> Result<Self, SchedulerError> {
        Self::with_workers(default_worker_count())
    }

    /// Start a pool with `requested` workers (at least one).
    ///
    /// If the OS refuses some threads the pool keeps the ones it got; it only
    /// fails when no thread at all could be started.
    pub fn with_workers(requested: usize) -> Result<Self, SchedulerError> {
        let requested = requested.max(1);
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                queue: VecDeque::new(),
                pending: 0,
                panicked: 0,
                shutdown: false,
            }),
            task_available: Condvar::new(),
            batch_done: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(requested);
        let mut last_error: Option<io::Error> = None;
        for index in 0..requested {
            let shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("legionfall-worker-{index}"))
                .spawn(move || worker_loop(&shared));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    log::warn!("Worker {index} failed to start: {err}");
                    last_error = Some(err);
                }
            }
        }

        if workers.is_empty() {
            let err = last_error
                .unwrap_or_else(|| io::Error::other("no worker threads were started"));
            return Err(SchedulerError::Spawn(err));
        }
        if workers.len() < requested {
            log::warn!(
                "Task scheduler degraded: {} of {} workers running",
                workers.len(),
                requested
            );
        }
        log::info!("Task scheduler started with {} workers", workers.len());

        Ok(Self { shared, workers })
    }

    /// Number of worker threads in the pool
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Tasks submitted but not yet finished
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending
    }

    /// Queue a task. Never blocks on task execution; the task runs exactly once.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Box::new(task));
    }

    fn enqueue(&self, job: Job) {
        {
            let mut state = self.shared.state.lock();
            if !state.shutdown {
                state.queue.push_back(job);
                state.pending += 1;
                drop(state);
                self.shared.task_available.notify_one();
                return;
            }
        }

        // No workers left to pick it up; run on the caller so the task
        // still executes exactly once and `wait` cannot stall on it.
        log::warn!("Task submitted after shutdown; running inline");
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            log::error!("Task panicked while running inline");
            self.shared.state.lock().panicked += 1;
        }
    }

    /// Block until every submitted task has finished executing.
    ///
    /// Reports tasks that panicked since the previous barrier.
    pub fn wait(&self) -> Result<(), SchedulerError> {
        let mut state = self.shared.state.lock();
        while state.pending > 0 {
            self.shared.batch_done.wait(&mut state);
        }
        match std::mem::take(&mut state.panicked) {
            0 => Ok(()),
            count => Err(SchedulerError::TaskPanicked { count }),
        }
    }

    /// Run one fork-join batch whose tasks may borrow from the caller.
    ///
    /// Every task submitted through the [`Scope`] has finished when this
    /// returns, including when `f` itself panics.
    pub fn scope<'env, F, R>(&self, f: F) -> Result<R, SchedulerError>
    where
        F: for<'scope> FnOnce(&'scope Scope<'scope, 'env>) -> R,
    {
        let scope = Scope {
            scheduler: self,
            _env: PhantomData,
        };
        let guard = BarrierOnUnwind(self);
        let output = f(&scope);
        std::mem::forget(guard);
        self.wait()?;
        Ok(output)
    }

    /// Signal shutdown and join every worker. Queued tasks are drained first.
    ///
    /// Tasks submitted afterwards run inline on the submitting thread.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.shared.state.lock().shutdown = true;
        self.shared.task_available.notify_all();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Worker thread terminated abnormally");
            }
        }
        log::debug!("Task scheduler shut down");
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Submission handle for one scoped batch
pub struct Scope<'scope, 'env: 'scope> {
    scheduler: &'scope TaskScheduler,
    _env: PhantomData<&'scope mut &'env ()>,
}

impl<'scope, 'env> Scope<'scope, 'env> {
    /// Queue a task that may borrow data living for `'env`
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'env,
    {
        let job: Box<dyn FnOnce() + Send + 'env> = Box::new(task);
        // SAFETY: the job either runs inline inside `enqueue`, or is queued
        // and counted in `pending`. `TaskScheduler::scope` does not return,
        // and its `BarrierOnUnwind` guard does not finish dropping, until
        // `pending` is zero. Workers drop a job before decrementing `pending`,
        // so no `'env` borrow held by the job outlives the scope.
        let job: Job = unsafe {
            std::mem::transmute::<Box<dyn FnOnce() + Send + 'env>, Job>(job)
        };
        self.scheduler.enqueue(job);
    }

    pub fn worker_count(&self) -> usize {
        self.scheduler.worker_count()
    }
}

/// Drains the batch if the scope closure unwinds
struct BarrierOnUnwind<'a>(&'a TaskScheduler);

impl Drop for BarrierOnUnwind<'_> {
    fn drop(&mut self) {
        let _ = self.0.wait();
    }
}

/// Idle -> Executing -> Idle, or Idle -> Terminated once shut down with an empty queue
fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if let Some(job) = state.queue.pop_front() {
                    break job;
                }
                if state.shutdown {
                    return;
                }
                shared.task_available.wait(&mut state);
            }
        };

        // Runs outside the queue lock
        let outcome = panic::catch_unwind(AssertUnwindSafe(job));

        let mut state = shared.state.lock();
        if outcome.is_err() {
            log::error!(
                "Task panicked on {}",
                thread::current().name().unwrap_or("worker")
            );
            state.panicked += 1;
        }
        state.pending -= 1;
        if state.pending == 0 {
            shared.batch_done.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_worker_count_clamp() {
        assert_eq!(worker_count_for(0), 1);
        assert_eq!(worker_count_for(1), 1);
        assert_eq!(worker_count_for(2), 1);
        assert_eq!(worker_count_for(5), 4);
        assert_eq!(worker_count_for(64), MAX_WORKERS);
    }

    #[test]
    fn test_wait_blocks_until_tasks_complete() {
        let scheduler = TaskScheduler::with_workers(3).unwrap();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..24 {
            let done = Arc::clone(&done);
            scheduler.submit(move || {
                thread::sleep(Duration::from_millis(2));
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        scheduler.wait().unwrap();

        assert_eq!(done.load(Ordering::SeqCst), 24);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_wait_with_nothing_submitted() {
        let scheduler = TaskScheduler::with_workers(2).unwrap();
        scheduler.wait().unwrap();
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_repeated_batches() {
        let scheduler = TaskScheduler::with_workers(4).unwrap();
        let total = Arc::new(AtomicUsize::new(0));
        for batch in 1..=10 {
            for _ in 0..8 {
                let total = Arc::clone(&total);
                scheduler.submit(move || {
                    total.fetch_add(1, Ordering::SeqCst);
                });
            }
            scheduler.wait().unwrap();
            assert_eq!(total.load(Ordering::SeqCst), batch * 8);
        }
    }

    #[test]
    fn test_scope_writes_disjoint_slices() {
        let scheduler = TaskScheduler::with_workers(4).unwrap();
        let mut values = vec![0u32; 1000];

        scheduler
            .scope(|scope| {
                for (chunk_index, chunk) in values.chunks_mut(128).enumerate() {
                    scope.submit(move || {
                        for v in chunk.iter_mut() {
                            *v = chunk_index as u32 + 1;
                        }
                    });
                }
            })
            .unwrap();

        assert!(values.iter().all(|&v| v > 0));
        assert_eq!(values[0], 1);
        assert_eq!(values[999], 999 / 128 + 1);
    }

    #[test]
    fn test_task_panic_is_reported_and_worker_survives() {
        let scheduler = TaskScheduler::with_workers(1).unwrap();
        scheduler.submit(|| panic!("boom"));
        let err = scheduler.wait().unwrap_err();
        assert!(matches!(err, SchedulerError::TaskPanicked { count: 1 }));

        // The single worker still accepts work
        let ran = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran);
        scheduler.submit(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        });
        scheduler.wait().unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let mut scheduler = TaskScheduler::with_workers(2).unwrap();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let done = Arc::clone(&done);
            scheduler.submit(move || {
                thread::sleep(Duration::from_micros(200));
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        scheduler.shutdown();
        assert_eq!(done.load(Ordering::SeqCst), 50);
        assert_eq!(scheduler.worker_count(), 0);
    }

    #[test]
    fn test_submit_after_shutdown_runs_inline() {
        let mut scheduler = TaskScheduler::with_workers(2).unwrap();
        scheduler.shutdown();

        let ran = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran);
        scheduler.submit(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        });

        // Wait on a helper thread so a stalled barrier fails instead of hanging
        let scheduler = Arc::new(scheduler);
        let (tx, rx) = std::sync::mpsc::channel();
        let waiter = Arc::clone(&scheduler);
        thread::spawn(move || {
            let _ = tx.send(waiter.wait());
        });
        let result = rx.recv_timeout(Duration::from_secs(3)).expect("wait stalled");
        assert!(result.is_ok());
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);

        scheduler.submit(|| panic!("late boom"));
        assert!(matches!(
            scheduler.wait(),
            Err(SchedulerError::TaskPanicked { count: 1 })
        ));
    }

    #[test]
    fn test_scope_drains_batch_when_closure_panics() {
        let scheduler = TaskScheduler::with_workers(2).unwrap();
        let mut values = vec![0u32; 64];

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = scheduler.scope(|scope| {
                for chunk in values.chunks_mut(16) {
                    scope.submit(move || {
                        thread::sleep(Duration::from_millis(5));
                        for v in chunk.iter_mut() {
                            *v = 7;
                        }
                    });
                }
                panic!("scope body failed");
            });
        }));

        assert!(outcome.is_err());
        // Every borrowed chunk was written before the unwind left `scope`
        assert_eq!(scheduler.pending(), 0);
        assert!(values.iter().all(|&v| v == 7));
    }
}
