//! Fixed-size worker pool for render tasks.
//!
//! Workers pull boxed tasks from one FIFO queue guarded by a mutex and a
//! condition variable. The pool is scoped: tasks may borrow anything that
//! outlives the call to [`scope`], which is how each pixel task gets an
//! exclusive `&mut` to its own framebuffer slot without any locking.
//!
//! Worker life cycle: WAITING (blocked on the condvar) -> RUNNING (executing
//! a task outside the lock) -> WAITING ... until the pool is stopped and the
//! queue is empty, then EXITED.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::error::{ConfigError, RenderError, RenderResult};
use log::{debug, error, trace};

type Task<'t> = Box<dyn FnOnce() + Send + 't>;

struct Queue<'t> {
    tasks: VecDeque<Task<'t>>,
    stop: bool,
    enqueued: usize,
    dispatched: usize,
}

struct Shared<'t> {
    queue: Mutex<Queue<'t>>,
    available: Condvar,
    failed: AtomicUsize,
}

impl<'t> Shared<'t> {
    fn new() -> Self {
        Self {
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                stop: false,
                enqueued: 0,
                dispatched: 0,
            }),
            available: Condvar::new(),
            failed: AtomicUsize::new(0),
        }
    }

    // Tasks never run while the lock is held, so a poisoned queue is still consistent.
    fn lock(&self) -> MutexGuard<'_, Queue<'t>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_worker(&self, id: usize) {
        loop {
            let task = {
                let queue = self.lock();
                let mut queue = self
                    .available
                    .wait_while(queue, |q| q.tasks.is_empty() && !q.stop)
                    .unwrap_or_else(PoisonError::into_inner);

                match queue.tasks.pop_front() {
                    Some(task) => {
                        queue.dispatched += 1;
                        trace!("worker {}: task {}/{}", id, queue.dispatched, queue.enqueued);
                        task
                    }
                    // Stopped and drained
                    None => break,
                }
            };

            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!("worker {}: render task panicked", id);
            }
        }

        debug!("worker {} exiting", id);
    }

    fn stop(&self) {
        self.lock().stop = true;
        self.available.notify_all();
    }
}

/// Stops the pool even if the submitting closure unwinds, so the scope
/// can still join its workers.
struct StopGuard<'a, 't>(&'a Shared<'t>);

impl Drop for StopGuard<'_, '_> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Task counters of a running pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub enqueued: usize,
    pub dispatched: usize,
}

/// Handle for submitting work to a running pool.
pub struct WorkerPool<'p, 't> {
    shared: &'p Shared<'t>,
    threads: usize,
}

impl<'p, 't> WorkerPool<'p, 't> {
    /// Queue a task. Never blocks on running work.
    pub fn enqueue<F>(&self, task: F)
    where
        F: FnOnce() + Send + 't,
    {
        {
            let mut queue = self.shared.lock();
            queue.tasks.push_back(Box::new(task));
            queue.enqueued += 1;
        }
        self.shared.available.notify_one();
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn stats(&self) -> PoolStats {
        let queue = self.shared.lock();
        PoolStats {
            enqueued: queue.enqueued,
            dispatched: queue.dispatched,
        }
    }
}

/// Run `submit` against a pool of `threads` workers.
///
/// Once `submit` returns, the pool is stopped and this call blocks until
/// every queued task has run and every worker has exited. A task that
/// panics does not take its worker down, but the whole call then fails
/// with [`RenderError::TaskPanicked`].
pub fn scope<'t, R, F>(threads: usize, submit: F) -> RenderResult<R>
where
    F: FnOnce(&WorkerPool<'_, 't>) -> R,
{
    if threads == 0 {
        return Err(ConfigError::ZeroThreads.into());
    }

    let shared = Shared::new();
    let output = thread::scope(|s| {
        let _stop = StopGuard(&shared);
        for id in 0..threads {
            let shared = &shared;
            s.spawn(move || shared.run_worker(id));
        }

        let pool = WorkerPool {
            shared: &shared,
            threads,
        };
        submit(&pool)
    });

    let failed = shared.failed.load(Ordering::Relaxed);
    if failed > 0 {
        let total = shared.lock().enqueued;
        error!("{} of {} render tasks panicked", failed, total);
        return Err(RenderError::TaskPanicked { failed, total });
    }

    Ok(output)
}
