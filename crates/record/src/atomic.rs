//! The serial atomic-execution lane
//!
//! [`AtomicExecutor`] runs closures with mutual exclusion against every
//! other closure submitted to the same executor, in strict submission
//! (FIFO) order, on one dedicated worker thread. Synchronous runs block
//! the caller until their closure has executed; asynchronous runs return
//! immediately. There is no cancellation and no deadline: once accepted, a
//! closure always eventually runs, including during shutdown drain.
//!
//! Reentrancy is a detectable error, not a deadlock: calling
//! [`AtomicExecutor::run`] from inside an executing closure returns
//! `Err(ReentrantAtomic)`.
//!
//! The process-wide lane shared by all find-or-create operations is
//! [`AtomicExecutor::global`].

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::{Condvar, Mutex};
use shellac_core::{Error, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use tracing::error;

static GLOBAL: Lazy<AtomicExecutor> = Lazy::new(|| AtomicExecutor::new("shellac-atomic"));

struct Job {
    work: Box<dyn FnOnce() + Send>,
    // Present for synchronous submissions: carries the closure's outcome
    // (including a panic payload) back to the blocked caller.
    done: Option<mpsc::SyncSender<std::thread::Result<()>>>,
}

struct ExecutorInner {
    queue: Mutex<VecDeque<Job>>,
    work_ready: Condvar,
    shutdown: AtomicBool,
    worker_thread: OnceCell<std::thread::ThreadId>,
}

/// Mutual-exclusion executor: one worker, one FIFO queue, total ordering.
pub struct AtomicExecutor {
    inner: Arc<ExecutorInner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AtomicExecutor {
    /// Create an executor with a dedicated worker thread of the given name.
    pub fn new(name: &str) -> Self {
        let inner = Arc::new(ExecutorInner {
            queue: Mutex::new(VecDeque::new()),
            work_ready: Condvar::new(),
            shutdown: AtomicBool::new(false),
            worker_thread: OnceCell::new(),
        });

        let inner_clone = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(&inner_clone))
            .expect("failed to spawn atomic executor worker thread");

        // Recorded before any job can be submitted, so the reentrancy check
        // never races with an executing closure.
        let _ = inner.worker_thread.set(handle.thread().id());

        AtomicExecutor {
            inner,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// The process-wide serial lane shared by all find-or-create
    /// operations for all entity types.
    pub fn global() -> &'static AtomicExecutor {
        &GLOBAL
    }

    /// Run `work` with mutual exclusion against every other submission.
    ///
    /// `wait = true` blocks until `work` has executed; a panic inside
    /// `work` is resumed on the calling thread. `wait = false` enqueues
    /// and returns; a panic inside `work` is caught and logged, and the
    /// worker survives.
    ///
    /// ## Errors
    ///
    /// - `ReentrantAtomic`: called from inside an executing closure
    /// - `ExecutorShutdown`: the executor has been shut down
    pub fn run<F>(&self, wait: bool, work: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.worker_thread.get() == Some(&std::thread::current().id()) {
            return Err(Error::ReentrantAtomic);
        }

        let (job, receiver) = if wait {
            let (sender, receiver) = mpsc::sync_channel(1);
            (
                Job {
                    work: Box::new(work),
                    done: Some(sender),
                },
                Some(receiver),
            )
        } else {
            (
                Job {
                    work: Box::new(work),
                    done: None,
                },
                None,
            )
        };

        {
            // The flag must be read under the queue lock: a push after an
            // unlocked check could land in a queue the drain has already
            // passed, stranding a waiting caller.
            let mut queue = self.inner.queue.lock();
            if self.inner.shutdown.load(Ordering::Acquire) {
                return Err(Error::ExecutorShutdown);
            }
            queue.push_back(job);
        }
        self.inner.work_ready.notify_one();

        if let Some(receiver) = receiver {
            match receiver.recv() {
                Ok(Ok(())) => Ok(()),
                Ok(Err(payload)) => std::panic::resume_unwind(payload),
                // Worker gone without reporting: only possible after a
                // shutdown that discarded the channel.
                Err(_) => Err(Error::ExecutorShutdown),
            }
        } else {
            Ok(())
        }
    }

    /// Run `work` synchronously and return its value.
    ///
    /// Convenience over `run(true, …)` for callers that need a result out
    /// of the atomic block.
    pub fn run_sync<R, F>(&self, work: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let slot = Arc::new(Mutex::new(None));
        let slot_in_block = Arc::clone(&slot);
        self.run(true, move || {
            *slot_in_block.lock() = Some(work());
        })?;
        let value = slot.lock().take();
        // run(true) only returns Ok after the closure stored its value.
        value.ok_or(Error::ExecutorShutdown)
    }

    /// Shut down the executor: drain every queued job, then join the
    /// worker. Subsequent `run` calls return `Err(ExecutorShutdown)`.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        {
            let _queue = self.inner.queue.lock();
            self.inner.work_ready.notify_all();
        }
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AtomicExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(inner: &ExecutorInner) {
    loop {
        let job = {
            let mut queue = inner.queue.lock();
            loop {
                if let Some(job) = queue.pop_front() {
                    break job;
                }
                // Drain before exit: accepted jobs always run.
                if inner.shutdown.load(Ordering::Acquire) {
                    return;
                }
                inner.work_ready.wait(&mut queue);
            }
        };

        // Execute outside the lock. catch_unwind keeps the lane alive
        // across a panicking closure.
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job.work));

        match (job.done, outcome) {
            // Synchronous caller observes the outcome, panic included.
            (Some(sender), outcome) => {
                let _ = sender.send(outcome);
            }
            (None, Err(payload)) => {
                error!(
                    "asynchronous atomic block panicked: {:?}",
                    payload
                        .downcast_ref::<&str>()
                        .copied()
                        .unwrap_or("(non-string panic)")
                );
            }
            (None, Ok(())) => {}
        }
    }
}
