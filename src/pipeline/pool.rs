// src/pipeline/pool.rs

//! Fixed-size worker pool draining a `WorkQueue`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinSet;

use crate::error::{AppError, Result};
use crate::pipeline::WorkQueue;

/// What the pool should do after a unit was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Completed,
    /// Stop the whole run; queued units are discarded.
    Halt,
}

/// Processes one work unit. May put follow-up units on `queue`.
#[async_trait]
pub trait UnitProcessor<T>: Send + Sync {
    async fn process(&self, unit: T, queue: &WorkQueue<T>) -> UnitOutcome;
}

/// Summary of one pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub units_processed: usize,
    /// Units dropped by an immediate shutdown
    pub units_discarded: usize,
    /// Units whose processing panicked
    pub units_panicked: usize,
    pub halted: bool,
}

#[derive(Default)]
struct Counters {
    processed: AtomicUsize,
    discarded: AtomicUsize,
    panicked: AtomicUsize,
    halted: AtomicBool,
}

/// Runs a fixed number of workers over one queue.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(AppError::validation("worker count must be > 0"));
        }
        Ok(Self { workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Drain `queue` with `processor` until every unit is done or a unit halts
    /// the run.
    pub async fn run<T, P>(&self, queue: Arc<WorkQueue<T>>, processor: Arc<P>) -> RunReport
    where
        T: Send + 'static,
        P: UnitProcessor<T> + ?Sized + 'static,
    {
        let counters = Arc::new(Counters::default());
        let mut join_set = JoinSet::new();

        for worker_id in 0..self.workers {
            let queue = Arc::clone(&queue);
            let processor = Arc::clone(&processor);
            let counters = Arc::clone(&counters);
            join_set.spawn(async move {
                worker_loop(worker_id, &queue, processor.as_ref(), &counters).await;
            });
        }

        queue.join().await;

        join_set.abort_all();
        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    log::error!("Worker panicked: {}", e);
                }
            }
        }

        RunReport {
            units_processed: counters.processed.load(Ordering::SeqCst),
            units_discarded: counters.discarded.load(Ordering::SeqCst),
            units_panicked: counters.panicked.load(Ordering::SeqCst),
            halted: counters.halted.load(Ordering::SeqCst),
        }
    }
}

async fn worker_loop<T, P>(worker_id: usize, queue: &WorkQueue<T>, processor: &P, counters: &Counters)
where
    P: UnitProcessor<T> + ?Sized,
{
    loop {
        let unit = match queue.get().await {
            Ok(unit) => unit,
            Err(_) => {
                log::debug!("Worker {} stopping: queue closed", worker_id);
                return;
            }
        };

        // a panicking unit must still reach task_done, or join never resolves
        let outcome = match AssertUnwindSafe(processor.process(unit, queue))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => {
                counters.panicked.fetch_add(1, Ordering::SeqCst);
                log::error!("Worker {} panicked: {}", worker_id, panic_message(&*panic));
                UnitOutcome::Completed
            }
        };
        counters.processed.fetch_add(1, Ordering::SeqCst);

        if outcome == UnitOutcome::Halt {
            // closed before this unit counts as done
            let discarded = queue.shutdown(true);
            queue.task_done();
            counters.discarded.fetch_add(discarded, Ordering::SeqCst);
            counters.halted.store(true, Ordering::SeqCst);
            log::warn!(
                "Worker {} halted the run, {} queued units discarded",
                worker_id,
                discarded
            );
            return;
        }
        queue.task_done();
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
