// src/pipeline/queue.rs

//! Unbounded FIFO work queue with completion tracking.
//!
//! Every `put` raises the pending count and every `task_done` lowers it;
//! `join` resolves once the count reaches zero. A unit that spawns more units
//! must `put` them before its own `task_done`, otherwise `join` can observe a
//! zero count while work is still about to be added.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

use crate::error::{AppError, Result};

struct State<T> {
    items: VecDeque<T>,
    unfinished: usize,
    closed: bool,
}

/// Work queue shared by the workers of one run.
pub struct WorkQueue<T> {
    state: Mutex<State<T>>,
    available: Notify,
    drained: Notify,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                unfinished: 0,
                closed: false,
            }),
            available: Notify::new(),
            drained: Notify::new(),
        }
    }

    /// Enqueue a unit. Fails once the queue is shut down.
    pub fn put(&self, item: T) -> Result<()> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(AppError::QueueClosed);
            }
            state.items.push_back(item);
            state.unfinished += 1;
        }
        self.available.notify_one();
        Ok(())
    }

    /// Dequeue the next unit, waiting until one is available.
    ///
    /// Returns `AppError::QueueClosed` once the queue is shut down and empty.
    pub async fn get(&self) -> Result<T> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(item) = state.items.pop_front() {
                    return Ok(item);
                }
                if state.closed {
                    return Err(AppError::QueueClosed);
                }
            }

            notified.await;
        }
    }

    /// Mark one dequeued unit as complete.
    pub fn task_done(&self) {
        let drained = {
            let mut state = self.lock();
            if state.unfinished == 0 {
                log::warn!("task_done called more times than units were put");
                return;
            }
            state.unfinished -= 1;
            state.unfinished == 0
        };
        if drained {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every unit put so far has been marked done.
    pub async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.lock().unfinished == 0 {
                return;
            }

            notified.await;
        }
    }

    /// Close the queue.
    ///
    /// With `immediate`, queued units are discarded (and counted as done) and
    /// every blocked `get` returns `QueueClosed`. Otherwise the remaining
    /// units can still be dequeued.
    pub fn shutdown(&self, immediate: bool) -> usize {
        let (discarded, drained) = {
            let mut state = self.lock();
            state.closed = true;
            let discarded = if immediate {
                let count = state.items.len();
                state.items.clear();
                state.unfinished -= count;
                count
            } else {
                0
            };
            (discarded, state.unfinished == 0)
        };

        self.available.notify_waiters();
        if drained {
            self.drained.notify_waiters();
        }
        discarded
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Units put but not yet marked done.
    pub fn unfinished(&self) -> usize {
        self.lock().unfinished
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State<T>> {
        // no await or user code runs under the lock
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
