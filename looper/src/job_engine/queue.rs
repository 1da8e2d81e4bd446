// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use log::{debug, warn};

use crate::error::SubmitError;
use crate::job_engine::event_loop::StopMode;
use crate::job_engine::stats::{LoopStats, StatCounters};
use crate::job_engine::task::Task;

struct Entry {
    due_time: Instant,
    seq: u64,
    task: Task,
}

// BinaryHeap is a max-heap, so the comparison is reversed: the entry with
// the earliest due time (and the lowest sequence among ties) is the greatest.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_time
            .cmp(&self.due_time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due_time == other.due_time && self.seq == other.seq
    }
}

impl Eq for Entry {}

/// Shutdown only ever escalates: Open -> Drain -> Graceful -> Hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    Open,
    Drain,
    Graceful { cutoff: Instant },
    Hard,
}

impl Shutdown {
    fn rank(&self) -> u8 {
        match self {
            Shutdown::Open => 0,
            Shutdown::Drain => 1,
            Shutdown::Graceful { .. } => 2,
            Shutdown::Hard => 3,
        }
    }
}

struct Inner {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
    shutdown: Shutdown,
}

/// Thread-safe queue of pending tasks ordered by `(due_time, insertion sequence)`.
///
/// Any number of producers may enqueue; one consumer blocks in [`take_next`](Self::take_next).
/// The lock is held only for bookkeeping, never while a job runs or is dropped.
pub struct TimeOrderedQueue {
    inner: Mutex<Inner>,
    available: Condvar,
    counters: Arc<StatCounters>,
}

impl Default for TimeOrderedQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeOrderedQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                next_seq: 0,
                shutdown: Shutdown::Open,
            }),
            available: Condvar::new(),
            counters: Arc::new(StatCounters::default()),
        }
    }

    // Nothing user supplied runs under the lock, so a poisoned lock still
    // guards a consistent heap.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn counters(&self) -> Arc<StatCounters> {
        self.counters.clone()
    }

    pub fn stats(&self) -> LoopStats {
        self.counters.snapshot()
    }

    /// Inserts the task. Returns `false` if shutdown has been requested.
    pub fn enqueue(&self, task: Task) -> bool {
        self.try_enqueue(task).is_ok()
    }

    pub fn try_enqueue(&self, task: Task) -> Result<(), SubmitError> {
        let mut inner = self.lock();
        if inner.shutdown != Shutdown::Open {
            drop(inner);
            debug!("Rejected job after shutdown: {}", task.desc());
            return Err(SubmitError::Rejected);
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.heap.push(Entry {
            due_time: task.due_time(),
            seq,
            task,
        });
        drop(inner);

        self.counters.record_submitted();
        self.available.notify_all();
        Ok(())
    }

    /// Blocks until the earliest task is due and returns it, or returns `None`
    /// once shutdown leaves no further work to hand out.
    pub fn take_next(&self) -> Option<Task> {
        let mut inner = self.lock();
        loop {
            let head_due = inner.heap.peek().map(|entry| entry.due_time);
            match (inner.shutdown, head_due) {
                (Shutdown::Hard, _) => {
                    self.discard(inner);
                    return None;
                }
                (Shutdown::Graceful { cutoff }, Some(due)) if due > cutoff => {
                    self.discard(inner);
                    return None;
                }
                (Shutdown::Open, None) => {
                    inner = self
                        .available
                        .wait(inner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                (_, None) => return None,
                (_, Some(due)) => {
                    let now = Instant::now();
                    if due <= now {
                        return inner.heap.pop().map(|entry| entry.task);
                    }
                    // An earlier insertion or a shutdown notifies the condvar
                    // and cuts this wait short.
                    let (guard, _timeout) = self
                        .available
                        .wait_timeout(inner, due - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    inner = guard;
                }
            }
        }
    }

    /// Hard shutdown: rejects new work and discards everything queued.
    pub fn request_shutdown(&self) {
        self.request_shutdown_with(StopMode::Hard);
    }

    /// Requests shutdown in the given mode. Repeating a request, or asking for
    /// a softer mode after a harder one, has no effect.
    pub fn request_shutdown_with(&self, mode: StopMode) {
        let mut inner = self.lock();
        let requested = match mode {
            StopMode::Hard => Shutdown::Hard,
            StopMode::Graceful => Shutdown::Graceful {
                cutoff: Instant::now(),
            },
            StopMode::Drain => Shutdown::Drain,
        };
        if requested.rank() <= inner.shutdown.rank() {
            return;
        }
        debug!("Shutdown requested: {:?}", mode);
        inner.shutdown = requested;
        if requested == Shutdown::Hard {
            // Nothing queued can run any more; don't keep it alive until the
            // consumer comes around, there might not be one.
            self.available.notify_all();
            self.discard(inner);
            return;
        }
        drop(inner);
        self.available.notify_all();
    }

    fn discard(&self, mut inner: MutexGuard<'_, Inner>) {
        let discarded = std::mem::take(&mut inner.heap);
        drop(inner);
        if !discarded.is_empty() {
            warn!("Discarding {} pending job(s) on shutdown", discarded.len());
            self.counters.record_discarded(discarded.len() as u64);
        }
        // Jobs are dropped here, outside the lock.
        drop(discarded);
    }

    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown != Shutdown::Open
    }

    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<Instant> {
        self.lock().heap.peek().map(|entry| entry.due_time)
    }
}

impl std::fmt::Debug for TimeOrderedQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("TimeOrderedQueue")
            .field("pending", &inner.heap.len())
            .field("shutdown", &inner.shutdown)
            .finish()
    }
}
