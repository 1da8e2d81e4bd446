// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time view of the counters of one event loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    /// Tasks accepted by the queue.
    pub submitted: u64,
    /// Tasks that ran to completion without error.
    pub executed: u64,
    /// Tasks whose job returned an error.
    pub failed: u64,
    /// Tasks whose job panicked.
    pub panicked: u64,
    /// Accepted tasks dropped by a shutdown without running.
    pub discarded: u64,
    /// Messages whose handler was already gone when they came due.
    pub target_gone: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatCounters {
    submitted: AtomicU64,
    executed: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
    discarded: AtomicU64,
    target_gone: AtomicU64,
}

impl StatCounters {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: u64) {
        self.discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_target_gone(&self) {
        self.target_gone.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LoopStats {
        LoopStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            target_gone: self.target_gone.load(Ordering::Relaxed),
        }
    }
}
