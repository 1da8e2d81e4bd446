// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::time::{Duration, Instant};

use crate::error::SubmitError;
use crate::job_engine::job::Job;

/// One scheduled unit of work. The due time is taken from the monotonic
/// clock once, at construction, and never changes afterwards.
pub struct Task {
    job: Box<dyn Job>,
    due_time: Instant,
}

impl Task {
    /// A task that is due immediately.
    pub fn new(job: Box<dyn Job>) -> Self {
        Self {
            job,
            due_time: Instant::now(),
        }
    }

    pub fn with_delay(job: Box<dyn Job>, delay: Duration) -> Result<Self, SubmitError> {
        let due_time = Instant::now()
            .checked_add(delay)
            .ok_or(SubmitError::DelayOverflow)?;
        Ok(Self { job, due_time })
    }

    /// A task due at an explicit point in time.
    pub fn at(job: Box<dyn Job>, due_time: Instant) -> Self {
        Self { job, due_time }
    }

    pub fn due_time(&self) -> Instant {
        self.due_time
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.due_time <= now
    }

    pub fn desc(&self) -> &str {
        self.job.desc()
    }

    /// Runs the job. Consumes the task, so a task runs at most once.
    pub fn invoke(self) -> anyhow::Result<()> {
        self.job.run()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("desc", &self.desc())
            .field("due_time", &self.due_time)
            .finish()
    }
}
