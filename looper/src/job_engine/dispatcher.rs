// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::any::type_name;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SubmitError;
use crate::job_engine::closure_job::ClosureJob;
use crate::job_engine::future_job::FutureJob;
use crate::job_engine::job::Job;
use crate::job_engine::queue::TimeOrderedQueue;
use crate::job_engine::target::{Handler, HandlerRef};
use crate::job_engine::task::Task;

/// Handle producers use to submit work to one event loop.
///
/// Cheap to clone and safe to share between threads. The queue is shared by
/// reference count, so a dispatcher that outlives its loop stays valid; its
/// submissions are simply rejected because the loop shut the queue down.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    queue: Arc<TimeOrderedQueue>,
}

impl Dispatcher {
    pub fn new(queue: Arc<TimeOrderedQueue>) -> Self {
        Self { queue }
    }

    /// Runs `f` on the loop thread as soon as possible.
    /// Returns `false` if the loop is shutting down.
    pub fn submit<F>(&self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.try_submit(f).is_ok()
    }

    /// Runs `f` on the loop thread, not before `delay` has passed.
    pub fn submit_after<F>(&self, f: F, delay: Duration) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.try_submit_after(f, delay).is_ok()
    }

    pub fn try_submit<F>(&self, f: F) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatch(Box::new(ClosureJob::new(type_name::<F>(), f)))
    }

    pub fn try_submit_after<F>(&self, f: F, delay: Duration) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatch_after(Box::new(ClosureJob::new(type_name::<F>(), f)), delay)
    }

    /// Signed variant for delays that come from arithmetic or configuration.
    /// Negative delays are rejected, never clamped.
    pub fn submit_after_millis<F>(&self, f: F, millis: i64) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        let millis = u64::try_from(millis).map_err(|_| SubmitError::InvalidDelay(millis))?;
        self.try_submit_after(f, Duration::from_millis(millis))
    }

    /// Drives `fut` to completion on the loop thread. The loop runs nothing
    /// else until the future resolves.
    pub fn submit_future<Fut>(&self, fut: Fut) -> bool
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.dispatch(Box::new(FutureJob::new(type_name::<Fut>(), fut)))
            .is_ok()
    }

    pub fn dispatch(&self, job: Box<dyn Job>) -> Result<(), SubmitError> {
        self.queue.try_enqueue(Task::new(job))
    }

    pub fn dispatch_after(&self, job: Box<dyn Job>, delay: Duration) -> Result<(), SubmitError> {
        let task = Task::with_delay(job, delay)?;
        self.queue.try_enqueue(task)
    }

    /// Binds a handler to this loop. The returned handle keeps only a weak
    /// reference; messages for a handler that is gone are dropped.
    pub fn bind<H: Handler>(&self, handler: &Arc<H>) -> HandlerRef<H> {
        HandlerRef::new(self.clone(), handler, self.queue.counters())
    }

    pub fn is_accepting(&self) -> bool {
        !self.queue.is_shutdown()
    }
}
