// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::config::LoopConfig;
use crate::error::LoopError;
use crate::job_engine::dispatcher::Dispatcher;
use crate::job_engine::queue::TimeOrderedQueue;
use crate::job_engine::stats::{LoopStats, StatCounters};
use crate::job_engine::task::Task;

/// How pending work is treated when the loop is asked to stop.
/// Every mode rejects new submissions right away.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopMode {
    #[default]
    /// Discard everything that has not started yet
    Hard,
    /// Run what is due at the moment of the request, discard later timers
    Graceful,
    /// Run everything that is already queued, waiting for pending timers
    Drain,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum LoopState {
    Created,
    Running,
    Stopped,
}

/// Owns the queue and the single thread that executes its tasks.
///
/// `Created -> Running -> Stopped`; a stopped loop cannot be restarted.
/// Dropping a running loop stops it with [`LoopConfig::stop_on_drop`] and
/// waits for the thread.
#[derive(Debug)]
pub struct EventLoop {
    config: LoopConfig,
    queue: Arc<TimeOrderedQueue>,
    worker: Option<JoinHandle<()>>,
    state: LoopState,
}

impl EventLoop {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            queue: Arc::new(TimeOrderedQueue::new()),
            worker: None,
            state: LoopState::Created,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(LoopConfig::default())
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// A handle producers use to submit work. Can be cloned and sent to other threads.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.queue.clone())
    }

    pub fn start(&mut self) -> Result<(), LoopError> {
        match self.state {
            LoopState::Running => return Err(LoopError::AlreadyStarted),
            LoopState::Stopped => return Err(LoopError::Stopped),
            LoopState::Created => {}
        }
        if self.queue.is_shutdown() {
            self.state = LoopState::Stopped;
            return Err(LoopError::Stopped);
        }

        let queue = self.queue.clone();
        let name = self.config.name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_loop(&name, &queue))?;

        self.worker = Some(handle);
        self.state = LoopState::Running;
        Ok(())
    }

    pub fn stop(&self, mode: StopMode) {
        self.queue.request_shutdown_with(mode);
    }

    pub fn stop_hard(&self) {
        self.stop(StopMode::Hard);
    }

    pub fn stop_graceful(&self) {
        self.stop(StopMode::Graceful);
    }

    pub fn stop_drain(&self) {
        self.stop(StopMode::Drain);
    }

    /// Blocks until the loop thread has exited. Without a prior stop this
    /// waits for another thread to stop the loop.
    pub fn join(&mut self) -> Result<(), LoopError> {
        let Some(handle) = self.worker.take() else {
            if self.queue.is_shutdown() {
                self.state = LoopState::Stopped;
            }
            return Ok(());
        };
        let result = handle.join();
        self.state = LoopState::Stopped;
        result.map_err(|_| LoopError::WorkerPanicked)
    }

    pub fn state(&self) -> LoopState {
        match (&self.state, &self.worker) {
            (LoopState::Running, Some(handle)) if handle.is_finished() => LoopState::Stopped,
            (LoopState::Created, _) if self.queue.is_shutdown() => LoopState::Stopped,
            (state, _) => *state,
        }
    }

    pub fn stats(&self) -> LoopStats {
        self.queue.stats()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        if self.worker.is_none() {
            // Never started (or already joined): nobody will drain the queue.
            self.queue.request_shutdown();
            return;
        }
        self.stop(self.config.stop_on_drop);
        if let Err(e) = self.join() {
            error!("Loop {} did not shut down cleanly: {e}", self.config.name);
        }
    }
}

fn run_loop(name: &str, queue: &TimeOrderedQueue) {
    info!("Starting loop {}", name);
    let counters = queue.counters();
    while let Some(task) = queue.take_next() {
        execute(task, &counters);
    }
    info!("Loop {} ended", name);
}

/// Runs one task on the loop thread. Errors and panics are logged and
/// counted; they never end the loop.
fn execute(task: Task, counters: &StatCounters) {
    let desc = task.desc().to_string();
    debug!("Executing job: {}", desc);
    match catch_unwind(AssertUnwindSafe(|| task.invoke())) {
        Ok(Ok(())) => counters.record_executed(),
        Ok(Err(e)) => {
            error!("Job '{}' failed: {:#}", desc, e);
            counters.record_failed();
        }
        Err(payload) => {
            error!("Job '{}' panicked: {}", desc, panic_message(&*payload));
            counters.record_panicked();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}
