// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use thiserror::Error;

/// Why a submission did not make it into the queue.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The loop has been asked to stop; no further work will run.
    #[error("event loop is shutting down, submission rejected")]
    Rejected,
    /// A negative delay was requested.
    #[error("invalid delay of {0} ms, delays must not be negative")]
    InvalidDelay(i64),
    /// `now + delay` is not representable by the monotonic clock.
    #[error("delay too large for the monotonic clock")]
    DelayOverflow,
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("event loop has already been started")]
    AlreadyStarted,
    #[error("event loop was stopped and cannot be started again")]
    Stopped,
    #[error("failed to spawn the event loop thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("event loop thread panicked")]
    WorkerPanicked,
}
