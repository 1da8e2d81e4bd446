// SPDX-License-Identifier: MIT
// looper: single-threaded event loop with a time-ordered task queue
//
// - One worker thread executes scheduled jobs strictly in due-time order.
// - Any number of producer threads submit work through cloneable dispatchers.
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod config;
pub mod error;
pub mod job_engine;

pub use crate::config::LoopConfig;
pub use crate::error::{LoopError, SubmitError};
pub use crate::job_engine::closure_job::ClosureJob;
pub use crate::job_engine::dispatcher::Dispatcher;
pub use crate::job_engine::event_loop::{EventLoop, LoopState, StopMode};
pub use crate::job_engine::future_job::FutureJob;
pub use crate::job_engine::job::Job;
pub use crate::job_engine::queue::TimeOrderedQueue;
pub use crate::job_engine::stats::LoopStats;
pub use crate::job_engine::target::{Handler, HandlerRef};
pub use crate::job_engine::task::Task;
