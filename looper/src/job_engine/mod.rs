// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! # Design: Single-Threaded Event Loop with a Time-Ordered Queue
//!
//! ## Overview
//! - Producers hand jobs to a [`Dispatcher`](dispatcher::Dispatcher), immediately or with a delay.
//! - The dispatcher wraps each job into a [`Task`](task::Task) with a fixed monotonic due time.
//! - The [`TimeOrderedQueue`](queue::TimeOrderedQueue) keeps tasks ordered by
//!   `(due_time, insertion sequence)` and wakes the consumer on every insertion.
//! - One dedicated thread owned by the [`EventLoop`](event_loop::EventLoop) takes the next due
//!   task and runs it. Failures and panics of a job stay local to that job.
//! - Shutdown is hard (discard), graceful (run what is due) or drain (run everything queued).
//!
//! ```text
//!         +----------+  +----------+  +----------+
//!         | producer |  | producer |  | producer |
//!         +----+-----+  +----+-----+  +----+-----+
//!              |  Dispatcher (Arc)         |
//!              v             v             v
//!         +----+-------------+-------------+-----+
//!         |  TimeOrderedQueue  (Mutex + Condvar) |
//!         +------------------+-------------------+
//!                            | take_next()
//!                       +----v-----+
//!                       | loop     |
//!                       | thread   |
//!                       +----------+
//! ```

pub mod closure_job;
pub mod dispatcher;
pub mod event_loop;
pub mod future_job;
pub mod job;
pub mod queue;
pub mod stats;
pub mod target;
pub mod task;

#[cfg(test)]
mod tests;
