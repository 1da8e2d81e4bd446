// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

// Several handler objects can share one loop. A message holds only a weak
// reference to its handler, so queued messages never keep a handler alive.

use std::any::type_name;
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::debug;

use crate::error::SubmitError;
use crate::job_engine::dispatcher::Dispatcher;
use crate::job_engine::job::Job;
use crate::job_engine::stats::StatCounters;

/// Receives messages on the loop thread.
pub trait Handler: Send + Sync + 'static {
    type Message: Send + 'static;

    fn handle(&self, msg: Self::Message);
}

pub struct HandlerRef<H: Handler> {
    dispatcher: Dispatcher,
    target: Weak<H>,
    counters: Arc<StatCounters>,
}

impl<H: Handler> Clone for HandlerRef<H> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            target: self.target.clone(),
            counters: self.counters.clone(),
        }
    }
}

impl<H: Handler> std::fmt::Debug for HandlerRef<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRef")
            .field("target", &type_name::<H>())
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<H: Handler> HandlerRef<H> {
    pub(crate) fn new(dispatcher: Dispatcher, handler: &Arc<H>, counters: Arc<StatCounters>) -> Self {
        Self {
            dispatcher,
            target: Arc::downgrade(handler),
            counters,
        }
    }

    pub fn send(&self, msg: H::Message) -> bool {
        self.try_send(msg).is_ok()
    }

    pub fn send_after(&self, msg: H::Message, delay: Duration) -> bool {
        self.try_send_after(msg, delay).is_ok()
    }

    pub fn try_send(&self, msg: H::Message) -> Result<(), SubmitError> {
        self.dispatcher.dispatch(self.job_for(msg))
    }

    pub fn try_send_after(&self, msg: H::Message, delay: Duration) -> Result<(), SubmitError> {
        self.dispatcher.dispatch_after(self.job_for(msg), delay)
    }

    /// Whether the handler still exists. Messages sent to a dead handler are
    /// accepted by the queue but dropped when they come due.
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    fn job_for(&self, msg: H::Message) -> Box<dyn Job> {
        Box::new(TargetJob {
            target: self.target.clone(),
            msg,
            counters: self.counters.clone(),
        })
    }
}

struct TargetJob<H: Handler> {
    target: Weak<H>,
    msg: H::Message,
    counters: Arc<StatCounters>,
}

impl<H: Handler> Job for TargetJob<H> {
    fn desc(&self) -> &str {
        type_name::<H>()
    }

    fn run(self: Box<Self>) -> anyhow::Result<()> {
        let TargetJob {
            target,
            msg,
            counters,
        } = *self;
        match target.upgrade() {
            Some(handler) => handler.handle(msg),
            None => {
                debug!("Target {} is gone, dropping message", type_name::<H>());
                counters.record_target_gone();
            }
        }
        Ok(())
    }
}
