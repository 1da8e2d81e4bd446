// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::future::Future;
use std::pin::Pin;

use crate::job_engine::job::Job;

/// Runs a future to completion on the loop thread. The loop stays serial:
/// nothing else runs until the future resolves, so the future must not wait
/// for work that is queued on the same loop.
pub struct FutureJob {
    desc: String,
    task: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
}

impl FutureJob {
    pub fn new(desc: impl Into<String>, fut: impl Future<Output = ()> + Send + 'static) -> Self {
        Self {
            desc: desc.into(),
            task: Box::pin(fut),
        }
    }
}

impl Job for FutureJob {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn run(self: Box<Self>) -> anyhow::Result<()> {
        let job = *self;
        futures::executor::block_on(job.task);
        Ok(())
    }
}
