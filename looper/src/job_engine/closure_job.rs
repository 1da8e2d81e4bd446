// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use crate::job_engine::job::Job;

pub struct ClosureJob {
    desc: String,
    body: Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>,
}

impl ClosureJob {
    pub fn new<F>(desc: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            desc: desc.into(),
            body: Box::new(move || {
                f();
                Ok(())
            }),
        }
    }

    /// A closure that may fail. The error is logged by the loop, it never
    /// reaches the producer.
    pub fn fallible<F>(desc: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            desc: desc.into(),
            body: Box::new(f),
        }
    }
}

impl Job for ClosureJob {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn run(self: Box<Self>) -> anyhow::Result<()> {
        let job = *self;
        (job.body)()
    }
}
