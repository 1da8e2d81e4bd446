// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

// A job is the type-erased body of a task. The due time lives on the task,
// the job only knows how to run itself once.

pub trait Job: Send + 'static {
    /// Free-form description, used for logging or debugging
    fn desc(&self) -> &str {
        "anonymous job"
    }

    /// Main entry point. Consumes the job, so it can only ever run once.
    fn run(self: Box<Self>) -> anyhow::Result<()>;
}

impl std::fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("desc", &self.desc()).finish()
    }
}
