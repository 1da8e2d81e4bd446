// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExecutedJob {
    pub label: String,

    /// Microseconds between the recorder's creation and the execution.
    pub offset_usec: u64,

    pub thread: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ExecutionLog {
    pub jobs: Vec<ExecutedJob>,
}

/// Collects which jobs ran, in which order and on which thread.
#[derive(Clone, Debug)]
pub struct Recorder {
    origin: Instant,
    log: Arc<Mutex<ExecutionLog>>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            log: Arc::new(Mutex::new(ExecutionLog::default())),
        }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn record(&self, label: impl Into<String>) {
        let entry = ExecutedJob {
            label: label.into(),
            offset_usec: self.origin.elapsed().as_micros() as u64,
            thread: std::thread::current().name().map(str::to_string),
        };
        self.log.lock().unwrap().jobs.push(entry);
    }

    /// A closure that records `label` when it runs.
    pub fn job(&self, label: impl Into<String>) -> impl FnOnce() + Send + 'static {
        let recorder = self.clone();
        let label = label.into();
        move || recorder.record(label)
    }

    pub fn labels(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .jobs
            .iter()
            .map(|job| job.label.clone())
            .collect()
    }

    pub fn entries(&self) -> Vec<ExecutedJob> {
        self.log.lock().unwrap().jobs.clone()
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dumps the log as JSON, handy when a timing assertion fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&*self.log.lock().unwrap())
            .unwrap_or_else(|e| format!("<unserializable log: {e}>"))
    }
}
