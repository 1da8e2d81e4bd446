// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::job_engine::event_loop::StopMode;

/// Settings of a single event loop. There is no global instance; every
/// loop receives its own copy at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoopConfig {
    /// Name of the worker thread, also used as log prefix.
    #[serde(default = "default_name")]
    pub name: String,

    /// How the loop shuts down when it is dropped while still running.
    #[serde(default)]
    pub stop_on_drop: StopMode,
}

fn default_name() -> String {
    "looper".to_string()
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            stop_on_drop: StopMode::default(),
        }
    }
}

impl LoopConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid event loop configuration")
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_stop_on_drop(mut self, mode: StopMode) -> Self {
        self.stop_on_drop = mode;
        self
    }
}
