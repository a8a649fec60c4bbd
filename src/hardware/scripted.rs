// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Recorded sensor traces

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;

use super::SensorSource;
use crate::error::{GovernorError, Result};
use crate::governor::SensorSample;

/// Load a trace: a JSON array of sensor samples.
pub fn load_trace(path: &Path) -> Result<Vec<SensorSample>> {
    let content = std::fs::read_to_string(path)?;
    let samples: Vec<SensorSample> = serde_json::from_str(&content)?;
    if samples.is_empty() {
        return Err(GovernorError::InvalidInput(format!(
            "trace {} has no samples",
            path.display()
        )));
    }
    Ok(samples)
}

/// Replays samples in order. Once exhausted it either repeats the last
/// sample or reports a sensor fault on every read.
#[derive(Debug, Clone)]
pub struct ScriptedSensors {
    samples: VecDeque<SensorSample>,
    last: Option<SensorSample>,
    repeat_last: bool,
    reads: u64,
}

impl ScriptedSensors {
    pub fn new(samples: impl IntoIterator<Item = SensorSample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            last: None,
            repeat_last: false,
            reads: 0,
        }
    }

    /// Keep returning the final sample after the trace runs out.
    pub fn repeat_last(mut self, repeat: bool) -> Self {
        self.repeat_last = repeat;
        self
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }
}

#[async_trait]
impl SensorSource for ScriptedSensors {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn read(&mut self) -> Result<SensorSample> {
        self.reads += 1;
        if let Some(sample) = self.samples.pop_front() {
            self.last = Some(sample.clone());
            return Ok(sample);
        }
        match (&self.last, self.repeat_last) {
            (Some(last), true) => Ok(last.clone()),
            _ => Err(GovernorError::Sensor("trace exhausted".to_string())),
        }
    }
}
