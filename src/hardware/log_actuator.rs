// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Actuator that records decisions instead of writing to firmware

use async_trait::async_trait;
use std::io::Write;

use super::Actuator;
use crate::error::Result;
use crate::governor::ControlOutput;
use crate::runtime::Heartbeat;

/// Logs changed outputs through `tracing` and optionally prints heartbeats.
#[derive(Debug, Default)]
pub struct LogActuator {
    last: Option<ControlOutput>,
    json: bool,
    print_heartbeats: bool,
    applied: u64,
}

impl LogActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print each heartbeat to stdout, as JSON lines when `json` is set.
    pub fn with_stdout(mut self, json: bool) -> Self {
        self.print_heartbeats = true;
        self.json = json;
        self
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    fn changed(&self, output: &ControlOutput) -> bool {
        match &self.last {
            Some(last) => {
                last.fans != output.fans
                    || last.pl1 != output.pl1
                    || last.gps != output.gps
                    || last.degraded != output.degraded
                    || output.ir_event.is_some()
            }
            None => true,
        }
    }
}

#[async_trait]
impl Actuator for LogActuator {
    fn name(&self) -> &str {
        "log"
    }

    async fn apply(&mut self, output: &ControlOutput) -> Result<()> {
        if self.changed(output) {
            tracing::info!(
                target: "thermgov.runtime",
                tick = output.tick,
                cpu_fan = output.fans.cpu,
                gpu_fan = output.fans.gpu,
                pl1 = output.pl1.current,
                gps = output.gps,
                "apply{}",
                output
                    .ir_event
                    .map(|event| format!(" ({})", event))
                    .unwrap_or_default()
            );
        }
        self.last = Some(output.clone());
        self.applied += 1;
        Ok(())
    }

    async fn report(&mut self, heartbeat: &Heartbeat) -> Result<()> {
        tracing::info!(target: "thermgov.runtime", "heartbeat: {}", heartbeat.summary_line());
        if self.print_heartbeats {
            let mut stdout = std::io::stdout().lock();
            if self.json {
                writeln!(stdout, "{}", serde_json::to_string(heartbeat)?)?;
            } else {
                writeln!(stdout, "[{}] {}", heartbeat.timestamp, heartbeat.summary_line())?;
            }
        }
        Ok(())
    }
}
