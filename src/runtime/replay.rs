// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Deterministic trace replay
//!
//! Drives a [`Governor`] tick by tick without timers: every sample is one
//! short tick followed by an IR evaluation when the profile's IR cycle
//! completes, and fault escalation runs after every `long / short` ticks, the
//! same order the live loop produces. No heartbeats are emitted.

use serde::{Deserialize, Serialize};

use super::{FaultMonitor, LoopConfig, LoopSummary};
use crate::governor::{ControlOutput, Governor, SensorSample};

/// Everything a replay produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// One output per tick, plus one per IR event right after its tick
    pub outputs: Vec<ControlOutput>,
    pub summary: LoopSummary,
}

/// Replay `trace` through `governor`.
pub fn replay(governor: &mut Governor, trace: &[SensorSample], config: &LoopConfig) -> ReplayReport {
    let per_long = config.ticks_per_long_cycle();
    let mut monitor = FaultMonitor::new(config.degrade_after);
    let mut report = ReplayReport::default();

    for sample in trace {
        let output = governor.tick(Some(sample));
        if output.sensor_fault {
            monitor.sensor_fault();
        }
        report.outputs.push(output);

        if let Some(event) = governor.long_cycle() {
            report.summary.ir_events += 1;
            report.outputs.push(governor.output(Some(event)));
        }

        if governor.ticks() % per_long == 0 {
            report.summary.long_cycles += 1;
            monitor.end_cycle(governor);
        }
    }

    report.summary.ticks = governor.ticks();
    report.summary.faults = monitor.counters();
    report.summary.degraded = governor.state().degraded;
    report
}
