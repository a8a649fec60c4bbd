// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Timer-driven control loop
//!
//! One task owns the [`Governor`] and multiplexes three timers:
//!
//! - **short** (1 s): read sensors, tick the governor, apply fans and PL1,
//!   and run the IR evaluation whenever the profile's IR cycle completes
//! - **long** (30 s): fault escalation
//! - **heartbeat** (30 s): status report through the actuator
//!
//! Collaborator calls are bounded by `io_timeout`. A sensor read that times
//! out drops the tick. Faults in several consecutive long cycles put the
//! governor into degraded mode until one long cycle passes cleanly.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub mod replay;
pub mod report;

pub use replay::{replay, ReplayReport};
pub use report::{FaultCounters, Heartbeat};

use crate::error::{GovernorError, Result};
use crate::governor::{ControlOutput, Governor};
use crate::hardware::{Actuator, SensorSource};

/// Loop cadence and fault policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub short_interval: Duration,
    pub long_interval: Duration,
    pub heartbeat_interval: Duration,
    pub io_timeout: Duration,
    /// Consecutive faulted long cycles before entering degraded mode
    pub degrade_after: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            short_interval: Duration::from_millis(1000),
            long_interval: Duration::from_millis(30_000),
            heartbeat_interval: Duration::from_millis(30_000),
            io_timeout: Duration::from_millis(250),
            degrade_after: 3,
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("short", self.short_interval),
            ("long", self.long_interval),
            ("heartbeat", self.heartbeat_interval),
            ("io timeout", self.io_timeout),
        ];
        for (name, value) in intervals {
            if value.is_zero() {
                return Err(GovernorError::Config(format!(
                    "{} interval must be positive",
                    name
                )));
            }
        }
        if self.long_interval < self.short_interval {
            return Err(GovernorError::Config(
                "long interval is shorter than the short interval".to_string(),
            ));
        }
        if self.degrade_after == 0 {
            return Err(GovernorError::Config(
                "degrade_after must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Short ticks per long cycle, at least 1.
    pub fn ticks_per_long_cycle(&self) -> u64 {
        (self.long_interval.as_millis() / self.short_interval.as_millis().max(1)).max(1) as u64
    }
}

/// Totals reported when the loop stops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopSummary {
    pub ticks: u64,
    pub long_cycles: u64,
    pub ir_events: u64,
    pub heartbeats: u64,
    pub faults: FaultCounters,
    pub degraded: bool,
}

/// Tracks faults within the current long cycle and drives degraded mode.
#[derive(Debug, Clone, Default)]
pub struct FaultMonitor {
    counters: FaultCounters,
    cycle_faulted: bool,
    degrade_after: u32,
}

impl FaultMonitor {
    pub fn new(degrade_after: u32) -> Self {
        Self {
            degrade_after: degrade_after.max(1),
            ..Default::default()
        }
    }

    pub fn counters(&self) -> FaultCounters {
        self.counters
    }

    pub fn sensor_fault(&mut self) {
        self.counters.sensor_faults += 1;
        self.cycle_faulted = true;
    }

    pub fn actuator_fault(&mut self) {
        self.counters.actuator_faults += 1;
        self.cycle_faulted = true;
    }

    pub fn missed_tick(&mut self) {
        self.counters.missed_ticks += 1;
        self.cycle_faulted = true;
    }

    /// Close a long cycle: extend or clear the faulted streak, then enter or
    /// leave degraded mode. Returns the new degraded flag on a transition.
    pub fn end_cycle(&mut self, governor: &mut Governor) -> Option<bool> {
        if std::mem::take(&mut self.cycle_faulted) {
            self.counters.faulted_cycles = self.counters.faulted_cycles.saturating_add(1);
        } else {
            self.counters.faulted_cycles = 0;
        }

        let degraded = governor.state().degraded;
        if !degraded && self.counters.faulted_cycles >= self.degrade_after {
            tracing::error!(
                target: "thermgov.runtime",
                "faults in {} consecutive long cycles, entering degraded mode",
                self.counters.faulted_cycles
            );
            governor.set_degraded(true);
            Some(true)
        } else if degraded && self.counters.faulted_cycles == 0 {
            tracing::info!(target: "thermgov.runtime", "clean long cycle, leaving degraded mode");
            governor.set_degraded(false);
            Some(false)
        } else {
            None
        }
    }
}

/// Governor plus its collaborators, ready to run.
pub struct GovernorLoop<S, A> {
    governor: Governor,
    sensors: S,
    actuator: A,
    config: LoopConfig,
    faults: FaultMonitor,
    summary: LoopSummary,
}

impl<S, A> GovernorLoop<S, A>
where
    S: SensorSource + 'static,
    A: Actuator + 'static,
{
    pub fn new(governor: Governor, sensors: S, actuator: A, config: LoopConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            governor,
            sensors,
            actuator,
            config,
            faults: FaultMonitor::new(config.degrade_after),
            summary: LoopSummary::default(),
        })
    }

    /// Start the loop on its own task.
    pub fn spawn(self) -> LoopHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));
        LoopHandle { stop_tx, task }
    }

    /// Run until `stop` flips to true or its sender is dropped. A cycle in
    /// progress always completes first.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> Result<LoopSummary> {
        let start = Instant::now();
        let mut short = time::interval_at(start, self.config.short_interval);
        let mut long = time::interval_at(
            start + self.config.long_interval,
            self.config.long_interval,
        );
        let mut heartbeat = time::interval_at(
            start + self.config.heartbeat_interval,
            self.config.heartbeat_interval,
        );
        for timer in [&mut short, &mut long, &mut heartbeat] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        tracing::info!(
            target: "thermgov.runtime",
            "control loop started: sensors={} actuator={} short={:?} long={:?}",
            self.sensors.name(),
            self.actuator.name(),
            self.config.short_interval,
            self.config.long_interval
        );

        loop {
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                _ = long.tick() => self.long_cycle().await,
                _ = heartbeat.tick() => self.heartbeat().await,
                _ = short.tick() => self.short_cycle().await,
            }
        }

        self.summary.ticks = self.governor.ticks();
        self.summary.faults = self.faults.counters();
        self.summary.degraded = self.governor.state().degraded;
        tracing::info!(
            target: "thermgov.runtime",
            "control loop stopped after {} ticks ({} faults)",
            self.summary.ticks,
            self.summary.faults.total()
        );
        Ok(self.summary)
    }

    async fn short_cycle(&mut self) {
        let sample = match time::timeout(self.config.io_timeout, self.sensors.read()).await {
            Ok(Ok(sample)) => Some(sample),
            Ok(Err(e)) => {
                tracing::warn!(target: "thermgov.runtime", "sensor read failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    target: "thermgov.runtime",
                    "sensor read exceeded {:?}, tick skipped",
                    self.config.io_timeout
                );
                self.faults.missed_tick();
                return;
            }
        };

        let output = self.governor.tick(sample.as_ref());
        if output.sensor_fault {
            self.faults.sensor_fault();
        }
        self.apply(&output).await;

        let event = self.governor.long_cycle();
        if event.is_some() {
            self.summary.ir_events += 1;
            let output = self.governor.output(event);
            self.apply(&output).await;
        }
    }

    async fn long_cycle(&mut self) {
        self.summary.long_cycles += 1;
        self.faults.end_cycle(&mut self.governor);
    }

    async fn heartbeat(&mut self) {
        let beat = Heartbeat::capture(&self.governor, self.faults.counters());
        self.summary.heartbeats += 1;
        let failure = match time::timeout(self.config.io_timeout, self.actuator.report(&beat)).await
        {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", self.config.io_timeout),
        };
        tracing::warn!(
            target: "thermgov.runtime",
            "heartbeat report to {} failed: {}",
            self.actuator.name(),
            failure
        );
        self.faults.actuator_fault();
    }

    async fn apply(&mut self, output: &ControlOutput) {
        let failure = match time::timeout(self.config.io_timeout, self.actuator.apply(output)).await
        {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", self.config.io_timeout),
        };
        tracing::warn!(
            target: "thermgov.runtime",
            "actuator {} failed on tick {}: {}",
            self.actuator.name(),
            output.tick,
            failure
        );
        self.faults.actuator_fault();
    }
}

/// Handle to a spawned control loop.
pub struct LoopHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Result<LoopSummary>>,
}

impl LoopHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the loop to stop and wait for the in-flight cycle to finish.
    pub async fn stop(self) -> Result<LoopSummary> {
        let _ = self.stop_tx.send(true);
        self.task
            .await
            .map_err(|e| GovernorError::InvalidInput(format!("control loop task failed: {}", e)))?
    }
}
