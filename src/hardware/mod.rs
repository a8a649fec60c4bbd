// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Hardware collaborators
//!
//! The control loop only talks to hardware through [`SensorSource`] and
//! [`Actuator`]. Implementations here cover Linux sysfs, recorded traces and
//! a logging sink; platform drivers plug in behind the same traits.

use async_trait::async_trait;

pub mod log_actuator;
pub mod scripted;
pub mod thermal;

pub use log_actuator::LogActuator;
pub use scripted::{load_trace, ScriptedSensors};
pub use thermal::{SensorPaths, SysfsSensors};

use crate::error::Result;
use crate::governor::{ControlOutput, SensorSample};
use crate::runtime::Heartbeat;

/// Source of raw readings, polled once per short tick.
#[async_trait]
pub trait SensorSource: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Read every channel once
    async fn read(&mut self) -> Result<SensorSample>;
}

/// Sink for fan duties, power limits and status reports.
#[async_trait]
pub trait Actuator: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Apply one control output
    async fn apply(&mut self, output: &ControlOutput) -> Result<()>;

    /// Publish a heartbeat
    async fn report(&mut self, heartbeat: &Heartbeat) -> Result<()>;
}
