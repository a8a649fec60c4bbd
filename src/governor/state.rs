// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mutable per-session control state

use serde::{Deserialize, Serialize};

use super::fan_curve::FanDuties;
use super::throttle::ThrottleTracker;
use crate::profile::{CurveKind, PerformanceMode};

/// Number of raw CPU samples kept for reporting.
pub const CPU_TEMP_HISTORY: usize = 3;

/// Discrete GPU power state, D1 draws the least power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum DState {
    #[default]
    D1,
    D2,
    D3,
    D4,
    D5,
}

impl TryFrom<u8> for DState {
    type Error = crate::error::GovernorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DState::D1),
            2 => Ok(DState::D2),
            3 => Ok(DState::D3),
            4 => Ok(DState::D4),
            5 => Ok(DState::D5),
            other => Err(crate::error::GovernorError::InvalidInput(format!(
                "GPU DState {} outside 1-5",
                other
            ))),
        }
    }
}

/// Optional feature switch with an explicit "not decided" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriState {
    Enabled,
    Disabled,
    #[default]
    Unspecified,
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => TriState::Enabled,
            Some(false) => TriState::Disabled,
            None => TriState::Unspecified,
        }
    }
}

/// Smoothed sensor channels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Temperatures {
    pub cpu: f64,
    pub gpu: f64,
    pub ambient: f64,
    pub ir: f64,
}

/// Everything the governor mutates between ticks.
#[derive(Debug, Clone)]
pub struct ControlState {
    pub smoothed: Temperatures,
    /// Most recent raw CPU readings, oldest first
    pub cpu_history: [f64; CPU_TEMP_HISTORY],
    pub(crate) cpu_history_len: usize,
    pub throttle: ThrottleTracker,
    pub gpu_usage: f64,
    /// Consecutive ticks with GPU usage above the gaming threshold
    pub gpu_hit_rate: u32,
    pub dstate: DState,
    pub mode: PerformanceMode,
    /// PL1 upper bound set by the mode or the caller, before gaming arbitration
    pub configured_upper_bound: i32,
    /// Dynamic PL1 value
    pub pl1: i32,
    /// PL1 to restore when an overheat or degraded clamp lifts
    pub pl1_hold: Option<i32>,
    /// Graphics power-state limit
    pub gps: i32,
    pub ppab: TriState,
    pub tgp: TriState,
    /// Valid IR samples accumulated since the last IR evaluation
    pub ir_cycle_counter: u32,
    pub active_curve: CurveKind,
    /// Duties emitted on the last tick
    pub last_fans: FanDuties,
    /// Last tick had an unusable sensor channel
    pub sensor_fault: bool,
    pub degraded: bool,
}

impl ControlState {
    pub fn new(
        mode: PerformanceMode,
        configured_upper_bound: i32,
        pl1: i32,
        gps: i32,
        curve: CurveKind,
        throttle: ThrottleTracker,
    ) -> Self {
        Self {
            smoothed: Temperatures::default(),
            cpu_history: [0.0; CPU_TEMP_HISTORY],
            cpu_history_len: 0,
            throttle,
            gpu_usage: 0.0,
            gpu_hit_rate: 0,
            dstate: DState::default(),
            mode,
            configured_upper_bound,
            pl1,
            pl1_hold: None,
            gps,
            ppab: TriState::Unspecified,
            tgp: TriState::Unspecified,
            ir_cycle_counter: 0,
            active_curve: curve,
            last_fans: FanDuties::default(),
            sensor_fault: false,
            degraded: false,
        }
    }

    /// Append a raw CPU reading, dropping the oldest when full.
    pub fn push_cpu_sample(&mut self, raw: f64) {
        if self.cpu_history_len < CPU_TEMP_HISTORY {
            self.cpu_history[self.cpu_history_len] = raw;
            self.cpu_history_len += 1;
        } else {
            self.cpu_history.rotate_left(1);
            self.cpu_history[CPU_TEMP_HISTORY - 1] = raw;
        }
    }

    /// Buffered raw CPU readings, oldest first.
    pub fn cpu_samples(&self) -> &[f64] {
        &self.cpu_history[..self.cpu_history_len]
    }
}
