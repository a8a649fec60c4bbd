// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for thermgov
//!
//! Handles loading and saving settings from ~/.thermgov/settings.toml. Every
//! section is optional; missing keys take the defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::hardware::SensorPaths;
use crate::profile::{CurveKind, PerformanceMode, PlatformVariant};

mod io;
mod validation;

/// Main settings structure, stored in ~/.thermgov/settings.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Loop cadence
    #[serde(default)]
    pub timing: TimingConfig,

    /// Control policy knobs not carried by the platform profile
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Platform calibration selection
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Sensor file locations
    #[serde(default)]
    pub sensors: SensorPaths,
}

/// Timer intervals, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub short_interval_ms: u64,
    pub long_interval_ms: u64,
    pub heartbeat_interval_ms: u64,
    /// Upper bound on any single sensor or actuator call
    pub io_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            short_interval_ms: 1000,
            long_interval_ms: 30_000,
            heartbeat_interval_ms: 30_000,
            io_timeout_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// GPU usage (%) above which the gaming PL1 bound applies; the profile's
    /// value when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaming_gpu_usage: Option<f64>,

    /// Throttle windows, in short ticks
    pub short_window: usize,
    pub long_window: usize,

    /// Throttled ticks in the short window that raise the throttling flag
    pub throttle_trigger_count: usize,

    /// Consecutive faulted long cycles before degraded mode
    pub degrade_after_long_cycles: u32,

    /// Plausible sensor range in °C
    pub sensor_min_c: f64,
    pub sensor_max_c: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            gaming_gpu_usage: None,
            short_window: 3,
            long_window: 30,
            throttle_trigger_count: 1,
            degrade_after_long_cycles: 3,
            sensor_min_c: -40.0,
            sensor_max_c: 150.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Platform profile JSON; the built-in reference profile when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<PathBuf>,

    /// Platform variant selecting the IR threshold column
    pub variant: PlatformVariant,

    /// Performance mode at startup
    pub mode: PerformanceMode,

    /// Pin a fan curve instead of following the mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan_curve: Option<CurveKind>,

    /// Override the mode's PL1 upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pl1_upper_bound: Option<i32>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            profile: None,
            variant: PlatformVariant::default(),
            mode: PerformanceMode::Default,
            fan_curve: None,
            pl1_upper_bound: None,
        }
    }
}
