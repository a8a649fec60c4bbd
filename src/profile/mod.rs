// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Platform calibration profiles
//!
//! A [`PlatformProfile`] carries everything the governor needs to know about
//! one laptop model: smoothing coefficients, power-limit bounds, IR sensor
//! thresholds and fan curves. Profiles are loaded from JSON once, validated,
//! and shared read-only behind an `Arc` for the rest of the session.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod fan_table;
pub mod mode;
mod validation;

pub use fan_table::{BoundList, Boundary, CurvePoints, FanRole, FanTable};
pub use mode::{
    ModeTier, PerformanceMode, PlatformVariant, MODE_ALIASES, MODE_TIER_COUNT,
    PLATFORM_VARIANT_COUNT,
};

use crate::error::{GovernorError, Result};

/// Reference calibration shipped with the binary.
const REFERENCE_PROFILE: &str = include_str!("../../profiles/reference.json");

/// Asymmetric EWMA weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Smoothing {
    /// Weight of the new sample when it is at or above the current value
    pub increase: f64,
    /// Weight of the new sample when it is below the current value
    pub decrease: f64,
}

impl Smoothing {
    pub const fn new(increase: f64, decrease: f64) -> Self {
        Self { increase, decrease }
    }
}

/// Chassis type. Desktops skip the boundary clamp stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chassis {
    #[default]
    Laptop,
    Desktop,
}

/// Named fan-curve configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    Default,
    Performance,
    Custom,
}

impl std::str::FromStr for CurveKind {
    type Err = GovernorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(CurveKind::Default),
            "performance" => Ok(CurveKind::Performance),
            "custom" => Ok(CurveKind::Custom),
            other => Err(GovernorError::InvalidInput(format!(
                "unknown fan curve '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CurveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveKind::Default => write!(f, "default"),
            CurveKind::Performance => write!(f, "performance"),
            CurveKind::Custom => write!(f, "custom"),
        }
    }
}

/// Fan table plus its optional boundary and speed smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanCurve {
    pub table: FanTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Boundary>,
    /// Smoothing applied to the duty trajectory
    pub smoothing: Smoothing,
}

/// User-defined curve with its enable switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFanCurve {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub curve: FanCurve,
}

/// The fan-curve configurations of a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanCurveSet {
    pub default: FanCurve,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<FanCurve>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFanCurve>,
}

impl FanCurveSet {
    pub fn get(&self, kind: CurveKind) -> Option<&FanCurve> {
        match kind {
            CurveKind::Default => Some(&self.default),
            CurveKind::Performance => self.performance.as_ref(),
            CurveKind::Custom => self.custom.as_ref().map(|custom| &custom.curve),
        }
    }

    /// Curve kind the governor should run for a mode.
    pub fn preferred_for(&self, mode: PerformanceMode) -> CurveKind {
        if self.custom.as_ref().is_some_and(|custom| custom.enabled) {
            CurveKind::Custom
        } else if mode.is_performance_class() && self.performance.is_some() {
            CurveKind::Performance
        } else {
            CurveKind::Default
        }
    }
}

/// PL1 upper bounds in watts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pl1UpperBounds {
    pub default: i32,
    pub performance: i32,
    pub gaming: i32,
}

/// IR sensor thresholds per platform variant, in °C.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrThresholds {
    pub overheat: [i32; PLATFORM_VARIANT_COUNT],
    pub gps: [i32; PLATFORM_VARIANT_COUNT],
    pub pl1: [i32; PLATFORM_VARIANT_COUNT],
    pub release: [i32; PLATFORM_VARIANT_COUNT],
}

/// Magnitudes of the IR mitigation adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrAdjustments {
    #[serde(default = "default_adjustment")]
    pub overheat_pl1_reduce: i32,
    #[serde(default = "default_adjustment")]
    pub pl1_reduce: i32,
    #[serde(default = "default_adjustment")]
    pub gps_reduce: i32,
    #[serde(default = "default_adjustment")]
    pub pl1_release: i32,
    #[serde(default = "default_adjustment")]
    pub gps_release: i32,
}

impl Default for IrAdjustments {
    fn default() -> Self {
        Self {
            overheat_pl1_reduce: default_adjustment(),
            pl1_reduce: default_adjustment(),
            gps_reduce: default_adjustment(),
            pl1_release: default_adjustment(),
            gps_release: default_adjustment(),
        }
    }
}

/// Absolute die and chassis overheat limits in °C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverheatThresholds {
    pub cpu: i32,
    pub gpu: i32,
    pub ambient: i32,
}

impl Default for OverheatThresholds {
    fn default() -> Self {
        Self {
            cpu: 90,
            gpu: 90,
            ambient: 70,
        }
    }
}

/// CPU temperatures that count as throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleTemperatures {
    pub balanced: i32,
    pub performance: i32,
}

impl Default for ThrottleTemperatures {
    fn default() -> Self {
        Self {
            balanced: 90,
            performance: 95,
        }
    }
}

/// GPU usage constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpuSettings {
    /// Usage percentage above which the gaming PL1 bound applies
    #[serde(default = "default_gaming_usage")]
    pub usage_threshold: f64,
    /// Cap on the consecutive-hit counter
    #[serde(default = "default_usage_count")]
    pub usage_count: u32,
}

impl Default for GpuSettings {
    fn default() -> Self {
        Self {
            usage_threshold: default_gaming_usage(),
            usage_count: default_usage_count(),
        }
    }
}

/// Range of the graphics power-state limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsRange {
    pub min: i32,
    pub max: i32,
}

impl Default for GpsRange {
    fn default() -> Self {
        Self { min: 50, max: 100 }
    }
}

/// Immutable per-model calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformProfile {
    /// Platform identifier
    pub name: String,
    /// Calibration version tag
    pub version: String,
    #[serde(default)]
    pub chassis: Chassis,
    /// Raw temperature smoothing
    pub smoothing: Smoothing,
    /// PL1 lower bound per tier L0 - L7
    pub pl1_lower_bounds: [i32; MODE_TIER_COUNT],
    pub pl1_upper_bounds: Pl1UpperBounds,
    /// PL1 value at session start, defaults to the configured upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pl1_initial: Option<i32>,
    #[serde(default)]
    pub gps: GpsRange,
    pub ir_thresholds: IrThresholds,
    #[serde(default)]
    pub ir_adjustments: IrAdjustments,
    /// Short ticks per IR evaluation
    #[serde(default = "default_ir_cycle")]
    pub ir_cycle: u32,
    #[serde(default)]
    pub overheat: OverheatThresholds,
    #[serde(default)]
    pub throttle_temperatures: ThrottleTemperatures,
    #[serde(default)]
    pub gpu: GpuSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppab_off_when_ir_overheat: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppab_on_in_performance_mode: Option<bool>,
    pub fan_curves: FanCurveSet,
}

impl PlatformProfile {
    /// The built-in reference calibration.
    pub fn reference() -> Result<Self> {
        Self::from_json(REFERENCE_PROFILE)
    }

    /// Parse and validate a profile from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let profile: PlatformProfile = serde_json::from_str(content)
            .map_err(|e| GovernorError::Config(format!("invalid platform profile: {}", e)))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a profile file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GovernorError::Config(format!(
                "cannot read platform profile {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Load from `path` when given, otherwise the reference profile.
    pub fn load_or_reference(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::reference(),
        }
    }

    /// PL1 lower bound for a tier.
    pub fn pl1_lower_bound(&self, tier: ModeTier) -> i32 {
        self.pl1_lower_bounds[tier.index()]
    }

    /// Highest lower bound over every tier.
    pub fn max_pl1_lower_bound(&self) -> i32 {
        self.pl1_lower_bounds.iter().copied().max().unwrap_or(0)
    }

    /// Configured PL1 upper bound for a mode.
    pub fn pl1_upper_bound_for(&self, mode: PerformanceMode) -> i32 {
        if mode.is_performance_class() {
            self.pl1_upper_bounds.performance
        } else {
            self.pl1_upper_bounds.default
        }
    }

    /// Throttle temperature for a mode.
    pub fn throttle_temperature_for(&self, mode: PerformanceMode) -> i32 {
        if mode.is_performance_class() {
            self.throttle_temperatures.performance
        } else {
            self.throttle_temperatures.balanced
        }
    }
}

fn default_adjustment() -> i32 {
    5
}

fn default_ir_cycle() -> u32 {
    30
}

fn default_gaming_usage() -> f64 {
    30.0
}

fn default_usage_count() -> u32 {
    3
}
