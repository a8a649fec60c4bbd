// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! PL1 bound arbitration and IR overheat mitigation
//!
//! The upper bound only ever tightens through the gaming rule. PL1 itself
//! moves down on IR overheat events and back up on release events, always
//! inside `[lower, upper]`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::state::ControlState;
use crate::profile::{IrAdjustments, ModeTier, PlatformProfile, PlatformVariant};

/// IR sensor mitigation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrOverheatCase {
    IrOverheatThresholdDecreasePl1,
    IrGpsThresholdDecreaseGps,
    IrPl1ThresholdDecreasePl1,
    IrReleaseThresholdIncreasePl1,
    IrReleaseThresholdIncreaseGps,
}

/// Limit an [`IrOverheatCase`] acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerTarget {
    Pl1,
    Gps,
}

impl IrOverheatCase {
    pub fn target(&self) -> PowerTarget {
        match self {
            IrOverheatCase::IrOverheatThresholdDecreasePl1
            | IrOverheatCase::IrPl1ThresholdDecreasePl1
            | IrOverheatCase::IrReleaseThresholdIncreasePl1 => PowerTarget::Pl1,
            IrOverheatCase::IrGpsThresholdDecreaseGps
            | IrOverheatCase::IrReleaseThresholdIncreaseGps => PowerTarget::Gps,
        }
    }

    /// Signed step applied to the target limit.
    pub fn adjustment(&self, steps: &IrAdjustments) -> i32 {
        match self {
            IrOverheatCase::IrOverheatThresholdDecreasePl1 => -steps.overheat_pl1_reduce,
            IrOverheatCase::IrGpsThresholdDecreaseGps => -steps.gps_reduce,
            IrOverheatCase::IrPl1ThresholdDecreasePl1 => -steps.pl1_reduce,
            IrOverheatCase::IrReleaseThresholdIncreasePl1 => steps.pl1_release,
            IrOverheatCase::IrReleaseThresholdIncreaseGps => steps.gps_release,
        }
    }
}

impl fmt::Display for IrOverheatCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Active PL1 window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pl1Bounds {
    pub lower: i32,
    pub upper: i32,
}

impl Pl1Bounds {
    /// Clamp a PL1 value into the window. The lower bound wins if the window
    /// is ever inverted.
    pub fn clamp(&self, pl1: i32) -> i32 {
        pl1.min(self.upper).max(self.lower)
    }
}

/// Upper-bound arbitration: the gaming bound applies only when the GPU is busy
/// and it does not loosen the configured bound.
pub fn upper_bound(configured: i32, gaming: i32, gpu_usage: f64, gaming_usage: f64) -> i32 {
    if gpu_usage > gaming_usage && gaming <= configured {
        gaming
    } else {
        configured
    }
}

/// Classify one IR temperature. First matching threshold wins.
pub fn classify_ir(
    profile: &PlatformProfile,
    variant: PlatformVariant,
    ir_temp: f64,
    pl1: i32,
    bounds: Pl1Bounds,
    gps: i32,
) -> Option<IrOverheatCase> {
    let thresholds = &profile.ir_thresholds;
    let v = variant.index();
    if ir_temp >= thresholds.overheat[v] as f64 {
        Some(IrOverheatCase::IrOverheatThresholdDecreasePl1)
    } else if ir_temp >= thresholds.gps[v] as f64 {
        Some(IrOverheatCase::IrGpsThresholdDecreaseGps)
    } else if ir_temp >= thresholds.pl1[v] as f64 {
        Some(IrOverheatCase::IrPl1ThresholdDecreasePl1)
    } else if ir_temp <= thresholds.release[v] as f64 && pl1 < bounds.upper {
        Some(IrOverheatCase::IrReleaseThresholdIncreasePl1)
    } else if ir_temp <= thresholds.release[v] as f64 && gps < profile.gps.max {
        Some(IrOverheatCase::IrReleaseThresholdIncreaseGps)
    } else {
        None
    }
}

/// Bound selection and IR state machine for one platform variant.
#[derive(Debug, Clone)]
pub struct PowerLimitController {
    variant: PlatformVariant,
    gaming_usage: f64,
}

impl PowerLimitController {
    pub fn new(variant: PlatformVariant, gaming_usage: f64) -> Self {
        Self {
            variant,
            gaming_usage,
        }
    }

    pub fn variant(&self) -> PlatformVariant {
        self.variant
    }

    pub fn gaming_usage(&self) -> f64 {
        self.gaming_usage
    }

    /// Active PL1 window for the current state.
    pub fn bounds(&self, profile: &PlatformProfile, state: &ControlState, tier: ModeTier) -> Pl1Bounds {
        Pl1Bounds {
            lower: profile.pl1_lower_bound(tier),
            upper: upper_bound(
                state.configured_upper_bound,
                profile.pl1_upper_bounds.gaming,
                state.gpu_usage,
                self.gaming_usage,
            ),
        }
    }

    /// Run one IR evaluation against the smoothed IR temperature and apply
    /// the resulting adjustment to the state.
    pub fn evaluate_ir(
        &self,
        profile: &PlatformProfile,
        state: &mut ControlState,
        bounds: Pl1Bounds,
    ) -> Option<IrOverheatCase> {
        let event = classify_ir(
            profile,
            self.variant,
            state.smoothed.ir,
            state.pl1,
            bounds,
            state.gps,
        )?;
        let delta = event.adjustment(&profile.ir_adjustments);
        match event.target() {
            PowerTarget::Pl1 => state.pl1 = bounds.clamp(state.pl1 + delta),
            PowerTarget::Gps => {
                state.gps = (state.gps + delta).min(profile.gps.max).max(profile.gps.min)
            }
        }
        tracing::debug!(
            target: "thermgov.governor",
            "IR {:.1}C -> {} (PL1 {}, GPS {})",
            state.smoothed.ir,
            event,
            state.pl1,
            state.gps
        );
        Some(event)
    }
}
