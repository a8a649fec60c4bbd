// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Fan curve engine
//!
//! 1. **Interpolation**: linear between the two control points bracketing the
//!    temperature, flat outside the calibrated range.
//! 2. **Boundary**: the interpolated duty is clamped into the tier's
//!    `[lower, upper]` band (laptops only).
//! 3. **Smoothing**: the duty trajectory runs through the curve's own EWMA.

use serde::{Deserialize, Serialize};

use super::smoother::Ewma;
use crate::profile::{Boundary, Chassis, CurvePoints, FanCurve, FanRole, FanTable, ModeTier};

/// Duty per fan, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FanDuties {
    pub cpu: u8,
    pub gpu: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir: Option<u8>,
}

impl FanDuties {
    pub fn get(&self, role: FanRole) -> Option<u8> {
        match role {
            FanRole::Cpu => Some(self.cpu),
            FanRole::Gpu => Some(self.gpu),
            FanRole::Ir => self.ir,
        }
    }

    fn set(&mut self, role: FanRole, duty: Option<u8>) {
        match role {
            FanRole::Cpu => self.cpu = duty.unwrap_or(0),
            FanRole::Gpu => self.gpu = duty.unwrap_or(0),
            FanRole::Ir => self.ir = duty,
        }
    }
}

/// Piecewise-linear lookup with flat clamping at both ends.
pub fn interpolate(curve: &CurvePoints, temp: f64) -> f64 {
    let mut points = curve.points();
    let Some((first_temp, first_speed)) = points.next() else {
        return 0.0;
    };
    if temp <= first_temp as f64 {
        return first_speed as f64;
    }

    let (mut lower_temp, mut lower_speed) = (first_temp, first_speed);
    for (upper_temp, upper_speed) in points {
        if temp <= upper_temp as f64 {
            let span = (upper_temp - lower_temp) as f64;
            if span <= 0.0 {
                return upper_speed as f64;
            }
            let ratio = (temp - lower_temp as f64) / span;
            return lower_speed as f64 + ratio * (upper_speed - lower_speed) as f64;
        }
        lower_temp = upper_temp;
        lower_speed = upper_speed;
    }
    lower_speed as f64
}

/// Target duty for one fan before speed smoothing. `None` when the table has
/// no curve for the role.
pub fn target_speed(
    role: FanRole,
    temp: f64,
    table: &FanTable,
    boundary: Option<&Boundary>,
    tier: ModeTier,
) -> Option<f64> {
    let curve = table.curve(role)?;
    let mut speed = interpolate(curve, temp);
    if let Some(bounds) = boundary.and_then(|b| b.bounds(role)) {
        let (lower, upper) = bounds.range(tier);
        speed = speed.min(upper as f64).max(lower as f64);
    }
    Some(speed)
}

/// Highest duty the calibration allows for a fan at this tier.
pub fn max_safe_speed(
    role: FanRole,
    table: &FanTable,
    boundary: Option<&Boundary>,
    tier: ModeTier,
) -> Option<f64> {
    let curve = table.curve(role)?;
    let mut speed = curve.max_speed() as f64;
    if let Some(bounds) = boundary.and_then(|b| b.bounds(role)) {
        let (lower, upper) = bounds.range(tier);
        speed = speed.min(upper as f64).max(lower as f64);
    }
    Some(speed)
}

fn to_duty(speed: f64) -> u8 {
    speed.round().clamp(0.0, 100.0) as u8
}

/// Per-fan speed trajectories.
#[derive(Debug, Clone, Default)]
pub struct FanCurveEngine {
    trajectories: [Ewma; 3],
}

impl FanCurveEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(role: FanRole) -> usize {
        match role {
            FanRole::Cpu => 0,
            FanRole::Gpu => 1,
            FanRole::Ir => 2,
        }
    }

    fn boundary(curve: &FanCurve, chassis: Chassis) -> Option<&Boundary> {
        match chassis {
            Chassis::Laptop => curve.boundary.as_ref(),
            Chassis::Desktop => None,
        }
    }

    /// Advance one fan's trajectory toward its target and return the duty.
    pub fn update(
        &mut self,
        role: FanRole,
        temp: f64,
        curve: &FanCurve,
        chassis: Chassis,
        tier: ModeTier,
    ) -> Option<u8> {
        let target = target_speed(
            role,
            temp,
            &curve.table,
            Self::boundary(curve, chassis),
            tier,
        )?;
        let smoothed = self.trajectories[Self::slot(role)].update(target, &curve.smoothing);
        Some(to_duty(smoothed))
    }

    /// Compute every fan's duty for one tick.
    pub fn update_all(
        &mut self,
        temps: [f64; 3],
        curve: &FanCurve,
        chassis: Chassis,
        tier: ModeTier,
    ) -> FanDuties {
        let mut duties = FanDuties::default();
        for (role, temp) in FanRole::ALL.into_iter().zip(temps) {
            let duty = self.update(role, temp, curve, chassis, tier);
            duties.set(role, duty);
        }
        duties
    }

    /// Pin every fan to its maximum safe duty. Trajectories continue from
    /// there once normal control resumes.
    pub fn max_safe(&mut self, curve: &FanCurve, chassis: Chassis, tier: ModeTier) -> FanDuties {
        let mut duties = FanDuties::default();
        for role in FanRole::ALL {
            let speed = max_safe_speed(role, &curve.table, Self::boundary(curve, chassis), tier);
            if let Some(speed) = speed {
                self.trajectories[Self::slot(role)].reset(speed);
            }
            duties.set(role, speed.map(to_duty));
        }
        duties
    }

    /// Forget all trajectories.
    pub fn reset(&mut self) {
        self.trajectories = Default::default();
    }
}
