// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Fan tables and boundary lists
//!
//! A fan table is a piecewise-linear temperature → duty mapping per fan.
//! Boundaries clamp the interpolated duty per performance tier.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::mode::{ModeTier, MODE_TIER_COUNT};
use crate::error::{GovernorError, Result};

/// Fan driven by the governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanRole {
    Cpu,
    Gpu,
    /// Auxiliary fan keyed on the chassis IR sensor
    Ir,
}

impl FanRole {
    pub const ALL: [FanRole; 3] = [FanRole::Cpu, FanRole::Gpu, FanRole::Ir];
}

impl fmt::Display for FanRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanRole::Cpu => write!(f, "cpu"),
            FanRole::Gpu => write!(f, "gpu"),
            FanRole::Ir => write!(f, "ir"),
        }
    }
}

/// Ordered control points for one fan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoints {
    /// Temperatures in °C, non-decreasing
    pub temperatures: Vec<i32>,
    /// Duty percentages, one per temperature
    pub speeds: Vec<i32>,
}

impl CurvePoints {
    pub fn new(temperatures: Vec<i32>, speeds: Vec<i32>) -> Self {
        Self {
            temperatures,
            speeds,
        }
    }

    /// Iterate `(temperature, speed)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.temperatures
            .iter()
            .copied()
            .zip(self.speeds.iter().copied())
    }

    /// Highest calibrated duty on this curve.
    pub fn max_speed(&self) -> i32 {
        self.speeds.iter().copied().max().unwrap_or(0)
    }

    pub(crate) fn validate(&self, role: FanRole) -> Result<()> {
        if self.temperatures.is_empty() {
            return Err(GovernorError::Config(format!(
                "{} fan table has no control points",
                role
            )));
        }
        if self.temperatures.len() != self.speeds.len() {
            return Err(GovernorError::Config(format!(
                "{} fan table has {} temperatures but {} speeds",
                role,
                self.temperatures.len(),
                self.speeds.len()
            )));
        }
        if let Some(pair) = self.temperatures.windows(2).find(|w| w[1] < w[0]) {
            return Err(GovernorError::Config(format!(
                "{} fan table temperatures decrease ({} then {})",
                role, pair[0], pair[1]
            )));
        }
        if let Some(speed) = self.speeds.iter().find(|s| !(0..=100).contains(*s)) {
            return Err(GovernorError::Config(format!(
                "{} fan table speed {} outside 0-100",
                role, speed
            )));
        }
        Ok(())
    }
}

/// Control points for every fan of a chassis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanTable {
    pub cpu: CurvePoints,
    pub gpu: CurvePoints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir: Option<CurvePoints>,
}

impl FanTable {
    /// Curve for a fan role, `None` when the chassis lacks that fan.
    pub fn curve(&self, role: FanRole) -> Option<&CurvePoints> {
        match role {
            FanRole::Cpu => Some(&self.cpu),
            FanRole::Gpu => Some(&self.gpu),
            FanRole::Ir => self.ir.as_ref(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for role in FanRole::ALL {
            if let Some(curve) = self.curve(role) {
                curve.validate(role)?;
            }
        }
        Ok(())
    }
}

/// Lower and upper duty limits indexed by tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundList {
    pub lower: Vec<i32>,
    pub upper: Vec<i32>,
}

impl BoundList {
    /// `(lower, upper)` duty limits for a tier. A single-entry list covers
    /// every tier.
    pub fn range(&self, tier: ModeTier) -> (i32, i32) {
        let pick = |list: &[i32]| {
            list.get(tier.index())
                .or(list.last())
                .copied()
                .unwrap_or(0)
        };
        (pick(&self.lower), pick(&self.upper))
    }

    fn validate(&self, role: FanRole) -> Result<()> {
        for (name, list) in [("lower", &self.lower), ("upper", &self.upper)] {
            if list.len() != 1 && list.len() < MODE_TIER_COUNT {
                return Err(GovernorError::Config(format!(
                    "{} {} bound list has {} entries, expected 1 or at least {}",
                    role,
                    name,
                    list.len(),
                    MODE_TIER_COUNT
                )));
            }
        }
        for index in 0..MODE_TIER_COUNT {
            let tier = ModeTier::try_from(index as u8)?;
            let (lower, upper) = self.range(tier);
            if lower > upper {
                return Err(GovernorError::Config(format!(
                    "{} boundary for {} has lower {} above upper {}",
                    role, tier, lower, upper
                )));
            }
        }
        Ok(())
    }
}

/// Per-fan hysteresis band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub cpu: BoundList,
    pub gpu: BoundList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir: Option<BoundList>,
}

impl Boundary {
    pub fn bounds(&self, role: FanRole) -> Option<&BoundList> {
        match role {
            FanRole::Cpu => Some(&self.cpu),
            FanRole::Gpu => Some(&self.gpu),
            FanRole::Ir => self.ir.as_ref(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for role in FanRole::ALL {
            if let Some(bounds) = self.bounds(role) {
                bounds.validate(role)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(index: u8) -> ModeTier {
        ModeTier::try_from(index).unwrap()
    }

    #[test]
    fn test_curve_rejects_length_mismatch() {
        let curve = CurvePoints::new(vec![40, 50, 60], vec![10, 20]);
        let err = curve.validate(FanRole::Cpu).unwrap_err();
        assert!(err.to_string().contains("3 temperatures but 2 speeds"));
    }

    #[test]
    fn test_curve_rejects_decreasing_temperatures() {
        let curve = CurvePoints::new(vec![40, 60, 50], vec![10, 20, 30]);
        assert!(curve.validate(FanRole::Gpu).is_err());
    }

    #[test]
    fn test_curve_accepts_repeated_temperature() {
        let curve = CurvePoints::new(vec![40, 40, 50], vec![10, 20, 30]);
        assert!(curve.validate(FanRole::Cpu).is_ok());
    }

    #[test]
    fn test_curve_rejects_out_of_range_speed() {
        let curve = CurvePoints::new(vec![40, 50], vec![10, 120]);
        assert!(curve.validate(FanRole::Ir).is_err());
    }

    #[test]
    fn test_curve_rejects_empty() {
        let curve = CurvePoints::new(vec![], vec![]);
        assert!(curve.validate(FanRole::Cpu).is_err());
    }

    #[test]
    fn test_single_entry_bound_list_covers_all_tiers() {
        let bounds = BoundList {
            lower: vec![0],
            upper: vec![55],
        };
        assert!(bounds.validate(FanRole::Ir).is_ok());
        assert_eq!(bounds.range(tier(0)), (0, 55));
        assert_eq!(bounds.range(tier(7)), (0, 55));
    }

    #[test]
    fn test_bound_list_indexed_by_tier() {
        let bounds = BoundList {
            lower: vec![15, 15, 15, 15, 21, 21, 27, 27, 27],
            upper: vec![55; 9],
        };
        assert!(bounds.validate(FanRole::Cpu).is_ok());
        assert_eq!(bounds.range(tier(4)), (21, 55));
        assert_eq!(bounds.range(tier(6)), (27, 55));
    }

    #[test]
    fn test_short_bound_list_rejected() {
        let bounds = BoundList {
            lower: vec![15, 15, 15],
            upper: vec![55, 55, 55],
        };
        assert!(bounds.validate(FanRole::Gpu).is_err());
    }

    #[test]
    fn test_inverted_bound_rejected() {
        let bounds = BoundList {
            lower: vec![60],
            upper: vec![55],
        };
        assert!(bounds.validate(FanRole::Cpu).is_err());
    }

    #[test]
    fn test_missing_ir_curve() {
        let table = FanTable {
            cpu: CurvePoints::new(vec![40], vec![20]),
            gpu: CurvePoints::new(vec![40], vec![20]),
            ir: None,
        };
        assert!(table.curve(FanRole::Ir).is_none());
        assert!(table.validate().is_ok());
    }
}
