// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::error::{GovernorError, Result};

use super::{CurveKind, PlatformProfile, Smoothing};

fn validate_smoothing(what: &str, smoothing: &Smoothing) -> Result<()> {
    for (name, value) in [
        ("increase", smoothing.increase),
        ("decrease", smoothing.decrease),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            return Err(GovernorError::Config(format!(
                "{} smoothing {} coefficient {} outside (0, 1]",
                what, name, value
            )));
        }
    }
    Ok(())
}

impl PlatformProfile {
    /// Check internal consistency. A profile that fails here must never
    /// reach the control loop.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(GovernorError::Config("profile version is empty".into()));
        }

        validate_smoothing("temperature", &self.smoothing)?;

        if let Some(bound) = self.pl1_lower_bounds.iter().find(|b| **b <= 0) {
            return Err(GovernorError::Config(format!(
                "PL1 lower bound {} must be positive",
                bound
            )));
        }

        let max_lower = self.max_pl1_lower_bound();
        for (name, bound) in [
            ("default", self.pl1_upper_bounds.default),
            ("performance", self.pl1_upper_bounds.performance),
            ("gaming", self.pl1_upper_bounds.gaming),
        ] {
            if bound < max_lower {
                return Err(GovernorError::Config(format!(
                    "{} PL1 upper bound {} is below the highest lower bound {}",
                    name, bound, max_lower
                )));
            }
        }

        if let Some(initial) = self.pl1_initial {
            if initial <= 0 {
                return Err(GovernorError::Config(format!(
                    "initial PL1 {} must be positive",
                    initial
                )));
            }
        }

        if self.gps.min > self.gps.max {
            return Err(GovernorError::Config(format!(
                "GPS range {}..{} is inverted",
                self.gps.min, self.gps.max
            )));
        }

        let adjustments = &self.ir_adjustments;
        if [
            adjustments.overheat_pl1_reduce,
            adjustments.pl1_reduce,
            adjustments.gps_reduce,
            adjustments.pl1_release,
            adjustments.gps_release,
        ]
        .iter()
        .any(|step| *step < 0)
        {
            return Err(GovernorError::Config(
                "IR adjustment magnitudes must not be negative".into(),
            ));
        }

        if self.ir_cycle == 0 {
            return Err(GovernorError::Config("IR cycle must be at least one tick".into()));
        }

        if !(self.gpu.usage_threshold >= 0.0 && self.gpu.usage_threshold <= 100.0) {
            return Err(GovernorError::Config(format!(
                "GPU gaming usage threshold {} outside 0-100",
                self.gpu.usage_threshold
            )));
        }

        for kind in [CurveKind::Default, CurveKind::Performance, CurveKind::Custom] {
            if let Some(curve) = self.fan_curves.get(kind) {
                curve.table.validate().map_err(|e| {
                    GovernorError::Config(format!("{} fan curve: {}", kind, strip_prefix(&e)))
                })?;
                if let Some(boundary) = &curve.boundary {
                    boundary.validate().map_err(|e| {
                        GovernorError::Config(format!("{} fan curve: {}", kind, strip_prefix(&e)))
                    })?;
                }
                validate_smoothing(&format!("{} fan curve", kind), &curve.smoothing)?;
            }
        }

        Ok(())
    }
}

fn strip_prefix(err: &GovernorError) -> String {
    match err {
        GovernorError::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}
