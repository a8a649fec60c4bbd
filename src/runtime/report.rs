// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Heartbeat status reports

use serde::{Deserialize, Serialize};

use crate::governor::{DState, FanDuties, Governor, Pl1Directive, Temperatures, TriState};
use crate::profile::{CurveKind, ModeTier, PerformanceMode};

/// Non-fatal fault tallies kept by the control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultCounters {
    /// Ticks where a sensor channel was unusable or the read failed
    pub sensor_faults: u64,
    /// Failed fan or power-limit writes
    pub actuator_faults: u64,
    /// Short ticks dropped because a collaborator call timed out
    pub missed_ticks: u64,
    /// Consecutive long cycles that saw at least one fault
    pub faulted_cycles: u32,
}

impl FaultCounters {
    pub fn total(&self) -> u64 {
        self.sensor_faults + self.actuator_faults + self.missed_ticks
    }
}

/// Periodic snapshot of the governor for operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    /// RFC 3339 wall-clock time
    pub timestamp: String,
    pub profile: String,
    pub profile_version: String,
    pub ticks: u64,
    pub mode: PerformanceMode,
    pub tier: ModeTier,
    pub temperatures: Temperatures,
    /// Latest raw CPU readings, oldest first
    pub cpu_history: Vec<f64>,
    pub gpu_usage: f64,
    pub gpu_hit_rate: u32,
    pub dstate: DState,
    pub pl1: Pl1Directive,
    pub gps: i32,
    pub ppab: TriState,
    pub tgp: TriState,
    pub active_curve: CurveKind,
    pub fans: FanDuties,
    pub throttling: bool,
    /// Throttled ticks in the long window
    pub throttle_long_count: usize,
    pub faults: FaultCounters,
    pub degraded: bool,
}

impl Heartbeat {
    /// Capture the governor's current state.
    pub fn capture(governor: &Governor, faults: FaultCounters) -> Self {
        let state = governor.state();
        let profile = governor.profile();
        let output = governor.output(None);
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            profile: profile.name.clone(),
            profile_version: profile.version.clone(),
            ticks: governor.ticks(),
            mode: state.mode,
            tier: governor.tier(),
            temperatures: state.smoothed,
            cpu_history: state.cpu_samples().to_vec(),
            gpu_usage: state.gpu_usage,
            gpu_hit_rate: state.gpu_hit_rate,
            dstate: state.dstate,
            pl1: output.pl1,
            gps: state.gps,
            ppab: state.ppab,
            tgp: state.tgp,
            active_curve: state.active_curve,
            fans: state.last_fans,
            throttling: state.throttle.is_throttling(),
            throttle_long_count: state.throttle.long_count(),
            faults,
            degraded: state.degraded,
        }
    }

    /// One-line human summary.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "cpu {:.1}C gpu {:.1}C ir {:.1}C | fans {}/{}% | PL1 {} [{}..{}] GPS {} | mode {} curve {}",
            self.temperatures.cpu,
            self.temperatures.gpu,
            self.temperatures.ir,
            self.fans.cpu,
            self.fans.gpu,
            self.pl1.current,
            self.pl1.lower,
            self.pl1.upper,
            self.gps,
            self.mode,
            self.active_curve
        );
        if self.throttling {
            line.push_str(" | throttling");
        }
        if self.faults.total() > 0 {
            line.push_str(&format!(" | faults {}", self.faults.total()));
        }
        if self.degraded {
            line.push_str(" | DEGRADED");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::{GovernorOptions, SensorSample};
    use crate::profile::PlatformProfile;
    use std::sync::Arc;

    fn governor() -> Governor {
        let profile = Arc::new(PlatformProfile::reference().unwrap());
        Governor::new(profile, GovernorOptions::default()).unwrap()
    }

    #[test]
    fn test_capture_reflects_state() {
        let mut gov = governor();
        gov.tick(Some(&SensorSample {
            cpu: Some(61.0),
            gpu: Some(55.0),
            ..Default::default()
        }));
        let beat = Heartbeat::capture(&gov, FaultCounters::default());
        assert_eq!(beat.profile, "ralph-adl-n20e");
        assert_eq!(beat.ticks, 1);
        assert_eq!(beat.cpu_history, vec![61.0]);
        assert_eq!(beat.temperatures.cpu, 61.0);
        assert!(!beat.degraded);
        assert!(chrono::DateTime::parse_from_rfc3339(&beat.timestamp).is_ok());
    }

    #[test]
    fn test_summary_line_flags() {
        let mut gov = governor();
        gov.set_degraded(true);
        let faults = FaultCounters {
            sensor_faults: 2,
            actuator_faults: 1,
            ..Default::default()
        };
        let line = Heartbeat::capture(&gov, faults).summary_line();
        assert!(line.contains("faults 3"));
        assert!(line.contains("DEGRADED"));
    }

    #[test]
    fn test_heartbeat_serializes() {
        let gov = governor();
        let json = serde_json::to_value(Heartbeat::capture(&gov, FaultCounters::default())).unwrap();
        assert_eq!(json["active_curve"], "default");
        assert_eq!(json["faults"]["missed_ticks"], 0);
    }
}
