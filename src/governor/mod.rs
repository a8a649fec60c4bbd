// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Closed-loop thermal and power governor
//!
//! [`Governor`] owns the [`ControlState`] and one instance of each control
//! component. The caller drives it with [`Governor::tick`] on the short
//! cadence, following each tick with [`Governor::long_cycle`], which runs the
//! IR evaluation once per IR cycle; nothing else mutates the state.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod fan_curve;
pub mod power_limit;
pub mod smoother;
pub mod state;
pub mod throttle;

pub use fan_curve::{FanCurveEngine, FanDuties};
pub use power_limit::{IrOverheatCase, Pl1Bounds, PowerLimitController, PowerTarget};
pub use smoother::Ewma;
pub use state::{ControlState, DState, Temperatures, TriState};
pub use throttle::ThrottleTracker;

use crate::error::{GovernorError, Result};
use crate::profile::{CurveKind, FanCurve, ModeTier, PerformanceMode, PlatformProfile, PlatformVariant};

/// One raw reading set from the hardware layer.
///
/// A `None` channel is absent on this platform. A channel that failed to read
/// is reported as a non-finite or out-of-range value and counts as a sensor
/// fault for the tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub gpu: Option<f64>,
    #[serde(default)]
    pub ambient: Option<f64>,
    #[serde(default)]
    pub ir: Option<f64>,
    /// GPU usage percentage
    #[serde(default)]
    pub gpu_usage: Option<f64>,
    /// Tier reported by the platform; `None` keeps the tier chosen by the mode
    #[serde(default)]
    pub mode_tier: Option<ModeTier>,
    #[serde(default)]
    pub dstate: DState,
    /// System known to be at rest
    #[serde(default)]
    pub idle: bool,
    /// First sample after resume from sleep
    #[serde(default)]
    pub resumed: bool,
    /// Hardware reported a throttling event this tick
    #[serde(default)]
    pub throttling: bool,
}

/// PL1 directive for the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pl1Directive {
    pub lower: i32,
    pub upper: i32,
    pub current: i32,
}

/// Everything the governor emits for one tick or cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlOutput {
    pub tick: u64,
    pub fans: FanDuties,
    pub pl1: Pl1Directive,
    pub gps: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir_event: Option<IrOverheatCase>,
    pub throttling: bool,
    pub overheat: bool,
    pub sensor_fault: bool,
    pub degraded: bool,
}

/// Tunables that come from settings rather than the platform profile.
#[derive(Debug, Clone)]
pub struct GovernorOptions {
    pub variant: PlatformVariant,
    pub mode: PerformanceMode,
    /// Fixed curve, or `None` to follow the mode
    pub curve: Option<CurveKind>,
    pub short_window: usize,
    pub long_window: usize,
    pub throttle_trigger_count: usize,
    /// Overrides the profile's gaming usage threshold
    pub gaming_usage_threshold: Option<f64>,
    /// Valid temperature range in °C; readings outside it are sensor faults
    pub sensor_range: (f64, f64),
}

impl Default for GovernorOptions {
    fn default() -> Self {
        Self {
            variant: PlatformVariant::default(),
            mode: PerformanceMode::Default,
            curve: None,
            short_window: 3,
            long_window: 30,
            throttle_trigger_count: 1,
            gaming_usage_threshold: None,
            sensor_range: (-40.0, 150.0),
        }
    }
}

/// Smoothed channels in `[cpu, gpu, ambient, ir]` order.
#[derive(Debug, Clone, Default)]
struct Channels {
    cpu: Ewma,
    gpu: Ewma,
    ambient: Ewma,
    ir: Ewma,
}

/// The control loop's single owner of mutable state.
#[derive(Debug)]
pub struct Governor {
    profile: Arc<PlatformProfile>,
    options: GovernorOptions,
    state: ControlState,
    channels: Channels,
    power: PowerLimitController,
    fans: FanCurveEngine,
    tier: ModeTier,
    ticks: u64,
}

impl Governor {
    /// Build a governor for a validated profile.
    pub fn new(profile: Arc<PlatformProfile>, options: GovernorOptions) -> Result<Self> {
        profile.validate()?;
        let (min, max) = options.sensor_range;
        if !(min < max) {
            return Err(GovernorError::Config(format!(
                "sensor range {}..{} is empty",
                min, max
            )));
        }
        if options.short_window == 0 || options.long_window < options.short_window {
            return Err(GovernorError::Config(format!(
                "throttle windows {}/{} are inconsistent",
                options.short_window, options.long_window
            )));
        }

        let curve = match options.curve {
            Some(kind) => {
                if profile.fan_curves.get(kind).is_none() {
                    return Err(GovernorError::Config(format!(
                        "profile has no {} fan curve",
                        kind
                    )));
                }
                kind
            }
            None => profile.fan_curves.preferred_for(options.mode),
        };

        let configured = profile.pl1_upper_bound_for(options.mode);
        let pl1 = profile.pl1_initial.unwrap_or(configured);
        let throttle = ThrottleTracker::new(
            options.short_window,
            options.long_window,
            options.throttle_trigger_count,
        );
        let mut state = ControlState::new(
            options.mode,
            configured,
            pl1,
            profile.gps.max,
            curve,
            throttle,
        );
        if options.mode.is_performance_class() && profile.ppab_on_in_performance_mode == Some(true)
        {
            state.ppab = TriState::Enabled;
        }

        let gaming_usage = options
            .gaming_usage_threshold
            .unwrap_or(profile.gpu.usage_threshold);
        let power = PowerLimitController::new(options.variant, gaming_usage);
        let tier = options.mode.tier().unwrap_or_default();

        Ok(Self {
            profile,
            options,
            state,
            channels: Channels::default(),
            power,
            fans: FanCurveEngine::new(),
            tier,
            ticks: 0,
        })
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tier(&self) -> ModeTier {
        self.tier
    }

    /// Whether enough IR samples accumulated for an IR evaluation.
    pub fn ir_cycle_due(&self) -> bool {
        self.state.ir_cycle_counter >= self.profile.ir_cycle
    }

    fn active_curve(&self) -> &FanCurve {
        self.profile
            .fan_curves
            .get(self.state.active_curve)
            .unwrap_or(&self.profile.fan_curves.default)
    }

    fn valid_temp(&self, reading: Option<f64>) -> Option<f64> {
        let (min, max) = self.options.sensor_range;
        reading.filter(|t| t.is_finite() && *t >= min && *t <= max)
    }

    /// Run one short cycle. `None` means the sensor read failed outright;
    /// the last smoothed values are reused and mitigation is skipped.
    pub fn tick(&mut self, sample: Option<&SensorSample>) -> ControlOutput {
        self.ticks += 1;
        let fault = match sample {
            Some(sample) => self.ingest(sample),
            None => true,
        };
        self.state.sensor_fault = fault;
        if fault {
            tracing::warn!(
                target: "thermgov.governor",
                "tick {}: sensor fault, reusing last smoothed values",
                self.ticks
            );
        }

        let bounds = self.bounds();
        self.state.pl1 = bounds.clamp(self.state.pl1);

        let overheat = !fault && self.overheated();
        if overheat || self.state.degraded {
            if overheat && self.state.pl1 != bounds.lower {
                tracing::warn!(
                    target: "thermgov.governor",
                    "overheat (cpu {:.1}C, gpu {:.1}C, ambient {:.1}C): PL1 {} -> {}",
                    self.state.smoothed.cpu,
                    self.state.smoothed.gpu,
                    self.state.smoothed.ambient,
                    self.state.pl1,
                    bounds.lower
                );
            }
            self.hold_pl1_at(bounds.lower);
        } else if !fault {
            if let Some(held) = self.state.pl1_hold.take() {
                let restored = bounds.clamp(held);
                tracing::info!(
                    target: "thermgov.governor",
                    "PL1 clamp lifted: {} -> {}",
                    self.state.pl1,
                    restored
                );
                self.state.pl1 = restored;
            }
        }

        let chassis = self.profile.chassis;
        let tier = self.tier;
        let curve = self
            .profile
            .fan_curves
            .get(self.state.active_curve)
            .unwrap_or(&self.profile.fan_curves.default);
        let fans = if self.state.degraded {
            self.fans.max_safe(curve, chassis, tier)
        } else {
            let t = &self.state.smoothed;
            self.fans.update_all([t.cpu, t.gpu, t.ir], curve, chassis, tier)
        };

        let mut output = self.output(None);
        output.fans = fans;
        output.overheat = overheat;
        self.state.last_fans = fans;
        output
    }

    fn ingest(&mut self, sample: &SensorSample) -> bool {
        let smoothing = self.profile.smoothing;
        let mut fault = false;

        let readings = [
            (self.valid_temp(sample.cpu), sample.cpu.is_some()),
            (self.valid_temp(sample.gpu), sample.gpu.is_some()),
            (self.valid_temp(sample.ambient), sample.ambient.is_some()),
            (self.valid_temp(sample.ir), sample.ir.is_some()),
        ];
        let channels = [
            &mut self.channels.cpu,
            &mut self.channels.gpu,
            &mut self.channels.ambient,
            &mut self.channels.ir,
        ];
        let mut smoothed = [None; 4];
        for (index, (channel, (reading, present))) in channels.into_iter().zip(readings).enumerate()
        {
            match reading {
                Some(raw) if sample.resumed => {
                    channel.reset(raw);
                }
                Some(raw) if sample.idle => {
                    channel.update_idle(raw);
                }
                Some(raw) => {
                    channel.update(raw, &smoothing);
                }
                None if present => {
                    tracing::debug!(
                        target: "thermgov.governor",
                        "channel {} reading unusable",
                        index
                    );
                    fault = true;
                }
                None => {}
            }
            smoothed[index] = channel.value();
        }

        let s = &mut self.state.smoothed;
        s.cpu = smoothed[0].unwrap_or(s.cpu);
        s.gpu = smoothed[1].unwrap_or(s.gpu);
        s.ambient = smoothed[2].unwrap_or(s.ambient);
        s.ir = smoothed[3].unwrap_or(s.ir);

        if let Some(raw) = self.valid_temp(sample.cpu) {
            self.state.push_cpu_sample(raw);
        }
        if self.valid_temp(sample.ir).is_some() {
            self.state.ir_cycle_counter = self.state.ir_cycle_counter.saturating_add(1);
        }

        match sample.gpu_usage {
            Some(usage) if usage.is_finite() && (0.0..=100.0).contains(&usage) => {
                self.state.gpu_usage = usage;
                if usage > self.power.gaming_usage() {
                    self.state.gpu_hit_rate =
                        (self.state.gpu_hit_rate + 1).min(self.profile.gpu.usage_count);
                } else {
                    self.state.gpu_hit_rate = 0;
                }
            }
            Some(_) => fault = true,
            None => {}
        }

        if let Some(tier) = sample.mode_tier {
            self.tier = tier;
        }
        self.state.dstate = sample.dstate;

        if !fault {
            let limit = self.profile.throttle_temperature_for(self.state.mode) as f64;
            let throttled = sample.throttling || self.state.smoothed.cpu >= limit;
            self.state.throttle.record(throttled);
        }
        fault
    }

    /// Pin PL1 to `lower`, remembering the value in effect before the first
    /// clamp so it can be restored once the clamp lifts.
    fn hold_pl1_at(&mut self, lower: i32) {
        if self.state.pl1_hold.is_none() {
            self.state.pl1_hold = Some(self.state.pl1);
        }
        self.state.pl1 = lower;
    }

    fn overheated(&self) -> bool {
        let limits = &self.profile.overheat;
        let t = &self.state.smoothed;
        t.cpu >= limits.cpu as f64 || t.gpu >= limits.gpu as f64 || t.ambient >= limits.ambient as f64
    }

    /// Active PL1 window.
    pub fn bounds(&self) -> Pl1Bounds {
        self.power.bounds(&self.profile, &self.state, self.tier)
    }

    /// Run one IR evaluation once the profile's IR cycle has accumulated.
    /// Skipped while degraded or after a faulted tick; a skipped evaluation
    /// runs on the next clean tick.
    pub fn long_cycle(&mut self) -> Option<IrOverheatCase> {
        if !self.ir_cycle_due() {
            return None;
        }
        if self.state.degraded {
            self.state.ir_cycle_counter = 0;
            tracing::debug!(target: "thermgov.governor", "IR evaluation skipped while degraded");
            return None;
        }
        if self.state.sensor_fault {
            tracing::debug!(target: "thermgov.governor", "IR evaluation deferred after sensor fault");
            return None;
        }

        let bounds = self.bounds();
        // while clamped, the evaluation steps the value that will be restored
        let clamped = self.state.pl1_hold.map(|held| std::mem::replace(&mut self.state.pl1, held));
        let event = self.power.evaluate_ir(&self.profile, &mut self.state, bounds);
        if let Some(lower) = clamped {
            self.state.pl1_hold = Some(self.state.pl1);
            self.state.pl1 = lower;
        }
        self.state.ir_cycle_counter = 0;

        if event == Some(IrOverheatCase::IrOverheatThresholdDecreasePl1)
            && self.profile.ppab_off_when_ir_overheat == Some(true)
        {
            self.state.ppab = TriState::Disabled;
        }
        event
    }

    /// Build an output from the current state without advancing it.
    pub fn output(&self, ir_event: Option<IrOverheatCase>) -> ControlOutput {
        let bounds = self.bounds();
        ControlOutput {
            tick: self.ticks,
            fans: self.state.last_fans,
            pl1: Pl1Directive {
                lower: bounds.lower,
                upper: bounds.upper,
                current: self.state.pl1,
            },
            gps: self.state.gps,
            ir_event,
            throttling: self.state.throttle.is_throttling(),
            overheat: false,
            sensor_fault: self.state.sensor_fault,
            degraded: self.state.degraded,
        }
    }

    /// Switch performance mode: reselect the configured PL1 bound and fan
    /// curve, and restart throttle tracking.
    pub fn apply_performance_mode(&mut self, mode: PerformanceMode) {
        self.state.mode = mode;
        self.state.configured_upper_bound = self.profile.pl1_upper_bound_for(mode);
        self.state.throttle.reset();
        if self.options.curve.is_none() {
            self.state.active_curve = self.profile.fan_curves.preferred_for(mode);
        }
        if mode.is_performance_class() && self.profile.ppab_on_in_performance_mode == Some(true) {
            self.state.ppab = TriState::Enabled;
        }
        if let Some(tier) = mode.tier() {
            self.tier = tier;
        }
        tracing::info!(
            target: "thermgov.governor",
            "mode {} (PL1 bound {}, curve {})",
            mode,
            self.state.configured_upper_bound,
            self.state.active_curve
        );
    }

    /// Set the configured PL1 upper bound explicitly.
    pub fn set_configured_upper_bound(&mut self, bound: i32) -> Result<()> {
        let floor = self.profile.max_pl1_lower_bound();
        if bound < floor {
            return Err(GovernorError::Config(format!(
                "PL1 upper bound {} is below the highest lower bound {}",
                bound, floor
            )));
        }
        self.state.configured_upper_bound = bound;
        Ok(())
    }

    /// Pin the fan curve, overriding mode-based selection.
    pub fn select_curve(&mut self, kind: CurveKind) -> Result<()> {
        if self.profile.fan_curves.get(kind).is_none() {
            return Err(GovernorError::Config(format!(
                "profile has no {} fan curve",
                kind
            )));
        }
        self.options.curve = Some(kind);
        self.state.active_curve = kind;
        Ok(())
    }

    pub fn set_tgp(&mut self, tgp: TriState) {
        self.state.tgp = tgp;
    }

    pub fn set_ppab(&mut self, ppab: TriState) {
        self.state.ppab = ppab;
    }

    /// Enter or leave degraded mode: maximum safe fan duty and the minimum
    /// PL1 bound until cleared.
    pub fn set_degraded(&mut self, degraded: bool) {
        if self.state.degraded != degraded {
            self.state.degraded = degraded;
            if degraded {
                let lower = self.bounds().lower;
                self.hold_pl1_at(lower);
            }
        }
    }

    /// Reset smoothing and throttle history, e.g. at session start.
    pub fn reset(&mut self) {
        self.channels = Channels::default();
        self.fans.reset();
        self.state.throttle.reset();
        self.state.ir_cycle_counter = 0;
    }

    /// Active fan curve configuration.
    pub fn fan_curve(&self) -> &FanCurve {
        self.active_curve()
    }
}
