// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::time::Duration;

use crate::error::{GovernorError, Result};
use crate::governor::GovernorOptions;
use crate::profile::PlatformProfile;
use crate::runtime::LoopConfig;

use super::Settings;

impl Settings {
    /// Reject settings the loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.loop_config().validate()?;

        let policy = &self.policy;
        if policy.short_window == 0 || policy.long_window < policy.short_window {
            return Err(GovernorError::Config(format!(
                "policy windows {}/{} are inconsistent",
                policy.short_window, policy.long_window
            )));
        }
        if policy.throttle_trigger_count == 0 || policy.throttle_trigger_count > policy.short_window
        {
            return Err(GovernorError::Config(format!(
                "throttle_trigger_count {} outside 1..={}",
                policy.throttle_trigger_count, policy.short_window
            )));
        }
        if !(policy.sensor_min_c < policy.sensor_max_c) {
            return Err(GovernorError::Config(format!(
                "sensor range {}..{} is empty",
                policy.sensor_min_c, policy.sensor_max_c
            )));
        }
        if let Some(usage) = policy.gaming_gpu_usage {
            if !(0.0..=100.0).contains(&usage) {
                return Err(GovernorError::Config(format!(
                    "gaming_gpu_usage {} outside 0-100",
                    usage
                )));
            }
        }
        if let Some(bound) = self.platform.pl1_upper_bound {
            if bound <= 0 {
                return Err(GovernorError::Config(format!(
                    "pl1_upper_bound {} must be positive",
                    bound
                )));
            }
        }
        Ok(())
    }

    /// Loop timing derived from `[timing]` and `[policy]`.
    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            short_interval: Duration::from_millis(self.timing.short_interval_ms),
            long_interval: Duration::from_millis(self.timing.long_interval_ms),
            heartbeat_interval: Duration::from_millis(self.timing.heartbeat_interval_ms),
            io_timeout: Duration::from_millis(self.timing.io_timeout_ms),
            degrade_after: self.policy.degrade_after_long_cycles,
        }
    }

    /// Governor tunables derived from `[platform]` and `[policy]`.
    pub fn governor_options(&self) -> GovernorOptions {
        GovernorOptions {
            variant: self.platform.variant,
            mode: self.platform.mode,
            curve: self.platform.fan_curve,
            short_window: self.policy.short_window,
            long_window: self.policy.long_window,
            throttle_trigger_count: self.policy.throttle_trigger_count,
            gaming_usage_threshold: self.policy.gaming_gpu_usage,
            sensor_range: (self.policy.sensor_min_c, self.policy.sensor_max_c),
        }
    }

    /// The configured platform profile, or the built-in reference.
    pub fn load_profile(&self) -> Result<PlatformProfile> {
        PlatformProfile::load_or_reference(self.platform.profile.as_deref())
    }
}
