// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Linux sysfs sensor source
//!
//! Temperatures come from thermal-zone style files holding either
//! millidegrees or degrees Celsius. GPU usage comes from a file holding a
//! plain percentage (e.g. `gpu_busy_percent`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::SensorSource;
use crate::error::{GovernorError, Result};
use crate::governor::SensorSample;
use crate::profile::ModeTier;

/// Files backing each sensor channel. `None` marks a channel the platform
/// does not have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorPaths {
    pub cpu: Option<PathBuf>,
    pub gpu: Option<PathBuf>,
    pub ambient: Option<PathBuf>,
    pub ir: Option<PathBuf>,
    pub gpu_usage: Option<PathBuf>,
}

impl Default for SensorPaths {
    fn default() -> Self {
        Self {
            cpu: Some(PathBuf::from("/sys/class/thermal/thermal_zone0/temp")),
            gpu: None,
            ambient: None,
            ir: None,
            gpu_usage: None,
        }
    }
}

impl SensorPaths {
    fn configured(&self) -> impl Iterator<Item = &Path> {
        [&self.cpu, &self.gpu, &self.ambient, &self.ir, &self.gpu_usage]
            .into_iter()
            .flatten()
            .map(PathBuf::as_path)
    }
}

/// Parse a thermal-zone reading. Values above 1000 are millidegrees.
pub fn parse_thermal_zone_temp(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    if value.abs() > 1000.0 {
        Some(value / 1000.0)
    } else {
        Some(value)
    }
}

/// Parse a usage percentage, tolerating a trailing `%`.
pub fn parse_usage_percent(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().trim_end_matches('%').trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Sensor source backed by sysfs files.
#[derive(Debug, Clone)]
pub struct SysfsSensors {
    paths: SensorPaths,
    /// Tier to report with each sample, if the platform exposes one
    mode_tier: Option<ModeTier>,
}

impl SysfsSensors {
    pub fn new(paths: SensorPaths, mode_tier: Option<ModeTier>) -> Self {
        Self { paths, mode_tier }
    }

    /// Fail early when no channel can be read at all.
    pub async fn ensure_readable(&self) -> Result<()> {
        let mut readable = 0;
        for path in self.paths.configured() {
            match tokio::fs::metadata(path).await {
                Ok(_) => readable += 1,
                Err(e) => tracing::warn!(
                    target: "thermgov.runtime",
                    "sensor file {} unavailable: {}",
                    path.display(),
                    e
                ),
            }
        }
        if readable == 0 {
            return Err(GovernorError::Sensor(
                "no configured sensor file is readable".to_string(),
            ));
        }
        Ok(())
    }

    /// Read one channel. An unreadable file yields NaN so the governor
    /// counts a fault for that channel only.
    async fn read_channel(path: Option<&Path>, parse: fn(&str) -> Option<f64>) -> Option<f64> {
        let path = path?;
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => Some(parse(&raw).unwrap_or(f64::NAN)),
            Err(e) => {
                tracing::debug!(
                    target: "thermgov.runtime",
                    "read {} failed: {}",
                    path.display(),
                    e
                );
                Some(f64::NAN)
            }
        }
    }
}

#[async_trait]
impl SensorSource for SysfsSensors {
    fn name(&self) -> &str {
        "sysfs"
    }

    async fn read(&mut self) -> Result<SensorSample> {
        let temp = parse_thermal_zone_temp;
        Ok(SensorSample {
            cpu: Self::read_channel(self.paths.cpu.as_deref(), temp).await,
            gpu: Self::read_channel(self.paths.gpu.as_deref(), temp).await,
            ambient: Self::read_channel(self.paths.ambient.as_deref(), temp).await,
            ir: Self::read_channel(self.paths.ir.as_deref(), temp).await,
            gpu_usage: Self::read_channel(self.paths.gpu_usage.as_deref(), parse_usage_percent)
                .await,
            mode_tier: self.mode_tier,
            ..Default::default()
        })
    }
}
