// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Asymmetric exponential smoothing of temperature samples

use crate::profile::Smoothing;

/// Rise weight used while the system is known to be idle.
pub const IDLE_RISE_WEIGHT: f64 = 0.1;

/// One EWMA step. Heating uses `increase`, cooling uses `decrease`.
pub fn smooth(previous: f64, raw: f64, coefficients: &Smoothing) -> f64 {
    let lambda = if raw >= previous {
        coefficients.increase
    } else {
        coefficients.decrease
    };
    lambda * raw + (1.0 - lambda) * previous
}

/// One idle-mode step with fixed weights regardless of direction.
pub fn smooth_idle(previous: f64, raw: f64) -> f64 {
    IDLE_RISE_WEIGHT * raw + (1.0 - IDLE_RISE_WEIGHT) * previous
}

/// A single smoothed channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ewma {
    value: Option<f64>,
}

impl Ewma {
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Current smoothed value, `None` before the first sample.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Feed a raw sample. The first sample seeds the channel.
    pub fn update(&mut self, raw: f64, coefficients: &Smoothing) -> f64 {
        let next = match self.value {
            Some(previous) => smooth(previous, raw, coefficients),
            None => raw,
        };
        self.value = Some(next);
        next
    }

    /// Feed a raw sample using the idle weights.
    pub fn update_idle(&mut self, raw: f64) -> f64 {
        let next = match self.value {
            Some(previous) => smooth_idle(previous, raw),
            None => raw,
        };
        self.value = Some(next);
        next
    }

    /// Snap to the latest raw sample.
    pub fn reset(&mut self, raw: f64) {
        self.value = Some(raw);
    }
}
