// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! thermgov - closed-loop thermal and power governor for laptops.
//!
//! This crate exposes the control core used by the `thermgov` CLI
//! (`src/main.rs`) and by platform integrations.
//!
//! Architecture highlights:
//! - `profile`: per-model calibration (fan tables, PL1 bounds, IR thresholds)
//! - `governor`: smoothing, throttle tracking, PL1 arbitration, fan curves
//! - `runtime`: the timer-driven control loop, heartbeats, trace replay
//! - `hardware`: sensor and actuator traits plus sysfs/trace/log backends
//! - `config`, `cli`, `commands`: settings file and command-line surface

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod governor;
pub mod hardware;
pub mod profile;
pub mod runtime;

pub use error::{GovernorError, Result};
