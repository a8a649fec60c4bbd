// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for thermgov.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::profile::{CurveKind, ModeTier, PerformanceMode, PlatformVariant};

/// thermgov - closed-loop thermal and power governor for laptops
#[derive(Parser, Debug)]
#[command(name = "thermgov")]
#[command(version, about = "Closed-loop thermal and power governor")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop until interrupted
    Run(RunArgs),

    /// Replay a recorded sensor trace through the governor
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Inspect or validate a platform profile
    Profile(ProfileArgs),

    /// Print fan duty against temperature for a curve
    Curve(CurveArgs),

    /// Show or create the settings file
    #[command(alias = "config")]
    Settings(SettingsArgs),
}

/// Overrides shared by commands that build a governor
#[derive(clap::Args, Debug, Default, Clone)]
pub struct GovernorOverrides {
    /// Platform profile JSON (built-in reference when omitted)
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Performance mode (e.g. default, performance, L3)
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<PerformanceMode>,

    /// Platform variant (0-7)
    #[arg(long, value_parser = parse_variant)]
    pub variant: Option<PlatformVariant>,

    /// Pin a fan curve instead of following the mode
    #[arg(long, value_parser = parse_curve)]
    pub curve: Option<CurveKind>,
}

/// Arguments for the run subcommand
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: GovernorOverrides,

    /// Read sensors from a trace file instead of sysfs
    #[arg(long)]
    pub trace: Option<PathBuf>,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<u64>,
}

/// Arguments for the simulate subcommand
#[derive(clap::Args, Debug)]
pub struct SimulateArgs {
    /// Trace file: JSON array of sensor samples
    pub trace: PathBuf,

    #[command(flatten)]
    pub overrides: GovernorOverrides,

    /// Only print ticks with an IR event or a state change
    #[arg(long)]
    pub changes_only: bool,
}

/// Arguments for the profile subcommand
#[derive(clap::Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommands,
}

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Print the active profile
    Show {
        /// Profile file (configured or reference profile when omitted)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Validate a profile and report the first problem
    Validate {
        /// Profile file (configured or reference profile when omitted)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

/// Arguments for the curve subcommand
#[derive(clap::Args, Debug)]
pub struct CurveArgs {
    /// Profile file (configured or reference profile when omitted)
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Curve to print
    #[arg(long, value_parser = parse_curve, default_value = "default")]
    pub curve: CurveKind,

    /// Mode tier for boundary clamping (0-7)
    #[arg(long, value_parser = parse_tier, default_value = "0")]
    pub tier: ModeTier,

    /// First temperature of the sweep (°C)
    #[arg(long, default_value = "30")]
    pub from: i32,

    /// Last temperature of the sweep (°C)
    #[arg(long, default_value = "100")]
    pub to: i32,

    /// Sweep step (°C)
    #[arg(long, default_value = "5")]
    pub step: u32,
}

/// Arguments for the settings subcommand
#[derive(clap::Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommands,
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print the effective settings
    Show,

    /// Print the settings file path
    Path,

    /// Write a settings file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Text,

    /// JSON output
    Json,
}

fn parse_mode(value: &str) -> Result<PerformanceMode, String> {
    value.parse().map_err(|e: crate::error::GovernorError| e.to_string())
}

fn parse_curve(value: &str) -> Result<CurveKind, String> {
    value.parse().map_err(|e: crate::error::GovernorError| e.to_string())
}

fn parse_index(value: &str) -> Result<u8, String> {
    value
        .parse::<u8>()
        .map_err(|_| format!("'{}' is not an index", value))
}

fn parse_tier(value: &str) -> Result<ModeTier, String> {
    ModeTier::try_from(parse_index(value)?).map_err(|e| e.to_string())
}

fn parse_variant(value: &str) -> Result<PlatformVariant, String> {
    PlatformVariant::try_from(parse_index(value)?).map_err(|e| e.to_string())
}
