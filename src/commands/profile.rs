// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Platform profile inspection

use serde::Serialize;
use std::path::Path;

use crate::cli::{OutputFormat, ProfileArgs, ProfileCommands};
use crate::config::Settings;
use crate::error::Result;
use crate::profile::{CurveKind, PlatformProfile, PLATFORM_VARIANT_COUNT};

#[derive(Serialize)]
struct ValidationReport<'a> {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the profile command
pub fn execute(args: &ProfileArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    match &args.command {
        ProfileCommands::Show { path } => {
            let profile = resolve(path.as_deref(), settings)?;
            match format {
                OutputFormat::Json => super::print_json(&profile),
                OutputFormat::Text => {
                    print!("{}", describe(&profile));
                    Ok(())
                }
            }
        }
        ProfileCommands::Validate { path } => {
            let result = resolve(path.as_deref(), settings);
            match format {
                OutputFormat::Json => {
                    let report = match &result {
                        Ok(profile) => ValidationReport {
                            valid: true,
                            name: Some(&profile.name),
                            error: None,
                        },
                        Err(e) => ValidationReport {
                            valid: false,
                            name: None,
                            error: Some(e.to_string()),
                        },
                    };
                    super::print_json(&report)?;
                }
                OutputFormat::Text => {
                    if let Ok(profile) = &result {
                        println!("profile {} v{} is valid", profile.name, profile.version);
                    }
                }
            }
            result.map(|_| ())
        }
    }
}

fn resolve(path: Option<&Path>, settings: &Settings) -> Result<PlatformProfile> {
    PlatformProfile::load_or_reference(path.or(settings.platform.profile.as_deref()))
}

/// Human-readable profile summary.
pub fn describe(profile: &PlatformProfile) -> String {
    let mut text = format!(
        "Profile: {} v{} ({:?})\n",
        profile.name, profile.version, profile.chassis
    );
    text.push_str(&format!(
        "Smoothing: increase {} decrease {}\n",
        profile.smoothing.increase, profile.smoothing.decrease
    ));
    text.push_str(&format!(
        "PL1 lower by tier: {:?}\n",
        profile.pl1_lower_bounds
    ));
    let upper = &profile.pl1_upper_bounds;
    text.push_str(&format!(
        "PL1 upper: default {} performance {} gaming {}\n",
        upper.default, upper.performance, upper.gaming
    ));
    text.push_str(&format!(
        "GPS: {}..{}  IR cycle: {} ticks\n",
        profile.gps.min, profile.gps.max, profile.ir_cycle
    ));

    let ir = &profile.ir_thresholds;
    text.push_str("IR thresholds   overheat  gps  pl1  release\n");
    for variant in 0..PLATFORM_VARIANT_COUNT {
        text.push_str(&format!(
            "  variant {}     {:>8} {:>4} {:>4} {:>8}\n",
            variant, ir.overheat[variant], ir.gps[variant], ir.pl1[variant], ir.release[variant]
        ));
    }

    for kind in [CurveKind::Default, CurveKind::Performance, CurveKind::Custom] {
        if let Some(curve) = profile.fan_curves.get(kind) {
            let roles = if curve.table.ir.is_some() { "cpu/gpu/ir" } else { "cpu/gpu" };
            text.push_str(&format!(
                "Fan curve {}: {} ({} points cpu), boundary {}\n",
                kind,
                roles,
                curve.table.cpu.temperatures.len(),
                if curve.boundary.is_some() { "yes" } else { "no" }
            ));
        }
    }
    text
}
