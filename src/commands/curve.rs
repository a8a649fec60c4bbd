// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Fan curve sweep

use serde::Serialize;

use crate::cli::{CurveArgs, OutputFormat};
use crate::config::Settings;
use crate::error::{GovernorError, Result};
use crate::governor::fan_curve::target_speed;
use crate::profile::{Chassis, CurveKind, FanRole, ModeTier, PlatformProfile};

/// Target duty per role at one temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveRow {
    pub temperature: i32,
    pub cpu: Option<f64>,
    pub gpu: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ir: Option<f64>,
}

/// Execute the curve command
pub fn execute(args: &CurveArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    let path = args.profile.as_deref().or(settings.platform.profile.as_deref());
    let profile = PlatformProfile::load_or_reference(path)?;
    let rows = sweep(&profile, args.curve, args.tier, args.from, args.to, args.step)?;

    match format {
        OutputFormat::Json => super::print_json(&rows),
        OutputFormat::Text => {
            println!(
                "{} curve, tier L{} ({})",
                args.curve,
                args.tier.index(),
                profile.name
            );
            println!("  temp   cpu   gpu    ir");
            for row in &rows {
                println!(
                    "{:>5}C {:>5} {:>5} {:>5}",
                    row.temperature,
                    cell(row.cpu),
                    cell(row.gpu),
                    cell(row.ir)
                );
            }
            Ok(())
        }
    }
}

fn cell(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.0}%", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Evaluate every role of a curve over `from..=to`, boundary included.
pub fn sweep(
    profile: &PlatformProfile,
    kind: CurveKind,
    tier: ModeTier,
    from: i32,
    to: i32,
    step: u32,
) -> Result<Vec<CurveRow>> {
    if step == 0 || from > to {
        return Err(GovernorError::InvalidInput(format!(
            "sweep {}..{} step {} is empty",
            from, to, step
        )));
    }
    let curve = profile.fan_curves.get(kind).ok_or_else(|| {
        GovernorError::Config(format!("profile {} has no {} fan curve", profile.name, kind))
    })?;
    let boundary = match profile.chassis {
        Chassis::Laptop => curve.boundary.as_ref(),
        Chassis::Desktop => None,
    };

    let speed = |role, temp: i32| target_speed(role, temp as f64, &curve.table, boundary, tier);
    Ok((from..=to)
        .step_by(step as usize)
        .map(|temperature| CurveRow {
            temperature,
            cpu: speed(FanRole::Cpu, temperature),
            gpu: speed(FanRole::Gpu, temperature),
            ir: speed(FanRole::Ir, temperature),
        })
        .collect())
}
