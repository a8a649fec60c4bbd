// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Subcommand implementations

use serde::Serialize;
use std::sync::Arc;

pub mod curve;
pub mod profile;
pub mod run;
pub mod settings;
pub mod simulate;

use crate::cli::GovernorOverrides;
use crate::config::Settings;
use crate::error::Result;
use crate::governor::Governor;
use crate::profile::PlatformProfile;

/// Build a governor from settings with command-line overrides applied.
pub fn build_governor(settings: &Settings, overrides: &GovernorOverrides) -> Result<Governor> {
    let mut options = settings.governor_options();
    if let Some(mode) = overrides.mode {
        options.mode = mode;
    }
    if let Some(variant) = overrides.variant {
        options.variant = variant;
    }
    if let Some(curve) = overrides.curve {
        options.curve = Some(curve);
    }

    let path = overrides
        .profile
        .as_deref()
        .or(settings.platform.profile.as_deref());
    let profile = Arc::new(PlatformProfile::load_or_reference(path)?);
    tracing::debug!(
        target: "thermgov.runtime",
        "profile {} v{}, variant {}, mode {}",
        profile.name,
        profile.version,
        options.variant.index(),
        options.mode
    );

    let mut governor = Governor::new(profile, options)?;
    if let Some(bound) = settings.platform.pl1_upper_bound {
        governor.set_configured_upper_bound(bound)?;
    }
    Ok(governor)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
