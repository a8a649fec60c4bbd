// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! thermgov - closed-loop thermal and power governor
//!
//! Entry point for the thermgov CLI application.

use clap::Parser;

use thermgov::cli::{Cli, Commands, SettingsArgs, SettingsCommands};
use thermgov::commands;
use thermgov::config::Settings;
use thermgov::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // `-v` turns on loop and governor diagnostics; `-vv` adds per-tick detail.
    // `RUST_LOG` still takes precedence.
    let level = match cli.verbose {
        0 => None,
        1 => Some("info"),
        _ => Some("debug"),
    };
    if let Some(level) = level {
        for target in ["thermgov.runtime", "thermgov.governor"] {
            if let Ok(parsed) = format!("{}={}", target, level).parse() {
                env_filter = env_filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Load settings; `settings init` must work even when the file is broken
    let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let settings = match &cli.command {
        Commands::Settings(SettingsArgs {
            command: SettingsCommands::Init { .. },
        }) => Settings::default(),
        _ => Settings::load_from(&settings_path)?,
    };

    // Dispatch to appropriate command
    let format = cli.format;
    match &cli.command {
        Commands::Run(args) => commands::run::execute(args, &settings, format).await?,
        Commands::Simulate(args) => commands::simulate::execute(args, &settings, format)?,
        Commands::Profile(args) => commands::profile::execute(args, &settings, format)?,
        Commands::Curve(args) => commands::curve::execute(args, &settings, format)?,
        Commands::Settings(args) => {
            commands::settings::execute(args, &settings, &settings_path, format)?
        }
    }

    Ok(())
}
