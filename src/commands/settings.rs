// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings file management

use std::path::Path;

use crate::cli::{OutputFormat, SettingsArgs, SettingsCommands};
use crate::config::Settings;
use crate::error::{GovernorError, Result};

/// Execute the settings command. `path` is the file the settings came from.
pub fn execute(
    args: &SettingsArgs,
    settings: &Settings,
    path: &Path,
    format: OutputFormat,
) -> Result<()> {
    match &args.command {
        SettingsCommands::Show => match format {
            OutputFormat::Json => super::print_json(settings),
            OutputFormat::Text => {
                print!("{}", toml::to_string_pretty(settings)?);
                Ok(())
            }
        },
        SettingsCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        SettingsCommands::Init { force } => {
            init(path, *force)?;
            println!("wrote default settings to {}", path.display());
            Ok(())
        }
    }
}

/// Write default settings, refusing to overwrite unless forced.
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(GovernorError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    Settings::default().save_to(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.toml");
        init(&path, false).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        std::fs::write(&path, "[timing]\nshort_interval_ms = 500\n").unwrap();
        assert!(init(&path, false).is_err());
        init(&path, true).unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.timing.short_interval_ms, 1000);
    }
}
