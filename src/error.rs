// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for thermgov
//!
//! Configuration problems are fatal and stop the governor before the control
//! loop starts. Sensor and actuator faults are contained within a single tick.

use thiserror::Error;

/// Main error type for governor operations
#[derive(Error, Debug)]
pub enum GovernorError {
    /// Malformed or inconsistent platform profile or settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// A sensor read failed or returned an out-of-range value
    #[error("Sensor fault: {0}")]
    Sensor(String),

    /// A fan or power-limit write failed
    #[error("Actuator fault: {0}")]
    Actuator(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GovernorError {
    /// Whether this error must abort startup rather than be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GovernorError::Config(_) | GovernorError::Toml(_) | GovernorError::Json(_)
        )
    }
}

/// Result type alias for governor operations
pub type Result<T> = std::result::Result<T, GovernorError>;

impl From<toml::de::Error> for GovernorError {
    fn from(err: toml::de::Error) -> Self {
        GovernorError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for GovernorError {
    fn from(err: toml::ser::Error) -> Self {
        GovernorError::Toml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = GovernorError::Config("fan table length mismatch".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: fan table length mismatch"
        );
    }

    #[test]
    fn test_sensor_and_actuator_not_fatal() {
        assert!(!GovernorError::Sensor("cpu".into()).is_fatal());
        assert!(!GovernorError::Actuator("pwm".into()).is_fatal());
        assert!(GovernorError::Config("bad".into()).is_fatal());
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse: std::result::Result<toml::Value, _> = toml::from_str("= broken");
        let err: GovernorError = parse.unwrap_err().into();
        assert!(matches!(err, GovernorError::Toml(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GovernorError = io_err.into();
        assert!(matches!(err, GovernorError::Io(_)));
        assert!(!err.is_fatal());
    }
}
