// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur during IOC configuration validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two records resolve to the same name
    DuplicateRecordName {
        /// The duplicated record name
        name: String,
    },
    /// An array or long string record was given a zero length
    InvalidLength {
        /// The record with the bad length
        record: String,
        /// The rejected length
        length: usize,
    },
    /// An array record has neither a length nor an initial value to size it
    MissingLength {
        /// The record that cannot be sized
        record: String,
    },
    /// A multi-bit record lists more state names than the record can hold
    TooManyOptions {
        /// The record with too many options
        record: String,
        /// Number of options supplied
        count: usize,
    },
    /// The scan policy string could not be parsed
    InvalidScan {
        /// The record with the bad scan policy
        record: String,
        /// The scan string as written in the configuration
        scan: String,
    },
    /// Drive limits are inverted
    InvalidDriveLimits {
        /// The record with inverted limits
        record: String,
        low: f64,
        high: f64,
    },
    /// An alarm status appears more than once in the priority table
    DuplicateAlarmPriority {
        /// The repeated status name
        status: String,
    },
    /// Autosave is enabled but no directory was configured
    MissingAutosaveDirectory,
    /// The device name prefix is empty
    EmptyDeviceName,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateRecordName { name } => {
                write!(f, "Duplicate record name: '{}'", name)
            }
            ValidationError::InvalidLength { record, length } => {
                write!(
                    f,
                    "Record '{}' has invalid length {}: arrays cannot be of zero length",
                    record, length
                )
            }
            ValidationError::MissingLength { record } => {
                write!(
                    f,
                    "Record '{}' needs either a length or an initial value",
                    record
                )
            }
            ValidationError::TooManyOptions { record, count } => {
                write!(
                    f,
                    "Record '{}' lists {} options, at most 16 enum values are allowed",
                    record, count
                )
            }
            ValidationError::InvalidScan { record, scan } => {
                write!(f, "Record '{}' has unrecognised scan policy '{}'", record, scan)
            }
            ValidationError::InvalidDriveLimits { record, low, high } => {
                write!(
                    f,
                    "Record '{}' has drive low limit {} above drive high limit {}",
                    record, low, high
                )
            }
            ValidationError::DuplicateAlarmPriority { status } => {
                write!(f, "Alarm status '{}' listed more than once in alarm_priority", status)
            }
            ValidationError::MissingAutosaveDirectory => {
                write!(f, "Autosave is enabled but autosave.directory is not set")
            }
            ValidationError::EmptyDeviceName => {
                write!(f, "device_name must not be empty")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading an IOC configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config format '{extension}', expected .yaml, .yml or .toml")]
    UnsupportedFormat { extension: String },

    #[error("config validation failed: {}", format_validation_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
