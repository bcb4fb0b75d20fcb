// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::alarm::{AlarmStatus, Severity};
use crate::config::consts::{
    DEFAULT_COROUTINE_WORKERS, DEFAULT_SAVE_PERIOD_SECONDS, DEFAULT_SEPARATOR,
};
use crate::errors::ConfigError;
use crate::record::{ElementType, PlainValue, RecordType};
use crate::traits::SchedulerKind;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete configuration of one soft IOC.
///
/// # Fields
/// * `device_name` - Prefix of every record name
/// * `separator` - Placed between the prefix and each record name (default `:`)
/// * `dispatcher` - Scheduler settings
/// * `alarm_priority` - Status tie-break order for alarms of equal severity
/// * `autosave` - Periodic value persistence
/// * `records` - The records to build
///
/// # Example
/// ```yaml
/// device_name: "TEST-DEVICE"
/// dispatcher:
///   default_scheduler: coroutine
///   coroutine_workers: 2
/// alarm_priority: [UDF, LINK]
/// autosave:
///   enabled: true
///   directory: /var/lib/softrec
///   save_period_seconds: 10
/// records:
///   - name: SETPOINT
///     type: ao
///     initial_value: 5.0
///     autosave: true
///   - name: READBACK
///     type: ai
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IocConfig {
    pub device_name: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub alarm_priority: Vec<AlarmStatus>,
    #[serde(default)]
    pub autosave: AutosaveConfig,
    #[serde(default)]
    pub records: Vec<RecordConfig>,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

/// Scheduler settings.
///
/// # Fields
/// * `default_scheduler` - Where callbacks run when neither the record nor the
///   building thread names a scheduler
/// * `coroutine_workers` - Worker threads of the coroutine scheduler
/// * `lazy_start` - Start a scheduler on first use instead of failing
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    pub default_scheduler: SchedulerKind,
    pub coroutine_workers: usize,
    pub lazy_start: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_scheduler: SchedulerKind::Coroutine,
            coroutine_workers: DEFAULT_COROUTINE_WORKERS,
            lazy_start: false,
        }
    }
}

/// Autosave settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AutosaveConfig {
    pub enabled: bool,
    pub directory: Option<PathBuf>,
    pub save_period_seconds: f64,
    /// Keep a timestamped copy of the previous save file on start.
    pub backup_on_restart: bool,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: None,
            save_period_seconds: DEFAULT_SAVE_PERIOD_SECONDS,
            backup_on_restart: true,
        }
    }
}

impl AutosaveConfig {
    pub fn save_period(&self) -> Duration {
        if self.save_period_seconds.is_finite() && self.save_period_seconds > 0.0 {
            Duration::from_secs_f64(self.save_period_seconds)
        } else {
            Duration::from_secs_f64(DEFAULT_SAVE_PERIOD_SECONDS)
        }
    }
}

/// Configuration for a single record.
///
/// # Example
/// ```yaml
/// name: MODE
/// type: mbbo
/// options: [Off, Standby, On]
/// initial_value: 1
/// scheduler: event_loop
/// log_updates: true
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RecordConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub initial_value: Option<PlainValue>,
    #[serde(default)]
    pub always_update: bool,
    /// `Passive`, `I/O Intr` or `<seconds> second`
    pub scan: Option<String>,
    pub length: Option<usize>,
    pub element_type: Option<ElementType>,
    pub drvl: Option<f64>,
    pub drvh: Option<f64>,
    pub egu: Option<String>,
    pub prec: Option<u16>,
    pub description: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub autosave: bool,
    pub scheduler: Option<SchedulerKind>,
    pub severity: Option<Severity>,
    pub status: Option<AlarmStatus>,
    #[serde(default)]
    pub log_updates: bool,
    #[serde(default)]
    pub retain_timestamp: bool,
}

/// File formats a configuration can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }
}

pub fn parse_config(content: &str, format: ConfigFormat) -> Result<IocConfig, ConfigError> {
    Ok(match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    })
}

/// Load a config from a YAML or TOML file, chosen by extension
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<IocConfig, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&content, format)
}

/// Load a config and validate it
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<IocConfig, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
