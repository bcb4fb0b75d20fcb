// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the IOC lifecycle.
//!
//! This module contains message types for logging events related to:
//! * Configuration loading
//! * Record building
//! * IOC start and shutdown
//! * Autosave persistence

use crate::observability::messages::StructuredLog;
use crate::record::RecordType;
use crate::traits::SchedulerKind;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// A configuration file was loaded and validated.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub records: usize,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded configuration {} with {} record(s)",
            self.path, self.records
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(path = self.path, records = self.records, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "config_loaded",
            span_name = name,
            path = self.path,
            records = self.records,
        )
    }
}

/// The IOC is initialising its engine.
///
/// # Log Level
/// `info!` - Important operational event
pub struct IocStarting<'a> {
    pub device: &'a str,
    pub records: usize,
}

impl Display for IocStarting<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting IOC {} with {} record(s)",
            self.device, self.records
        )
    }
}

impl StructuredLog for IocStarting<'_> {
    fn log(&self) {
        tracing::info!(device = self.device, records = self.records, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "ioc_starting",
            span_name = name,
            device = self.device,
            records = self.records,
        )
    }
}

/// A record was built and registered.
///
/// # Log Level
/// `debug!` - Diagnostic event, one per record
pub struct RecordBuilt<'a> {
    pub name: &'a str,
    pub record_type: RecordType,
    pub scheduler: Option<SchedulerKind>,
}

impl Display for RecordBuilt<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.scheduler {
            Some(kind) => write!(
                f,
                "Built {} record {} with updates on {}",
                self.record_type, self.name, kind
            ),
            None => write!(f, "Built {} record {}", self.record_type, self.name),
        }
    }
}

impl StructuredLog for RecordBuilt<'_> {
    fn log(&self) {
        tracing::debug!(
            record = self.name,
            record_type = self.record_type.as_str(),
            scheduler = self.scheduler.map(|k| k.as_str()),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "record_built",
            span_name = name,
            record = self.name,
            record_type = self.record_type.as_str(),
        )
    }
}

/// The IOC shut down.
///
/// # Log Level
/// `info!` - Important operational event
pub struct IocShutdown<'a> {
    pub device: &'a str,
}

impl Display for IocShutdown<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "IOC {} shut down", self.device)
    }
}

impl StructuredLog for IocShutdown<'_> {
    fn log(&self) {
        tracing::info!(device = self.device, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("ioc_shutdown", span_name = name, device = self.device)
    }
}

/// Autosaved values were written to disk.
///
/// # Log Level
/// `debug!` - Periodic event
pub struct AutosaveWritten<'a> {
    pub path: &'a Path,
    pub records: usize,
}

impl Display for AutosaveWritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Saved {} record(s) to {}",
            self.records,
            self.path.display()
        )
    }
}

impl StructuredLog for AutosaveWritten<'_> {
    fn log(&self) {
        tracing::debug!(
            path = %self.path.display(),
            records = self.records,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "autosave_written",
            span_name = name,
            path = %self.path.display(),
            records = self.records,
        )
    }
}

/// Autosaved values were loaded back into their records.
///
/// # Log Level
/// `info!` - Important operational event
pub struct AutosaveRestored<'a> {
    pub path: &'a Path,
    pub records: usize,
}

impl Display for AutosaveRestored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Restored {} record(s) from {}",
            self.records,
            self.path.display()
        )
    }
}

impl StructuredLog for AutosaveRestored<'_> {
    fn log(&self) {
        tracing::info!(
            path = %self.path.display(),
            records = self.records,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "autosave_restored",
            span_name = name,
            path = %self.path.display(),
            records = self.records,
        )
    }
}

/// Reading or writing an autosave file failed.
///
/// # Log Level
/// `error!` - Persistence is not working
pub struct AutosaveFailed<'a> {
    pub path: &'a Path,
    pub error: &'a str,
}

impl Display for AutosaveFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Autosave to {} failed: {}", self.path.display(), self.error)
    }
}

impl StructuredLog for AutosaveFailed<'_> {
    fn log(&self) {
        tracing::error!(
            path = %self.path.display(),
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "autosave_failed",
            span_name = name,
            path = %self.path.display(),
            error = self.error,
        )
    }
}

/// A saved value could not be applied to its record.
///
/// # Log Level
/// `warn!` - The record keeps its configured initial value
pub struct AutosaveValueSkipped<'a> {
    pub record: &'a str,
    pub reason: &'a str,
}

impl Display for AutosaveValueSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Skipped saved value for {}: {}",
            self.record, self.reason
        )
    }
}

impl StructuredLog for AutosaveValueSkipped<'_> {
    fn log(&self) {
        tracing::warn!(record = self.record, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "autosave_value_skipped",
            span_name = name,
            record = self.record,
            reason = self.reason,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_built_display() {
        let with = RecordBuilt {
            name: "TS:AO",
            record_type: RecordType::Ao,
            scheduler: Some(SchedulerKind::EventLoop),
        };
        assert_eq!(with.to_string(), "Built ao record TS:AO with updates on event_loop");

        let without = RecordBuilt {
            name: "TS:AI",
            record_type: RecordType::Ai,
            scheduler: None,
        };
        assert_eq!(without.to_string(), "Built ai record TS:AI");
    }

    #[test]
    fn test_autosave_failed_display() {
        let msg = AutosaveFailed {
            path: Path::new("/tmp/TS.softsav"),
            error: "disk full",
        };
        assert_eq!(msg.to_string(), "Autosave to /tmp/TS.softsav failed: disk full");
    }
}
