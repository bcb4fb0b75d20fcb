// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the soft record engine.
//!
//! This module contains message types for logging events related to:
//! * Record registration
//! * Engine initialisation and shutdown
//! * Periodic scan threads

use crate::observability::messages::StructuredLog;
use crate::record::RecordType;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A record was registered with the engine.
///
/// # Log Level
/// `debug!` - Diagnostic event, one per record
pub struct RecordRegistered<'a> {
    pub name: &'a str,
    pub record_type: RecordType,
}

impl Display for RecordRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Registered {} record {}", self.record_type, self.name)
    }
}

impl StructuredLog for RecordRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            record = self.name,
            record_type = self.record_type.as_str(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "record_registered",
            span_name = name,
            record = self.name,
            record_type = self.record_type.as_str(),
        )
    }
}

/// The engine initialised every registered record.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use softrec::observability::messages::engine::EngineInitialised;
///
/// let msg = EngineInitialised {
///     records: 8,
///     scan_threads: 1,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct EngineInitialised {
    pub records: usize,
    pub scan_threads: usize,
}

impl Display for EngineInitialised {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Engine initialised with {} records and {} scan thread(s)",
            self.records, self.scan_threads
        )
    }
}

impl StructuredLog for EngineInitialised {
    fn log(&self) {
        tracing::info!(
            records = self.records,
            scan_threads = self.scan_threads,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "engine_initialised",
            span_name = name,
            records = self.records,
            scan_threads = self.scan_threads,
        )
    }
}

/// A record's `init_record` reported an error.
///
/// # Log Level
/// `warn!` - The record stays registered
pub struct InitRecordFailed<'a> {
    pub record: &'a str,
}

impl Display for InitRecordFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "init_record failed for {}", self.record)
    }
}

impl StructuredLog for InitRecordFailed<'_> {
    fn log(&self) {
        tracing::warn!(record = self.record, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("init_record_failed", span_name = name, record = self.record)
    }
}

/// A periodic scan thread started.
///
/// # Log Level
/// `debug!`
pub struct ScanThreadStarted {
    pub period: Duration,
    pub records: usize,
}

impl Display for ScanThreadStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Scanning {} record(s) every {:?}",
            self.records, self.period
        )
    }
}

impl StructuredLog for ScanThreadStarted {
    fn log(&self) {
        tracing::debug!(
            period_ms = self.period.as_millis() as u64,
            records = self.records,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "scan_thread",
            span_name = name,
            period = ?self.period,
            records = self.records,
        )
    }
}

/// A periodic scan thread could not be spawned. Its records are only
/// processed on writes.
///
/// # Log Level
/// `error!`
pub struct ScanThreadFailed<'a> {
    pub period: Duration,
    pub records: usize,
    pub error: &'a str,
}

impl Display for ScanThreadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to start scan thread for {} record(s) every {:?}: {}",
            self.records, self.period, self.error
        )
    }
}

impl StructuredLog for ScanThreadFailed<'_> {
    fn log(&self) {
        tracing::error!(
            period_ms = self.period.as_millis() as u64,
            records = self.records,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "scan_thread_failed",
            span_name = name,
            period = ?self.period,
            records = self.records,
            error = self.error,
        )
    }
}

/// The engine stopped its scan threads.
///
/// # Log Level
/// `info!`
pub struct EngineStopped {
    pub scan_threads: usize,
}

impl Display for EngineStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Engine stopped {} scan thread(s)", self.scan_threads)
    }
}

impl StructuredLog for EngineStopped {
    fn log(&self) {
        tracing::info!(scan_threads = self.scan_threads, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("engine_stopped", span_name = name, scan_threads = self.scan_threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_thread_messages() {
        let started = ScanThreadStarted {
            period: Duration::from_millis(500),
            records: 3,
        };
        assert_eq!(started.to_string(), "Scanning 3 record(s) every 500ms");

        let failed = ScanThreadFailed {
            period: Duration::from_secs(1),
            records: 2,
            error: "out of threads",
        };
        assert_eq!(
            failed.to_string(),
            "Failed to start scan thread for 2 record(s) every 1s: out of threads"
        );
    }
}
