// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for record adapter events.
//!
//! These are emitted from inside engine entry points, so they must never
//! block and never panic.

use crate::errors::{DeviceError, DispatchError};
use crate::observability::messages::StructuredLog;
use crate::record::Value;
use crate::traits::SchedulerKind;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A validator refused a value written to an output record.
///
/// # Log Level
/// `warn!` - The write fails, the record keeps its previous value
///
/// # Example
/// ```
/// use softrec::observability::messages::device::ValueRejected;
/// use softrec::record::Value;
///
/// let value = Value::Double(-1.0);
/// let msg = ValueRejected {
///     record: "DEV:SETPOINT",
///     value: &value,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct ValueRejected<'a> {
    pub record: &'a str,
    pub value: &'a Value,
}

impl Display for ValueRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Value {} rejected for record {}", self.value, self.record)
    }
}

impl StructuredLog for ValueRejected<'_> {
    fn log(&self) {
        tracing::warn!(record = self.record, value = %self.value, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("value_rejected", span_name = name, record = self.record)
    }
}

/// A value pushed by the engine could not be converted for the record.
///
/// # Log Level
/// `warn!`
pub struct ConversionFailed<'a> {
    pub record: &'a str,
    pub error: &'a DeviceError,
}

impl Display for ConversionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Write to {} failed: {}", self.record, self.error)
    }
}

impl StructuredLog for ConversionFailed<'_> {
    fn log(&self) {
        tracing::warn!(record = self.record, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("conversion_failed", span_name = name, record = self.record)
    }
}

/// A device-support entry point panicked. The panic was contained and the
/// engine saw an error status.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct EntryPointPanicked<'a> {
    pub record: &'a str,
    pub entry_point: &'a str,
    pub message: &'a str,
}

impl Display for EntryPointPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Panic in {} for record {}: {}",
            self.entry_point, self.record, self.message
        )
    }
}

impl StructuredLog for EntryPointPanicked<'_> {
    fn log(&self) {
        tracing::error!(
            record = self.record,
            entry_point = self.entry_point,
            panic = self.message,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "entry_point_panicked",
            span_name = name,
            record = self.record,
            entry_point = self.entry_point,
        )
    }
}

/// An `on_update` callback finished with an error or a panic.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct CallbackFailed<'a> {
    pub record: &'a str,
    pub scheduler: SchedulerKind,
    pub error: &'a DispatchError,
}

impl Display for CallbackFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "on_update for {} failed on {} scheduler: {}",
            self.record, self.scheduler, self.error
        )
    }
}

impl StructuredLog for CallbackFailed<'_> {
    fn log(&self) {
        tracing::error!(
            record = self.record,
            scheduler = %self.scheduler,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "callback_failed",
            span_name = name,
            record = self.record,
            scheduler = %self.scheduler,
        )
    }
}

/// An `on_update` callback could not be queued on its scheduler.
///
/// # Log Level
/// `error!`
pub struct UpdateDispatchFailed<'a> {
    pub record: &'a str,
    pub error: &'a DispatchError,
}

impl Display for UpdateDispatchFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Could not dispatch on_update for {}: {}",
            self.record, self.error
        )
    }
}

impl StructuredLog for UpdateDispatchFailed<'_> {
    fn log(&self) {
        tracing::error!(record = self.record, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("update_dispatch_failed", span_name = name, record = self.record)
    }
}

/// An output record accepted a new value. Emitted by the logging handler
/// attached to records configured with `log_updates`.
///
/// # Log Level
/// `info!`
pub struct UpdateReceived<'a> {
    pub record: &'a str,
    pub value: &'a Value,
}

impl Display for UpdateReceived<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} updated to {}", self.record, self.value)
    }
}

impl StructuredLog for UpdateReceived<'_> {
    fn log(&self) {
        tracing::info!(record = self.record, value = %self.value, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("update_received", span_name = name, record = self.record)
    }
}
