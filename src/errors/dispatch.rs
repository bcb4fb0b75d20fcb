// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::traits::SchedulerKind;

/// Result alias for cross-scheduler calls.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Failures surfaced by the cross-scheduler dispatcher.
///
/// `Callback` carries the callable's own error untouched, so callers can
/// `downcast_ref` to the concrete type they raised on the other side of the hop.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{kind} scheduler is not running")]
    SchedulerUnavailable { kind: SchedulerKind },

    #[error("{kind} scheduler is already running in this context")]
    SchedulerExists { kind: SchedulerKind },

    #[error("failed to start {kind} scheduler: {reason}")]
    StartFailed { kind: SchedulerKind, reason: String },

    #[error("call {id} abandoned: {kind} scheduler shut down before it completed")]
    Abandoned { id: u64, kind: SchedulerKind },

    #[error("{0}")]
    Callback(anyhow::Error),

    #[error("callable panicked: {message}")]
    Panicked { message: String },

    #[error("blocking calls are not allowed from a scheduler thread")]
    BlockingInsideScheduler,
}

impl DispatchError {
    /// The callable's own error, if this failure came from the callable.
    pub fn callback_error(&self) -> Option<&anyhow::Error> {
        match self {
            DispatchError::Callback(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_callback_error(self) -> Result<anyhow::Error, DispatchError> {
        match self {
            DispatchError::Callback(err) => Ok(err),
            other => Err(other),
        }
    }
}
