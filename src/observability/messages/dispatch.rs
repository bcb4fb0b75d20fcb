// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for scheduler lifecycle and cross-scheduler calls.

use crate::errors::DispatchError;
use crate::observability::messages::StructuredLog;
use crate::traits::SchedulerKind;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A scheduler finished starting and accepts work.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use softrec::observability::messages::dispatch::SchedulerStarted;
/// use softrec::traits::SchedulerKind;
///
/// let msg = SchedulerStarted {
///     kind: SchedulerKind::Coroutine,
///     threads: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct SchedulerStarted {
    pub kind: SchedulerKind,
    pub threads: usize,
}

impl Display for SchedulerStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Started {} scheduler with {} thread(s)",
            self.kind, self.threads
        )
    }
}

impl StructuredLog for SchedulerStarted {
    fn log(&self) {
        tracing::info!(
            scheduler = %self.kind,
            threads = self.threads,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "scheduler_started",
            span_name = name,
            scheduler = %self.kind,
            threads = self.threads,
        )
    }
}

/// A scheduler stopped accepting work.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SchedulerStopped {
    pub kind: SchedulerKind,
}

impl Display for SchedulerStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stopped {} scheduler", self.kind)
    }
}

impl StructuredLog for SchedulerStopped {
    fn log(&self) {
        tracing::info!(scheduler = %self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("scheduler_stopped", span_name = name, scheduler = %self.kind)
    }
}

/// A call was queued on its target scheduler.
///
/// # Log Level
/// `debug!` - High-volume diagnostic event
pub struct CallSubmitted {
    pub id: u64,
    pub origin: Option<SchedulerKind>,
    pub target: SchedulerKind,
}

impl Display for CallSubmitted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.origin {
            Some(origin) => write!(
                f,
                "Call {} submitted from {} to {}",
                self.id, origin, self.target
            ),
            None => write!(f, "Call {} submitted to {}", self.id, self.target),
        }
    }
}

impl StructuredLog for CallSubmitted {
    fn log(&self) {
        tracing::debug!(
            call_id = self.id,
            origin = ?self.origin,
            target = %self.target,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "call",
            span_name = name,
            call_id = self.id,
            origin = ?self.origin,
            target = %self.target,
        )
    }
}

/// A call could not be handed to its target scheduler.
///
/// # Log Level
/// `warn!` - Recoverable, returned to the caller
pub struct SubmissionRejected<'a> {
    pub id: u64,
    pub target: SchedulerKind,
    pub error: &'a DispatchError,
}

impl Display for SubmissionRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Call {} to {} rejected: {}",
            self.id, self.target, self.error
        )
    }
}

impl StructuredLog for SubmissionRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            call_id = self.id,
            target = %self.target,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "submission_rejected",
            span_name = name,
            call_id = self.id,
            target = %self.target,
        )
    }
}

/// The target scheduler went away before a call completed.
///
/// # Log Level
/// `warn!`
pub struct CallAbandoned {
    pub id: u64,
    pub kind: SchedulerKind,
}

impl Display for CallAbandoned {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Call {} abandoned, {} scheduler shut down while it was in flight",
            self.id, self.kind
        )
    }
}

impl StructuredLog for CallAbandoned {
    fn log(&self) {
        tracing::warn!(call_id = self.id, scheduler = %self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "call_abandoned",
            span_name = name,
            call_id = self.id,
            scheduler = %self.kind,
        )
    }
}

/// A fire-and-forget completion hook panicked.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct CompletionHookPanicked<'a> {
    pub message: &'a str,
}

impl Display for CompletionHookPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Completion hook panicked: {}", self.message)
    }
}

impl StructuredLog for CompletionHookPanicked<'_> {
    fn log(&self) {
        tracing::error!(panic = self.message, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("completion_hook_panicked", span_name = name, panic = self.message)
    }
}
