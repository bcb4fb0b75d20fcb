// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio::sync::oneshot;

use crate::errors::{DispatchError, DispatchResult};
use crate::observability::messages::dispatch::CallAbandoned;
use crate::observability::messages::StructuredLog;
use crate::scheduler::current_kind;
use crate::traits::SchedulerKind;

/// A call submitted to another scheduler whose result has not been collected.
///
/// The completion slot is a oneshot channel, so the result is delivered at
/// most once and consumed by whichever `wait` runs.
#[must_use = "a pending call does nothing unless waited on"]
pub struct PendingCall<T> {
    pub(crate) id: u64,
    pub(crate) origin: Option<SchedulerKind>,
    pub(crate) target: SchedulerKind,
    pub(crate) receiver: oneshot::Receiver<DispatchResult<T>>,
}

impl<T> PendingCall<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Scheduler of the thread that submitted the call, `None` for a plain thread.
    pub fn origin(&self) -> Option<SchedulerKind> {
        self.origin
    }

    pub fn target(&self) -> SchedulerKind {
        self.target
    }

    /// Suspends the calling task until the call completes.
    pub async fn wait(self) -> DispatchResult<T> {
        let (id, target) = (self.id, self.target);
        match self.receiver.await {
            Ok(result) => result,
            Err(_) => Err(abandoned(id, target)),
        }
    }

    /// Blocks the calling thread until the call completes.
    ///
    /// Refused on scheduler threads and inside any tokio runtime.
    pub fn wait_blocking(self) -> DispatchResult<T> {
        if current_kind().is_some() || tokio::runtime::Handle::try_current().is_ok() {
            return Err(DispatchError::BlockingInsideScheduler);
        }
        let (id, target) = (self.id, self.target);
        match self.receiver.blocking_recv() {
            Ok(result) => result,
            Err(_) => Err(abandoned(id, target)),
        }
    }
}

fn abandoned(id: u64, kind: SchedulerKind) -> DispatchError {
    CallAbandoned { id, kind }.log();
    DispatchError::Abandoned { id, kind }
}
