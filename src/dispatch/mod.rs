// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cross-scheduler calls.
//!
//! A [`Dispatcher`] hands a callable to the scheduler of the requested kind,
//! runs it to completion there and delivers its result through a oneshot
//! completion slot. The caller sees exactly what the callable produced: the
//! returned value, or the very `anyhow::Error` it failed with. Panics inside
//! the callable are caught on the target and reported as
//! [`DispatchError::Panicked`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use softrec::dispatch::Dispatcher;
//! use softrec::scheduler::SchedulerContext;
//! use softrec::traits::SchedulerKind;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let context = Arc::new(SchedulerContext::new());
//! context.start_all()?;
//! let dispatcher = Dispatcher::new(Arc::clone(&context));
//!
//! let doubled = dispatcher
//!     .call(SchedulerKind::EventLoop, || async { Ok(21 * 2) })
//!     .await?;
//! assert_eq!(doubled, 42);
//! # Ok(())
//! # }
//! ```

mod panic;
mod pending;

#[cfg(test)]
mod integration_tests;

pub(crate) use panic::panic_message;
pub use pending::PendingCall;

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::errors::{DispatchError, DispatchResult};
use crate::observability::messages::dispatch::{CallSubmitted, CompletionHookPanicked, SubmissionRejected};
use crate::observability::messages::StructuredLog;
use crate::scheduler::{current_kind, SchedulerContext};
use crate::traits::SchedulerKind;
use panic::CatchPanic;

/// Submits callables to the schedulers of a [`SchedulerContext`].
#[derive(Clone)]
pub struct Dispatcher {
    context: Arc<SchedulerContext>,
    next_id: Arc<AtomicU64>,
}

impl Dispatcher {
    pub fn new(context: Arc<SchedulerContext>) -> Self {
        Self {
            context,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn context(&self) -> &Arc<SchedulerContext> {
        &self.context
    }

    /// Runs `f` on the `target` scheduler and waits for its result.
    pub async fn call<F, Fut, T>(&self, target: SchedulerKind, f: F) -> DispatchResult<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(target, f)?.wait().await
    }

    /// Blocking form of [`call`](Self::call) for threads outside every scheduler.
    pub fn call_blocking<F, Fut, T>(&self, target: SchedulerKind, f: F) -> DispatchResult<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        if current_kind().is_some() || tokio::runtime::Handle::try_current().is_ok() {
            return Err(DispatchError::BlockingInsideScheduler);
        }
        self.submit(target, f)?.wait_blocking()
    }

    /// Queues `f` on the `target` scheduler and returns its completion slot.
    ///
    /// Fails immediately with `SchedulerUnavailable` if the target is not
    /// running.
    pub fn submit<F, Fut, T>(&self, target: SchedulerKind, f: F) -> DispatchResult<PendingCall<T>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let (id, origin) = self.enqueue(target, f, move |result| {
            // the caller may have dropped its PendingCall
            let _ = sender.send(result);
        })?;
        Ok(PendingCall {
            id,
            origin,
            target,
            receiver,
        })
    }

    /// Fire-and-forget: runs `f` on `target`, then `on_complete` with its
    /// result on the same scheduler. Returns the call id.
    pub fn dispatch<F, Fut, T, C>(
        &self,
        target: SchedulerKind,
        f: F,
        on_complete: C,
    ) -> DispatchResult<u64>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(DispatchResult<T>) + Send + 'static,
    {
        let (id, _) = self.enqueue(target, f, move |result| {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| on_complete(result))) {
                CompletionHookPanicked {
                    message: &panic_message(payload.as_ref()),
                }
                .log();
            }
        })?;
        Ok(id)
    }

    fn enqueue<F, Fut, T, S>(
        &self,
        target: SchedulerKind,
        f: F,
        sink: S,
    ) -> DispatchResult<(u64, Option<SchedulerKind>)>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
        S: FnOnce(DispatchResult<T>) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let origin = current_kind();

        let submitted = self.context.resolve(target).and_then(|scheduler| {
            scheduler.submit(Box::new(move || {
                Box::pin(async move {
                    let result = match CatchPanic::new(async move { f().await }).await {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(error)) => Err(DispatchError::Callback(error)),
                        Err(message) => Err(DispatchError::Panicked { message }),
                    };
                    sink(result);
                })
            }))
        });

        match submitted {
            Ok(()) => {
                CallSubmitted { id, origin, target }.log();
                Ok((id, origin))
            }
            Err(error) => {
                SubmissionRejected {
                    id,
                    target,
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }
}
