// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The two scheduler kinds and the context object that owns them.
//!
//! * [`CoroutineScheduler`] - cooperative tasks on a multi-thread tokio runtime
//! * [`EventLoopScheduler`] - one dedicated thread running a current-thread
//!   runtime with a `LocalSet`
//!
//! Both accept [`Job`](crate::traits::Job)s from any thread through an
//! unbounded channel and start them in the order they were submitted. Every
//! thread a scheduler owns is tagged with its kind, see [`current_kind`].

mod context;
mod coroutine;
mod current;
mod event_loop;

pub use context::SchedulerContext;
pub use coroutine::CoroutineScheduler;
pub use current::current_kind;
pub use event_loop::EventLoopScheduler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Clears the running flag when a scheduler's owning thread exits.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
