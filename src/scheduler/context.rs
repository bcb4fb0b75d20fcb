// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::lock;
use super::{CoroutineScheduler, EventLoopScheduler};
use crate::errors::DispatchError;
use crate::traits::{Scheduler, SchedulerKind};

/// Owns at most one running scheduler of each kind.
///
/// A scheduler that has been shut down stays registered so that later
/// submissions fail with `SchedulerUnavailable` instead of silently starting a
/// fresh one. Call [`start`](Self::start) to replace it explicitly.
pub struct SchedulerContext {
    schedulers: Mutex<HashMap<SchedulerKind, Arc<dyn Scheduler>>>,
    coroutine_workers: usize,
    lazy_start: bool,
}

impl Default for SchedulerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerContext {
    pub fn new() -> Self {
        Self {
            schedulers: Mutex::new(HashMap::new()),
            coroutine_workers: crate::config::consts::DEFAULT_COROUTINE_WORKERS,
            lazy_start: false,
        }
    }

    pub fn with_coroutine_workers(mut self, workers: usize) -> Self {
        self.coroutine_workers = workers.max(1);
        self
    }

    /// Start a scheduler on first use instead of failing.
    pub fn with_lazy_start(mut self, lazy_start: bool) -> Self {
        self.lazy_start = lazy_start;
        self
    }

    pub fn start(&self, kind: SchedulerKind) -> Result<Arc<dyn Scheduler>, DispatchError> {
        let mut schedulers = lock(&self.schedulers);
        if let Some(existing) = schedulers.get(&kind) {
            if existing.is_running() {
                return Err(DispatchError::SchedulerExists { kind });
            }
        }
        let scheduler = self.create(kind)?;
        schedulers.insert(kind, Arc::clone(&scheduler));
        Ok(scheduler)
    }

    /// Starts every kind that is not already running.
    pub fn start_all(&self) -> Result<(), DispatchError> {
        for kind in SchedulerKind::ALL {
            match self.start(kind) {
                Ok(_) | Err(DispatchError::SchedulerExists { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Registers an externally constructed scheduler under its kind.
    pub fn install(&self, scheduler: Arc<dyn Scheduler>) -> Result<(), DispatchError> {
        let kind = scheduler.kind();
        let mut schedulers = lock(&self.schedulers);
        if schedulers.get(&kind).is_some_and(|s| s.is_running()) {
            return Err(DispatchError::SchedulerExists { kind });
        }
        schedulers.insert(kind, scheduler);
        Ok(())
    }

    pub fn get(&self, kind: SchedulerKind) -> Option<Arc<dyn Scheduler>> {
        lock(&self.schedulers).get(&kind).cloned()
    }

    /// The running scheduler for `kind`, started here if lazy start is on and
    /// none has been registered yet.
    pub fn resolve(&self, kind: SchedulerKind) -> Result<Arc<dyn Scheduler>, DispatchError> {
        let mut schedulers = lock(&self.schedulers);
        match schedulers.get(&kind) {
            Some(scheduler) if scheduler.is_running() => Ok(Arc::clone(scheduler)),
            Some(_) => Err(DispatchError::SchedulerUnavailable { kind }),
            None if self.lazy_start => {
                let scheduler = self.create(kind)?;
                schedulers.insert(kind, Arc::clone(&scheduler));
                Ok(scheduler)
            }
            None => Err(DispatchError::SchedulerUnavailable { kind }),
        }
    }

    pub fn is_running(&self, kind: SchedulerKind) -> bool {
        self.get(kind).is_some_and(|s| s.is_running())
    }

    pub fn shutdown(&self, kind: SchedulerKind) {
        if let Some(scheduler) = self.get(kind) {
            scheduler.shutdown();
        }
    }

    pub fn shutdown_all(&self) {
        let schedulers: Vec<_> = lock(&self.schedulers).values().cloned().collect();
        for scheduler in schedulers {
            scheduler.shutdown();
        }
    }

    fn create(&self, kind: SchedulerKind) -> Result<Arc<dyn Scheduler>, DispatchError> {
        let scheduler: Arc<dyn Scheduler> = match kind {
            SchedulerKind::Coroutine => CoroutineScheduler::start(self.coroutine_workers)?,
            SchedulerKind::EventLoop => EventLoopScheduler::start()?,
        };
        Ok(scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_twice_fails() {
        let context = SchedulerContext::new();
        context.start(SchedulerKind::EventLoop).unwrap();

        let second = context.start(SchedulerKind::EventLoop);
        assert!(matches!(
            second,
            Err(DispatchError::SchedulerExists {
                kind: SchedulerKind::EventLoop
            })
        ));
        context.shutdown_all();
    }

    #[test]
    fn test_restart_after_shutdown() {
        let context = SchedulerContext::new().with_coroutine_workers(1);
        context.start(SchedulerKind::Coroutine).unwrap();
        context.shutdown(SchedulerKind::Coroutine);

        assert!(!context.is_running(SchedulerKind::Coroutine));
        assert!(context.resolve(SchedulerKind::Coroutine).is_err());

        context.start(SchedulerKind::Coroutine).unwrap();
        assert!(context.is_running(SchedulerKind::Coroutine));
        context.shutdown_all();
    }

    #[test]
    fn test_lazy_start() {
        let strict = SchedulerContext::new();
        assert!(matches!(
            strict.resolve(SchedulerKind::EventLoop),
            Err(DispatchError::SchedulerUnavailable { .. })
        ));

        let lazy = SchedulerContext::new().with_lazy_start(true);
        let scheduler = lazy.resolve(SchedulerKind::EventLoop).unwrap();
        assert!(scheduler.is_running());

        lazy.shutdown_all();
        // a stopped scheduler is not restarted behind the caller's back
        assert!(lazy.resolve(SchedulerKind::EventLoop).is_err());
    }
}
