// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::thread;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::current::{current_kind, mark_current};
use super::{lock, RunningGuard};
use crate::errors::DispatchError;
use crate::observability::messages::dispatch::{SchedulerStarted, SchedulerStopped};
use crate::observability::messages::StructuredLog;
use crate::traits::{Job, Scheduler, SchedulerKind, TaskFuture};

const KIND: SchedulerKind = SchedulerKind::Coroutine;

/// Time given to running tasks to finish once the scheduler stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Cooperative tasks on a dedicated multi-thread tokio runtime.
///
/// An intake thread pulls jobs off the queue and spawns them one at a time,
/// waiting for each to finish its first poll before spawning the next, so jobs
/// start in submission order even though they may run on different workers.
pub struct CoroutineScheduler {
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    running: Arc<AtomicBool>,
    intake: Mutex<Option<thread::JoinHandle<()>>>,
    workers: usize,
}

impl CoroutineScheduler {
    pub fn start(workers: usize) -> Result<Arc<Self>, DispatchError> {
        let workers = workers.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("softrec-coroutine")
            .on_thread_start(|| mark_current(KIND))
            .enable_all()
            .build()
            .map_err(|e| DispatchError::StartFailed {
                kind: KIND,
                reason: e.to_string(),
            })?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(true));
        let guard = RunningGuard(Arc::clone(&running));

        let intake = thread::Builder::new()
            .name("softrec-coroutine-intake".to_string())
            .spawn(move || {
                mark_current(KIND);
                let _guard = guard;
                runtime.block_on(intake_loop(receiver));
                runtime.shutdown_timeout(SHUTDOWN_GRACE);
            })
            .map_err(|e| DispatchError::StartFailed {
                kind: KIND,
                reason: e.to_string(),
            })?;

        SchedulerStarted {
            kind: KIND,
            threads: workers,
        }
        .log();

        Ok(Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            running,
            intake: Mutex::new(Some(intake)),
            workers,
        }))
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

async fn intake_loop(mut receiver: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = receiver.recv().await {
        let (started_tx, started_rx) = oneshot::channel();
        tokio::spawn(async move {
            StartSignal {
                task: job(),
                started: Some(started_tx),
            }
            .await
        });
        let _ = started_rx.await;
    }
}

/// Signals once the wrapped task has been polled for the first time.
struct StartSignal {
    task: TaskFuture,
    started: Option<oneshot::Sender<()>>,
}

impl Future for StartSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let poll = self.task.as_mut().poll(cx);
        if let Some(started) = self.started.take() {
            let _ = started.send(());
        }
        poll
    }
}

impl Scheduler for CoroutineScheduler {
    fn kind(&self) -> SchedulerKind {
        KIND
    }

    fn submit(&self, job: Job) -> Result<(), DispatchError> {
        if !self.is_running() {
            return Err(DispatchError::SchedulerUnavailable { kind: KIND });
        }
        match lock(&self.sender).as_ref() {
            Some(sender) => sender
                .send(job)
                .map_err(|_| DispatchError::SchedulerUnavailable { kind: KIND }),
            None => Err(DispatchError::SchedulerUnavailable { kind: KIND }),
        }
    }

    fn spawn(&self, task: TaskFuture) -> Result<(), DispatchError> {
        self.submit(Box::new(move || task))
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn shutdown(&self) {
        let sender = lock(&self.sender).take();
        if sender.is_none() {
            return;
        }
        self.running.store(false, Ordering::Release);
        drop(sender);

        let intake = lock(&self.intake).take();
        // A worker cannot wait for its own runtime to stop.
        if current_kind() != Some(KIND) {
            if let Some(handle) = intake {
                let _ = handle.join();
            }
        }
        SchedulerStopped { kind: KIND }.log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;

    #[test]
    fn test_jobs_run_on_tagged_threads() {
        let scheduler = CoroutineScheduler::start(2).unwrap();
        let (tx, rx) = std_mpsc::channel();
        scheduler
            .submit(Box::new(move || {
                Box::pin(async move {
                    tx.send(current_kind()).unwrap();
                })
            }))
            .unwrap();

        assert_eq!(rx.recv().unwrap(), Some(SchedulerKind::Coroutine));
        scheduler.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let scheduler = CoroutineScheduler::start(1).unwrap();
        scheduler.shutdown();
        assert!(!scheduler.is_running());

        let result = scheduler.spawn(Box::pin(async {}));
        assert!(matches!(
            result,
            Err(DispatchError::SchedulerUnavailable {
                kind: SchedulerKind::Coroutine
            })
        ));
        // second shutdown is a no-op
        scheduler.shutdown();
    }

    #[test]
    fn test_jobs_start_in_submission_order() {
        let scheduler = CoroutineScheduler::start(4).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = std_mpsc::channel();

        for i in 0..50 {
            let order = Arc::clone(&order);
            let done_tx = done_tx.clone();
            scheduler
                .submit(Box::new(move || {
                    Box::pin(async move {
                        order.lock().unwrap().push(i);
                        done_tx.send(()).unwrap();
                    })
                }))
                .unwrap();
        }
        for _ in 0..50 {
            done_rx.recv().unwrap();
        }

        let order = order.lock().unwrap().clone();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
        scheduler.shutdown();
    }
}
