// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread;

use tokio::sync::mpsc;
use tokio::task::LocalSet;

use super::current::{current_kind, mark_current};
use super::{lock, RunningGuard};
use crate::errors::DispatchError;
use crate::observability::messages::dispatch::{SchedulerStarted, SchedulerStopped};
use crate::observability::messages::StructuredLog;
use crate::traits::{Job, Scheduler, SchedulerKind, TaskFuture};

const KIND: SchedulerKind = SchedulerKind::EventLoop;

/// A single thread running a current-thread runtime and a `LocalSet`.
///
/// Submitted jobs become local tasks, which the loop polls in the order they
/// were spawned. Tasks still pending when the loop stops are dropped.
pub struct EventLoopScheduler {
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    running: Arc<AtomicBool>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl EventLoopScheduler {
    pub fn start() -> Result<Arc<Self>, DispatchError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), String>>();
        let running = Arc::new(AtomicBool::new(true));
        let guard = RunningGuard(Arc::clone(&running));

        let handle = thread::Builder::new()
            .name("softrec-event-loop".to_string())
            .spawn(move || {
                let _guard = guard;
                mark_current(KIND);
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let local = LocalSet::new();
                local.block_on(&runtime, event_loop(receiver));
            })
            .map_err(|e| DispatchError::StartFailed {
                kind: KIND,
                reason: e.to_string(),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => {
                let _ = handle.join();
                return Err(DispatchError::StartFailed { kind: KIND, reason });
            }
            Err(_) => {
                let _ = handle.join();
                return Err(DispatchError::StartFailed {
                    kind: KIND,
                    reason: "event loop thread exited during start".to_string(),
                });
            }
        }

        SchedulerStarted {
            kind: KIND,
            threads: 1,
        }
        .log();

        Ok(Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            running,
            thread: Mutex::new(Some(handle)),
        }))
    }
}

async fn event_loop(mut receiver: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = receiver.recv().await {
        tokio::task::spawn_local(job());
    }
}

impl Scheduler for EventLoopScheduler {
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

        let handle = lock(&self.thread).take();
        if current_kind() != Some(KIND) {
            if let Some(handle) = handle {
                let _ = handle.join();
            }
        }
        SchedulerStopped { kind: KIND }.log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_jobs_share_one_thread() {
        let scheduler = EventLoopScheduler::start().unwrap();
        let (tx, rx) = std_mpsc::channel();

        for _ in 0..5 {
            let tx = tx.clone();
            scheduler
                .submit(Box::new(move || {
                    Box::pin(async move {
                        tx.send((thread::current().id(), current_kind())).unwrap();
                    })
                }))
                .unwrap();
        }

        let seen: Vec<_> = (0..5).map(|_| rx.recv().unwrap()).collect();
        assert!(seen.iter().all(|(id, _)| *id == seen[0].0));
        assert!(seen
            .iter()
            .all(|(_, kind)| *kind == Some(SchedulerKind::EventLoop)));
        scheduler.shutdown();
    }

    #[test]
    fn test_native_work_interleaves_in_order() {
        let scheduler = EventLoopScheduler::start().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = std_mpsc::channel();

        for i in 0..10 {
            let order = Arc::clone(&order);
            let done_tx = done_tx.clone();
            let work = async move {
                order.lock().unwrap().push(i);
                done_tx.send(()).unwrap();
            };
            if i % 2 == 0 {
                scheduler.spawn(Box::pin(work)).unwrap();
            } else {
                scheduler.submit(Box::new(move || Box::pin(work))).unwrap();
            }
        }
        for _ in 0..10 {
            done_rx.recv().unwrap();
        }

        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
        scheduler.shutdown();
        assert!(scheduler.submit(Box::new(|| Box::pin(async {}))).is_err());
    }
}
