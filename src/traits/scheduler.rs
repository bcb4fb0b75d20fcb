use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use crate::errors::DispatchError;

pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Work handed across schedulers. The closure runs on the target scheduler's
/// thread and the future it returns is driven there.
pub type Job = Box<dyn FnOnce() -> TaskFuture + Send + 'static>;

/// The two concurrency models a callback can be written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    /// Cooperative tasks on a multi-thread runtime.
    Coroutine,
    /// A single thread running a local event loop.
    EventLoop,
}

impl SchedulerKind {
    pub const ALL: [SchedulerKind; 2] = [SchedulerKind::Coroutine, SchedulerKind::EventLoop];

    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerKind::Coroutine => "coroutine",
            SchedulerKind::EventLoop => "event_loop",
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchedulerKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| format!("unknown scheduler '{}'", s))
    }
}

/// A running scheduler that accepts work from any thread.
pub trait Scheduler: Send + Sync {
    fn kind(&self) -> SchedulerKind;

    /// Queues a job. Jobs start in submission order.
    fn submit(&self, job: Job) -> Result<(), DispatchError>;

    /// Queues native work, ordered with submitted jobs.
    fn spawn(&self, task: TaskFuture) -> Result<(), DispatchError>;

    fn is_running(&self) -> bool;

    /// Stops accepting work and tears the scheduler down. Idempotent.
    fn shutdown(&self);
}
