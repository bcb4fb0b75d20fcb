pub mod device;
pub mod engine;
pub mod handler;
pub mod scheduler;

pub use device::{DeviceSupport, EngineStatus, PutMode, Snapshot};
pub use engine::RecordEngine;
pub use handler::UpdateHandler;
pub use scheduler::{Job, Scheduler, SchedulerKind, TaskFuture};
