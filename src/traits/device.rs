use std::time::SystemTime;

use crate::alarm::{Alarm, AlarmStatus, Severity};
use crate::record::{RecordType, ScanPolicy, Value};

/// Outcome reported back to the record engine from a device-support entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Ok,
    Error,
}

impl EngineStatus {
    pub fn is_ok(self) -> bool {
        self == EngineStatus::Ok
    }
}

/// Whether a put should run the record's processing (validation and `on_update`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PutMode {
    #[default]
    Process,
    Silent,
}

/// Committed state of a record as the engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub value: Value,
    pub alarm: Alarm,
    pub timestamp: SystemTime,
}

impl Snapshot {
    pub fn severity(&self) -> Severity {
        self.alarm.severity
    }

    pub fn status(&self) -> AlarmStatus {
        self.alarm.status
    }
}

/// The device-support boundary called by the record engine.
///
/// Every method runs with the engine's per-record lock held. Implementations
/// must return promptly, must not wait on other schedulers and must never
/// unwind into the caller.
pub trait DeviceSupport: Send + Sync {
    fn name(&self) -> &str;

    fn record_type(&self) -> RecordType;

    fn scan_policy(&self) -> ScanPolicy;

    /// Called once when the engine initialises.
    fn init_record(&self) -> EngineStatus;

    fn get(&self) -> Snapshot;

    fn set(&self, value: Value, mode: PutMode) -> EngineStatus;

    fn set_alarm(&self, severity: Severity, status: AlarmStatus) -> EngineStatus;
}
