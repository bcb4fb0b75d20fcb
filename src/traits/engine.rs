use std::sync::Arc;

use crate::alarm::Alarm;
use crate::errors::EngineError;
use crate::record::DbrBuffer;
use crate::traits::device::{DeviceSupport, EngineStatus, PutMode, Snapshot};

/// A synchronous record-processing engine that drives device support.
///
/// Each call that reaches a record's [`DeviceSupport`] holds that record's
/// lock for the duration of the call.
pub trait RecordEngine: Send + Sync {
    fn register(&self, name: &str, support: Arc<dyn DeviceSupport>) -> Result<(), EngineError>;

    fn is_initialised(&self) -> bool;

    /// Asks the engine to process an I/O interrupt record.
    fn request_scan(&self, name: &str) -> Result<(), EngineError>;

    /// Writes an engine-native buffer into a record.
    fn put_field(
        &self,
        name: &str,
        buffer: &DbrBuffer,
        mode: PutMode,
    ) -> Result<EngineStatus, EngineError>;

    fn raise_alarm(&self, name: &str, alarm: Alarm) -> Result<EngineStatus, EngineError>;

    fn process(&self, name: &str) -> Result<EngineStatus, EngineError>;

    /// The engine's copy of the record as of its last processing.
    fn read(&self, name: &str) -> Result<Snapshot, EngineError>;

    fn names(&self) -> Vec<String>;
}
