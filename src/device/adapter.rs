// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::SystemTime;

use super::callback::{BoundCallback, Validator};
use super::convert::ValueShape;
use crate::alarm::{Alarm, AlarmPolicy, AlarmStatus, Severity};
use crate::dispatch::{panic_message, Dispatcher};
use crate::errors::{DeviceError, DispatchError};
use crate::observability::messages::device::{
    CallbackFailed, ConversionFailed, EntryPointPanicked, UpdateDispatchFailed, ValueRejected,
};
use crate::observability::messages::StructuredLog;
use crate::record::{DbrBuffer, Direction, RecordType, ScanPolicy, Value};
use crate::traits::{DeviceSupport, EngineStatus, PutMode, RecordEngine, Snapshot};

thread_local! {
    // Addresses of the adapters whose entry point is running on this thread.
    static DELIVERING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Where a record is in its update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePhase {
    Idle,
    /// An engine entry point is running.
    Delivering,
    /// `on_update` callbacks are queued or running.
    AwaitingCallback,
}

/// Descriptive fields carried for display only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prec: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Behaviour options fixed when the record is built.
#[derive(Clone, Default)]
pub struct DeviceSettings {
    pub scan: ScanPolicy,
    pub initial_value: Option<Value>,
    pub initial_alarm: Option<Alarm>,
    pub on_update: Option<BoundCallback>,
    pub validate: Option<Validator>,
    pub always_update: bool,
    pub retain_timestamp: bool,
    pub autosave: bool,
    pub metadata: RecordMetadata,
}

struct RecordState {
    value: Value,
    alarm: Alarm,
    timestamp: SystemTime,
    defined: bool,
}

/// Decrements the outstanding-callback count when the completion hook runs
/// or is dropped unrun.
struct Outstanding(Arc<AtomicUsize>);

impl Outstanding {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(counter))
    }
}

impl Drop for Outstanding {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

struct DeliveringGuard<'a> {
    device: &'a RecordDevice,
}

impl<'a> DeliveringGuard<'a> {
    fn enter(device: &'a RecordDevice) -> Self {
        DELIVERING.with(|d| d.borrow_mut().push(device.address()));
        device.delivering.fetch_add(1, Ordering::AcqRel);
        Self { device }
    }
}

impl Drop for DeliveringGuard<'_> {
    fn drop(&mut self) {
        let address = self.device.address();
        DELIVERING.with(|d| {
            let mut stack = d.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|a| *a == address) {
                stack.remove(pos);
            }
        });
        self.device.delivering.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Device support for one soft record.
///
/// The engine drives it through [`DeviceSupport`]; application code uses the
/// inherent methods. Committed state sits behind a reader-writer lock, so
/// [`snapshot`](Self::snapshot) always sees a value together with the alarm
/// and timestamp written with it.
pub struct RecordDevice {
    name: String,
    shape: ValueShape,
    scan: ScanPolicy,
    state: RwLock<RecordState>,
    initial_alarm: Option<Alarm>,
    on_update: Option<BoundCallback>,
    validate: Option<Validator>,
    always_update: bool,
    retain_timestamp: bool,
    autosave: bool,
    metadata: RecordMetadata,
    alarm_policy: Arc<AlarmPolicy>,
    dispatcher: Dispatcher,
    engine: RwLock<Option<Weak<dyn RecordEngine>>>,
    delivering: AtomicUsize,
    outstanding: Arc<AtomicUsize>,
}

impl RecordDevice {
    pub fn new(
        name: impl Into<String>,
        shape: ValueShape,
        settings: DeviceSettings,
        alarm_policy: Arc<AlarmPolicy>,
        dispatcher: Dispatcher,
    ) -> Self {
        let defined = settings.initial_value.is_some();
        let value = settings
            .initial_value
            .unwrap_or_else(|| shape.default_value());
        Self {
            name: name.into(),
            scan: settings.scan,
            state: RwLock::new(RecordState {
                value,
                alarm: if defined { Alarm::NONE } else { Alarm::UNDEFINED },
                timestamp: SystemTime::now(),
                defined,
            }),
            shape,
            initial_alarm: settings.initial_alarm,
            on_update: settings.on_update,
            validate: settings.validate,
            always_update: settings.always_update,
            retain_timestamp: settings.retain_timestamp,
            autosave: settings.autosave,
            metadata: settings.metadata,
            alarm_policy,
            dispatcher,
            engine: RwLock::new(None),
            delivering: AtomicUsize::new(0),
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Connects the record to the engine it has been registered with.
    pub fn attach(&self, engine: &Arc<dyn RecordEngine>) {
        *self.engine.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::downgrade(engine));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> RecordType {
        self.shape.record_type
    }

    pub fn direction(&self) -> Direction {
        self.shape.record_type.direction()
    }

    pub fn shape(&self) -> &ValueShape {
        &self.shape
    }

    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    pub fn is_autosaved(&self) -> bool {
        self.autosave
    }

    pub fn scheduler(&self) -> Option<crate::traits::SchedulerKind> {
        self.on_update.as_ref().map(|callback| callback.scheduler)
    }

    pub fn phase(&self) -> DevicePhase {
        if self.delivering.load(Ordering::Acquire) > 0 {
            DevicePhase::Delivering
        } else if self.outstanding.load(Ordering::Acquire) > 0 {
            DevicePhase::AwaitingCallback
        } else {
            DevicePhase::Idle
        }
    }

    pub fn value(&self) -> Value {
        self.read_state().value.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.read_state();
        Snapshot {
            value: state.value.clone(),
            alarm: state.alarm,
            timestamp: state.timestamp,
        }
    }

    /// Updates an input record and asks the engine to scan it.
    pub fn publish(
        &self,
        value: impl Into<Value>,
        alarm: Alarm,
        timestamp: Option<SystemTime>,
    ) -> Result<(), DeviceError> {
        self.require(Direction::In, "publish")?;
        self.check_reentrant()?;
        let value = self.shape.coerce(&self.name, value.into())?;
        self.commit(value, alarm, Some(timestamp.unwrap_or_else(SystemTime::now)));
        self.request_scan()
    }

    pub fn publish_value(&self, value: impl Into<Value>) -> Result<(), DeviceError> {
        self.publish(value, Alarm::NONE, None)
    }

    /// Replaces the alarm of an input record, keeping its value.
    pub fn publish_alarm(
        &self,
        severity: Severity,
        status: AlarmStatus,
        timestamp: Option<SystemTime>,
    ) -> Result<(), DeviceError> {
        self.require(Direction::In, "publish_alarm")?;
        self.check_reentrant()?;
        {
            let mut state = self.write_state();
            state.alarm = Alarm::new(severity, status);
            state.timestamp = timestamp.unwrap_or_else(SystemTime::now);
        }
        self.request_scan()
    }

    /// Writes an output record.
    ///
    /// Before the engine is initialised the value simply becomes the initial
    /// value. Afterwards it goes through the engine like any external put;
    /// `process = false` skips validation and `on_update`.
    pub fn write(&self, value: impl Into<Value>, process: bool) -> Result<(), DeviceError> {
        self.require(Direction::Out, "write")?;
        self.check_reentrant()?;
        let value = self.shape.coerce(&self.name, value.into())?;

        let engine = match self.engine() {
            Some(engine) if engine.is_initialised() => engine,
            _ => {
                self.commit(value, Alarm::NONE, None);
                return Ok(());
            }
        };

        let mode = if process {
            PutMode::Process
        } else {
            PutMode::Silent
        };
        match engine.put_field(&self.name, &DbrBuffer::encode(&value), mode)? {
            EngineStatus::Ok => Ok(()),
            EngineStatus::Error => Err(DeviceError::Rejected {
                record: self.name.clone(),
            }),
        }
    }

    /// Replaces the value without validation, callbacks or an engine scan.
    pub fn restore(&self, value: Value) -> Result<(), DeviceError> {
        let value = self.shape.coerce(&self.name, value)?;
        self.commit(value, Alarm::NONE, None);
        Ok(())
    }

    fn engine(&self) -> Option<Arc<dyn RecordEngine>> {
        self.engine
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    fn request_scan(&self) -> Result<(), DeviceError> {
        if self.scan != ScanPolicy::IoIntr {
            return Ok(());
        }
        match self.engine() {
            Some(engine) if engine.is_initialised() => Ok(engine.request_scan(&self.name)?),
            _ => Ok(()),
        }
    }

    fn require(&self, direction: Direction, operation: &'static str) -> Result<(), DeviceError> {
        if self.direction() == direction {
            Ok(())
        } else {
            Err(DeviceError::WrongDirection {
                record: self.name.clone(),
                direction: self.direction().as_str(),
                operation,
            })
        }
    }

    fn check_reentrant(&self) -> Result<(), DeviceError> {
        let address = self.address();
        if DELIVERING.with(|d| d.borrow().contains(&address)) {
            return Err(DeviceError::Reentrant {
                record: self.name.clone(),
            });
        }
        Ok(())
    }

    fn address(&self) -> usize {
        self as *const Self as usize
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RecordState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RecordState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, value: Value, alarm: Alarm, timestamp: Option<SystemTime>) {
        let mut state = self.write_state();
        state.value = value;
        state.alarm = alarm;
        state.defined = true;
        match timestamp {
            Some(timestamp) => state.timestamp = timestamp,
            None if self.retain_timestamp => {}
            None => state.timestamp = SystemTime::now(),
        }
    }

    /// Runs an entry point with the delivering marker set, containing panics.
    fn guarded(&self, entry_point: &'static str, body: impl FnOnce() -> EngineStatus) -> EngineStatus {
        let _delivering = DeliveringGuard::enter(self);
        match catch_unwind(AssertUnwindSafe(body)) {
            Ok(status) => status,
            Err(payload) => {
                EntryPointPanicked {
                    record: &self.name,
                    entry_point,
                    message: &panic_message(payload.as_ref()),
                }
                .log();
                EngineStatus::Error
            }
        }
    }

    fn coerce_or_log(&self, value: Value) -> Option<Value> {
        match self.shape.coerce(&self.name, value) {
            Ok(value) => Some(value),
            Err(error) => {
                ConversionFailed {
                    record: &self.name,
                    error: &error,
                }
                .log();
                None
            }
        }
    }

    fn set_output(&self, value: Value, mode: PutMode) -> EngineStatus {
        let Some(value) = self.coerce_or_log(value) else {
            return EngineStatus::Error;
        };

        {
            let state = self.read_state();
            if !self.always_update && state.defined && state.value == value {
                return EngineStatus::Ok;
            }
        }

        if mode == PutMode::Process {
            if let Some(validate) = &self.validate {
                if !validate(&self.name, &value) {
                    ValueRejected {
                        record: &self.name,
                        value: &value,
                    }
                    .log();
                    return EngineStatus::Error;
                }
            }
        }

        self.commit(value.clone(), Alarm::NONE, None);

        match (&self.on_update, mode) {
            (Some(callback), PutMode::Process) => match self.dispatch_update(callback, value) {
                Ok(()) => EngineStatus::Ok,
                Err(error) => {
                    UpdateDispatchFailed {
                        record: &self.name,
                        error: &error,
                    }
                    .log();
                    EngineStatus::Error
                }
            },
            _ => EngineStatus::Ok,
        }
    }

    fn dispatch_update(&self, callback: &BoundCallback, value: Value) -> Result<(), DispatchError> {
        let handler = Arc::clone(&callback.handler);
        let scheduler = callback.scheduler;
        let record = self.name.clone();
        let failed_record = self.name.clone();
        let outstanding = Outstanding::acquire(&self.outstanding);

        self.dispatcher.dispatch(
            scheduler,
            move || async move { handler.on_update(&record, value).await },
            move |result| {
                let _outstanding = outstanding;
                if let Err(error) = result {
                    CallbackFailed {
                        record: &failed_record,
                        scheduler,
                        error: &error,
                    }
                    .log();
                }
            },
        )?;
        Ok(())
    }
}

impl DeviceSupport for RecordDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn record_type(&self) -> RecordType {
        self.shape.record_type
    }

    fn scan_policy(&self) -> ScanPolicy {
        self.scan
    }

    fn init_record(&self) -> EngineStatus {
        self.guarded("init_record", || {
            let mut state = self.write_state();
            if state.defined {
                state.alarm = self.initial_alarm.unwrap_or(Alarm::NONE);
            } else {
                state.alarm = Alarm::UNDEFINED;
            }
            EngineStatus::Ok
        })
    }

    fn get(&self) -> Snapshot {
        self.snapshot()
    }

    fn set(&self, value: Value, mode: PutMode) -> EngineStatus {
        self.guarded("set", || match self.direction() {
            Direction::Out => self.set_output(value, mode),
            Direction::In => match self.coerce_or_log(value) {
                Some(value) => {
                    self.commit(value, Alarm::NONE, None);
                    EngineStatus::Ok
                }
                None => EngineStatus::Error,
            },
        })
    }

    fn set_alarm(&self, severity: Severity, status: AlarmStatus) -> EngineStatus {
        self.guarded("set_alarm", || {
            let mut state = self.write_state();
            state.alarm = self
                .alarm_policy
                .merge(state.alarm, Alarm::new(severity, status));
            if !self.retain_timestamp {
                state.timestamp = SystemTime::now();
            }
            EngineStatus::Ok
        })
    }
}
