// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;

use super::scanner::PeriodicScanner;
use crate::alarm::Alarm;
use crate::errors::EngineError;
use crate::observability::messages::engine::{
    EngineInitialised, EngineStopped, InitRecordFailed, RecordRegistered,
    ScanThreadFailed,
};
use crate::observability::messages::StructuredLog;
use crate::record::{DbrBuffer, ScanPolicy};
use crate::traits::{DeviceSupport, EngineStatus, PutMode, RecordEngine, Snapshot};

struct EngineRecord {
    support: Arc<dyn DeviceSupport>,
    fields: Mutex<EngineFields>,
}

#[derive(Default)]
struct EngineFields {
    last: Option<Snapshot>,
    process_count: u64,
}

impl EngineRecord {
    fn lock(&self) -> MutexGuard<'_, EngineFields> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies the device's committed state into the engine's fields.
    fn process(&self, fields: &mut EngineFields) {
        fields.last = Some(self.support.get());
        fields.process_count += 1;
    }
}

/// The in-process record engine.
pub struct SoftEngine {
    records: RwLock<BTreeMap<String, Arc<EngineRecord>>>,
    initialised: AtomicBool,
    scanners: Mutex<Vec<PeriodicScanner>>,
    this: Weak<SoftEngine>,
}

impl SoftEngine {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            records: RwLock::new(BTreeMap::new()),
            initialised: AtomicBool::new(false),
            scanners: Mutex::new(Vec::new()),
            this: this.clone(),
        })
    }

    /// Initialises every record, processes each once and starts the periodic
    /// scan threads. Records can no longer be registered afterwards.
    pub fn init(&self) -> Result<(), EngineError> {
        if self.initialised.swap(true, Ordering::AcqRel) {
            return Err(EngineError::AlreadyInitialised);
        }

        let records = self.snapshot_records();
        for (name, record) in &records {
            let mut fields = record.lock();
            if !record.support.init_record().is_ok() {
                InitRecordFailed { record: name }.log();
            }
            record.process(&mut fields);
        }

        let mut periodic: BTreeMap<Duration, Vec<String>> = BTreeMap::new();
        for (name, record) in &records {
            if let ScanPolicy::Periodic(period) = record.support.scan_policy() {
                periodic.entry(period).or_default().push(name.clone());
            }
        }

        let mut scanners = self
            .scanners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (period, names) in periodic {
            let count = names.len();
            match PeriodicScanner::start(period, names, self.this.clone()) {
                Ok(scanner) => scanners.push(scanner),
                Err(e) => ScanThreadFailed {
                    period,
                    records: count,
                    error: &e.to_string(),
                }
                .log(),
            }
        }

        EngineInitialised {
            records: records.len(),
            scan_threads: scanners.len(),
        }
        .log();
        Ok(())
    }

    /// Stops the scan threads. Records stay readable and writable.
    pub fn shutdown(&self) {
        let scanners: Vec<_> = self
            .scanners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let count = scanners.len();
        drop(scanners);
        EngineStopped {
            scan_threads: count,
        }
        .log();
    }

    pub fn support(&self, name: &str) -> Option<Arc<dyn DeviceSupport>> {
        self.find(name).map(|record| Arc::clone(&record.support))
    }

    /// How many times the engine has processed `name`.
    pub fn process_count(&self, name: &str) -> Result<u64, EngineError> {
        self.with_record(name, |_, fields| fields.process_count)
    }

    fn snapshot_records(&self) -> Vec<(String, Arc<EngineRecord>)> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, record)| (name.clone(), Arc::clone(record)))
            .collect()
    }

    fn find(&self, name: &str) -> Option<Arc<EngineRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Runs `f` with the record's lock held.
    fn with_record<R>(
        &self,
        name: &str,
        f: impl FnOnce(&EngineRecord, &mut EngineFields) -> R,
    ) -> Result<R, EngineError> {
        let record = self
            .find(name)
            .ok_or_else(|| EngineError::UnknownRecord(name.to_string()))?;
        let mut fields = record.lock();
        Ok(f(&record, &mut fields))
    }
}

impl RecordEngine for SoftEngine {
    fn register(&self, name: &str, support: Arc<dyn DeviceSupport>) -> Result<(), EngineError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if self.is_initialised() {
            return Err(EngineError::AlreadyInitialised);
        }
        if records.contains_key(name) {
            return Err(EngineError::DuplicateRecord(name.to_string()));
        }
        RecordRegistered {
            name,
            record_type: support.record_type(),
        }
        .log();
        records.insert(
            name.to_string(),
            Arc::new(EngineRecord {
                support,
                fields: Mutex::new(EngineFields::default()),
            }),
        );
        Ok(())
    }

    fn is_initialised(&self) -> bool {
        self.initialised.load(Ordering::Acquire)
    }

    fn request_scan(&self, name: &str) -> Result<(), EngineError> {
        if !self.is_initialised() {
            return Err(EngineError::NotInitialised);
        }
        self.with_record(name, |record, fields| {
            if record.support.scan_policy() == ScanPolicy::IoIntr {
                record.process(fields);
            }
        })
    }

    fn put_field(
        &self,
        name: &str,
        buffer: &DbrBuffer,
        mode: PutMode,
    ) -> Result<EngineStatus, EngineError> {
        let value = buffer.decode()?;
        self.with_record(name, |record, fields| {
            let status = record.support.set(value, mode);
            record.process(fields);
            status
        })
    }

    fn raise_alarm(&self, name: &str, alarm: Alarm) -> Result<EngineStatus, EngineError> {
        self.with_record(name, |record, fields| {
            let status = record.support.set_alarm(alarm.severity, alarm.status);
            record.process(fields);
            status
        })
    }

    fn process(&self, name: &str) -> Result<EngineStatus, EngineError> {
        self.with_record(name, |record, fields| {
            record.process(fields);
            EngineStatus::Ok
        })
    }

    fn read(&self, name: &str) -> Result<Snapshot, EngineError> {
        self.with_record(name, |record, fields| match &fields.last {
            Some(snapshot) => snapshot.clone(),
            None => record.support.get(),
        })
    }

    fn names(&self) -> Vec<String> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
