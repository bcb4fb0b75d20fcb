// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::RecordSpec;
use crate::alarm::AlarmPolicy;
use crate::config::consts::{DEFAULT_LONG_STRING_LENGTH, DEFAULT_SEPARATOR, MAX_MBB_OPTIONS};
use crate::config::RecordConfig;
use crate::device::{BoundCallback, DeviceSettings, RecordDevice, RecordMetadata, ValueShape};
use crate::dispatch::Dispatcher;
use crate::errors::BuildError;
use crate::observability::messages::lifecycle::RecordBuilt;
use crate::observability::messages::StructuredLog;
use crate::record::{DataKind, Direction, ElementType, RecordType, ScanPolicy, Value};
use crate::scheduler::current_kind;
use crate::traits::{DeviceSupport, RecordEngine, SchedulerKind};

/// Builds records and registers them with an engine.
///
/// ```rust
/// use std::sync::Arc;
/// use softrec::builder::{RecordBuilder, RecordSpec};
/// use softrec::dispatch::Dispatcher;
/// use softrec::engine::SoftEngine;
/// use softrec::scheduler::SchedulerContext;
/// use softrec::traits::RecordEngine;
///
/// let engine: Arc<dyn RecordEngine> = SoftEngine::new();
/// let dispatcher = Dispatcher::new(Arc::new(SchedulerContext::new()));
/// let builder = RecordBuilder::new("TS", engine, dispatcher);
///
/// let gain = builder.build(RecordSpec::ai_in("GAIN").initial_value(2.0)).unwrap();
/// assert_eq!(gain.name(), "TS:GAIN");
/// assert!(builder.lookup("GAIN").is_some());
/// ```
pub struct RecordBuilder {
    prefix: String,
    separator: String,
    engine: Arc<dyn RecordEngine>,
    dispatcher: Dispatcher,
    alarm_policy: Arc<AlarmPolicy>,
    default_scheduler: SchedulerKind,
    records: RwLock<BTreeMap<String, Arc<RecordDevice>>>,
}

impl RecordBuilder {
    pub fn new(
        prefix: impl Into<String>,
        engine: Arc<dyn RecordEngine>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            separator: DEFAULT_SEPARATOR.to_string(),
            engine,
            dispatcher,
            alarm_policy: Arc::new(AlarmPolicy::default()),
            default_scheduler: SchedulerKind::Coroutine,
            records: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_alarm_policy(mut self, policy: Arc<AlarmPolicy>) -> Self {
        self.alarm_policy = policy;
        self
    }

    /// Scheduler used for callbacks when neither the `RecordSpec` nor the building
    /// thread names one.
    pub fn with_default_scheduler(mut self, kind: SchedulerKind) -> Self {
        self.default_scheduler = kind;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn full_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}{}{}", self.prefix, self.separator, name)
        }
    }

    pub fn build(&self, spec: RecordSpec) -> Result<Arc<RecordDevice>, BuildError> {
        let full_name = self.full_name(&spec.name);
        if self.engine.is_initialised() {
            return Err(BuildError::TooLate(full_name));
        }

        let direction = spec.record_type.direction();
        if direction == Direction::In && (spec.on_update.is_some() || spec.validate.is_some()) {
            return Err(BuildError::CallbackOnInputRecord(full_name));
        }
        if spec.options.len() > MAX_MBB_OPTIONS {
            return Err(invalid(
                &full_name,
                format!(
                    "{} options given, at most {} enum values are allowed",
                    spec.options.len(),
                    MAX_MBB_OPTIONS
                ),
            ));
        }

        let shape = shape_for(&full_name, &spec)?;
        let initial_value = spec
            .initial_value
            .map(|value| shape.coerce(&full_name, value))
            .transpose()?;

        let scheduler = spec
            .scheduler
            .or_else(current_kind)
            .unwrap_or(self.default_scheduler);
        let on_update = spec
            .on_update
            .map(|handler| BoundCallback { handler, scheduler });

        let settings = DeviceSettings {
            scan: spec.scan.unwrap_or(match direction {
                Direction::In => ScanPolicy::IoIntr,
                Direction::Out => ScanPolicy::Passive,
            }),
            initial_value,
            initial_alarm: spec.initial_alarm,
            on_update,
            validate: spec.validate,
            always_update: spec.always_update,
            retain_timestamp: spec.retain_timestamp,
            autosave: spec.autosave,
            metadata: RecordMetadata {
                description: spec.description,
                egu: spec.egu,
                prec: spec.prec,
                options: spec.options,
            },
        };

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&full_name) {
            return Err(BuildError::Duplicate(full_name));
        }

        let device = Arc::new(RecordDevice::new(
            full_name.clone(),
            shape,
            settings,
            Arc::clone(&self.alarm_policy),
            self.dispatcher.clone(),
        ));
        let support: Arc<dyn DeviceSupport> = device.clone();
        self.engine.register(&full_name, support)?;
        device.attach(&self.engine);

        RecordBuilt {
            name: &full_name,
            record_type: device.record_type(),
            scheduler: device.scheduler(),
        }
        .log();

        records.insert(full_name, Arc::clone(&device));
        Ok(device)
    }

    pub fn build_from_config(&self, config: &RecordConfig) -> Result<Arc<RecordDevice>, BuildError> {
        self.build(RecordSpec::try_from(config)?)
    }

    /// Every record built so far, ordered by full name.
    pub fn records(&self) -> Vec<Arc<RecordDevice>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Finds a record by its full name, or by its name without the prefix.
    pub fn lookup(&self, name: &str) -> Option<Arc<RecordDevice>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(name)
            .or_else(|| records.get(&self.full_name(name)))
            .cloned()
    }
}

fn shape_for(record: &str, spec: &RecordSpec) -> Result<ValueShape, BuildError> {
    let record_type = spec.record_type;

    if record_type.is_long_string() {
        let length = match (spec.length, &spec.initial_value) {
            (Some(length), _) => length,
            (None, Some(Value::String(text))) => text.len() + 1,
            (None, _) => DEFAULT_LONG_STRING_LENGTH,
        };
        if length == 0 {
            return Err(invalid(record, "long strings cannot be of zero length"));
        }
        return Ok(ValueShape::long_string(record_type, length));
    }

    match record_type.data_kind() {
        DataKind::Array => {
            let (element_hint, length_hint) = match &spec.initial_value {
                Some(Value::Array(array)) => (Some(array.element_type()), Some(array.len())),
                Some(Value::String(text)) => (Some(ElementType::Char), Some(text.len() + 1)),
                Some(Value::Long(_)) => (Some(ElementType::Long), Some(1)),
                Some(Value::Enum(_)) => (Some(ElementType::UShort), Some(1)),
                Some(Value::Double(_)) => (Some(ElementType::Double), Some(1)),
                None => (None, None),
            };
            let element = spec
                .element_type
                .or(element_hint)
                .unwrap_or(ElementType::Double);
            let length = spec
                .length
                .or(length_hint)
                .ok_or_else(|| invalid(record, "arrays need either a length or an initial value"))?;
            if length == 0 {
                return Err(invalid(record, "arrays cannot be of zero length"));
            }
            Ok(ValueShape::array(record_type, element, length))
        }
        _ => {
            let shape = ValueShape::scalar(record_type);
            Ok(match (spec.drive_limits, record_type) {
                (Some((low, high)), RecordType::Ao | RecordType::Longout) => {
                    shape.with_drive_limits(low, high)
                }
                _ => shape,
            })
        }
    }
}

fn invalid(record: &str, reason: impl Into<String>) -> BuildError {
    BuildError::InvalidSpec {
        record: record.to_string(),
        reason: reason.into(),
    }
}
