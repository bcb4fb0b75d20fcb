// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::sync::Arc;

use crate::alarm::{Alarm, AlarmStatus, Severity};
use crate::device::{self, Validator};
use crate::record::{ElementType, RecordType, ScanPolicy, Value};
use crate::traits::{SchedulerKind, UpdateHandler};

/// Declarative description of a record to build.
///
/// ```rust
/// use softrec::builder::RecordSpec;
/// use softrec::traits::SchedulerKind;
///
/// let spec = RecordSpec::ao_out("SETPOINT")
///     .initial_value(5.0)
///     .drive_limits(0.0, 100.0)
///     .on_update_fn(|value| async move {
///         println!("new setpoint {}", value);
///         Ok(())
///     })
///     .scheduler(SchedulerKind::Coroutine);
/// assert_eq!(spec.name(), "SETPOINT");
/// ```
#[derive(Clone)]
pub struct RecordSpec {
    pub(crate) record_type: RecordType,
    pub(crate) name: String,
    pub(crate) initial_value: Option<Value>,
    pub(crate) initial_alarm: Option<Alarm>,
    pub(crate) drive_limits: Option<(f64, f64)>,
    pub(crate) length: Option<usize>,
    pub(crate) element_type: Option<ElementType>,
    pub(crate) options: Vec<String>,
    pub(crate) on_update: Option<Arc<dyn UpdateHandler>>,
    pub(crate) validate: Option<Validator>,
    pub(crate) always_update: bool,
    pub(crate) scan: Option<ScanPolicy>,
    pub(crate) scheduler: Option<SchedulerKind>,
    pub(crate) autosave: bool,
    pub(crate) retain_timestamp: bool,
    pub(crate) egu: Option<String>,
    pub(crate) prec: Option<u16>,
    pub(crate) description: Option<String>,
}

impl RecordSpec {
    pub fn new(record_type: RecordType, name: impl Into<String>) -> Self {
        Self {
            record_type,
            name: name.into(),
            initial_value: None,
            initial_alarm: None,
            drive_limits: None,
            length: None,
            element_type: None,
            options: Vec::new(),
            on_update: None,
            validate: None,
            always_update: false,
            scan: None,
            scheduler: None,
            autosave: false,
            retain_timestamp: false,
            egu: None,
            prec: None,
            description: None,
        }
    }

    pub fn ai_in(name: impl Into<String>) -> Self {
        Self::new(RecordType::Ai, name)
    }

    pub fn ao_out(name: impl Into<String>) -> Self {
        Self::new(RecordType::Ao, name)
    }

    /// Use [`options`](Self::options) to name the zero and one states.
    pub fn bool_in(name: impl Into<String>) -> Self {
        Self::new(RecordType::Bi, name)
    }

    pub fn bool_out(name: impl Into<String>) -> Self {
        Self::new(RecordType::Bo, name)
    }

    pub fn long_in(name: impl Into<String>) -> Self {
        Self::new(RecordType::Longin, name)
    }

    pub fn long_out(name: impl Into<String>) -> Self {
        Self::new(RecordType::Longout, name)
    }

    pub fn mbb_in<S: AsRef<str>>(name: impl Into<String>, options: impl IntoIterator<Item = S>) -> Self {
        Self::new(RecordType::Mbbi, name).options(options)
    }

    pub fn mbb_out<S: AsRef<str>>(name: impl Into<String>, options: impl IntoIterator<Item = S>) -> Self {
        Self::new(RecordType::Mbbo, name).options(options)
    }

    pub fn string_in(name: impl Into<String>) -> Self {
        Self::new(RecordType::Stringin, name)
    }

    pub fn string_out(name: impl Into<String>) -> Self {
        Self::new(RecordType::Stringout, name)
    }

    pub fn waveform_in(name: impl Into<String>, length: usize) -> Self {
        Self::new(RecordType::Waveform, name).length(length)
    }

    pub fn waveform_out(name: impl Into<String>, length: usize) -> Self {
        Self::new(RecordType::WaveformOut, name).length(length)
    }

    pub fn long_string_in(name: impl Into<String>) -> Self {
        Self::new(RecordType::LongStringin, name)
    }

    pub fn long_string_out(name: impl Into<String>) -> Self {
        Self::new(RecordType::LongStringout, name)
    }

    /// A binary output that runs its callback on every write, changed or not.
    pub fn action(name: impl Into<String>) -> Self {
        Self::bool_out(name).always_update(true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Alarm the record reports after engine initialisation.
    pub fn alarm(mut self, severity: Severity, status: AlarmStatus) -> Self {
        self.initial_alarm = Some(Alarm::new(severity, status));
        self
    }

    pub fn drive_limits(mut self, low: f64, high: f64) -> Self {
        self.drive_limits = Some((low, high));
        self
    }

    /// Element capacity of an array, or byte capacity of a long string.
    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn element_type(mut self, element: ElementType) -> Self {
        self.element_type = Some(element);
        self
    }

    pub fn options<S: AsRef<str>>(mut self, options: impl IntoIterator<Item = S>) -> Self {
        self.options = options.into_iter().map(|o| o.as_ref().to_string()).collect();
        self
    }

    pub fn on_update(mut self, handler: Arc<dyn UpdateHandler>) -> Self {
        self.on_update = Some(handler);
        self
    }

    pub fn on_update_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_update(device::on_update(f))
    }

    /// Like [`on_update_fn`](Self::on_update_fn), also passing the full record name.
    pub fn on_update_name<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_update(device::on_update_name(f))
    }

    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Value) -> bool + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(f));
        self
    }

    pub fn always_update(mut self, always_update: bool) -> Self {
        self.always_update = always_update;
        self
    }

    pub fn scan(mut self, scan: ScanPolicy) -> Self {
        self.scan = Some(scan);
        self
    }

    pub fn scheduler(mut self, kind: SchedulerKind) -> Self {
        self.scheduler = Some(kind);
        self
    }

    pub fn autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn retain_timestamp(mut self, retain: bool) -> Self {
        self.retain_timestamp = retain;
        self
    }

    pub fn egu(mut self, egu: impl Into<String>) -> Self {
        self.egu = Some(egu.into());
        self
    }

    pub fn prec(mut self, prec: u16) -> Self {
        self.prec = Some(prec);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
