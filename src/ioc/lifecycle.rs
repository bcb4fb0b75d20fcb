// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use super::autosave::Autosave;
use super::shell::Shell;
use crate::alarm::AlarmPolicy;
use crate::builder::RecordBuilder;
use crate::config::{load_and_validate_config, validate_config, IocConfig};
use crate::dispatch::Dispatcher;
use crate::engine::SoftEngine;
use crate::errors::{ConfigError, IocError};
use crate::observability::messages::lifecycle::{
    AutosaveFailed, ConfigLoaded, IocShutdown, IocStarting,
};
use crate::observability::messages::StructuredLog;
use crate::scheduler::SchedulerContext;
use crate::traits::{RecordEngine, SchedulerKind};

struct AutosaveTask {
    autosave: Arc<Autosave>,
    token: CancellationToken,
}

/// A soft IOC: schedulers, dispatcher, engine, records and autosave.
///
/// Records from the configuration are built by [`Ioc::new`]; more can be
/// added through [`builder`](Self::builder) until [`init`](Self::init).
pub struct Ioc {
    config: IocConfig,
    context: Arc<SchedulerContext>,
    dispatcher: Dispatcher,
    engine: Arc<SoftEngine>,
    builder: RecordBuilder,
    autosave: Mutex<Option<AutosaveTask>>,
    initialised: AtomicBool,
    stopped: AtomicBool,
}

impl Ioc {
    /// Validates `config`, starts the schedulers (unless they start lazily)
    /// and builds the configured records.
    pub fn new(config: IocConfig) -> Result<Self, IocError> {
        validate_config(&config).map_err(ConfigError::Invalid)?;

        let context = Arc::new(
            SchedulerContext::new()
                .with_coroutine_workers(config.dispatcher.coroutine_workers)
                .with_lazy_start(config.dispatcher.lazy_start),
        );
        if !config.dispatcher.lazy_start {
            context.start_all()?;
        }
        let dispatcher = Dispatcher::new(Arc::clone(&context));

        let policy = if config.alarm_priority.is_empty() {
            AlarmPolicy::default()
        } else {
            AlarmPolicy::from_priority(&config.alarm_priority)
        };

        let engine = SoftEngine::new();
        let dyn_engine: Arc<dyn RecordEngine> = engine.clone();
        let builder = RecordBuilder::new(config.device_name.clone(), dyn_engine, dispatcher.clone())
            .with_separator(config.separator.clone())
            .with_alarm_policy(Arc::new(policy))
            .with_default_scheduler(config.dispatcher.default_scheduler);

        for record in &config.records {
            if let Err(error) = builder.build_from_config(record) {
                context.shutdown_all();
                return Err(error.into());
            }
        }

        Ok(Self {
            config,
            context,
            dispatcher,
            engine,
            builder,
            autosave: Mutex::new(None),
            initialised: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        })
    }

    /// Loads a YAML or TOML configuration file and builds the IOC from it.
    pub fn from_config<P: AsRef<Path>>(path: P) -> Result<Self, IocError> {
        let path = path.as_ref();
        let config = load_and_validate_config(path)?;
        ConfigLoaded {
            path: &path.display().to_string(),
            records: config.records.len(),
        }
        .log();
        Self::new(config)
    }

    pub fn config(&self) -> &IocConfig {
        &self.config
    }

    pub fn builder(&self) -> &RecordBuilder {
        &self.builder
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn engine(&self) -> &Arc<SoftEngine> {
        &self.engine
    }

    /// Restores autosaved values, initialises the engine and starts the
    /// periodic autosave task on the coroutine scheduler.
    pub fn init(&self) -> Result<(), IocError> {
        if self.initialised.swap(true, Ordering::AcqRel) {
            return Err(IocError::AlreadyInitialised);
        }

        let records = self.builder.records();
        IocStarting {
            device: &self.config.device_name,
            records: records.len(),
        }
        .log();

        let autosave = if self.config.autosave.enabled {
            let autosave = Autosave::new(&self.config.autosave, &self.config.device_name, records)?;
            if self.config.autosave.backup_on_restart {
                autosave.backup_existing()?;
            }
            autosave.load()?;
            Some(Arc::new(autosave))
        } else {
            None
        };

        self.engine.init()?;

        if let Some(autosave) = autosave.filter(|a| !a.is_empty()) {
            let token = CancellationToken::new();
            let scheduler = self.context.resolve(SchedulerKind::Coroutine)?;
            scheduler.spawn(Box::pin(Arc::clone(&autosave).run(token.clone())))?;
            *self.lock_autosave() = Some(AutosaveTask { autosave, token });
        }
        Ok(())
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised.load(Ordering::Acquire)
    }

    pub fn shell(&self) -> Shell<'_> {
        Shell::new(&self.builder, self.engine.as_ref())
    }

    /// Runs the interactive shell on stdin until `exit` or end of input.
    pub fn run_shell(&self) -> io::Result<()> {
        let stdin = io::stdin();
        self.shell().run(stdin.lock(), io::stdout())
    }

    /// Stops autosave (saving one last time), the scan threads and every
    /// scheduler. Later calls do nothing.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(task) = self.lock_autosave().take() {
            task.token.cancel();
            if let Err(error) = task.autosave.save() {
                AutosaveFailed {
                    path: &task.autosave.save_path(),
                    error: &error.to_string(),
                }
                .log();
            }
        }
        self.engine.shutdown();
        self.context.shutdown_all();
        IocShutdown {
            device: &self.config.device_name,
        }
        .log();
    }

    fn lock_autosave(&self) -> std::sync::MutexGuard<'_, Option<AutosaveTask>> {
        self.autosave.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Ioc {
    fn drop(&mut self) {
        self.shutdown();
    }
}
