// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;

use crate::config::consts::{
    AUTOSAVE_BACKUP_EXTENSION, AUTOSAVE_BACKUP_TIMESTAMP, AUTOSAVE_EXTENSION,
};
use crate::config::AutosaveConfig;
use crate::device::RecordDevice;
use crate::errors::IocError;
use crate::observability::messages::lifecycle::{
    AutosaveFailed, AutosaveRestored, AutosaveValueSkipped, AutosaveWritten,
};
use crate::observability::messages::StructuredLog;
use crate::record::PlainValue;

type SavedState = BTreeMap<String, PlainValue>;

/// Periodic persistence of record values.
///
/// Values of the records flagged for autosave are written as a YAML map of
/// full record name to value, to both `<device>.softsav` and
/// `<device>.softsavB`, and only when something changed since the last save.
pub struct Autosave {
    directory: PathBuf,
    device_name: String,
    period: Duration,
    records: BTreeMap<String, Arc<RecordDevice>>,
    last_saved: Mutex<Option<SavedState>>,
}

impl Autosave {
    pub fn new(
        config: &AutosaveConfig,
        device_name: &str,
        records: impl IntoIterator<Item = Arc<RecordDevice>>,
    ) -> Result<Self, IocError> {
        let directory = config
            .directory
            .clone()
            .ok_or_else(|| IocError::Autosave("autosave directory is not configured".into()))?;
        if !directory.is_dir() {
            return Err(IocError::Autosave(format!(
                "{} is not a valid autosave directory",
                directory.display()
            )));
        }

        Ok(Self {
            directory,
            device_name: device_name.to_string(),
            period: config.save_period(),
            records: records
                .into_iter()
                .filter(|record| record.is_autosaved())
                .map(|record| (record.name().to_string(), record))
                .collect(),
            last_saved: Mutex::new(None),
        })
    }

    pub fn save_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.device_name, AUTOSAVE_EXTENSION))
    }

    pub fn backup_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.device_name, AUTOSAVE_BACKUP_EXTENSION))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copies the current save file aside with a `_<yymmdd-HHMMSS>` suffix in
    /// local time.
    pub fn backup_existing(&self) -> Result<Option<PathBuf>, IocError> {
        let current = self.save_path();
        if !current.is_file() {
            return Ok(None);
        }
        let mut name = current.as_os_str().to_owned();
        name.push(format!("_{}", Local::now().format(AUTOSAVE_BACKUP_TIMESTAMP)));
        let backup = PathBuf::from(name);
        fs::copy(&current, &backup).map_err(|e| io_error(&backup, e))?;
        Ok(Some(backup))
    }

    /// Restores saved values into their records. A missing save file is not an
    /// error; values for unknown records or of the wrong shape are skipped.
    pub fn load(&self) -> Result<usize, IocError> {
        let path = self.save_path();
        if self.records.is_empty() || !path.is_file() {
            return Ok(0);
        }
        let text = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
        let state: SavedState = serde_yaml::from_str(&text)
            .map_err(|e| IocError::Autosave(format!("{}: {}", path.display(), e)))?;

        let mut restored = 0;
        for (name, value) in &state {
            let Some(record) = self.records.get(name) else {
                AutosaveValueSkipped {
                    record: name,
                    reason: "record is not autosaved",
                }
                .log();
                continue;
            };
            match record.restore(value.to_value()) {
                Ok(()) => restored += 1,
                Err(error) => AutosaveValueSkipped {
                    record: name,
                    reason: &error.to_string(),
                }
                .log(),
            }
        }

        *self.lock_last() = Some(state);
        AutosaveRestored {
            path: &path,
            records: restored,
        }
        .log();
        Ok(restored)
    }

    /// Writes the save files if any value changed. Returns whether it wrote.
    pub fn save(&self) -> Result<bool, IocError> {
        let state: SavedState = self
            .records
            .iter()
            .map(|(name, record)| (name.clone(), record.value().to_plain()))
            .collect();

        let mut last = self.lock_last();
        if last.as_ref() == Some(&state) {
            return Ok(false);
        }

        let text = serde_yaml::to_string(&state)
            .map_err(|e| IocError::Autosave(e.to_string()))?;
        for path in [self.save_path(), self.backup_path()] {
            fs::write(&path, &text).map_err(|e| io_error(&path, e))?;
        }
        AutosaveWritten {
            path: &self.save_path(),
            records: state.len(),
        }
        .log();
        *last = Some(state);
        Ok(true)
    }

    /// Saves every period until cancelled.
    pub async fn run(self: Arc<Self>, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(self.period) => {}
            }
            if let Err(error) = self.save() {
                AutosaveFailed {
                    path: &self.save_path(),
                    error: &error.to_string(),
                }
                .log();
            }
        }
    }

    fn lock_last(&self) -> std::sync::MutexGuard<'_, Option<SavedState>> {
        self.last_saved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn io_error(path: &Path, error: std::io::Error) -> IocError {
    IocError::Autosave(format!("{}: {}", path.display(), error))
}
