// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::soft::SoftEngine;
use crate::observability::messages::engine::ScanThreadStarted;
use crate::observability::messages::StructuredLog;
use crate::traits::RecordEngine;

/// Processes a fixed set of records every `period` until stopped.
pub(crate) struct PeriodicScanner {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicScanner {
    pub(crate) fn start(
        period: Duration,
        records: Vec<String>,
        engine: Weak<SoftEngine>,
    ) -> std::io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();
        let count = records.len();

        let handle = thread::Builder::new()
            .name(format!("softrec-scan-{}ms", period.as_millis()))
            .spawn(move || loop {
                match stopped.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        let Some(engine) = engine.upgrade() else {
                            break;
                        };
                        for name in &records {
                            let _ = engine.process(name);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        ScanThreadStarted {
            period,
            records: count,
        }
        .log();

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub(crate) fn stop(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for PeriodicScanner {
    fn drop(&mut self) {
        self.stop();
    }
}
