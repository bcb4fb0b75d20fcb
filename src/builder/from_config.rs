// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::RecordSpec;
use crate::config::RecordConfig;
use crate::device::LogUpdates;
use crate::errors::BuildError;
use crate::record::ScanPolicy;

impl TryFrom<&RecordConfig> for RecordSpec {
    type Error = BuildError;

    fn try_from(config: &RecordConfig) -> Result<Self, Self::Error> {
        let mut spec = RecordSpec::new(config.record_type, config.name.clone())
            .options(&config.options)
            .always_update(config.always_update)
            .autosave(config.autosave)
            .retain_timestamp(config.retain_timestamp);

        if let Some(value) = &config.initial_value {
            spec = spec.initial_value(value.to_value());
        }
        if let Some(scan) = &config.scan {
            let scan: ScanPolicy = scan.parse().map_err(|reason| BuildError::InvalidSpec {
                record: config.name.clone(),
                reason,
            })?;
            spec = spec.scan(scan);
        }
        if config.severity.is_some() || config.status.is_some() {
            spec = spec.alarm(
                config.severity.unwrap_or_default(),
                config.status.unwrap_or_default(),
            );
        }
        if let (Some(low), Some(high)) = (config.drvl, config.drvh) {
            spec = spec.drive_limits(low, high);
        }
        if let Some(length) = config.length {
            spec = spec.length(length);
        }
        if let Some(element) = config.element_type {
            spec = spec.element_type(element);
        }
        if let Some(kind) = config.scheduler {
            spec = spec.scheduler(kind);
        }
        if let Some(egu) = &config.egu {
            spec = spec.egu(egu.clone());
        }
        if let Some(prec) = config.prec {
            spec = spec.prec(prec);
        }
        if let Some(description) = &config.description {
            spec = spec.description(description.clone());
        }
        if config.log_updates {
            spec = spec.on_update(Arc::new(LogUpdates));
        }

        Ok(spec)
    }
}
