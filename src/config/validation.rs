// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation.
//!
//! Every check runs and every problem is reported, so a broken configuration
//! can be fixed in one pass:
//!
//! 1. **IOC settings**: device name, alarm priority table, autosave directory
//! 2. **Record names**: no two records share a name
//! 3. **Record shapes**: array lengths, mbb option counts, scan policies and
//!    drive limits
//!
//! # Example
//! ```rust
//! use softrec::config::{validate_config, DispatcherConfig, IocConfig, AutosaveConfig};
//! use softrec::errors::ValidationError;
//!
//! let config = IocConfig {
//!     device_name: String::new(),
//!     separator: ":".to_string(),
//!     dispatcher: DispatcherConfig::default(),
//!     alarm_priority: vec![],
//!     autosave: AutosaveConfig::default(),
//!     records: vec![],
//! };
//!
//! let errors = validate_config(&config).unwrap_err();
//! assert_eq!(errors, vec![ValidationError::EmptyDeviceName]);
//! ```

use std::collections::HashSet;

use crate::config::consts::MAX_MBB_OPTIONS;
use crate::config::{IocConfig, RecordConfig};
use crate::errors::ValidationError;
use crate::record::{DataKind, PlainValue, ScanPolicy};

pub fn validate_config(cfg: &IocConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if cfg.device_name.trim().is_empty() {
        errors.push(ValidationError::EmptyDeviceName);
    }

    let mut seen_statuses = HashSet::new();
    for status in &cfg.alarm_priority {
        if !seen_statuses.insert(*status) {
            errors.push(ValidationError::DuplicateAlarmPriority {
                status: status.to_string(),
            });
        }
    }

    if cfg.autosave.enabled && cfg.autosave.directory.is_none() {
        errors.push(ValidationError::MissingAutosaveDirectory);
    }

    let mut seen_names = HashSet::new();
    for record in &cfg.records {
        if !seen_names.insert(record.name.as_str()) {
            errors.push(ValidationError::DuplicateRecordName {
                name: record.name.clone(),
            });
        }
        validate_record(record, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_record(record: &RecordConfig, errors: &mut Vec<ValidationError>) {
    let kind = record.record_type.data_kind();

    if let Some(0) = record.length {
        if kind == DataKind::Array || record.record_type.is_long_string() {
            errors.push(ValidationError::InvalidLength {
                record: record.name.clone(),
                length: 0,
            });
        }
    }

    if kind == DataKind::Array && record.length.is_none() {
        let sized = match &record.initial_value {
            Some(PlainValue::Ints(v)) => !v.is_empty(),
            Some(PlainValue::Floats(v)) => !v.is_empty(),
            Some(PlainValue::Text(_)) => true,
            Some(PlainValue::Int(_) | PlainValue::Float(_)) => true,
            None => false,
        };
        if !sized {
            errors.push(ValidationError::MissingLength {
                record: record.name.clone(),
            });
        }
    }

    if record.options.len() > MAX_MBB_OPTIONS {
        errors.push(ValidationError::TooManyOptions {
            record: record.name.clone(),
            count: record.options.len(),
        });
    }

    if let Some(scan) = &record.scan {
        if scan.parse::<ScanPolicy>().is_err() {
            errors.push(ValidationError::InvalidScan {
                record: record.name.clone(),
                scan: scan.clone(),
            });
        }
    }

    if let (Some(low), Some(high)) = (record.drvl, record.drvh) {
        if low > high {
            errors.push(ValidationError::InvalidDriveLimits {
                record: record.name.clone(),
                low,
                high,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmStatus;
    use crate::config::{parse_config, ConfigFormat};

    fn config(yaml: &str) -> IocConfig {
        parse_config(yaml, ConfigFormat::Yaml).unwrap()
    }

    #[test]
    fn test_valid_config() {
        let cfg = config(
            r#"
device_name: OK
alarm_priority: [LINK]
records:
  - name: W
    type: waveform
    initial_value: [1, 2, 3]
  - name: S
    type: ai
    scan: 1 second
"#,
        );
        assert_eq!(validate_config(&cfg), Ok(()));
    }

    #[test]
    fn test_all_errors_reported() {
        let cfg = config(
            r#"
device_name: BAD
alarm_priority: [UDF, UDF]
autosave:
  enabled: true
records:
  - name: W
    type: waveform_out
    length: 0
  - name: NOLEN
    type: waveform
  - name: M
    type: mbbi
    options: [s0, s1, s2, s3, s4, s5, s6, s7, s8, s9, s10, s11, s12, s13, s14, s15, s16]
  - name: S
    type: ai
    scan: whenever
  - name: D
    type: ao
    drvl: 5
    drvh: 1
  - name: D
    type: ao
"#,
        );

        let errors = validate_config(&cfg).unwrap_err();
        let expected = vec![
            ValidationError::DuplicateAlarmPriority {
                status: AlarmStatus::Udf.to_string(),
            },
            ValidationError::MissingAutosaveDirectory,
            ValidationError::InvalidLength {
                record: "W".into(),
                length: 0,
            },
            ValidationError::MissingLength {
                record: "NOLEN".into(),
            },
            ValidationError::TooManyOptions {
                record: "M".into(),
                count: 17,
            },
            ValidationError::InvalidScan {
                record: "S".into(),
                scan: "whenever".into(),
            },
            ValidationError::InvalidDriveLimits {
                record: "D".into(),
                low: 5.0,
                high: 1.0,
            },
            ValidationError::DuplicateRecordName { name: "D".into() },
        ];
        assert_eq!(errors, expected);
    }
}
