// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::value::{ArrayValue, ElementType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Whether the engine reads a record from the device or writes it to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "input",
            Direction::Out => "output",
        }
    }
}

/// Shape of the data a record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Scalar,
    String,
    Array,
}

/// Supported soft record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Ai,
    Ao,
    Bi,
    Bo,
    Longin,
    Longout,
    Mbbi,
    Mbbo,
    Stringin,
    Stringout,
    Waveform,
    WaveformOut,
    LongStringin,
    LongStringout,
}

impl RecordType {
    pub const ALL: [RecordType; 14] = [
        RecordType::Ai,
        RecordType::Ao,
        RecordType::Bi,
        RecordType::Bo,
        RecordType::Longin,
        RecordType::Longout,
        RecordType::Mbbi,
        RecordType::Mbbo,
        RecordType::Stringin,
        RecordType::Stringout,
        RecordType::Waveform,
        RecordType::WaveformOut,
        RecordType::LongStringin,
        RecordType::LongStringout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Ai => "ai",
            RecordType::Ao => "ao",
            RecordType::Bi => "bi",
            RecordType::Bo => "bo",
            RecordType::Longin => "longin",
            RecordType::Longout => "longout",
            RecordType::Mbbi => "mbbi",
            RecordType::Mbbo => "mbbo",
            RecordType::Stringin => "stringin",
            RecordType::Stringout => "stringout",
            RecordType::Waveform => "waveform",
            RecordType::WaveformOut => "waveform_out",
            RecordType::LongStringin => "long_stringin",
            RecordType::LongStringout => "long_stringout",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            RecordType::Ai
            | RecordType::Bi
            | RecordType::Longin
            | RecordType::Mbbi
            | RecordType::Stringin
            | RecordType::Waveform
            | RecordType::LongStringin => Direction::In,
            _ => Direction::Out,
        }
    }

    pub fn data_kind(self) -> DataKind {
        match self {
            RecordType::Stringin
            | RecordType::Stringout
            | RecordType::LongStringin
            | RecordType::LongStringout => DataKind::String,
            RecordType::Waveform | RecordType::WaveformOut => DataKind::Array,
            _ => DataKind::Scalar,
        }
    }

    pub fn is_enum(self) -> bool {
        matches!(
            self,
            RecordType::Bi | RecordType::Bo | RecordType::Mbbi | RecordType::Mbbo
        )
    }

    pub fn is_long_string(self) -> bool {
        matches!(self, RecordType::LongStringin | RecordType::LongStringout)
    }

    /// Value a record holds before anything has been written to it.
    pub fn default_value(self) -> Value {
        match self {
            RecordType::Ai | RecordType::Ao => Value::Double(0.0),
            RecordType::Longin | RecordType::Longout => Value::Long(0),
            RecordType::Bi | RecordType::Bo | RecordType::Mbbi | RecordType::Mbbo => {
                Value::Enum(0)
            }
            RecordType::Stringin
            | RecordType::Stringout
            | RecordType::LongStringin
            | RecordType::LongStringout => Value::String(String::new()),
            RecordType::Waveform | RecordType::WaveformOut => {
                Value::Array(ArrayValue::empty(ElementType::Double))
            }
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("unknown record type '{}'", s))
    }
}

/// How the engine decides when to process a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanPolicy {
    /// Processed only when written to.
    #[default]
    Passive,
    /// Processed by the engine's periodic scanner.
    Periodic(Duration),
    /// Processed when the device announces new data.
    IoIntr,
}

impl fmt::Display for ScanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPolicy::Passive => f.write_str("Passive"),
            ScanPolicy::IoIntr => f.write_str("I/O Intr"),
            ScanPolicy::Periodic(period) => write!(f, "{} second", period.as_secs_f64()),
        }
    }
}

impl FromStr for ScanPolicy {
    type Err = String;

    /// Accepts `Passive`, `I/O Intr` (or `io_intr`) and `<seconds> second[s]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let lower = text.to_ascii_lowercase();
        match lower.as_str() {
            "passive" => return Ok(ScanPolicy::Passive),
            "i/o intr" | "io_intr" | "iointr" => return Ok(ScanPolicy::IoIntr),
            _ => {}
        }

        let number = lower
            .strip_suffix("seconds")
            .or_else(|| lower.strip_suffix("second"))
            .ok_or_else(|| format!("unknown scan policy '{}'", text))?;
        let seconds: f64 = number
            .trim()
            .parse()
            .map_err(|_| format!("unknown scan policy '{}'", text))?;
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(format!("scan period must be positive, got '{}'", text));
        }
        Ok(ScanPolicy::Periodic(Duration::from_secs_f64(seconds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions() {
        let inputs: Vec<_> = RecordType::ALL
            .into_iter()
            .filter(|t| t.direction() == Direction::In)
            .collect();
        assert_eq!(inputs.len(), 7);
        assert!(inputs.contains(&RecordType::Waveform));
        assert_eq!(RecordType::WaveformOut.direction(), Direction::Out);
    }

    #[test]
    fn test_scan_policy_parsing() {
        let cases = [
            ("Passive", Ok(ScanPolicy::Passive)),
            ("I/O Intr", Ok(ScanPolicy::IoIntr)),
            ("io_intr", Ok(ScanPolicy::IoIntr)),
            ("1 second", Ok(ScanPolicy::Periodic(Duration::from_secs(1)))),
            (".5 second", Ok(ScanPolicy::Periodic(Duration::from_millis(500)))),
            ("10 seconds", Ok(ScanPolicy::Periodic(Duration::from_secs(10)))),
        ];
        for (text, expected) in cases {
            assert_eq!(text.parse::<ScanPolicy>(), expected, "parsing {}", text);
        }
        assert!("0 second".parse::<ScanPolicy>().is_err());
        assert!("Event".parse::<ScanPolicy>().is_err());
    }

    #[test]
    fn test_record_type_names_match_serde() {
        for t in RecordType::ALL {
            let yaml = serde_yaml::to_string(&t).unwrap();
            assert_eq!(yaml.trim(), t.as_str());
            assert_eq!(t.as_str().parse::<RecordType>(), Ok(t));
        }
    }
}
