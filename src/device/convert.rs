// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::DeviceError;
use crate::record::dbr::MAX_STRING_SIZE;
use crate::record::{ArrayValue, DataKind, ElementType, RecordType, Value};

/// Highest state index of a multi-bit record.
pub const MAX_MBB_STATE: u16 = 15;

/// Everything needed to turn an arbitrary [`Value`] into one a record can hold.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueShape {
    pub record_type: RecordType,
    /// Element type of array records.
    pub element: ElementType,
    /// Element capacity of arrays, byte capacity (terminator included) of strings.
    pub capacity: usize,
    /// `(low, high)` clamp applied to ao and longout values.
    pub drive_limits: Option<(f64, f64)>,
}

impl ValueShape {
    pub fn scalar(record_type: RecordType) -> Self {
        let capacity = match record_type.data_kind() {
            DataKind::String => MAX_STRING_SIZE,
            _ => 1,
        };
        Self {
            record_type,
            element: ElementType::Double,
            capacity,
            drive_limits: None,
        }
    }

    pub fn array(record_type: RecordType, element: ElementType, length: usize) -> Self {
        Self {
            record_type,
            element,
            capacity: length,
            drive_limits: None,
        }
    }

    pub fn long_string(record_type: RecordType, length: usize) -> Self {
        Self {
            record_type,
            element: ElementType::Char,
            capacity: length,
            drive_limits: None,
        }
    }

    pub fn with_drive_limits(mut self, low: f64, high: f64) -> Self {
        self.drive_limits = Some((low, high));
        self
    }

    /// The record's value before anything is written to it.
    pub fn default_value(&self) -> Value {
        match self.record_type.data_kind() {
            DataKind::Array => Value::Array(ArrayValue::empty(self.element)),
            _ => self.record_type.default_value(),
        }
    }

    /// Converts `value` to the representation this record stores.
    ///
    /// Strings are truncated to fit, arrays are converted to the element type
    /// and truncated to capacity, drive limits clamp. Values with no sensible
    /// conversion are refused.
    pub fn coerce(&self, record: &str, value: Value) -> Result<Value, DeviceError> {
        match self.record_type.data_kind() {
            DataKind::Scalar => self.coerce_scalar(record, value),
            DataKind::String => self.coerce_string(record, value),
            DataKind::Array => Ok(self.coerce_array(value)),
        }
    }

    fn coerce_scalar(&self, record: &str, value: Value) -> Result<Value, DeviceError> {
        let number = match value {
            Value::Double(v) => v,
            Value::Long(v) => v as f64,
            Value::Enum(v) => v as f64,
            Value::String(ref text) => text.trim().parse::<f64>().map_err(|_| conversion(record, &value))?,
            Value::Array(ref array) if array.len() == 1 => array.to_f64s()[0],
            Value::Array(_) => return Err(conversion(record, &value)),
        };

        match self.record_type {
            RecordType::Ai => Ok(Value::Double(number)),
            RecordType::Ao => Ok(Value::Double(self.clamp(number))),
            RecordType::Longin | RecordType::Longout => {
                let number = if self.record_type == RecordType::Longout {
                    self.clamp(number)
                } else {
                    number
                };
                let truncated = number.trunc();
                if !truncated.is_finite()
                    || truncated < i32::MIN as f64
                    || truncated > i32::MAX as f64
                {
                    return Err(out_of_range(record, number));
                }
                Ok(Value::Long(truncated as i32))
            }
            RecordType::Bi | RecordType::Bo | RecordType::Mbbi | RecordType::Mbbo => {
                let max = if matches!(self.record_type, RecordType::Bi | RecordType::Bo) {
                    1
                } else {
                    MAX_MBB_STATE
                };
                if number.fract() != 0.0 || number < 0.0 || number > max as f64 {
                    return Err(out_of_range(record, number));
                }
                Ok(Value::Enum(number as u16))
            }
            _ => Err(conversion(record, &Value::Double(number))),
        }
    }

    fn coerce_string(&self, record: &str, value: Value) -> Result<Value, DeviceError> {
        let text = match value {
            Value::String(text) => text,
            Value::Array(array) => array.to_text(),
            other => return Err(conversion(record, &other)),
        };
        let limit = self.capacity.saturating_sub(1);
        if self.record_type.is_long_string() {
            Ok(Value::String(truncate_utf8(text, limit)))
        } else {
            Ok(Value::String(truncate_chars(text, limit)))
        }
    }

    fn coerce_array(&self, value: Value) -> Value {
        let mut array = match value {
            Value::Array(array) => array.convert(self.element),
            Value::String(text) => {
                let mut bytes: Vec<i64> = text.bytes().map(i64::from).collect();
                bytes.push(0);
                ArrayValue::from_i64s(self.element, &bytes)
            }
            Value::Double(v) => ArrayValue::from_f64s(self.element, &[v]),
            Value::Long(v) => ArrayValue::from_i64s(self.element, &[v as i64]),
            Value::Enum(v) => ArrayValue::from_i64s(self.element, &[v as i64]),
        };
        array.truncate(self.capacity);
        Value::Array(array)
    }

    fn clamp(&self, number: f64) -> f64 {
        match self.drive_limits {
            Some((low, high)) if low < high => number.clamp(low, high),
            _ => number,
        }
    }
}

/// Keeps at most `max_chars` characters. The DBR codec carries anything over
/// the STRING field size as a CHAR array.
fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((end, _)) = text.char_indices().nth(max_chars) {
        text.truncate(end);
    }
    text
}

/// Keeps at most `max_bytes` bytes without splitting a character.
fn truncate_utf8(mut text: String, max_bytes: usize) -> String {
    if text.len() > max_bytes {
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

fn conversion(record: &str, value: &Value) -> DeviceError {
    DeviceError::Conversion {
        record: record.to_string(),
        from: format!("{} {}", value.kind_name(), value),
    }
}

fn out_of_range(record: &str, number: f64) -> DeviceError {
    DeviceError::OutOfRange {
        record: record.to_string(),
        value: number.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_coercion() {
        let ai = ValueShape::scalar(RecordType::Ai);
        let longout = ValueShape::scalar(RecordType::Longout);
        let bo = ValueShape::scalar(RecordType::Bo);
        let mbbi = ValueShape::scalar(RecordType::Mbbi);

        assert_eq!(ai.coerce("r", Value::Long(3)).unwrap(), Value::Double(3.0));
        assert_eq!(ai.coerce("r", Value::String(" 2.5 ".into())).unwrap(), Value::Double(2.5));
        assert_eq!(longout.coerce("r", Value::Double(7.9)).unwrap(), Value::Long(7));
        assert_eq!(bo.coerce("r", Value::Long(1)).unwrap(), Value::Enum(1));
        assert_eq!(mbbi.coerce("r", Value::Double(15.0)).unwrap(), Value::Enum(15));
        assert_eq!(
            ai.coerce("r", Value::Array(ArrayValue::Short(vec![4]))).unwrap(),
            Value::Double(4.0)
        );
    }

    #[test]
    fn test_scalar_rejections() {
        let bo = ValueShape::scalar(RecordType::Bo);
        let mbbo = ValueShape::scalar(RecordType::Mbbo);
        let longin = ValueShape::scalar(RecordType::Longin);
        let ao = ValueShape::scalar(RecordType::Ao);

        assert!(matches!(bo.coerce("r", Value::Long(2)), Err(DeviceError::OutOfRange { .. })));
        assert!(matches!(mbbo.coerce("r", Value::Long(16)), Err(DeviceError::OutOfRange { .. })));
        assert!(matches!(bo.coerce("r", Value::Double(0.5)), Err(DeviceError::OutOfRange { .. })));
        assert!(matches!(
            longin.coerce("r", Value::Double(1e12)),
            Err(DeviceError::OutOfRange { .. })
        ));
        assert!(matches!(
            ao.coerce("r", Value::String("fast".into())),
            Err(DeviceError::Conversion { .. })
        ));
        assert!(matches!(
            ao.coerce("r", Value::from(vec![1.0, 2.0])),
            Err(DeviceError::Conversion { .. })
        ));
    }

    #[test]
    fn test_drive_limits_clamp_outputs() {
        let ao = ValueShape::scalar(RecordType::Ao).with_drive_limits(-1.0, 1.0);
        let longout = ValueShape::scalar(RecordType::Longout).with_drive_limits(0.0, 10.0);

        assert_eq!(ao.coerce("r", Value::Double(5.0)).unwrap(), Value::Double(1.0));
        assert_eq!(ao.coerce("r", Value::Double(-5.0)).unwrap(), Value::Double(-1.0));
        assert_eq!(longout.coerce("r", Value::Long(99)).unwrap(), Value::Long(10));
    }

    #[test]
    fn test_strings_truncate() {
        let stringin = ValueShape::scalar(RecordType::Stringin);
        let long = ValueShape::long_string(RecordType::LongStringout, 8);

        let text = "a".repeat(50);
        assert_eq!(
            stringin.coerce("r", Value::String(text)).unwrap(),
            Value::String("a".repeat(39))
        );
        let accented = "\u{e9}".repeat(50);
        assert_eq!(
            stringin.coerce("r", Value::String(accented)).unwrap(),
            Value::String("\u{e9}".repeat(39))
        );
        let short_accented = "\u{e9}".repeat(30);
        assert_eq!(
            ValueShape::scalar(RecordType::Stringout)
                .coerce("r", Value::String(short_accented.clone()))
                .unwrap(),
            Value::String(short_accented)
        );
        assert_eq!(
            long.coerce("r", Value::String("abcdefghij".into())).unwrap(),
            Value::String("abcdefg".into())
        );
        // never split a multi-byte character
        assert_eq!(
            long.coerce("r", Value::String("abcdef\u{e9}".into())).unwrap(),
            Value::String("abcdef".into())
        );
        assert_eq!(
            long.coerce("r", Value::Array(ArrayValue::Char(vec![104, 105, 0]))).unwrap(),
            Value::String("hi".into())
        );
    }

    #[test]
    fn test_arrays_convert_and_truncate() {
        let shape = ValueShape::array(RecordType::Waveform, ElementType::Short, 3);

        assert_eq!(
            shape.coerce("r", Value::from(vec![1.5, 2.5, 3.5, 4.5])).unwrap(),
            Value::Array(ArrayValue::Short(vec![1, 2, 3]))
        );
        assert_eq!(
            shape.coerce("r", Value::Long(9)).unwrap(),
            Value::Array(ArrayValue::Short(vec![9]))
        );

        let chars = ValueShape::array(RecordType::WaveformOut, ElementType::UChar, 10);
        assert_eq!(
            chars.coerce("r", Value::String("ok".into())).unwrap(),
            Value::Array(ArrayValue::UChar(vec![b'o', b'k', 0]))
        );
    }
}
