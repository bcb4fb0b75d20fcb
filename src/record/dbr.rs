// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Engine-native value buffers.
//!
//! The record engine moves values around as a typed, counted byte buffer. A
//! string occupies a fixed 40 byte NUL-padded field. Unsigned array element
//! types travel as their signed counterpart of the same width. Strings too long
//! for a string field travel as a CHAR array with a trailing NUL.

use super::value::{ArrayValue, Value};
use crate::errors::DbrError;

/// Width of one string field, terminator included.
pub const MAX_STRING_SIZE: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DbrType {
    String = 0,
    Short = 1,
    Float = 2,
    Enum = 3,
    Char = 4,
    Long = 5,
    Double = 6,
}

impl DbrType {
    pub fn from_code(code: u16) -> Result<Self, DbrError> {
        match code {
            0 => Ok(DbrType::String),
            1 => Ok(DbrType::Short),
            2 => Ok(DbrType::Float),
            3 => Ok(DbrType::Enum),
            4 => Ok(DbrType::Char),
            5 => Ok(DbrType::Long),
            6 => Ok(DbrType::Double),
            other => Err(DbrError::UnknownType(other)),
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn element_size(self) -> usize {
        match self {
            DbrType::String => MAX_STRING_SIZE,
            DbrType::Char => 1,
            DbrType::Short | DbrType::Enum => 2,
            DbrType::Long | DbrType::Float => 4,
            DbrType::Double => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DbrType::String => "DBR_STRING",
            DbrType::Short => "DBR_SHORT",
            DbrType::Float => "DBR_FLOAT",
            DbrType::Enum => "DBR_ENUM",
            DbrType::Char => "DBR_CHAR",
            DbrType::Long => "DBR_LONG",
            DbrType::Double => "DBR_DOUBLE",
        }
    }
}

/// A typed, counted buffer in the engine's native layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DbrBuffer {
    pub dbr_type: DbrType,
    pub count: usize,
    pub data: Vec<u8>,
}

impl DbrBuffer {
    pub fn encode(value: &Value) -> Self {
        match value {
            Value::Double(v) => Self::scalar(DbrType::Double, v.to_ne_bytes().to_vec()),
            Value::Long(v) => Self::scalar(DbrType::Long, v.to_ne_bytes().to_vec()),
            Value::Enum(v) => Self::scalar(DbrType::Enum, v.to_ne_bytes().to_vec()),
            Value::String(s) if s.len() < MAX_STRING_SIZE => {
                let mut data = s.as_bytes().to_vec();
                data.resize(MAX_STRING_SIZE, 0);
                Self::scalar(DbrType::String, data)
            }
            Value::String(s) => {
                let mut data = s.as_bytes().to_vec();
                data.push(0);
                Self {
                    dbr_type: DbrType::Char,
                    count: data.len(),
                    data,
                }
            }
            Value::Array(array) => Self::encode_array(array),
        }
    }

    fn scalar(dbr_type: DbrType, data: Vec<u8>) -> Self {
        Self {
            dbr_type,
            count: 1,
            data,
        }
    }

    fn encode_array(array: &ArrayValue) -> Self {
        let (dbr_type, data): (DbrType, Vec<u8>) = match array {
            ArrayValue::Char(v) => (DbrType::Char, v.iter().map(|x| *x as u8).collect()),
            ArrayValue::UChar(v) => (DbrType::Char, v.clone()),
            ArrayValue::Short(v) => (DbrType::Short, v.iter().flat_map(|x| x.to_ne_bytes()).collect()),
            ArrayValue::UShort(v) => (
                DbrType::Short,
                v.iter().flat_map(|x| (*x as i16).to_ne_bytes()).collect(),
            ),
            ArrayValue::Long(v) => (DbrType::Long, v.iter().flat_map(|x| x.to_ne_bytes()).collect()),
            ArrayValue::ULong(v) => (
                DbrType::Long,
                v.iter().flat_map(|x| (*x as i32).to_ne_bytes()).collect(),
            ),
            ArrayValue::Float(v) => (DbrType::Float, v.iter().flat_map(|x| x.to_ne_bytes()).collect()),
            ArrayValue::Double(v) => (DbrType::Double, v.iter().flat_map(|x| x.to_ne_bytes()).collect()),
        };
        Self {
            dbr_type,
            count: array.len(),
            data,
        }
    }

    /// Decodes a single element as a scalar and anything else as an array.
    ///
    /// Element types the buffer cannot express (unsigned arrays) come back as
    /// the signed type; the receiving record converts them.
    pub fn decode(&self) -> Result<Value, DbrError> {
        let truncated = || DbrError::Truncated {
            dbr_type: self.dbr_type.name(),
            count: self.count,
            actual: self.data.len(),
        };
        let needed = self
            .count
            .checked_mul(self.dbr_type.element_size())
            .ok_or_else(truncated)?;
        if self.data.len() < needed {
            return Err(truncated());
        }
        let data = &self.data[..needed];

        match self.dbr_type {
            DbrType::String => match self.count {
                0 => Err(DbrError::Empty),
                1 => {
                    let end = data.iter().position(|b| *b == 0).unwrap_or(MAX_STRING_SIZE);
                    std::str::from_utf8(&data[..end])
                        .map(|s| Value::String(s.to_string()))
                        .map_err(|_| DbrError::InvalidString)
                }
                n => Err(DbrError::StringArray(n)),
            },
            DbrType::Char => {
                let chars: Vec<i8> = data.iter().map(|b| *b as i8).collect();
                Ok(match chars.as_slice() {
                    [single] => Value::Long(*single as i32),
                    _ => Value::Array(ArrayValue::Char(chars)),
                })
            }
            DbrType::Short => {
                let shorts: Vec<i16> = data
                    .chunks_exact(2)
                    .map(|c| i16::from_ne_bytes([c[0], c[1]]))
                    .collect();
                Ok(match shorts.as_slice() {
                    [single] => Value::Long(*single as i32),
                    _ => Value::Array(ArrayValue::Short(shorts)),
                })
            }
            DbrType::Enum => {
                let states: Vec<u16> = data
                    .chunks_exact(2)
                    .map(|c| u16::from_ne_bytes([c[0], c[1]]))
                    .collect();
                Ok(match states.as_slice() {
                    [single] => Value::Enum(*single),
                    _ => Value::Array(ArrayValue::UShort(states)),
                })
            }
            DbrType::Long => {
                let longs: Vec<i32> = data
                    .chunks_exact(4)
                    .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                Ok(match longs.as_slice() {
                    [single] => Value::Long(*single),
                    _ => Value::Array(ArrayValue::Long(longs)),
                })
            }
            DbrType::Float => {
                let floats: Vec<f32> = data
                    .chunks_exact(4)
                    .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                Ok(match floats.as_slice() {
                    [single] => Value::Double(*single as f64),
                    _ => Value::Array(ArrayValue::Float(floats)),
                })
            }
            DbrType::Double => {
                let doubles: Vec<f64> = data
                    .chunks_exact(8)
                    .map(|c| {
                        let mut bytes = [0u8; 8];
                        bytes.copy_from_slice(c);
                        f64::from_ne_bytes(bytes)
                    })
                    .collect();
                Ok(match doubles.as_slice() {
                    [single] => Value::Double(*single),
                    _ => Value::Array(ArrayValue::Double(doubles)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_buffers() {
        let cases = [
            (Value::Double(2.5), DbrType::Double),
            (Value::Long(-7), DbrType::Long),
            (Value::Enum(3), DbrType::Enum),
            (Value::String("abc".into()), DbrType::String),
        ];
        for (value, dbr_type) in cases {
            let buffer = DbrBuffer::encode(&value);
            assert_eq!(buffer.dbr_type, dbr_type);
            assert_eq!(buffer.count, 1);
            assert_eq!(buffer.decode().unwrap(), value);
        }
    }

    #[test]
    fn test_string_field_is_padded() {
        let buffer = DbrBuffer::encode(&Value::String("hi".into()));
        assert_eq!(buffer.data.len(), MAX_STRING_SIZE);
        assert_eq!(&buffer.data[..3], b"hi\0");
    }

    #[test]
    fn test_long_string_travels_as_char_array() {
        let text = "x".repeat(60);
        let buffer = DbrBuffer::encode(&Value::String(text.clone()));
        assert_eq!(buffer.dbr_type, DbrType::Char);
        assert_eq!(buffer.count, 61);

        let decoded = buffer.decode().unwrap();
        assert_eq!(decoded.as_array().unwrap().to_text(), text);
    }

    #[test]
    fn test_unsigned_arrays_map_to_signed_types() {
        let buffer = DbrBuffer::encode(&Value::Array(ArrayValue::UShort(vec![1, 65535])));
        assert_eq!(buffer.dbr_type, DbrType::Short);
        assert_eq!(
            buffer.decode().unwrap(),
            Value::Array(ArrayValue::Short(vec![1, -1]))
        );

        let buffer = DbrBuffer::encode(&Value::Array(ArrayValue::UChar(vec![200, 1])));
        assert_eq!(buffer.dbr_type, DbrType::Char);
        assert_eq!(
            buffer.decode().unwrap(),
            Value::Array(ArrayValue::Char(vec![-56, 1]))
        );
    }

    #[test]
    fn test_decode_errors() {
        let short = DbrBuffer {
            dbr_type: DbrType::Double,
            count: 2,
            data: vec![0; 12],
        };
        assert!(matches!(short.decode(), Err(DbrError::Truncated { .. })));

        let oversized = DbrBuffer {
            dbr_type: DbrType::Double,
            count: usize::MAX / 4,
            data: vec![0; 8],
        };
        assert!(matches!(
            oversized.decode(),
            Err(DbrError::Truncated { actual: 8, .. })
        ));

        let bad_utf8 = DbrBuffer {
            dbr_type: DbrType::String,
            count: 1,
            data: vec![0xff; MAX_STRING_SIZE],
        };
        assert_eq!(bad_utf8.decode(), Err(DbrError::InvalidString));

        assert_eq!(DbrType::from_code(9), Err(DbrError::UnknownType(9)));
    }
}
