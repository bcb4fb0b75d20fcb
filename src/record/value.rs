// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Element type of an array record (the record's FTVL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Char,
    UChar,
    Short,
    UShort,
    Long,
    ULong,
    Float,
    Double,
}

impl ElementType {
    pub const ALL: [ElementType; 8] = [
        ElementType::Char,
        ElementType::UChar,
        ElementType::Short,
        ElementType::UShort,
        ElementType::Long,
        ElementType::ULong,
        ElementType::Float,
        ElementType::Double,
    ];

    /// Field type name as the engine reports it.
    pub fn ftvl(self) -> &'static str {
        match self {
            ElementType::Char => "CHAR",
            ElementType::UChar => "UCHAR",
            ElementType::Short => "SHORT",
            ElementType::UShort => "USHORT",
            ElementType::Long => "LONG",
            ElementType::ULong => "ULONG",
            ElementType::Float => "FLOAT",
            ElementType::Double => "DOUBLE",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, ElementType::Float | ElementType::Double)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ftvl())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .into_iter()
            .find(|e| e.ftvl().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown element type '{}'", s))
    }
}

/// Typed contents of an array record.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Char(Vec<i8>),
    UChar(Vec<u8>),
    Short(Vec<i16>),
    UShort(Vec<u16>),
    Long(Vec<i32>),
    ULong(Vec<u32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

macro_rules! each_array {
    ($value:expr, $v:ident => $body:expr) => {
        match $value {
            ArrayValue::Char($v) => $body,
            ArrayValue::UChar($v) => $body,
            ArrayValue::Short($v) => $body,
            ArrayValue::UShort($v) => $body,
            ArrayValue::Long($v) => $body,
            ArrayValue::ULong($v) => $body,
            ArrayValue::Float($v) => $body,
            ArrayValue::Double($v) => $body,
        }
    };
}

impl ArrayValue {
    pub fn empty(element: ElementType) -> Self {
        Self::from_f64s(element, &[])
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ArrayValue::Char(_) => ElementType::Char,
            ArrayValue::UChar(_) => ElementType::UChar,
            ArrayValue::Short(_) => ElementType::Short,
            ArrayValue::UShort(_) => ElementType::UShort,
            ArrayValue::Long(_) => ElementType::Long,
            ArrayValue::ULong(_) => ElementType::ULong,
            ArrayValue::Float(_) => ElementType::Float,
            ArrayValue::Double(_) => ElementType::Double,
        }
    }

    pub fn len(&self) -> usize {
        each_array!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn truncate(&mut self, len: usize) {
        each_array!(self, v => v.truncate(len))
    }

    pub fn to_f64s(&self) -> Vec<f64> {
        each_array!(self, v => v.iter().map(|x| *x as f64).collect())
    }

    pub fn to_i64s(&self) -> Vec<i64> {
        each_array!(self, v => v.iter().map(|x| *x as i64).collect())
    }

    /// Integer elements are narrowed with wrapping casts.
    pub fn from_i64s(element: ElementType, values: &[i64]) -> Self {
        match element {
            ElementType::Char => ArrayValue::Char(values.iter().map(|v| *v as i8).collect()),
            ElementType::UChar => ArrayValue::UChar(values.iter().map(|v| *v as u8).collect()),
            ElementType::Short => ArrayValue::Short(values.iter().map(|v| *v as i16).collect()),
            ElementType::UShort => ArrayValue::UShort(values.iter().map(|v| *v as u16).collect()),
            ElementType::Long => ArrayValue::Long(values.iter().map(|v| *v as i32).collect()),
            ElementType::ULong => ArrayValue::ULong(values.iter().map(|v| *v as u32).collect()),
            ElementType::Float => ArrayValue::Float(values.iter().map(|v| *v as f32).collect()),
            ElementType::Double => ArrayValue::Double(values.iter().map(|v| *v as f64).collect()),
        }
    }

    /// Floating point elements are truncated toward zero for integer types.
    pub fn from_f64s(element: ElementType, values: &[f64]) -> Self {
        match element {
            ElementType::Float => ArrayValue::Float(values.iter().map(|v| *v as f32).collect()),
            ElementType::Double => ArrayValue::Double(values.to_vec()),
            integer => {
                let ints: Vec<i64> = values.iter().map(|v| *v as i64).collect();
                Self::from_i64s(integer, &ints)
            }
        }
    }

    /// Converts to another element type, keeping the element count.
    pub fn convert(&self, element: ElementType) -> Self {
        if self.element_type() == element {
            return self.clone();
        }
        if self.element_type().is_integer() {
            Self::from_i64s(element, &self.to_i64s())
        } else {
            Self::from_f64s(element, &self.to_f64s())
        }
    }

    /// Interprets the elements as bytes of a NUL-terminated string.
    pub fn to_text(&self) -> String {
        let bytes: Vec<u8> = self
            .to_i64s()
            .into_iter()
            .map(|b| b as u8)
            .take_while(|b| *b != 0)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        each_array!(self, v => {
            for (i, x) in v.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", x)?;
            }
        });
        f.write_str("]")
    }
}

/// The value held by a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Long(i32),
    /// State index of a binary or multi-bit record.
    Enum(u16),
    String(String),
    Array(ArrayValue),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Double(_) => "double",
            Value::Long(_) => "long",
            Value::Enum(_) => "enum",
            Value::String(_) => "string",
            Value::Array(_) => "array",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Long(v) => Some(*v as f64),
            Value::Enum(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Double(v) => Some(*v as i64),
            Value::Long(v) => Some(*v as i64),
            Value::Enum(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Converts to the untyped form used in config and autosave files.
    pub fn to_plain(&self) -> PlainValue {
        match self {
            Value::Double(v) => PlainValue::Float(*v),
            Value::Long(v) => PlainValue::Int(*v as i64),
            Value::Enum(v) => PlainValue::Int(*v as i64),
            Value::String(s) => PlainValue::Text(s.clone()),
            Value::Array(a) if a.element_type().is_integer() => PlainValue::Ints(a.to_i64s()),
            Value::Array(a) => PlainValue::Floats(a.to_f64s()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Double(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Enum(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Array(a) => write!(f, "{}", a),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Long(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Enum(v as u16)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<ArrayValue> for Value {
    fn from(v: ArrayValue) -> Self {
        Value::Array(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Array(ArrayValue::Double(v))
    }
}

/// Untyped value as written in config and autosave files.
///
/// The record type decides how it is interpreted, see
/// [`crate::device::ValueShape::coerce`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlainValue {
    Int(i64),
    Float(f64),
    Text(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
}

impl PlainValue {
    /// A host value carrying the same data; arrays come back as LONG or DOUBLE.
    pub fn to_value(&self) -> Value {
        match self {
            PlainValue::Int(v) => match i32::try_from(*v) {
                Ok(v) => Value::Long(v),
                Err(_) => Value::Double(*v as f64),
            },
            PlainValue::Float(v) => Value::Double(*v),
            PlainValue::Text(s) => Value::String(s.clone()),
            PlainValue::Ints(v) => Value::Array(ArrayValue::from_i64s(ElementType::Long, v)),
            PlainValue::Floats(v) => Value::Array(ArrayValue::Double(v.clone())),
        }
    }

    /// Element type implied by an array literal.
    pub fn element_hint(&self) -> Option<ElementType> {
        match self {
            PlainValue::Ints(_) => Some(ElementType::Long),
            PlainValue::Floats(_) => Some(ElementType::Double),
            _ => None,
        }
    }

    pub fn array_len(&self) -> Option<usize> {
        match self {
            PlainValue::Ints(v) => Some(v.len()),
            PlainValue::Floats(v) => Some(v.len()),
            _ => None,
        }
    }
}
