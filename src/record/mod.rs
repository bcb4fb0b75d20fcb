// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Record values, record types and the engine-native buffer codec.

pub mod dbr;
mod record_type;
mod value;

pub use dbr::{DbrBuffer, DbrType};
pub use record_type::{DataKind, Direction, RecordType, ScanPolicy};
pub use value::{ArrayValue, ElementType, PlainValue, Value};
