// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{DbrError, EngineError};

/// Errors from the application-side record API.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("write to '{record}' was rejected")]
    Rejected { record: String },

    #[error("'{record}' is an {direction} record and does not support {operation}")]
    WrongDirection {
        record: String,
        direction: &'static str,
        operation: &'static str,
    },

    #[error("cannot convert {from} to a value for '{record}'")]
    Conversion { record: String, from: String },

    #[error("value {value} is out of range for '{record}'")]
    OutOfRange { record: String, value: String },

    #[error("write to '{record}' from inside its own engine callback")]
    Reentrant { record: String },

    #[error("record '{record}' is no longer attached to an engine")]
    Detached { record: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Dbr(#[from] DbrError),
}
