// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{DeviceError, EngineError};

/// Errors raised while building records.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("record '{0}' already exists")]
    Duplicate(String),

    #[error("cannot create record '{0}' after the engine has been initialised")]
    TooLate(String),

    #[error("invalid spec for '{record}': {reason}")]
    InvalidSpec { record: String, reason: String },

    #[error("'{0}' is an input record, on_update and validate are only allowed on output records")]
    CallbackOnInputRecord(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
