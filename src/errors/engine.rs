// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::DbrError;

/// Errors raised by the record engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no record named '{0}'")]
    UnknownRecord(String),

    #[error("record '{0}' is already registered")]
    DuplicateRecord(String),

    #[error("engine already initialised, records can no longer be registered")]
    AlreadyInitialised,

    #[error("engine is not initialised")]
    NotInitialised,

    #[error(transparent)]
    Dbr(#[from] DbrError),
}
