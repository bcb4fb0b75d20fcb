// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{BuildError, ConfigError, DispatchError, EngineError};

/// Errors from the IOC lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum IocError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("autosave failed: {0}")]
    Autosave(String),

    #[error("IOC already initialised")]
    AlreadyInitialised,
}
