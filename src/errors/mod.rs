// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod build;
mod config;
mod dbr;
mod device;
mod dispatch;
mod engine;
mod ioc;

pub use build::BuildError;
pub use config::{ConfigError, ValidationError};
pub use dbr::DbrError;
pub use device::DeviceError;
pub use dispatch::{DispatchError, DispatchResult};
pub use engine::EngineError;
pub use ioc::IocError;
