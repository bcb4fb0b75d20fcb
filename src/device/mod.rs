// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Device support for soft records.
//!
//! [`RecordDevice`] sits between the record engine and application code. The
//! engine calls its [`DeviceSupport`](crate::traits::DeviceSupport) entry
//! points with the record lock held; those return immediately and hand any
//! `on_update` callback to the dispatcher as fire-and-forget work. Application
//! code publishes input values and writes output values through the inherent
//! methods.

mod adapter;
mod callback;
mod convert;

pub use adapter::{DevicePhase, DeviceSettings, RecordDevice, RecordMetadata};
pub use callback::{on_update, on_update_name, on_update_sync, BoundCallback, LogUpdates, Validator};
pub use convert::{ValueShape, MAX_MBB_STATE};
