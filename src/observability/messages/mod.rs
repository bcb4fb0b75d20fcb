// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit that line together with its fields at the level
//! the message is documented with.
//!
//! # Organization
//!
//! * `device` - record adapter events (rejections, panics, callback failures)
//! * `dispatch` - scheduler lifecycle and cross-scheduler calls
//! * `engine` - soft engine registration, initialisation and scanning
//! * `lifecycle` - configuration, IOC start/stop and autosave
//!
//! # Usage Pattern
//!
//! ```rust
//! use softrec::observability::messages::engine::EngineInitialised;
//! use softrec::observability::messages::StructuredLog;
//!
//! let msg = EngineInitialised {
//!     records: 12,
//!     scan_threads: 2,
//! };
//!
//! msg.log();
//! ```

use std::fmt::Display;
use tracing::Span;

pub mod device;
pub mod dispatch;
pub mod engine;
pub mod lifecycle;

/// A message that knows how to log itself with structured fields.
pub trait StructuredLog: Display {
    /// Emits the message at its documented level.
    fn log(&self);

    /// A span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
