// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Diagnostic and operational logging throughout softrec goes through message
//! structs that implement `Display`, so log lines are written in one place
//! and carry the same structured fields wherever they are emitted.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::device` - record adapter events
//! * `messages::dispatch` - scheduler lifecycle and cross-scheduler calls
//! * `messages::engine` - soft engine lifecycle and scanning
//! * `messages::lifecycle` - configuration, IOC start/stop and autosave
//!
//! # Usage
//!
//! ```rust
//! use softrec::observability::messages::lifecycle::AutosaveValueSkipped;
//!
//! let msg = AutosaveValueSkipped {
//!     record: "TS:GAIN",
//!     reason: "record no longer exists",
//! };
//!
//! tracing::warn!("{}", msg);
//! ```

pub mod messages;
