// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! An in-process record engine.
//!
//! [`SoftEngine`] drives registered [`DeviceSupport`](crate::traits::DeviceSupport)
//! implementations the way an external record engine would: every entry
//! point is called with that record's lock held, input records are processed
//! once at initialisation, I/O interrupt records are processed on request and
//! periodic records by one scan thread per distinct period.

mod scanner;
mod soft;

pub use soft::SoftEngine;
