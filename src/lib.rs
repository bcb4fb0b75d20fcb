// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod alarm;          // severities, statuses and the merge policy
pub mod builder;        // record specs and the record builder
pub mod config;         // config loading + validation
pub mod device;         // device support for soft records
pub mod dispatch;       // cross-scheduler calls
pub mod engine;         // in-process record engine
pub mod errors;         // error handling
pub mod ioc;            // lifecycle, shell and autosave
pub mod observability;
pub mod record;         // record types, values and the DBR codec
pub mod scheduler;      // coroutine and event-loop schedulers
pub mod traits;         // unified abstractions
