// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Record builder.
//!
//! A [`RecordSpec`] describes a record; [`RecordBuilder::build`] turns it into
//! a [`RecordDevice`], registers it with the engine under
//! `prefix + separator + name` and connects the two. Building is only possible
//! before the engine is initialised.
//!
//! `on_update` callbacks are bound to a scheduler when the record is built:
//! the `RecordSpec`'s explicit tag if it has one, otherwise the scheduler the building
//! thread belongs to, otherwise the builder's default.

mod from_config;
mod record_builder;
mod spec;

pub use record_builder::RecordBuilder;
pub use spec::RecordSpec;

#[cfg(test)]
mod tests;
