// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! IOC lifecycle.
//!
//! [`Ioc`] wires a configuration to running parts: the scheduler context and
//! dispatcher, the soft engine, the record builder and autosave. The usual
//! sequence is:
//!
//! ```no_run
//! use softrec::ioc::Ioc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let ioc = Ioc::from_config("configs/demo-ioc.yaml")?;
//!     ioc.init()?;
//!     ioc.run_shell()?;
//!     ioc.shutdown();
//!     Ok(())
//! }
//! ```

mod autosave;
mod lifecycle;
mod shell;

pub use autosave::Autosave;
pub use lifecycle::Ioc;
pub use shell::{Reply, Shell};

#[cfg(test)]
mod integration_tests;
