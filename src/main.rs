// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;

use anyhow::Context;
use softrec::ioc::Ioc;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Blocks until ctrl-c on a small runtime of its own.
fn wait_for_interrupt() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build signal runtime")?;
    runtime
        .block_on(tokio::signal::ctrl_c())
        .context("failed to listen for ctrl-c")
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let no_shell = args.iter().skip(1).any(|a| a == "--no-shell");
    let config_files: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();

    if config_files.len() != 1 {
        eprintln!("Usage: {} <config.yaml|config.toml> [--no-shell]", args[0]);
        eprintln!("Example: {} configs/demo-ioc.yaml", args[0]);
        std::process::exit(1);
    }

    init_logging();

    let ioc = Ioc::from_config(config_files[0])
        .with_context(|| format!("failed to start IOC from {}", config_files[0]))?;
    ioc.init()?;

    if no_shell {
        wait_for_interrupt()?;
    } else {
        println!("softrec IOC {} running, type help for commands", ioc.config().device_name);
        ioc.run_shell()?;
    }

    ioc.shutdown();
    Ok(())
}
