//! Accent tray server entry point.
//!
//! `run` (the default) starts the tray supervisor, which re-executes this
//! binary as `serve` to host the color service in its own process.

mod app;
mod cli;
mod config;
mod instance;
mod serve;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr: a worker's stdout is its message channel.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command.unwrap_or_default() {
        Command::Run => {
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                "starting accent tray server"
            );
            let Some(instance) = instance::InstanceLock::acquire(&config::lock_path()?)? else {
                tracing::info!("another instance is already running, exiting");
                return Ok(());
            };
            tracing::debug!(lock = %instance.path().display(), "single instance");

            let config = config::Config::load(cli.config.as_deref())?;
            tracing::info!(port = config.port, debug = config.debug, "configuration loaded");
            rt.block_on(app::run(config))?;
            tracing::info!("shut down cleanly");
        }
        Command::Serve(args) => {
            rt.block_on(serve::run(args))?;
        }
    }

    Ok(())
}
