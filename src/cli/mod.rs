//! cli
//!
//! Command-line interface layer for Verdant.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialize diagnostics logging
//! - Load configuration and apply flag overrides
//! - Delegate to command handlers

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug)?;

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(dir) = cli.data_dir {
        config.set_data_dir(dir);
    }
    if let Some(db) = cli.db {
        config.set_store_file(db);
    }
    if let Some(author) = cli.author {
        config.set_author(author).context("Invalid --author")?;
    }

    let ctx = commands::Context {
        config,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command.unwrap_or(args::Command::Repl), &ctx)
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` is honored; `--debug` raises this crate to debug level.
fn init_tracing(debug: bool) -> Result<()> {
    let level = if debug { "verdant=debug" } else { "verdant=warn" };
    let filter = EnvFilter::from_default_env().add_directive(level.parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}
