//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! The relay commands (`serve`, `send`) do network I/O. Their handlers build
//! a tokio runtime and `block_on` the async implementation, so the rest of
//! the CLI stays synchronous.

mod config_cmd;
pub mod repl;
mod send;
mod serve;

pub use config_cmd::config;
pub use repl::repl;
pub use send::send;
pub use serve::serve;

use anyhow::Result;

use crate::cli::args::Command;
use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective configuration, flags applied
    pub config: Config,
    /// Output verbosity
    pub verbosity: Verbosity,
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Repl => repl::repl(ctx),
        Command::Serve { addr } => serve::serve(ctx, addr),
        Command::Send { message, addr } => send::send(ctx, &message.join(" "), addr),
        Command::Config { write } => config_cmd::config(ctx, write),
    }
}
