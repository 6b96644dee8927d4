//! cli::commands::send
//!
//! Relay a commit message to a running server.

use std::net::SocketAddr;

use anyhow::{Context as _, Result};

use super::Context;
use crate::relay;
use crate::ui::output;

/// Run the send command.
pub fn send(ctx: &Context, message: &str, addr: Option<SocketAddr>) -> Result<()> {
    let addr = match addr {
        Some(addr) => addr,
        None => ctx.config.relay_addr()?,
    };

    let rt = tokio::runtime::Runtime::new()?;
    let reply = rt
        .block_on(relay::send_commit(addr, message))
        .with_context(|| format!("Failed to relay commit to {}", addr))?;

    output::print(format!("Server: {}", reply), ctx.verbosity);
    Ok(())
}
