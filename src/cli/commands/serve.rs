//! cli::commands::serve
//!
//! Run the relay server against the configured workspace.

use std::net::SocketAddr;

use anyhow::{Context as _, Result};

use super::Context;
use crate::relay::RelayServer;
use crate::ui::output;
use crate::workspace::Workspace;

/// Run the serve command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn serve(ctx: &Context, addr: Option<SocketAddr>) -> Result<()> {
    let addr = match addr {
        Some(addr) => addr,
        None => ctx.config.relay_addr()?,
    };
    let mut workspace = Workspace::open(&ctx.config).context("Failed to open workspace")?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(serve_async(ctx, addr, &mut workspace))
}

async fn serve_async(ctx: &Context, addr: SocketAddr, workspace: &mut Workspace) -> Result<()> {
    let server = RelayServer::bind(addr).await?;
    output::print(
        format!("Relay listening on {}", server.local_addr()?),
        ctx.verbosity,
    );
    server.serve(workspace).await?;
    Ok(())
}
