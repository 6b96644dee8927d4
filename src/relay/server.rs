//! relay::server
//!
//! TCP listener serving one connection at a time.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::{handle_request, RelayError, MAX_REQUEST_BYTES};
use crate::workspace::Workspace;

/// A bound relay listener.
#[derive(Debug)]
pub struct RelayServer {
    listener: TcpListener,
}

impl RelayServer {
    /// Bind to `addr`. Port 0 picks a free port.
    pub async fn bind(addr: SocketAddr) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;
        Ok(Self { listener })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and answer a single connection. Returns the reply sent.
    pub async fn serve_one(&self, workspace: &mut Workspace) -> Result<String, RelayError> {
        let (mut stream, peer) = self.listener.accept().await?;
        debug!(%peer, "relay connection");
        answer(&mut stream, workspace).await
    }

    /// Serve connections until accepting fails.
    ///
    /// Errors on a single connection are logged and the loop continues.
    pub async fn serve(&self, workspace: &mut Workspace) -> Result<(), RelayError> {
        info!(addr = %self.local_addr()?, "relay listening");
        loop {
            let (mut stream, peer) = self.listener.accept().await?;
            debug!(%peer, "relay connection");
            if let Err(e) = answer(&mut stream, workspace).await {
                warn!(%peer, error = %e, "relay connection failed");
            }
        }
    }
}

async fn answer(stream: &mut TcpStream, workspace: &mut Workspace) -> Result<String, RelayError> {
    let line = read_request(stream).await?;
    let reply = handle_request(workspace, &line);
    stream.write_all(reply.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(reply)
}

/// Read up to [`MAX_REQUEST_BYTES`], stopping at the first newline or EOF.
async fn read_request(stream: &mut TcpStream) -> Result<String, RelayError> {
    let mut buf = [0u8; MAX_REQUEST_BYTES];
    let mut filled = 0;

    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
        if buf[..filled].contains(&b'\n') {
            break;
        }
    }

    let text = String::from_utf8_lossy(&buf[..filled]);
    Ok(text.lines().next().unwrap_or_default().to_string())
}
