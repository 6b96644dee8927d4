//! relay::client
//!
//! One-shot client: send a line, read the reply until the server closes.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::RelayError;

/// Send `line` to the relay at `addr` and return its reply.
pub async fn send_line(addr: SocketAddr, line: &str) -> Result<String, RelayError> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|source| RelayError::Connect { addr, source })?;

    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    debug!(%addr, "sent relay request");

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await?;
    Ok(String::from_utf8_lossy(&reply).into_owned())
}

/// Ask the relay at `addr` to commit with `message`.
pub async fn send_commit(addr: SocketAddr, message: &str) -> Result<String, RelayError> {
    send_line(addr, &format!("commit {}", message)).await
}
