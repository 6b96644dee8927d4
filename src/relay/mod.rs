//! relay
//!
//! One-shot line protocol for sending commits to a running instance.
//!
//! # Protocol
//!
//! The client connects and sends a single line `"<command> <message>"`. The
//! only command is `commit`, which commits the server's store with
//! `message`. The server replies with one fixed string and closes the
//! connection:
//! - `Commit received` after a successful commit
//! - `Invalid command` for anything else
//! - `Commit failed: <reason>` if committing errored

pub mod client;
pub mod server;

pub use client::{send_commit, send_line};
pub use server::RelayServer;

use std::net::SocketAddr;

use thiserror::Error;
use tracing::{info, warn};

use crate::workspace::Workspace;

/// Largest request the server reads.
pub const MAX_REQUEST_BYTES: usize = 1024;
/// Reply to an accepted commit.
pub const ACK: &str = "Commit received";
/// Reply to an unrecognized command.
pub const INVALID: &str = "Invalid command";

/// Errors from the relay transport.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("relay i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `commit <message>`
    Commit(String),
    /// Any other command word.
    Unknown(String),
}

/// Parse one request line.
///
/// The command is everything before the first space; the rest is the
/// message. Trailing line endings are dropped.
pub fn parse_request(line: &str) -> Request {
    let line = line.trim_end_matches(['\r', '\n']);
    let (command, message) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "commit" => Request::Commit(message.to_string()),
        other => Request::Unknown(other.to_string()),
    }
}

/// Apply one request to `workspace` and produce the reply.
pub fn handle_request(workspace: &mut Workspace, line: &str) -> String {
    match parse_request(line) {
        Request::Commit(message) => match workspace.commit(&message) {
            Ok(id) => {
                info!(id = %id, message = %message, "commit received");
                ACK.to_string()
            }
            Err(e) => {
                warn!(error = %e, "relayed commit failed");
                format!("Commit failed: {}", e)
            }
        },
        Request::Unknown(command) => {
            warn!(command = %command, "invalid relay command");
            INVALID.to_string()
        }
    }
}
